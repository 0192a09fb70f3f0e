//! IPCC (2019) soil organic carbon stock-change estimation.
//!
//! This crate re-exports [`soc_core`] (record contracts, grouping, reference
//! data) and [`soc_models`] (the Tier 1 and Tier 2 models themselves).

pub use soc_core::*;
pub use soc_models::*;
