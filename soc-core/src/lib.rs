pub mod categories;
pub mod grouping;
pub mod lookup;
pub mod matching;
pub mod node;
pub mod params;

pub mod errors;

/// Alias for the float type used throughout the models.
pub type FloatValue = f64;
