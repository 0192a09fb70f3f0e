pub mod carbon_sources;
pub mod classifiers;
pub mod climate;
pub mod inventory;
pub mod orchestrator;
pub mod tier1;
pub mod tier2;
