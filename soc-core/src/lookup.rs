//! Reference data consumed by the models.
//!
//! The models never read external files themselves: callers supply a
//! [`ReferenceData`] with the eco-climate zone table (reference stocks and
//! stock-change factors) and the glossary-derived term classifications. All
//! structures are plain serde types so reference data can be loaded from
//! whatever format the caller keeps it in.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::errors::{SocError, SocResult};
use crate::FloatValue;

/// Eco-climate zones the Tier 1 model cannot run for: polar moist (5) and
/// polar dry (6).
pub const EXCLUDED_ECO_CLIMATE_ZONES: [u32; 2] = [5, 6];

/// The eco-climate zone lookup table: one row per zone, one column per
/// reference stock or stock-change factor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcoClimateZoneTable {
    rows: HashMap<u32, HashMap<String, FloatValue>>,
}

impl EcoClimateZoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, zone: u32, column: impl Into<String>, value: FloatValue) {
        self.rows.entry(zone).or_default().insert(column.into(), value);
    }

    /// A value that may legitimately be absent, e.g. while probing whether a
    /// site is eligible at all.
    pub fn get(&self, zone: u32, column: &str) -> Option<FloatValue> {
        self.rows.get(&zone).and_then(|row| row.get(column)).copied()
    }

    /// A value the surrounding calculation has already validated the
    /// existence of. A miss here is a broken reference-data contract.
    pub fn require(&self, zone: u32, column: &str) -> SocResult<FloatValue> {
        self.get(zone, column)
            .ok_or_else(|| SocError::MissingLookup(zone, column.to_string()))
    }
}

/// Glossary-derived reference data: term classifications, flag sets and
/// default term properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    pub eco_climate_zone: EcoClimateZoneTable,

    /// Land-cover term id to IPCC land use category label.
    pub land_cover_use_category: HashMap<String, String>,
    /// Crop term id to IPCC land use category label.
    pub crop_use_category: HashMap<String, String>,
    /// Tillage term id to IPCC tillage management category label.
    pub tillage_category: HashMap<String, String>,
    /// Soil type term id to IPCC soil category label.
    pub soil_type_category: HashMap<String, String>,
    /// USDA soil type term id to IPCC soil category label.
    pub usda_soil_type_category: HashMap<String, String>,

    /// Land-cover terms flagged as low residue-producing crops.
    pub low_residue_producing_crops: HashSet<String>,
    /// Land-cover terms flagged as nitrogen-fixing crops.
    pub n_fixing_crops: HashSet<String>,
    /// Land-use-management terms flagged as increasing carbon input.
    pub practices_increasing_c_input: HashSet<String>,

    /// Water-regime terms that mean irrigation.
    pub irrigated_terms: HashSet<String>,
    /// Crop terms for upland rice.
    pub upland_rice_crop_terms: HashSet<String>,
    /// Land-cover terms for upland rice.
    pub upland_rice_land_cover_terms: HashSet<String>,
    /// Property terms that mark a land cover as a cover crop.
    pub cover_crop_property_terms: HashSet<String>,
    /// Crop-residue-management terms meaning residues are removed or burnt.
    pub residue_removed_or_burnt_terms: HashSet<String>,
    /// Crop-residue terms meaning residues are incorporated or left on field.
    pub residue_incorporated_or_left_terms: HashSet<String>,

    /// Default property values per term, used when a record does not carry
    /// the property itself.
    pub term_properties: HashMap<String, HashMap<String, FloatValue>>,
}

impl ReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// The glossary default for a property of a term, e.g. the carbon
    /// content of a residue term.
    pub fn term_property(&self, term_id: &str, property_term_id: &str) -> Option<FloatValue> {
        self.term_properties
            .get(term_id)
            .and_then(|properties| properties.get(property_term_id))
            .copied()
    }

    pub fn land_cover_use_category_of(&self, term_id: &str) -> Option<&str> {
        self.land_cover_use_category.get(term_id).map(String::as_str)
    }

    pub fn crop_use_category_of(&self, term_id: &str) -> Option<&str> {
        self.crop_use_category.get(term_id).map(String::as_str)
    }

    pub fn tillage_category_of(&self, term_id: &str) -> Option<&str> {
        self.tillage_category.get(term_id).map(String::as_str)
    }
}
