//! Record contracts shared by the Tier 1 and Tier 2 models.
//!
//! Sites, cycles and their nested nodes mirror the external schema the models
//! consume: every node carries a glossary term, an optional value and optional
//! date information. The models never mutate these records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{SocError, SocResult};
use crate::FloatValue;

pub const ORGANIC_CARBON_PER_HA_TERM_ID: &str = "organicCarbonPerHa";

pub const ECO_CLIMATE_ZONE_TERM_ID: &str = "ecoClimateZone";
pub const SAND_CONTENT_TERM_ID: &str = "sandContent";
pub const CLAY_CONTENT_TERM_ID: &str = "clayContent";
pub const TEMPERATURE_MONTHLY_TERM_ID: &str = "temperatureMonthly";
pub const PRECIPITATION_MONTHLY_TERM_ID: &str = "precipitationMonthly";
pub const PET_MONTHLY_TERM_ID: &str = "potentialEvapotranspirationMonthly";
pub const NUMBER_OF_TILLAGES_TERM_ID: &str = "numberOfTillages";

pub const CARBON_CONTENT_TERM_ID: &str = "carbonContent";
pub const NITROGEN_CONTENT_TERM_ID: &str = "nitrogenContent";
pub const LIGNIN_CONTENT_TERM_ID: &str = "ligninContent";

pub const LONG_FALLOW_CROP_TERM_ID: &str = "longFallowCrop";
pub const IMPROVED_PASTURE_TERM_ID: &str = "improvedPasture";
pub const SHORT_BARE_FALLOW_TERM_ID: &str = "shortBareFallow";
pub const ANIMAL_MANURE_USED_TERM_ID: &str = "animalManureUsed";
pub const INORGANIC_NITROGEN_FERTILISER_USED_TERM_ID: &str = "inorganicNitrogenFertiliserUsed";
pub const ORGANIC_FERTILISER_USED_TERM_ID: &str = "organicFertiliserUsed";
pub const SOIL_AMENDMENT_USED_TERM_ID: &str = "amendmentIncreasingSoilCarbonUsed";

/// Depth interval (cm) that all calculated stocks refer to.
pub const DEPTH_UPPER: i32 = 0;
pub const DEPTH_LOWER: i32 = 30;

/// A calendar date with optional month and day components.
///
/// Parsed from `YYYY`, `YYYY-MM` or `YYYY-MM-DD` strings. Ordering is
/// lexicographic on (year, month, day) with missing components sorting first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    pub fn year(year: i32) -> Self {
        Self {
            year,
            month: None,
            day: None,
        }
    }

    pub fn year_month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
            day: None,
        }
    }

    /// The month, or `default` when only a year is known.
    pub fn month_or(&self, default: u32) -> u32 {
        self.month.unwrap_or(default)
    }
}

impl FromStr for PartialDate {
    type Err = SocError;

    fn from_str(s: &str) -> SocResult<Self> {
        let mut parts = s.splitn(3, '-');
        let year = parts
            .next()
            .filter(|p| !p.is_empty())
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(|| SocError::Error(format!("Invalid date: {s}")))?;
        let parse_component = |part: Option<&str>| -> SocResult<Option<u32>> {
            match part {
                None => Ok(None),
                Some(p) => p
                    .parse::<u32>()
                    .map(Some)
                    .map_err(|_| SocError::Error(format!("Invalid date: {s}"))),
            }
        };
        Ok(Self {
            year,
            month: parse_component(parts.next())?,
            day: parse_component(parts.next())?,
        })
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.month, self.day) {
            (Some(m), Some(d)) => write!(f, "{:04}-{:02}-{:02}", self.year, m, d),
            (Some(m), None) => write!(f, "{:04}-{:02}", self.year, m),
            _ => write!(f, "{:04}", self.year),
        }
    }
}

impl TryFrom<String> for PartialDate {
    type Error = SocError;

    fn try_from(value: String) -> SocResult<Self> {
        value.parse()
    }
}

impl From<PartialDate> for String {
    fn from(value: PartialDate) -> Self {
        value.to_string()
    }
}

/// Glossary term types a node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TermType {
    LandCover,
    WaterRegime,
    Tillage,
    SoilType,
    UsdaSoilType,
    LandUseManagement,
    CropResidueManagement,
    Crop,
    Forage,
    CropResidue,
    OrganicFertiliser,
    SoilAmendment,
    Measurement,
    Other,
}

impl Default for TermType {
    fn default() -> Self {
        TermType::Other
    }
}

/// The value of a node: a scalar, a boolean flag or a list of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeValue {
    Boolean(bool),
    Number(FloatValue),
    List(Vec<FloatValue>),
}

impl NodeValue {
    /// Collapse the value to a single number: lists are summed and booleans
    /// map to 0/1.
    pub fn magnitude(&self) -> FloatValue {
        match self {
            NodeValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            NodeValue::Number(n) => *n,
            NodeValue::List(values) => values.iter().sum(),
        }
    }

    /// Whether the value is "set": `false` and `0` count as unset.
    pub fn is_truthy(&self) -> bool {
        self.magnitude() != 0.0
    }
}

/// A property attached to a node, e.g. the carbon content of a crop residue
/// product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub term_id: String,
    pub value: NodeValue,
}

/// A single management, measurement, practice, input or product record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    pub term_id: String,
    pub term_type: TermType,
    pub value: Option<NodeValue>,
    pub start_date: Option<PartialDate>,
    pub end_date: Option<PartialDate>,
    /// Parallel to `value` for list-valued measurements: one date per entry.
    pub dates: Vec<PartialDate>,
    pub properties: Vec<Property>,
    pub depth_upper: Option<i32>,
    pub depth_lower: Option<i32>,
}

impl Node {
    pub fn new(term_id: impl Into<String>, term_type: TermType) -> Self {
        Self {
            term_id: term_id.into(),
            term_type,
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: NodeValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_span(mut self, start: PartialDate, end: PartialDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_dates(mut self, dates: Vec<PartialDate>) -> Self {
        self.dates = dates;
        self
    }

    pub fn with_property(mut self, term_id: impl Into<String>, value: NodeValue) -> Self {
        self.properties.push(Property {
            term_id: term_id.into(),
            value,
        });
        self
    }

    pub fn with_depth(mut self, upper: i32, lower: i32) -> Self {
        self.depth_upper = Some(upper);
        self.depth_lower = Some(lower);
        self
    }

    /// The node value collapsed to a single number, `0` when unset.
    pub fn magnitude(&self) -> FloatValue {
        self.value.as_ref().map(NodeValue::magnitude).unwrap_or(0.0)
    }

    /// The node value, or `default` when the node carries no value at all.
    pub fn magnitude_or(&self, default: FloatValue) -> FloatValue {
        self.value
            .as_ref()
            .map(NodeValue::magnitude)
            .unwrap_or(default)
    }

    /// The value as a monthly series, when it is a list.
    pub fn list_values(&self) -> Option<&[FloatValue]> {
        match &self.value {
            Some(NodeValue::List(values)) => Some(values),
            _ => None,
        }
    }

    /// A numeric property attached directly to this node.
    pub fn property_value(&self, property_term_id: &str) -> Option<FloatValue> {
        self.properties
            .iter()
            .find(|p| p.term_id == property_term_id)
            .map(|p| p.value.magnitude())
    }

    /// Whether a boolean-like property is present and set.
    pub fn property_flag(&self, property_term_id: &str) -> bool {
        self.property_value(property_term_id)
            .map(|v| v != 0.0)
            .unwrap_or(false)
    }

    /// Whether the node's depth interval is exactly the modelled 0-30cm one.
    pub fn covers_model_depth(&self) -> bool {
        self.depth_upper == Some(DEPTH_UPPER) && self.depth_lower == Some(DEPTH_LOWER)
    }
}

/// Site types the models distinguish between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteType {
    #[serde(rename = "cropland")]
    Cropland,
    #[serde(rename = "forest")]
    Forest,
    #[serde(rename = "other natural vegetation")]
    OtherNaturalVegetation,
    #[serde(rename = "permanent pasture")]
    PermanentPasture,
    #[serde(rename = "other")]
    Other,
}

/// A site: the place SOC stocks are estimated for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Site {
    pub site_type: SiteType,
    pub management: Vec<Node>,
    pub measurements: Vec<Node>,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            site_type: SiteType::Other,
            management: Vec::new(),
            measurements: Vec::new(),
        }
    }
}

/// The functional unit a cycle's amounts are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionalUnit {
    #[serde(rename = "1 ha")]
    OneHectare,
    #[serde(rename = "relative")]
    Relative,
}

impl Default for FunctionalUnit {
    fn default() -> Self {
        FunctionalUnit::Relative
    }
}

/// A production cycle on a site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cycle {
    pub site_id: String,
    pub start_date: Option<PartialDate>,
    pub end_date: Option<PartialDate>,
    pub functional_unit: FunctionalUnit,
    pub inputs: Vec<Node>,
    pub products: Vec<Node>,
    pub practices: Vec<Node>,
}

/// The method tier a calculated stock came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodClassification {
    #[serde(rename = "tier 1 model")]
    Tier1Model,
    #[serde(rename = "tier 2 model")]
    Tier2Model,
}

impl fmt::Display for MethodClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodClassification::Tier1Model => write!(f, "tier 1 model"),
            MethodClassification::Tier2Model => write!(f, "tier 2 model"),
        }
    }
}

/// An output measurement: one SOC stock (kg C ha-1) for the 0-30cm depth
/// interval, dated to the end of its inventory year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocMeasurement {
    pub term_id: String,
    pub value: Vec<FloatValue>,
    pub dates: Vec<String>,
    pub depth_upper: i32,
    pub depth_lower: i32,
    pub method_classification: MethodClassification,
}

impl SocMeasurement {
    pub fn annual(year: i32, value: FloatValue, method: MethodClassification) -> Self {
        Self {
            term_id: ORGANIC_CARBON_PER_HA_TERM_ID.to_string(),
            value: vec![value],
            dates: vec![format!("{year}-12-31")],
            depth_upper: DEPTH_UPPER,
            depth_lower: DEPTH_LOWER,
            method_classification: method,
        }
    }

    pub fn year_value(&self) -> Option<FloatValue> {
        self.value.first().copied()
    }
}

/// Find the first node carrying the given term.
pub fn find_term_match<'a>(nodes: &'a [Node], term_id: &str) -> Option<&'a Node> {
    nodes.iter().find(|node| node.term_id == term_id)
}

/// All nodes whose term type is one of `term_types`.
pub fn filter_by_term_type<'a>(nodes: &'a [Node], term_types: &[TermType]) -> Vec<&'a Node> {
    nodes
        .iter()
        .filter(|node| term_types.contains(&node.term_type))
        .collect()
}
