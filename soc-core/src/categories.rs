//! The categorical state space of the Tier 1 model.
//!
//! Every site-year is classified along four axes: soil, land use, management
//! and carbon input. Each category knows the reference-table column its
//! stock-change factor (or reference stock) lives in, plus the glossary
//! values its classifier matches against.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::node::SiteType;

/// IPCC (2019) soil categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilCategory {
    #[serde(rename = "organic soils")]
    Organic,
    #[serde(rename = "sandy soils")]
    Sandy,
    #[serde(rename = "wetland soils")]
    Wetland,
    #[serde(rename = "volcanic soils")]
    Volcanic,
    #[serde(rename = "spodic soils")]
    Spodic,
    #[serde(rename = "high-activity clay soils")]
    HighActivityClay,
    #[serde(rename = "low-activity clay soils")]
    LowActivityClay,
}

impl SoilCategory {
    /// Column of the eco-climate zone table holding the reference SOC stock
    /// for this soil. Organic soils have no mineral reference stock.
    pub fn soc_ref_column(&self) -> Option<&'static str> {
        match self {
            SoilCategory::Organic => None,
            SoilCategory::Sandy => Some("IPCC_2019_SOC_REF_KG_C_HECTARE_SAN"),
            SoilCategory::Wetland => Some("IPCC_2019_SOC_REF_KG_C_HECTARE_WET"),
            SoilCategory::Volcanic => Some("IPCC_2019_SOC_REF_KG_C_HECTARE_VOL"),
            SoilCategory::Spodic => Some("IPCC_2019_SOC_REF_KG_C_HECTARE_POD"),
            SoilCategory::HighActivityClay => Some("IPCC_2019_SOC_REF_KG_C_HECTARE_HAC"),
            SoilCategory::LowActivityClay => Some("IPCC_2019_SOC_REF_KG_C_HECTARE_LAC"),
        }
    }

    /// The value this category matches in the soil-type glossary lookups.
    pub fn soil_type_lookup_value(&self) -> &'static str {
        match self {
            SoilCategory::Organic => "Organic soils",
            SoilCategory::Sandy => "Sandy soils",
            SoilCategory::Wetland => "Wetland soils",
            SoilCategory::Volcanic => "Volcanic soils",
            SoilCategory::Spodic => "Spodic soils",
            SoilCategory::HighActivityClay => "High-activity clay soils",
            SoilCategory::LowActivityClay => "Low-activity clay soils",
        }
    }
}

impl fmt::Display for SoilCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SoilCategory::Organic => "organic soils",
            SoilCategory::Sandy => "sandy soils",
            SoilCategory::Wetland => "wetland soils",
            SoilCategory::Volcanic => "volcanic soils",
            SoilCategory::Spodic => "spodic soils",
            SoilCategory::HighActivityClay => "high-activity clay soils",
            SoilCategory::LowActivityClay => "low-activity clay soils",
        };
        write!(f, "{label}")
    }
}

/// IPCC (2019) land use categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandUseCategory {
    #[serde(rename = "grassland")]
    Grassland,
    #[serde(rename = "perennial crops")]
    PerennialCrops,
    #[serde(rename = "paddy rice cultivation")]
    PaddyRiceCultivation,
    #[serde(rename = "annual crops (wet)")]
    AnnualCropsWet,
    #[serde(rename = "annual crops")]
    AnnualCrops,
    #[serde(rename = "set aside")]
    SetAside,
    #[serde(rename = "forest")]
    Forest,
    #[serde(rename = "native")]
    Native,
    #[serde(rename = "other")]
    Other,
}

impl LandUseCategory {
    /// Column of the eco-climate zone table holding the land-use stock-change
    /// factor. Categories outside the factor tables resolve to a factor of 1.
    pub fn factor_column(&self) -> Option<&'static str> {
        match self {
            LandUseCategory::Grassland => Some("IPCC_2019_LANDUSE_FACTOR_GRASSLAND"),
            LandUseCategory::PerennialCrops => Some("IPCC_2019_LANDUSE_FACTOR_PERENNIAL_CROPS"),
            LandUseCategory::PaddyRiceCultivation => {
                Some("IPCC_2019_LANDUSE_FACTOR_PADDY_RICE_CULTIVATION")
            }
            LandUseCategory::AnnualCropsWet => Some("IPCC_2019_LANDUSE_FACTOR_ANNUAL_CROPS_WET"),
            LandUseCategory::AnnualCrops => Some("IPCC_2019_LANDUSE_FACTOR_ANNUAL_CROPS"),
            LandUseCategory::SetAside => Some("IPCC_2019_LANDUSE_FACTOR_SET_ASIDE"),
            LandUseCategory::Forest | LandUseCategory::Native | LandUseCategory::Other => None,
        }
    }

    /// The land-cover glossary values that indicate this category. Set-aside
    /// land can follow any cropping use.
    pub fn land_cover_targets(&self) -> &'static [&'static str] {
        match self {
            LandUseCategory::Grassland => &["Grassland"],
            LandUseCategory::PerennialCrops => &["Perennial crops"],
            LandUseCategory::PaddyRiceCultivation => &["Paddy rice cultivation"],
            LandUseCategory::AnnualCropsWet | LandUseCategory::AnnualCrops => &["Annual crops"],
            LandUseCategory::SetAside => &[
                "Annual crops",
                "Paddy rice cultivation",
                "Perennial crops",
                "Set aside",
            ],
            LandUseCategory::Forest => &["Forest"],
            LandUseCategory::Native => &["Native"],
            LandUseCategory::Other => &[],
        }
    }

    /// The static land use implied by a site type, for sites that record no
    /// land-cover history at all.
    pub fn from_site_type(site_type: SiteType) -> Self {
        match site_type {
            SiteType::PermanentPasture => LandUseCategory::Grassland,
            SiteType::Forest => LandUseCategory::Forest,
            SiteType::OtherNaturalVegetation => LandUseCategory::Native,
            SiteType::Cropland | SiteType::Other => LandUseCategory::Other,
        }
    }
}

impl fmt::Display for LandUseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LandUseCategory::Grassland => "grassland",
            LandUseCategory::PerennialCrops => "perennial crops",
            LandUseCategory::PaddyRiceCultivation => "paddy rice cultivation",
            LandUseCategory::AnnualCropsWet => "annual crops (wet)",
            LandUseCategory::AnnualCrops => "annual crops",
            LandUseCategory::SetAside => "set aside",
            LandUseCategory::Forest => "forest",
            LandUseCategory::Native => "native",
            LandUseCategory::Other => "other",
        };
        write!(f, "{label}")
    }
}

/// IPCC (2019) management categories, covering both grassland regimes and
/// cropland tillage regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagementCategory {
    #[serde(rename = "severely degraded")]
    SeverelyDegraded,
    #[serde(rename = "improved grassland")]
    ImprovedGrassland,
    #[serde(rename = "high-intensity grazing")]
    HighIntensityGrazing,
    #[serde(rename = "nominally managed")]
    NominallyManaged,
    #[serde(rename = "full tillage")]
    FullTillage,
    #[serde(rename = "reduced tillage")]
    ReducedTillage,
    #[serde(rename = "no tillage")]
    NoTillage,
    #[serde(rename = "other")]
    Other,
}

impl ManagementCategory {
    pub fn factor_column(&self) -> Option<&'static str> {
        match self {
            ManagementCategory::SeverelyDegraded => {
                Some("IPCC_2019_GRASSLAND_MANAGEMENT_FACTOR_SEVERELY_DEGRADED")
            }
            ManagementCategory::ImprovedGrassland => {
                Some("IPCC_2019_GRASSLAND_MANAGEMENT_FACTOR_IMPROVED_GRASSLAND")
            }
            ManagementCategory::HighIntensityGrazing => {
                Some("IPCC_2019_GRASSLAND_MANAGEMENT_FACTOR_HIGH_INTENSITY_GRAZING")
            }
            ManagementCategory::NominallyManaged => {
                Some("IPCC_2019_GRASSLAND_MANAGEMENT_FACTOR_NOMINALLY_MANAGED")
            }
            ManagementCategory::FullTillage => {
                Some("IPCC_2019_TILLAGE_MANAGEMENT_FACTOR_FULL_TILLAGE")
            }
            ManagementCategory::ReducedTillage => {
                Some("IPCC_2019_TILLAGE_MANAGEMENT_FACTOR_REDUCED_TILLAGE")
            }
            ManagementCategory::NoTillage => Some("IPCC_2019_TILLAGE_MANAGEMENT_FACTOR_NO_TILLAGE"),
            ManagementCategory::Other => None,
        }
    }

    /// The value a tillage regime matches in the tillage glossary lookup.
    pub fn tillage_lookup_value(&self) -> Option<&'static str> {
        match self {
            ManagementCategory::FullTillage => Some("Full tillage"),
            ManagementCategory::ReducedTillage => Some("Reduced tillage"),
            ManagementCategory::NoTillage => Some("No tillage"),
            _ => None,
        }
    }

    /// The land-cover term a grassland regime is recorded as.
    pub fn grassland_term_id(&self) -> Option<&'static str> {
        match self {
            ManagementCategory::SeverelyDegraded => Some("severelyDegradedPasture"),
            ManagementCategory::ImprovedGrassland => Some("improvedPasture"),
            ManagementCategory::HighIntensityGrazing => Some("highIntensityGrazingPasture"),
            ManagementCategory::NominallyManaged => Some("nominallyManagedPasture"),
            ManagementCategory::Other => Some("nativePasture"),
            _ => None,
        }
    }
}

impl fmt::Display for ManagementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ManagementCategory::SeverelyDegraded => "severely degraded",
            ManagementCategory::ImprovedGrassland => "improved grassland",
            ManagementCategory::HighIntensityGrazing => "high-intensity grazing",
            ManagementCategory::NominallyManaged => "nominally managed",
            ManagementCategory::FullTillage => "full tillage",
            ManagementCategory::ReducedTillage => "reduced tillage",
            ManagementCategory::NoTillage => "no tillage",
            ManagementCategory::Other => "other",
        };
        write!(f, "{label}")
    }
}

/// IPCC (2019) carbon input categories for improved grasslands and annual
/// croplands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarbonInputCategory {
    #[serde(rename = "grassland high")]
    GrasslandHigh,
    #[serde(rename = "grassland medium")]
    GrasslandMedium,
    #[serde(rename = "cropland high (with manure)")]
    CroplandHighWithManure,
    #[serde(rename = "cropland high (without manure)")]
    CroplandHighWithoutManure,
    #[serde(rename = "cropland medium")]
    CroplandMedium,
    #[serde(rename = "cropland low")]
    CroplandLow,
    #[serde(rename = "other")]
    Other,
}

impl CarbonInputCategory {
    pub fn factor_column(&self) -> Option<&'static str> {
        match self {
            CarbonInputCategory::GrasslandHigh => {
                Some("IPCC_2019_GRASSLAND_CARBON_INPUT_FACTOR_HIGH")
            }
            CarbonInputCategory::GrasslandMedium => {
                Some("IPCC_2019_GRASSLAND_CARBON_INPUT_FACTOR_MEDIUM")
            }
            CarbonInputCategory::CroplandHighWithManure => {
                Some("IPCC_2019_CROPLAND_CARBON_INPUT_FACTOR_HIGH_WITH_MANURE")
            }
            CarbonInputCategory::CroplandHighWithoutManure => {
                Some("IPCC_2019_CROPLAND_CARBON_INPUT_FACTOR_HIGH_WITHOUT_MANURE")
            }
            CarbonInputCategory::CroplandMedium => {
                Some("IPCC_2019_CROPLAND_CARBON_INPUT_FACTOR_MEDIUM")
            }
            CarbonInputCategory::CroplandLow => Some("IPCC_2019_CROPLAND_CARBON_INPUT_FACTOR_LOW"),
            CarbonInputCategory::Other => None,
        }
    }
}

impl fmt::Display for CarbonInputCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CarbonInputCategory::GrasslandHigh => "grassland high",
            CarbonInputCategory::GrasslandMedium => "grassland medium",
            CarbonInputCategory::CroplandHighWithManure => "cropland high (with manure)",
            CarbonInputCategory::CroplandHighWithoutManure => "cropland high (without manure)",
            CarbonInputCategory::CroplandMedium => "cropland medium",
            CarbonInputCategory::CroplandLow => "cropland low",
            CarbonInputCategory::Other => "other",
        };
        write!(f, "{label}")
    }
}
