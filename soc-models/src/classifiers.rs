//! Classification of site-years into the IPCC categorical state space.
//!
//! Each classifier walks an ordered decision sequence and returns the first
//! category whose conditions hold, falling back to a category-specific
//! default. Conditions are cumulative area-share matches over the year's
//! management records.

use std::collections::{HashMap, HashSet};

use soc_core::categories::{
    CarbonInputCategory, LandUseCategory, ManagementCategory, SoilCategory,
};
use soc_core::lookup::ReferenceData;
use soc_core::matching::{
    cumulative_nodes_match, cumulative_nodes_match_with_default, cumulative_nodes_term_match,
    cumulative_nodes_term_match_with_default, MIN_AREA_THRESHOLD, MIN_YIELD_THRESHOLD,
    SUPER_MAJORITY_AREA_THRESHOLD,
};
use soc_core::node::{
    filter_by_term_type, find_term_match, Cycle, Node, TermType, ANIMAL_MANURE_USED_TERM_ID,
    CLAY_CONTENT_TERM_ID, INORGANIC_NITROGEN_FERTILISER_USED_TERM_ID, LONG_FALLOW_CROP_TERM_ID,
    NUMBER_OF_TILLAGES_TERM_ID, ORGANIC_FERTILISER_USED_TERM_ID, SAND_CONTENT_TERM_ID,
    SHORT_BARE_FALLOW_TERM_ID, SOIL_AMENDMENT_USED_TERM_ID,
};
use soc_core::node::IMPROVED_PASTURE_TERM_ID;
use soc_core::FloatValue;

/// Clay below this share (%) is one half of the sandy-soil texture test.
const CLAY_CONTENT_MAX: FloatValue = 8.0;
/// Sand above this share (%) is the other half.
const SAND_CONTENT_MIN: FloatValue = 70.0;

const SOIL_CATEGORY_ORDER: [SoilCategory; 7] = [
    SoilCategory::Organic,
    SoilCategory::Sandy,
    SoilCategory::Wetland,
    SoilCategory::Volcanic,
    SoilCategory::Spodic,
    SoilCategory::HighActivityClay,
    SoilCategory::LowActivityClay,
];

const LAND_USE_CATEGORY_ORDER: [LandUseCategory; 9] = [
    LandUseCategory::Grassland,
    LandUseCategory::SetAside,
    LandUseCategory::PerennialCrops,
    LandUseCategory::PaddyRiceCultivation,
    LandUseCategory::AnnualCropsWet,
    LandUseCategory::AnnualCrops,
    LandUseCategory::Forest,
    LandUseCategory::Native,
    LandUseCategory::Other,
];

const GRASSLAND_MANAGEMENT_ORDER: [ManagementCategory; 5] = [
    ManagementCategory::SeverelyDegraded,
    ManagementCategory::ImprovedGrassland,
    ManagementCategory::HighIntensityGrazing,
    ManagementCategory::NominallyManaged,
    ManagementCategory::Other,
];

const TILLAGE_MANAGEMENT_ORDER: [ManagementCategory; 3] = [
    ManagementCategory::FullTillage,
    ManagementCategory::ReducedTillage,
    ManagementCategory::NoTillage,
];

/// Whether the nodes whose glossary lookup value is one of `targets` cover
/// enough of the site.
fn cumulative_lookup_match(
    nodes: &[&Node],
    lookup: &HashMap<String, String>,
    targets: &[&str],
    cumulative_threshold: FloatValue,
) -> bool {
    cumulative_nodes_match(
        |node| {
            lookup
                .get(&node.term_id)
                .map(|value| targets.contains(&value.as_str()))
                .unwrap_or(false)
        },
        nodes,
        cumulative_threshold,
    )
}

/// Whether the nodes flagged in `flagged_terms` cover enough of the site.
fn cumulative_flag_match(
    nodes: &[&Node],
    flagged_terms: &HashSet<String>,
    cumulative_threshold: FloatValue,
) -> bool {
    cumulative_nodes_term_match(nodes, flagged_terms, cumulative_threshold)
}

/// Whether irrigation covers at least 30% of the site.
pub fn has_irrigation(water_regime_nodes: &[&Node], reference: &ReferenceData) -> bool {
    cumulative_nodes_term_match(
        water_regime_nodes,
        &reference.irrigated_terms,
        MIN_AREA_THRESHOLD,
    )
}

// --- Soil category ---

fn check_soil_category(
    category: SoilCategory,
    soil_types: &[&Node],
    usda_soil_types: &[&Node],
    reference: &ReferenceData,
) -> bool {
    let target = category.soil_type_lookup_value();
    cumulative_lookup_match(
        soil_types,
        &reference.soil_type_category,
        &[target],
        MIN_AREA_THRESHOLD,
    ) || cumulative_lookup_match(
        usda_soil_types,
        &reference.usda_soil_type_category,
        &[target],
        MIN_AREA_THRESHOLD,
    )
}

/// Assign the soil category from the site measurements.
///
/// Sites without any soil-type measurement default to low-activity clay
/// soils. Soils failing every glossary match but with a sandy texture (clay
/// below 8%, sand above 70%) still classify as sandy.
pub fn assign_soil_category(measurements: &[Node], reference: &ReferenceData) -> SoilCategory {
    const DEFAULT: SoilCategory = SoilCategory::LowActivityClay;

    let soil_types = filter_by_term_type(measurements, &[TermType::SoilType]);
    let usda_soil_types = filter_by_term_type(measurements, &[TermType::UsdaSoilType]);

    if soil_types.is_empty() && usda_soil_types.is_empty() {
        return DEFAULT;
    }

    let clay_content = find_term_match(measurements, CLAY_CONTENT_TERM_ID)
        .map(Node::magnitude)
        .unwrap_or(0.0);
    let sand_content = find_term_match(measurements, SAND_CONTENT_TERM_ID)
        .map(Node::magnitude)
        .unwrap_or(0.0);
    let has_sandy_soil = clay_content < CLAY_CONTENT_MAX && sand_content > SAND_CONTENT_MIN;

    SOIL_CATEGORY_ORDER
        .into_iter()
        .find(|category| {
            check_soil_category(*category, &soil_types, &usda_soil_types, reference)
                || (*category == SoilCategory::Sandy && has_sandy_soil)
        })
        .unwrap_or(DEFAULT)
}

// --- Land use category ---

/// The land-use glossary value of a management, crop or forage node.
fn land_use_lookup_value<'a>(node: &Node, reference: &'a ReferenceData) -> Option<&'a str> {
    match node.term_type {
        TermType::LandCover => reference.land_cover_use_category_of(&node.term_id),
        TermType::Crop | TermType::Forage => reference.crop_use_category_of(&node.term_id),
        _ => None,
    }
}

/// Whether a super-majority of the site is under long fallow, either as
/// set-aside land covers or as crops flagged with the long-fallow property.
fn has_long_fallow(land_cover_nodes: &[&Node], reference: &ReferenceData) -> bool {
    cumulative_lookup_match(
        land_cover_nodes,
        &reference.land_cover_use_category,
        &["Set aside"],
        SUPER_MAJORITY_AREA_THRESHOLD,
    ) || cumulative_nodes_match(
        |node| node.property_flag(LONG_FALLOW_CROP_TERM_ID),
        land_cover_nodes,
        SUPER_MAJORITY_AREA_THRESHOLD,
    )
}

fn has_upland_rice(land_cover_nodes: &[&Node], reference: &ReferenceData) -> bool {
    cumulative_nodes_term_match(
        land_cover_nodes,
        &reference.upland_rice_land_cover_terms,
        SUPER_MAJORITY_AREA_THRESHOLD,
    )
}

fn check_land_use_category(
    category: LandUseCategory,
    land_cover_nodes: &[&Node],
    reference: &ReferenceData,
    has_long_fallow: bool,
    has_irrigated_upland_rice: bool,
    has_wetland_soils: bool,
) -> bool {
    let valid_lookup = cumulative_lookup_match(
        land_cover_nodes,
        &reference.land_cover_use_category,
        category.land_cover_targets(),
        MIN_AREA_THRESHOLD,
    );

    // Conditions a lookup match must additionally satisfy, and conditions
    // that count as a match on their own.
    let valid_kwargs = match category {
        LandUseCategory::AnnualCropsWet => has_wetland_soils,
        LandUseCategory::SetAside => has_long_fallow,
        _ => true,
    };
    let valid_override = match category {
        LandUseCategory::PaddyRiceCultivation => has_irrigated_upland_rice,
        _ => false,
    };

    (valid_lookup && valid_kwargs) || valid_override
}

/// Assign the land use category from a year's management nodes and the site
/// soil category.
pub fn assign_land_use_category(
    management_nodes: &[&Node],
    soil_category: SoilCategory,
    reference: &ReferenceData,
) -> LandUseCategory {
    const DEFAULT: LandUseCategory = LandUseCategory::Other;

    let land_cover_nodes: Vec<&Node> = management_nodes
        .iter()
        .copied()
        .filter(|node| node.term_type == TermType::LandCover)
        .collect();
    let water_regime_nodes: Vec<&Node> = management_nodes
        .iter()
        .copied()
        .filter(|node| node.term_type == TermType::WaterRegime)
        .collect();

    if land_cover_nodes.is_empty() {
        return DEFAULT;
    }

    let irrigated = has_irrigation(&water_regime_nodes, reference);
    let has_irrigated_upland_rice = has_upland_rice(&land_cover_nodes, reference) && irrigated;
    let long_fallow = has_long_fallow(&land_cover_nodes, reference);
    let has_wetland_soils = soil_category == SoilCategory::Wetland;

    LAND_USE_CATEGORY_ORDER
        .into_iter()
        .find(|category| {
            check_land_use_category(
                *category,
                &land_cover_nodes,
                reference,
                long_fallow,
                has_irrigated_upland_rice,
                has_wetland_soils,
            )
        })
        .unwrap_or(DEFAULT)
}

// --- Management category ---

fn check_grassland_management_category(
    category: ManagementCategory,
    land_cover_nodes: &[&Node],
) -> bool {
    category
        .grassland_term_id()
        .map(|term_id| {
            cumulative_nodes_match(
                |node| node.term_id == term_id,
                land_cover_nodes,
                MIN_AREA_THRESHOLD,
            )
        })
        .unwrap_or(false)
}

fn check_tillage_management_category(
    category: ManagementCategory,
    tillage_nodes: &[&Node],
    reference: &ReferenceData,
) -> bool {
    category
        .tillage_lookup_value()
        .map(|target| {
            cumulative_lookup_match(
                tillage_nodes,
                &reference.tillage_category,
                &[target],
                MIN_AREA_THRESHOLD,
            )
        })
        .unwrap_or(false)
}

/// Assign the management category from a year's management nodes and its land
/// use category.
///
/// Grasslands classify on the pasture land-cover terms (default nominally
/// managed), annual croplands on the tillage regime (default full tillage).
/// Other land uses have no management axis.
pub fn assign_management_category(
    management_nodes: &[&Node],
    land_use_category: LandUseCategory,
    reference: &ReferenceData,
) -> ManagementCategory {
    let land_cover_nodes: Vec<&Node> = management_nodes
        .iter()
        .copied()
        .filter(|node| node.term_type == TermType::LandCover)
        .collect();
    let tillage_nodes: Vec<&Node> = management_nodes
        .iter()
        .copied()
        .filter(|node| node.term_type == TermType::Tillage)
        .collect();

    match land_use_category {
        LandUseCategory::Grassland => {
            if land_cover_nodes.is_empty() {
                return ManagementCategory::NominallyManaged;
            }
            GRASSLAND_MANAGEMENT_ORDER
                .into_iter()
                .find(|category| check_grassland_management_category(*category, &land_cover_nodes))
                .unwrap_or(ManagementCategory::NominallyManaged)
        }
        LandUseCategory::AnnualCropsWet | LandUseCategory::AnnualCrops => {
            if tillage_nodes.is_empty() {
                return ManagementCategory::FullTillage;
            }
            TILLAGE_MANAGEMENT_ORDER
                .into_iter()
                .find(|category| {
                    check_tillage_management_category(*category, &tillage_nodes, reference)
                })
                .unwrap_or(ManagementCategory::FullTillage)
        }
        _ => ManagementCategory::Other,
    }
}

// --- Carbon input category ---

/// The area-share conditions the carbon input decision trees branch on, all
/// derived from one year's management nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CarbonInputArgs {
    pub has_animal_manure_used: bool,
    pub has_bare_fallow: bool,
    pub has_cover_crop: bool,
    pub has_irrigation: bool,
    pub has_low_residue_producing_crops: bool,
    pub has_n_fixing_crop_or_inorganic_n_fertiliser_used: bool,
    pub has_organic_fertiliser_or_soil_amendment_used: bool,
    pub has_practice_increasing_c_input: bool,
    pub has_residue_removed_or_burnt: bool,
    pub num_grassland_improvements: usize,
}

impl CarbonInputArgs {
    pub fn from_management_nodes(management_nodes: &[&Node], reference: &ReferenceData) -> Self {
        // Practices already checked on their own axis must not count twice
        // as generic carbon-increasing practices.
        let excluded_practice_terms = [
            IMPROVED_PASTURE_TERM_ID,
            ANIMAL_MANURE_USED_TERM_ID,
            INORGANIC_NITROGEN_FERTILISER_USED_TERM_ID,
            ORGANIC_FERTILISER_USED_TERM_ID,
        ];

        let by_type = |term_type: TermType| -> Vec<&Node> {
            management_nodes
                .iter()
                .copied()
                .filter(|node| node.term_type == term_type)
                .collect()
        };
        let crop_residue_management_nodes = by_type(TermType::CropResidueManagement);
        let land_cover_nodes = by_type(TermType::LandCover);
        let land_use_management_nodes = by_type(TermType::LandUseManagement);
        let water_regime_nodes = by_type(TermType::WaterRegime);

        let flag_used = |term_ids: &[&str]| -> bool {
            land_use_management_nodes
                .iter()
                .any(|node| term_ids.contains(&node.term_id.as_str()) && node.magnitude() != 0.0)
        };

        let has_animal_manure_used = flag_used(&[ANIMAL_MANURE_USED_TERM_ID]);
        let has_inorganic_n_fertiliser_used =
            flag_used(&[INORGANIC_NITROGEN_FERTILISER_USED_TERM_ID]);
        let has_organic_fertiliser_or_soil_amendment_used =
            flag_used(&[ORGANIC_FERTILISER_USED_TERM_ID, SOIL_AMENDMENT_USED_TERM_ID]);

        let has_bare_fallow = cumulative_nodes_match(
            |node| node.term_id == SHORT_BARE_FALLOW_TERM_ID,
            &land_cover_nodes,
            MIN_AREA_THRESHOLD,
        );

        let has_cover_crop = cumulative_nodes_match(
            |node| {
                reference
                    .cover_crop_property_terms
                    .iter()
                    .any(|term_id| node.property_flag(term_id))
            },
            &land_cover_nodes,
            MIN_AREA_THRESHOLD,
        );

        let has_irrigation = has_irrigation(&water_regime_nodes, reference);

        let has_low_residue_producing_crops = cumulative_flag_match(
            &land_cover_nodes,
            &reference.low_residue_producing_crops,
            SUPER_MAJORITY_AREA_THRESHOLD,
        );

        let has_n_fixing_crop = cumulative_flag_match(
            &land_cover_nodes,
            &reference.n_fixing_crops,
            MIN_AREA_THRESHOLD,
        );

        let has_practice_increasing_c_input = cumulative_nodes_match(
            |node| {
                reference.practices_increasing_c_input.contains(&node.term_id)
                    && !excluded_practice_terms.contains(&node.term_id.as_str())
            },
            &land_use_management_nodes,
            MIN_AREA_THRESHOLD,
        );

        let has_residue_removed_or_burnt = cumulative_flag_match(
            &crop_residue_management_nodes,
            &reference.residue_removed_or_burnt_terms,
            MIN_AREA_THRESHOLD,
        );

        let has_n_fixing_crop_or_inorganic_n_fertiliser_used =
            has_n_fixing_crop || has_inorganic_n_fertiliser_used;

        let num_grassland_improvements = [
            has_irrigation,
            has_practice_increasing_c_input,
            has_n_fixing_crop_or_inorganic_n_fertiliser_used,
            has_organic_fertiliser_or_soil_amendment_used,
        ]
        .iter()
        .filter(|improvement| **improvement)
        .count();

        Self {
            has_animal_manure_used,
            has_bare_fallow,
            has_cover_crop,
            has_irrigation,
            has_low_residue_producing_crops,
            has_n_fixing_crop_or_inorganic_n_fertiliser_used,
            has_organic_fertiliser_or_soil_amendment_used,
            has_practice_increasing_c_input,
            has_residue_removed_or_burnt,
            num_grassland_improvements,
        }
    }

    /// Any of the practices that lift a cropland out of the low-input class.
    fn has_any_input_practice(&self) -> bool {
        self.has_irrigation
            || self.has_practice_increasing_c_input
            || self.has_cover_crop
            || self.has_organic_fertiliser_or_soil_amendment_used
    }

    fn is_cropland_high_with_manure(&self) -> bool {
        !self.has_residue_removed_or_burnt
            && !self.has_low_residue_producing_crops
            && !self.has_bare_fallow
            && self.has_n_fixing_crop_or_inorganic_n_fertiliser_used
            && self.has_animal_manure_used
    }

    fn is_cropland_high_without_manure(&self) -> bool {
        !self.has_residue_removed_or_burnt
            && !self.has_low_residue_producing_crops
            && !self.has_bare_fallow
            && self.has_n_fixing_crop_or_inorganic_n_fertiliser_used
            && self.has_any_input_practice()
            && !self.has_animal_manure_used
    }

    fn is_cropland_medium(&self) -> bool {
        let residue_kept = !self.has_residue_removed_or_burnt;
        let reduced_residue_crops = self.has_low_residue_producing_crops || self.has_bare_fallow;

        (self.has_residue_removed_or_burnt && self.has_animal_manure_used)
            || (residue_kept && reduced_residue_crops && self.has_any_input_practice())
            || (residue_kept
                && !reduced_residue_crops
                && !self.has_n_fixing_crop_or_inorganic_n_fertiliser_used
                && self.has_any_input_practice())
            || (residue_kept
                && !reduced_residue_crops
                && self.has_n_fixing_crop_or_inorganic_n_fertiliser_used
                && !self.has_any_input_practice())
    }
}

/// Assign the carbon input category from a year's management nodes and its
/// management category.
///
/// Only improved grasslands and annual croplands have a carbon input axis.
/// Croplands that fit no high or medium branch are low input.
pub fn assign_carbon_input_category(
    management_nodes: &[&Node],
    management_category: ManagementCategory,
    reference: &ReferenceData,
) -> CarbonInputCategory {
    let default = match management_category {
        ManagementCategory::ImprovedGrassland => CarbonInputCategory::GrasslandMedium,
        ManagementCategory::FullTillage
        | ManagementCategory::ReducedTillage
        | ManagementCategory::NoTillage => CarbonInputCategory::CroplandLow,
        _ => return CarbonInputCategory::Other,
    };

    if management_nodes.is_empty() {
        return default;
    }

    let args = CarbonInputArgs::from_management_nodes(management_nodes, reference);

    match management_category {
        ManagementCategory::ImprovedGrassland => {
            if args.num_grassland_improvements >= 2 {
                CarbonInputCategory::GrasslandHigh
            } else if args.num_grassland_improvements >= 1 {
                CarbonInputCategory::GrasslandMedium
            } else {
                default
            }
        }
        _ => {
            if args.is_cropland_high_with_manure() {
                CarbonInputCategory::CroplandHighWithManure
            } else if args.is_cropland_high_without_manure() {
                CarbonInputCategory::CroplandHighWithoutManure
            } else if args.is_cropland_medium() {
                CarbonInputCategory::CroplandMedium
            } else {
                default
            }
        }
    }
}

// --- Tier 2: tillage regime of a year's cycles ---

/// Whether the practices describe zero total tillages. A missing
/// number-of-tillages practice counts as zero.
fn check_zero_tillages(tillage_nodes: &[&Node]) -> bool {
    let total: FloatValue = tillage_nodes
        .iter()
        .find(|node| node.term_id == NUMBER_OF_TILLAGES_TERM_ID)
        .map(|node| node.magnitude())
        .unwrap_or(0.0);
    total <= 0.0
}

fn check_cycle_tillage_category(
    cycle: &Cycle,
    category: ManagementCategory,
    reference: &ReferenceData,
) -> bool {
    let tillage_nodes = filter_by_term_type(&cycle.practices, &[TermType::Tillage]);
    check_tillage_management_category(category, &tillage_nodes, reference)
        && (category != ManagementCategory::NoTillage || check_zero_tillages(&tillage_nodes))
}

/// Assign the tillage regime of a year from its cycles, for the Tier 2
/// disturbance modifiers. Years without a recognisable regime get `Other`.
pub fn assign_cycle_tillage_category(
    cycles: &[&Cycle],
    reference: &ReferenceData,
) -> ManagementCategory {
    const DEFAULT: ManagementCategory = ManagementCategory::Other;

    if cycles.is_empty() {
        return DEFAULT;
    }

    TILLAGE_MANAGEMENT_ORDER
        .into_iter()
        .find(|category| {
            cycles
                .iter()
                .any(|cycle| check_cycle_tillage_category(cycle, *category, reference))
        })
        .unwrap_or(DEFAULT)
}

// --- Tier 2: paddy rice detection ---

/// Whether a year's cycles grow paddy rice, either directly or as upland rice
/// under irrigation. Paddy rice years are out of scope for the Tier 2 model.
pub fn is_paddy_rice(cycles: &[&Cycle], reference: &ReferenceData) -> bool {
    let rice_terms: HashSet<String> = reference
        .upland_rice_crop_terms
        .union(&reference.upland_rice_land_cover_terms)
        .cloned()
        .collect();

    fn crop_like(cycle: &Cycle) -> Vec<&Node> {
        cycle
            .products
            .iter()
            .chain(cycle.practices.iter())
            .filter(|node| {
                matches!(
                    node.term_type,
                    TermType::Crop | TermType::Forage | TermType::LandCover
                )
            })
            .collect()
    }

    let has_paddy_rice_products = cycles.iter().any(|cycle| {
        cumulative_nodes_match_with_default(
            |node| {
                land_use_lookup_value(node, reference)
                    .map(|value| value == "Paddy rice cultivation")
                    .unwrap_or(false)
            },
            &crop_like(cycle),
            MIN_YIELD_THRESHOLD,
            MIN_YIELD_THRESHOLD,
        )
    });

    let has_upland_rice_products = cycles.iter().any(|cycle| {
        cumulative_nodes_term_match_with_default(
            &crop_like(cycle),
            &rice_terms,
            MIN_YIELD_THRESHOLD,
            MIN_YIELD_THRESHOLD,
        )
    });

    let irrigated = cycles.iter().any(|cycle| {
        let water_regime_nodes = filter_by_term_type(&cycle.practices, &[TermType::WaterRegime]);
        has_irrigation(&water_regime_nodes, reference)
    });

    has_paddy_rice_products || (has_upland_rice_products && irrigated)
}
