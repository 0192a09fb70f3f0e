//! Annual inventories: the per-year data both models consume, extracted from
//! a site, its measurements and its production cycles.
//!
//! Building an inventory never fails; years with missing data are simply
//! flagged as not runnable and excluded from the calculation.

use std::collections::BTreeMap;

use log::debug;

use soc_core::categories::{
    CarbonInputCategory, LandUseCategory, ManagementCategory, SoilCategory,
};
use soc_core::grouping::{group_by_year, group_by_year_and_month, group_measurements_by_year};
use soc_core::lookup::ReferenceData;
use soc_core::matching::{cumulative_nodes_term_match, MIN_AREA_THRESHOLD};
use soc_core::node::{
    filter_by_term_type, find_term_match, Cycle, Node, Site, TermType, ECO_CLIMATE_ZONE_TERM_ID,
    PET_MONTHLY_TERM_ID, PRECIPITATION_MONTHLY_TERM_ID, SAND_CONTENT_TERM_ID,
    TEMPERATURE_MONTHLY_TERM_ID,
};
use soc_core::FloatValue;

use crate::carbon_sources::{
    average_lignin_content, average_nitrogen_content, carbon_sources_from_cycles,
    total_organic_carbon_input,
};
use crate::classifiers::{
    assign_carbon_input_category, assign_cycle_tillage_category, assign_land_use_category,
    assign_management_category, assign_soil_category, is_paddy_rice,
};
use soc_core::params::Tier2Parameters;

// --- Tier 1 inventory ---

/// The categorical classification of one inventory year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier1YearData {
    pub land_use_category: LandUseCategory,
    pub management_category: ManagementCategory,
    pub carbon_input_category: CarbonInputCategory,
}

impl Tier1YearData {
    /// Years without a recognised land use cannot take part in the Tier 1
    /// calculation.
    pub fn should_run(&self) -> bool {
        self.land_use_category != LandUseCategory::Other
    }
}

/// The Tier 1 inventory: site-level context plus one classification per
/// management year.
#[derive(Debug, Clone)]
pub struct Tier1Inventory {
    pub eco_climate_zone: Option<u32>,
    pub soil_category: SoilCategory,
    pub soc_ref: Option<FloatValue>,
    pub years: BTreeMap<i32, Tier1YearData>,
}

/// The eco-climate zone measurement of the site. A value of zero is treated
/// as unset.
fn eco_climate_zone(measurements: &[Node]) -> Option<u32> {
    find_term_match(measurements, ECO_CLIMATE_ZONE_TERM_ID)
        .map(Node::magnitude)
        .filter(|value| *value != 0.0)
        .map(|value| value as u32)
}

/// Classify every management year of the site.
///
/// Sites that record no land-cover history at all fall back to a static land
/// use derived from the site type.
pub fn build_tier_1_inventory(site: &Site, reference: &ReferenceData) -> Tier1Inventory {
    let eco_climate_zone = eco_climate_zone(&site.measurements);
    let soil_category = assign_soil_category(&site.measurements, reference);
    let soc_ref = eco_climate_zone.and_then(|zone| {
        crate::tier1::retrieve_soc_ref(&reference.eco_climate_zone, zone, soil_category)
    });

    let run_with_site_type =
        filter_by_term_type(&site.management, &[TermType::LandCover]).is_empty();
    let site_type_land_use_category = LandUseCategory::from_site_type(site.site_type);

    let grouped_management = group_by_year(&site.management);

    let years = grouped_management
        .iter()
        .map(|(year, nodes)| {
            let land_use_category = if run_with_site_type {
                site_type_land_use_category
            } else {
                assign_land_use_category(nodes, soil_category, reference)
            };
            let management_category =
                assign_management_category(nodes, land_use_category, reference);
            let carbon_input_category =
                assign_carbon_input_category(nodes, management_category, reference);
            (
                *year,
                Tier1YearData {
                    land_use_category,
                    management_category,
                    carbon_input_category,
                },
            )
        })
        .collect();

    Tier1Inventory {
        eco_climate_zone,
        soil_category,
        soc_ref,
        years,
    }
}

// --- Tier 2 inventory ---

/// One year of monthly climate measurements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimateData {
    pub temperature_monthly: Vec<FloatValue>,
    pub precipitation_monthly: Vec<FloatValue>,
    pub pet_monthly: Vec<FloatValue>,
}

impl ClimateData {
    fn is_complete(&self) -> bool {
        self.temperature_monthly.len() == 12
            && self.precipitation_monthly.len() == 12
            && self.pet_monthly.len() == 12
    }
}

/// One year of cycle-derived data.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleData {
    pub irrigated_monthly: Vec<bool>,
    pub carbon_input: FloatValue,
    pub nitrogen_content: FloatValue,
    pub lignin_content: FloatValue,
    pub tillage_category: ManagementCategory,
    pub is_paddy_rice: bool,
}

/// One Tier 2 inventory year. Climate data exists only for years with dated
/// measurements, cycle data only for years touched by a cycle.
#[derive(Debug, Clone, Default)]
pub struct Tier2YearData {
    pub climate: Option<ClimateData>,
    pub cycle_data: Option<CycleData>,
    pub sand_content: Option<FloatValue>,
}

impl Tier2YearData {
    /// Whether the year carries everything the Tier 2 model needs: a full
    /// twelve months of climate, a positive carbon input with plausible
    /// contents, and no paddy rice.
    pub fn should_run(&self) -> bool {
        let climate_complete = self
            .climate
            .as_ref()
            .map(ClimateData::is_complete)
            .unwrap_or(false);
        let cycle_data_complete = self
            .cycle_data
            .as_ref()
            .map(|data| {
                !data.is_paddy_rice
                    && data.carbon_input > 0.0
                    && data.nitrogen_content > 0.0
                    && data.lignin_content > 0.0
            })
            .unwrap_or(false);
        climate_complete && cycle_data_complete
    }
}

/// The Tier 2 inventory: one entry per year touched by a measurement or a
/// cycle, plus an undated site-level sand content as a backup.
#[derive(Debug, Clone, Default)]
pub struct Tier2Inventory {
    pub years: BTreeMap<i32, Tier2YearData>,
    pub site_sand_content: Option<FloatValue>,
}

impl Tier2Inventory {
    /// The years that can take part in the calculation, in order.
    pub fn runnable_years(&self) -> Vec<i32> {
        self.years
            .iter()
            .filter(|(_, data)| data.should_run())
            .map(|(year, _)| *year)
            .collect()
    }
}

fn monthly_values(measurements: &[Node], term_id: &str) -> Vec<FloatValue> {
    find_term_match(measurements, term_id)
        .and_then(Node::list_values)
        .map(<[FloatValue]>::to_vec)
        .unwrap_or_default()
}

/// The sand content (decimal proportion) among measurements for the modelled
/// 0-30cm depth interval.
fn sand_content_of(measurements: &[Node]) -> Option<FloatValue> {
    let at_model_depth: Vec<Node> = measurements
        .iter()
        .filter(|node| node.covers_model_depth())
        .cloned()
        .collect();
    find_term_match(&at_model_depth, SAND_CONTENT_TERM_ID)
        .map(|node| node.magnitude() / 100.0)
}

/// Monthly irrigation presence for one year. Practices inherit the cycle's
/// dates when they carry none of their own.
fn irrigated_monthly(year: i32, cycles: &[&Cycle], reference: &ReferenceData) -> Vec<bool> {
    let practice_nodes: Vec<Node> = cycles
        .iter()
        .flat_map(|cycle| {
            cycle.practices.iter().map(|node| {
                let mut node = node.clone();
                node.start_date = node.start_date.or(cycle.start_date);
                node.end_date = node.end_date.or(cycle.end_date);
                node
            })
        })
        .collect();

    let grouped = group_by_year_and_month(&practice_nodes);
    (1..=12)
        .map(|month| {
            grouped
                .get(&year)
                .and_then(|months| months.get(&month))
                .map(|nodes| {
                    cumulative_nodes_term_match(
                        nodes,
                        &reference.irrigated_terms,
                        MIN_AREA_THRESHOLD,
                    )
                })
                .unwrap_or(false)
        })
        .collect()
}

/// Build the Tier 2 inventory from a site's cycles and measurements.
pub fn build_tier_2_inventory(
    cycles: &[Cycle],
    measurements: &[Node],
    reference: &ReferenceData,
    parameters: &Tier2Parameters,
) -> Tier2Inventory {
    let grouped_cycles = group_by_year(cycles);
    let grouped_measurements = group_measurements_by_year(measurements);

    let mut years: BTreeMap<i32, Tier2YearData> = BTreeMap::new();

    for (year, year_measurements) in &grouped_measurements {
        let entry = years.entry(*year).or_default();
        entry.climate = Some(ClimateData {
            temperature_monthly: monthly_values(year_measurements, TEMPERATURE_MONTHLY_TERM_ID),
            precipitation_monthly: monthly_values(
                year_measurements,
                PRECIPITATION_MONTHLY_TERM_ID,
            ),
            pet_monthly: monthly_values(year_measurements, PET_MONTHLY_TERM_ID),
        });
        entry.sand_content = sand_content_of(year_measurements).filter(|value| *value != 0.0);
    }

    for (year, year_cycles) in &grouped_cycles {
        let carbon_sources = carbon_sources_from_cycles(year_cycles, reference);
        let entry = years.entry(*year).or_default();
        entry.cycle_data = Some(CycleData {
            irrigated_monthly: irrigated_monthly(*year, year_cycles, reference),
            carbon_input: total_organic_carbon_input(
                &carbon_sources,
                parameters.default_carbon_content,
            ),
            nitrogen_content: average_nitrogen_content(
                &carbon_sources,
                parameters.default_nitrogen_content,
            ),
            lignin_content: average_lignin_content(
                &carbon_sources,
                parameters.default_lignin_content,
            ),
            tillage_category: assign_cycle_tillage_category(year_cycles, reference),
            is_paddy_rice: is_paddy_rice(year_cycles, reference),
        });
    }

    let site_sand_content = sand_content_of(measurements).filter(|value| *value != 0.0);

    for (year, data) in &years {
        debug!(
            "inventory year={year} runnable={} sand={:?}",
            data.should_run(),
            data.sand_content
        );
    }

    Tier2Inventory {
        years,
        site_sand_content,
    }
}
