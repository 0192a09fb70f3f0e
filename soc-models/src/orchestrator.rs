//! Tier selection and the end-to-end model run.
//!
//! A site runs the Tier 2 model when its cropland cycles carry enough data,
//! falls back to the Tier 1 model when its management history supports one,
//! and otherwise produces no measurements at all.

use log::debug;

use soc_core::errors::{SocError, SocResult};
use soc_core::grouping::check_consecutive;
use soc_core::lookup::{ReferenceData, EXCLUDED_ECO_CLIMATE_ZONES};
use soc_core::node::{
    Cycle, FunctionalUnit, MethodClassification, Site, SiteType, SocMeasurement,
};
use soc_core::params::{RunConfiguration, Tier2Parameters, MIN_RUN_IN_PERIOD};

use crate::climate::{annual_temperature_factor, annual_water_factor};
use crate::inventory::{
    build_tier_1_inventory, build_tier_2_inventory, Tier1Inventory, Tier2Inventory,
};
use crate::tier1::{self, Tier1Year};
use crate::tier2::{AnnualInputs, Tier2Model};

/// Site types the Tier 1 model covers.
const TIER_1_SITE_TYPES: [SiteType; 4] = [
    SiteType::Cropland,
    SiteType::Forest,
    SiteType::OtherNaturalVegetation,
    SiteType::PermanentPasture,
];

/// The full SOC stock model: reference data, physical parameters and run
/// configuration bundled behind a single `run` entry point.
pub struct SocModel {
    reference: ReferenceData,
    parameters: Tier2Parameters,
    configuration: RunConfiguration,
}

impl SocModel {
    pub fn new(reference: ReferenceData) -> Self {
        Self {
            reference,
            parameters: Tier2Parameters::default(),
            configuration: RunConfiguration::default(),
        }
    }

    pub fn with_parameters(mut self, parameters: Tier2Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_configuration(mut self, configuration: RunConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Whether the site can support a Tier 1 inventory at all.
    fn should_build_tier_1(site: &Site) -> bool {
        TIER_1_SITE_TYPES.contains(&site.site_type)
            && !site.management.is_empty()
            && !site.measurements.is_empty()
    }

    /// Whether the cycles can support a Tier 2 inventory: a cropland site
    /// with cycles that all belong to it and are all expressed per hectare.
    fn should_build_tier_2(site: &Site, cycles: &[Cycle]) -> bool {
        let same_site = cycles
            .windows(2)
            .all(|pair| pair[0].site_id == pair[1].site_id);
        site.site_type == SiteType::Cropland
            && !cycles.is_empty()
            && same_site
            && cycles
                .iter()
                .all(|cycle| cycle.functional_unit == FunctionalUnit::OneHectare)
    }

    fn should_run_tier_1(&self, inventory: &Tier1Inventory) -> bool {
        let zone_supported = inventory
            .eco_climate_zone
            .map(|zone| !EXCLUDED_ECO_CLIMATE_ZONES.contains(&zone))
            .unwrap_or(false);
        let has_reference_stock = inventory.soc_ref.map(|value| value > 0.0).unwrap_or(false);
        let has_runnable_year = inventory.years.values().any(|data| data.should_run());

        zone_supported && has_reference_stock && has_runnable_year
    }

    fn should_run_tier_2(&self, inventory: &Tier2Inventory) -> bool {
        let years = inventory.runnable_years();
        let has_sand_content = years
            .iter()
            .any(|year| inventory.years[year].sand_content.is_some())
            || inventory.site_sand_content.is_some();

        years.len() >= self.configuration.run_in_period.max(MIN_RUN_IN_PERIOD)
            && check_consecutive(&years)
            && has_sand_content
    }

    fn run_tier_1(&self, inventory: &Tier1Inventory) -> SocResult<Vec<SocMeasurement>> {
        let (eco_climate_zone, soc_ref) = match (inventory.eco_climate_zone, inventory.soc_ref) {
            (Some(zone), Some(soc_ref)) => (zone, soc_ref),
            _ => return Ok(Vec::new()),
        };

        let years: Vec<Tier1Year> = inventory
            .years
            .iter()
            .filter(|(_, data)| data.should_run())
            .map(|(year, data)| Tier1Year {
                year: *year,
                land_use_category: data.land_use_category,
                management_category: data.management_category,
                carbon_input_category: data.carbon_input_category,
            })
            .collect();

        debug!(
            "running the tier 1 model over {} years, zone {eco_climate_zone}, {}",
            years.len(),
            inventory.soil_category
        );
        tier1::run_tier_1(
            &years,
            &self.reference.eco_climate_zone,
            eco_climate_zone,
            soc_ref,
        )
    }

    fn run_tier_2(&self, inventory: &Tier2Inventory) -> SocResult<Vec<SocMeasurement>> {
        let years = inventory.runnable_years();
        let parameters = &self.parameters;

        let mut temperature_factors = Vec::with_capacity(years.len());
        let mut water_factors = Vec::with_capacity(years.len());
        let mut carbon_inputs = Vec::with_capacity(years.len());
        let mut nitrogen_contents = Vec::with_capacity(years.len());
        let mut lignin_contents = Vec::with_capacity(years.len());
        let mut tillage_categories = Vec::with_capacity(years.len());

        for year in &years {
            let data = &inventory.years[year];
            // Runnable years are guaranteed both halves of the data.
            let missing = || SocError::Error(format!("Incomplete inventory year {year}"));
            let climate = data.climate.as_ref().ok_or_else(missing)?;
            let cycle_data = data.cycle_data.as_ref().ok_or_else(missing)?;

            let temperature_factor = annual_temperature_factor(
                &climate.temperature_monthly,
                parameters.maximum_temperature,
                parameters.optimum_temperature,
            )
            .ok_or_else(missing)?;
            let irrigated_monthly = self
                .configuration
                .run_with_irrigation
                .then(|| cycle_data.irrigated_monthly.as_slice());
            let water_factor = annual_water_factor(
                &climate.precipitation_monthly,
                &climate.pet_monthly,
                irrigated_monthly,
                parameters.water_factor_slope,
            )
            .ok_or_else(missing)?;

            temperature_factors.push(temperature_factor);
            water_factors.push(water_factor);
            carbon_inputs.push(cycle_data.carbon_input);
            nitrogen_contents.push(cycle_data.nitrogen_content);
            lignin_contents.push(cycle_data.lignin_content);
            tillage_categories.push(cycle_data.tillage_category);
        }

        let sand_content = years
            .iter()
            .find_map(|year| inventory.years[year].sand_content)
            .or(inventory.site_sand_content)
            .unwrap_or(self.configuration.default_sand_content);

        let inputs = AnnualInputs {
            timestamps: years,
            temperature_factors,
            water_factors,
            carbon_inputs,
            nitrogen_contents,
            lignin_contents,
            tillage_categories,
        };

        debug!(
            "running the tier 2 model over {} years, sand content {sand_content}",
            inputs.timestamps.len()
        );
        let model = Tier2Model::from_parameters(self.parameters.clone());
        let result = model.run(&inputs, sand_content, self.configuration.run_in_period)?;

        Ok(result
            .timestamps
            .iter()
            .zip(result.total_soc_stocks())
            .map(|(year, soc_stock)| {
                SocMeasurement::annual(*year, soc_stock, MethodClassification::Tier2Model)
            })
            .collect())
    }

    /// Estimate annual SOC stocks for the site.
    ///
    /// The Tier 2 model takes precedence when its inventory is complete; the
    /// Tier 1 model is the fallback; sites supporting neither yield an empty
    /// series.
    pub fn run(&self, site: &Site, cycles: &[Cycle]) -> SocResult<Vec<SocMeasurement>> {
        let build_tier_1 = Self::should_build_tier_1(site);
        let build_tier_2 = Self::should_build_tier_2(site, cycles);
        debug!(
            "site_type={:?} build_tier_1={build_tier_1} build_tier_2={build_tier_2}",
            site.site_type
        );

        if build_tier_2 {
            let inventory = build_tier_2_inventory(
                cycles,
                &site.measurements,
                &self.reference,
                &self.parameters,
            );
            if self.should_run_tier_2(&inventory) {
                return self.run_tier_2(&inventory);
            }
        }

        if build_tier_1 {
            let inventory = build_tier_1_inventory(site, &self.reference);
            if self.should_run_tier_1(&inventory) {
                return self.run_tier_1(&inventory);
            }
        }

        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use soc_core::node::{
        Node, NodeValue, PartialDate, TermType, CARBON_CONTENT_TERM_ID, DEPTH_LOWER, DEPTH_UPPER,
        ECO_CLIMATE_ZONE_TERM_ID, LIGNIN_CONTENT_TERM_ID, NITROGEN_CONTENT_TERM_ID,
        PET_MONTHLY_TERM_ID, PRECIPITATION_MONTHLY_TERM_ID, SAND_CONTENT_TERM_ID,
        TEMPERATURE_MONTHLY_TERM_ID,
    };

    const ZONE: u32 = 2;

    fn reference() -> ReferenceData {
        let mut reference = ReferenceData::new();
        reference.eco_climate_zone.insert(
            ZONE,
            "IPCC_2019_SOC_REF_KG_C_HECTARE_LAC",
            38000.0,
        );
        reference
            .eco_climate_zone
            .insert(ZONE, "IPCC_2019_LANDUSE_FACTOR_GRASSLAND", 1.0);
        reference.eco_climate_zone.insert(
            ZONE,
            "IPCC_2019_GRASSLAND_MANAGEMENT_FACTOR_NOMINALLY_MANAGED",
            1.0,
        );
        reference
            .land_cover_use_category
            .insert("grassland".to_string(), "Grassland".to_string());
        reference
            .residue_incorporated_or_left_terms
            .insert("aboveGroundCropResidueLeftOnField".to_string());
        reference
    }

    fn monthly_measurement(term_id: &str, year: i32, value: f64) -> Node {
        Node::new(term_id, TermType::Measurement)
            .with_value(NodeValue::List(vec![value; 12]))
            .with_dates(
                (1..=12)
                    .map(|month| PartialDate::year_month(year, month))
                    .collect(),
            )
    }

    fn pasture_site(start_year: i32, end_year: i32) -> Site {
        Site {
            site_type: SiteType::PermanentPasture,
            management: vec![Node::new("grassland", TermType::LandCover)
                .with_value(NodeValue::Number(100.0))
                .with_span(
                    PartialDate::year(start_year),
                    PartialDate::year(end_year),
                )],
            measurements: vec![Node::new(ECO_CLIMATE_ZONE_TERM_ID, TermType::Measurement)
                .with_value(NodeValue::Number(ZONE as f64))],
        }
    }

    fn cropland_cycle(year: i32) -> Cycle {
        let mut cycle = Cycle {
            site_id: "site-1".to_string(),
            start_date: Some(PartialDate::year(year)),
            end_date: Some(PartialDate::year(year)),
            functional_unit: FunctionalUnit::OneHectare,
            ..Default::default()
        };
        cycle.products.push(
            Node::new("aboveGroundCropResidueLeftOnField", TermType::CropResidue)
                .with_value(NodeValue::List(vec![4000.0]))
                .with_property(CARBON_CONTENT_TERM_ID, NodeValue::Number(42.0))
                .with_property(NITROGEN_CONTENT_TERM_ID, NodeValue::Number(0.85))
                .with_property(LIGNIN_CONTENT_TERM_ID, NodeValue::Number(7.3)),
        );
        cycle
    }

    fn cropland_site_and_cycles(years: std::ops::RangeInclusive<i32>) -> (Site, Vec<Cycle>) {
        let mut measurements = vec![Node::new(SAND_CONTENT_TERM_ID, TermType::Measurement)
            .with_value(NodeValue::Number(33.0))
            .with_depth(DEPTH_UPPER, DEPTH_LOWER)];
        let mut cycles = Vec::new();
        for year in years {
            measurements.push(monthly_measurement(TEMPERATURE_MONTHLY_TERM_ID, year, 20.0));
            measurements.push(monthly_measurement(
                PRECIPITATION_MONTHLY_TERM_ID,
                year,
                50.0,
            ));
            measurements.push(monthly_measurement(PET_MONTHLY_TERM_ID, year, 80.0));
            cycles.push(cropland_cycle(year));
        }
        let site = Site {
            site_type: SiteType::Cropland,
            management: Vec::new(),
            measurements,
        };
        (site, cycles)
    }

    #[test]
    fn test_ineligible_site_yields_no_measurements() {
        let model = SocModel::new(reference());
        let site = Site {
            site_type: SiteType::Other,
            ..Default::default()
        };
        assert!(model.run(&site, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_pasture_site_runs_the_tier_1_model() {
        let model = SocModel::new(reference());
        let measurements = model.run(&pasture_site(2000, 2004), &[]).unwrap();

        assert_eq!(measurements.len(), 5);
        for measurement in &measurements {
            assert_eq!(
                measurement.method_classification,
                MethodClassification::Tier1Model
            );
            let value = measurement.year_value().unwrap();
            assert!(
                is_close!(value, 38000.0),
                "Nominally managed grassland should sit at the reference stock: {value}"
            );
        }
    }

    #[test]
    fn test_polar_zones_never_run() {
        let mut reference = reference();
        reference
            .eco_climate_zone
            .insert(5, "IPCC_2019_SOC_REF_KG_C_HECTARE_LAC", 30000.0);
        let model = SocModel::new(reference);

        let mut site = pasture_site(2000, 2004);
        site.measurements = vec![Node::new(ECO_CLIMATE_ZONE_TERM_ID, TermType::Measurement)
            .with_value(NodeValue::Number(5.0))];
        assert!(model.run(&site, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_cropland_with_full_data_runs_the_tier_2_model() {
        let model = SocModel::new(reference());
        let (site, cycles) = cropland_site_and_cycles(2000..=2005);
        let measurements = model.run(&site, &cycles).unwrap();

        // Five run-in years collapse into 2004; 2005 follows.
        assert_eq!(measurements.len(), 2);
        assert_eq!(measurements[0].dates[0], "2004-12-31");
        assert_eq!(measurements[1].dates[0], "2005-12-31");
        for measurement in &measurements {
            assert_eq!(
                measurement.method_classification,
                MethodClassification::Tier2Model
            );
            assert!(measurement.year_value().unwrap() > 0.0);
        }
    }

    #[test]
    fn test_relative_cycles_cannot_run_the_tier_2_model() {
        let model = SocModel::new(reference());
        let (site, mut cycles) = cropland_site_and_cycles(2000..=2005);
        for cycle in &mut cycles {
            cycle.functional_unit = FunctionalUnit::Relative;
        }
        // Without a management history there is no Tier 1 fallback either.
        assert!(model.run(&site, &cycles).unwrap().is_empty());
    }

    #[test]
    fn test_gap_years_block_the_tier_2_model() {
        let model = SocModel::new(reference());
        let (mut site, mut cycles) = cropland_site_and_cycles(2000..=2004);
        site.measurements
            .push(monthly_measurement(TEMPERATURE_MONTHLY_TERM_ID, 2006, 20.0));
        site.measurements
            .push(monthly_measurement(PRECIPITATION_MONTHLY_TERM_ID, 2006, 50.0));
        site.measurements
            .push(monthly_measurement(PET_MONTHLY_TERM_ID, 2006, 80.0));
        cycles.push(cropland_cycle(2006));

        assert!(
            model.run(&site, &cycles).unwrap().is_empty(),
            "Six valid years with a gap must not run"
        );
    }

    #[test]
    fn test_missing_sand_content_blocks_the_tier_2_model() {
        let model = SocModel::new(reference());
        let (mut site, cycles) = cropland_site_and_cycles(2000..=2005);
        site.measurements
            .retain(|node| node.term_id != SAND_CONTENT_TERM_ID);
        assert!(model.run(&site, &cycles).unwrap().is_empty());
    }
}
