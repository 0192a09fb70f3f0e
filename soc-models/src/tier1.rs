//! The Tier 1 stock-change method (IPCC 2019 Vol. 4, Ch. 2, Table 2.3).
//!
//! Each inventory year maps to a SOC equilibrium: the reference stock of the
//! eco-climate zone and soil, scaled by the stock-change factors of the
//! year's land use, management and carbon input categories. Stocks move
//! linearly from the previous regime's stock to the new equilibrium over a
//! 20-year transition.

use soc_core::categories::{
    CarbonInputCategory, LandUseCategory, ManagementCategory, SoilCategory,
};
use soc_core::errors::SocResult;
use soc_core::lookup::EcoClimateZoneTable;
use soc_core::node::{MethodClassification, SocMeasurement};
use soc_core::FloatValue;

/// Years of consistent management after which SOC reaches equilibrium.
pub const EQUILIBRIUM_TRANSITION_PERIOD: i32 = 20;

/// Factor for categories outside the stock-change factor tables.
const DEFAULT_FACTOR: FloatValue = 1.0;

/// One classified inventory year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier1Year {
    pub year: i32,
    pub land_use_category: LandUseCategory,
    pub management_category: ManagementCategory,
    pub carbon_input_category: CarbonInputCategory,
}

/// The reference SOC stock for a zone and soil, kg C ha-1. Organic soils have
/// no mineral reference stock.
pub fn retrieve_soc_ref(
    table: &EcoClimateZoneTable,
    eco_climate_zone: u32,
    soil_category: SoilCategory,
) -> Option<FloatValue> {
    soil_category
        .soc_ref_column()
        .and_then(|column| table.get(eco_climate_zone, column))
}

/// The three stock-change factors of an inventory year. Categories without a
/// table column (unmanaged land uses, the `Other` categories) contribute a
/// neutral factor of 1.
fn retrieve_stock_change_factors(
    table: &EcoClimateZoneTable,
    eco_climate_zone: u32,
    year: &Tier1Year,
) -> SocResult<(FloatValue, FloatValue, FloatValue)> {
    let factor = |column: Option<&str>| -> SocResult<FloatValue> {
        match column {
            Some(column) => table.require(eco_climate_zone, column),
            None => Ok(DEFAULT_FACTOR),
        }
    };
    Ok((
        factor(year.land_use_category.factor_column())?,
        factor(year.management_category.factor_column())?,
        factor(year.carbon_input_category.factor_column())?,
    ))
}

fn soc_equilibrium(
    soc_ref: FloatValue,
    land_use_factor: FloatValue,
    management_factor: FloatValue,
    carbon_input_factor: FloatValue,
) -> FloatValue {
    soc_ref * land_use_factor * management_factor * carbon_input_factor
}

/// The index of the most recent year before `current_index` with a different
/// equilibrium, i.e. the final year of the previous regime. `None` when the
/// regime extends back past the start of the series.
fn regime_start_index(current_index: usize, soc_equilibriums: &[FloatValue]) -> Option<usize> {
    let current = soc_equilibriums[current_index];
    soc_equilibriums[..current_index]
        .iter()
        .rposition(|equilibrium| *equilibrium != current)
}

/// Insert synthetic years at the timestamps where a regime's 20-year
/// transition completes, so the interpolation pivots at the equilibrium
/// instead of cutting the corner.
fn insert_equilibrium_years(
    timestamps: &[i32],
    soc_equilibriums: &[FloatValue],
) -> (Vec<i32>, Vec<FloatValue>) {
    let mut iterated_timestamps = timestamps.to_vec();
    let mut iterated_soc_equilibriums = soc_equilibriums.to_vec();

    for (index, (timestamp, soc_equilibrium)) in
        timestamps.iter().zip(soc_equilibriums.iter()).enumerate()
    {
        let regime_start_timestamp = regime_start_index(index, soc_equilibriums)
            .map(|start| timestamps[start])
            .unwrap_or(timestamps[0] - EQUILIBRIUM_TRANSITION_PERIOD);
        let equilibrium_reached = regime_start_timestamp + EQUILIBRIUM_TRANSITION_PERIOD;

        if *timestamp > equilibrium_reached
            && !iterated_timestamps.contains(&equilibrium_reached)
        {
            iterated_timestamps.insert(index, equilibrium_reached);
            iterated_soc_equilibriums.insert(index, *soc_equilibrium);
        }
    }

    (iterated_timestamps, iterated_soc_equilibriums)
}

/// Interpolate annual SOC stocks towards each year's equilibrium.
///
/// The first year starts at its own equilibrium. Every later year moves from
/// the stock at the start of the current regime towards the equilibrium, in
/// proportion to the elapsed share of the 20-year transition.
fn calc_soc_stocks(timestamps: &[i32], soc_equilibriums: &[FloatValue]) -> Vec<FloatValue> {
    if soc_equilibriums.is_empty() {
        return Vec::new();
    }
    let mut soc_stocks = vec![soc_equilibriums[0]];

    for index in 1..soc_equilibriums.len() {
        let start_index = regime_start_index(index, soc_equilibriums);
        let regime_start_timestamp = start_index
            .map(|start| timestamps[start])
            .unwrap_or(timestamps[0] - EQUILIBRIUM_TRANSITION_PERIOD);
        let regime_start_soc_stock = soc_stocks[start_index.unwrap_or(0)];

        let regime_duration = timestamps[index] - regime_start_timestamp;
        let time_ratio =
            (regime_duration as FloatValue / EQUILIBRIUM_TRANSITION_PERIOD as FloatValue).min(1.0);
        let soc_delta = (soc_equilibriums[index] - regime_start_soc_stock) * time_ratio;

        soc_stocks.push(regime_start_soc_stock + soc_delta);
    }

    soc_stocks
}

/// Run the Tier 1 model over the classified years.
///
/// The result has one measurement per year, including the synthetic years
/// inserted where an equilibrium was reached between recorded years.
pub fn run_tier_1(
    years: &[Tier1Year],
    table: &EcoClimateZoneTable,
    eco_climate_zone: u32,
    soc_ref: FloatValue,
) -> SocResult<Vec<SocMeasurement>> {
    let timestamps: Vec<i32> = years.iter().map(|year| year.year).collect();
    let soc_equilibriums: Vec<FloatValue> = years
        .iter()
        .map(|year| {
            retrieve_stock_change_factors(table, eco_climate_zone, year).map(
                |(land_use_factor, management_factor, carbon_input_factor)| {
                    soc_equilibrium(
                        soc_ref,
                        land_use_factor,
                        management_factor,
                        carbon_input_factor,
                    )
                },
            )
        })
        .collect::<SocResult<Vec<FloatValue>>>()?;

    let (iterated_timestamps, iterated_soc_equilibriums) =
        insert_equilibrium_years(&timestamps, &soc_equilibriums);
    let soc_stocks = calc_soc_stocks(&iterated_timestamps, &iterated_soc_equilibriums);

    Ok(iterated_timestamps
        .iter()
        .zip(soc_stocks.iter())
        .map(|(year, soc_stock)| {
            SocMeasurement::annual(*year, *soc_stock, MethodClassification::Tier1Model)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    const ZONE: u32 = 2;

    fn table() -> EcoClimateZoneTable {
        let mut table = EcoClimateZoneTable::new();
        table.insert(ZONE, "IPCC_2019_SOC_REF_KG_C_HECTARE_HAC", 64000.0);
        table.insert(ZONE, "IPCC_2019_LANDUSE_FACTOR_ANNUAL_CROPS", 0.69);
        table.insert(ZONE, "IPCC_2019_LANDUSE_FACTOR_GRASSLAND", 1.0);
        table.insert(ZONE, "IPCC_2019_TILLAGE_MANAGEMENT_FACTOR_FULL_TILLAGE", 1.0);
        table.insert(ZONE, "IPCC_2019_TILLAGE_MANAGEMENT_FACTOR_NO_TILLAGE", 1.1);
        table.insert(ZONE, "IPCC_2019_CROPLAND_CARBON_INPUT_FACTOR_MEDIUM", 1.0);
        table.insert(ZONE, "IPCC_2019_CROPLAND_CARBON_INPUT_FACTOR_LOW", 0.92);
        table
    }

    fn cropland_year(year: i32) -> Tier1Year {
        Tier1Year {
            year,
            land_use_category: LandUseCategory::AnnualCrops,
            management_category: ManagementCategory::FullTillage,
            carbon_input_category: CarbonInputCategory::CroplandMedium,
        }
    }

    #[test]
    fn test_soc_ref_lookup() {
        assert_eq!(
            retrieve_soc_ref(&table(), ZONE, SoilCategory::HighActivityClay),
            Some(64000.0)
        );
        assert_eq!(
            retrieve_soc_ref(&table(), ZONE, SoilCategory::Organic),
            None,
            "Organic soils have no mineral reference stock"
        );
        assert_eq!(retrieve_soc_ref(&table(), 9, SoilCategory::HighActivityClay), None);
    }

    #[test]
    fn test_excluded_categories_use_neutral_factors() {
        let year = Tier1Year {
            year: 2000,
            land_use_category: LandUseCategory::Forest,
            management_category: ManagementCategory::Other,
            carbon_input_category: CarbonInputCategory::Other,
        };
        let factors = retrieve_stock_change_factors(&table(), ZONE, &year).unwrap();
        assert_eq!(factors, (1.0, 1.0, 1.0));
    }

    #[test]
    fn test_missing_factor_is_an_error() {
        let year = Tier1Year {
            year: 2000,
            land_use_category: LandUseCategory::PaddyRiceCultivation,
            management_category: ManagementCategory::Other,
            carbon_input_category: CarbonInputCategory::Other,
        };
        assert!(retrieve_stock_change_factors(&table(), ZONE, &year).is_err());
    }

    #[test]
    fn test_regime_start_index() {
        let equilibriums = [1.0, 1.0, 2.0, 2.0, 2.0];
        assert_eq!(regime_start_index(1, &equilibriums), None);
        assert_eq!(regime_start_index(2, &equilibriums), Some(1));
        assert_eq!(regime_start_index(4, &equilibriums), Some(1));
    }

    #[test]
    fn test_constant_regime_stays_at_equilibrium() {
        let years: Vec<Tier1Year> = (2000..2025).map(cropland_year).collect();
        let measurements = run_tier_1(&years, &table(), ZONE, 64000.0).unwrap();

        assert_eq!(measurements.len(), 25);
        let expected = 64000.0 * 0.69;
        for measurement in &measurements {
            let value = measurement.year_value().unwrap();
            assert!(
                is_close!(value, expected),
                "A constant regime should stay at its equilibrium: {value} != {expected}"
            );
        }
    }

    #[test]
    fn test_regime_change_interpolates_over_20_years() {
        // Ten years of full tillage, then a switch to no tillage.
        let mut years: Vec<Tier1Year> = (2000..2010).map(cropland_year).collect();
        for year in 2010..2021 {
            years.push(Tier1Year {
                management_category: ManagementCategory::NoTillage,
                ..cropland_year(year)
            });
        }
        let measurements = run_tier_1(&years, &table(), ZONE, 64000.0).unwrap();

        let old_equilibrium = 64000.0 * 0.69;
        let new_equilibrium = 64000.0 * 0.69 * 1.1;

        // The regime starts at the last full-tillage year (2009); one year
        // in, the stock has covered 1/20 of the gap.
        let by_year = |target: i32| -> FloatValue {
            measurements
                .iter()
                .find(|m| m.dates[0].starts_with(&target.to_string()))
                .and_then(SocMeasurement::year_value)
                .unwrap()
        };

        let expected_2010 = old_equilibrium + (new_equilibrium - old_equilibrium) / 20.0;
        assert!(
            is_close!(by_year(2010), expected_2010),
            "Expected {expected_2010}, got {}",
            by_year(2010)
        );

        let expected_2015 = old_equilibrium + (new_equilibrium - old_equilibrium) * 6.0 / 20.0;
        assert!(is_close!(by_year(2015), expected_2015));
    }

    #[test]
    fn test_equilibrium_year_is_inserted_into_sparse_series() {
        // Full tillage until 2000, no tillage after, nothing recorded
        // between 2005 and 2030: the model inserts the 2020 year where the
        // new regime reached equilibrium.
        let years = vec![
            cropland_year(2000),
            Tier1Year {
                management_category: ManagementCategory::NoTillage,
                ..cropland_year(2005)
            },
            Tier1Year {
                management_category: ManagementCategory::NoTillage,
                ..cropland_year(2030)
            },
        ];
        let measurements = run_tier_1(&years, &table(), ZONE, 64000.0).unwrap();

        assert_eq!(measurements.len(), 4);
        assert_eq!(measurements[2].dates[0], "2020-12-31");
        let new_equilibrium = 64000.0 * 0.69 * 1.1;
        assert!(is_close!(
            measurements[2].year_value().unwrap(),
            new_equilibrium
        ));
        assert!(is_close!(
            measurements[3].year_value().unwrap(),
            new_equilibrium
        ));
    }
}
