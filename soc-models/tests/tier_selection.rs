//! End-to-end runs over JSON records, through the same serde contracts an
//! external caller would use.

use serde_json::{json, Value};

use soc_core::lookup::ReferenceData;
use soc_core::node::{Cycle, MethodClassification, Site};
use soc_models::orchestrator::SocModel;

const ZONE: u32 = 2;

fn reference() -> ReferenceData {
    let mut reference = ReferenceData::new();
    reference
        .eco_climate_zone
        .insert(ZONE, "IPCC_2019_SOC_REF_KG_C_HECTARE_LAC", 38000.0);
    reference
        .eco_climate_zone
        .insert(ZONE, "IPCC_2019_LANDUSE_FACTOR_GRASSLAND", 1.0);
    reference.eco_climate_zone.insert(
        ZONE,
        "IPCC_2019_GRASSLAND_MANAGEMENT_FACTOR_NOMINALLY_MANAGED",
        0.95,
    );
    reference
        .land_cover_use_category
        .insert("grassland".to_string(), "Grassland".to_string());
    reference
        .residue_incorporated_or_left_terms
        .insert("aboveGroundCropResidueLeftOnField".to_string());
    reference
}

fn monthly_measurement(term_id: &str, year: i32, value: f64) -> Value {
    json!({
        "termId": term_id,
        "termType": "measurement",
        "value": vec![value; 12],
        "dates": (1..=12).map(|m| format!("{year}-{m:02}")).collect::<Vec<_>>(),
    })
}

fn cropland_cycle(year: i32) -> Value {
    json!({
        "siteId": "site-1",
        "startDate": year.to_string(),
        "endDate": year.to_string(),
        "functionalUnit": "1 ha",
        "products": [{
            "termId": "aboveGroundCropResidueLeftOnField",
            "termType": "cropResidue",
            "value": [4000.0],
            "properties": [
                { "termId": "carbonContent", "value": 42.0 },
                { "termId": "nitrogenContent", "value": 0.85 },
                { "termId": "ligninContent", "value": 7.3 },
            ],
        }],
    })
}

#[test]
fn test_pasture_site_produces_a_tier_1_series() {
    let site: Site = serde_json::from_value(json!({
        "siteType": "permanent pasture",
        "management": [{
            "termId": "grassland",
            "termType": "landCover",
            "value": 100.0,
            "startDate": "2000",
            "endDate": "2024",
        }],
        "measurements": [{
            "termId": "ecoClimateZone",
            "termType": "measurement",
            "value": ZONE as f64,
        }],
    }))
    .unwrap();

    let model = SocModel::new(reference());
    let measurements = model.run(&site, &[]).unwrap();

    // A constant regime over 25 years stays at its equilibrium.
    assert_eq!(measurements.len(), 25);
    let expected = 38000.0 * 0.95;
    for measurement in &measurements {
        assert_eq!(
            measurement.method_classification,
            MethodClassification::Tier1Model
        );
        let value = measurement.year_value().unwrap();
        assert!(
            (value - expected).abs() < 1e-9,
            "Expected {expected}, got {value}"
        );
    }

    let serialized = serde_json::to_value(&measurements[0]).unwrap();
    assert_eq!(serialized["methodClassification"], "tier 1 model");
    assert_eq!(serialized["termId"], "organicCarbonPerHa");
    assert_eq!(serialized["dates"][0], "2000-12-31");
    assert_eq!(serialized["depthUpper"], 0);
    assert_eq!(serialized["depthLower"], 30);
}

#[test]
fn test_cropland_site_produces_a_tier_2_series() {
    let mut measurements = vec![json!({
        "termId": "sandContent",
        "termType": "measurement",
        "value": 33.0,
        "depthUpper": 0,
        "depthLower": 30,
    })];
    let mut cycles = Vec::new();
    for year in 2000..=2005 {
        measurements.push(monthly_measurement("temperatureMonthly", year, 20.0));
        measurements.push(monthly_measurement("precipitationMonthly", year, 50.0));
        measurements.push(monthly_measurement(
            "potentialEvapotranspirationMonthly",
            year,
            80.0,
        ));
        cycles.push(cropland_cycle(year));
    }

    let site: Site = serde_json::from_value(json!({
        "siteType": "cropland",
        "measurements": measurements,
    }))
    .unwrap();
    let cycles: Vec<Cycle> = serde_json::from_value(Value::Array(cycles)).unwrap();

    let model = SocModel::new(reference());
    let results = model.run(&site, &cycles).unwrap();

    // Five run-in years collapse into 2004; 2005 follows.
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].dates[0], "2004-12-31");
    assert_eq!(results[1].dates[0], "2005-12-31");
    for result in &results {
        assert_eq!(
            result.method_classification,
            MethodClassification::Tier2Model
        );
        assert!(result.year_value().unwrap() > 0.0);
    }
}

#[test]
fn test_site_without_usable_data_produces_nothing() {
    let site: Site = serde_json::from_value(json!({ "siteType": "other" })).unwrap();
    let model = SocModel::new(reference());
    assert!(model.run(&site, &[]).unwrap().is_empty());
}

#[test]
fn test_forest_site_without_cycles_or_history_produces_nothing() {
    let site: Site = serde_json::from_value(json!({ "siteType": "forest" })).unwrap();
    let model = SocModel::new(reference());
    assert!(model.run(&site, &[]).unwrap().is_empty());
}
