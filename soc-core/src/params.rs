//! Model parameters and run configuration.
//!
//! Defaults follow IPCC (2019) Vol. 4, Ch. 5 (tables 5.5a/5.5b). Parameters
//! deserialize with per-field defaults, so a configuration file only needs to
//! name the values it overrides.

use serde::{Deserialize, Serialize};

use crate::FloatValue;

/// The shortest run-in period the Tier 2 model accepts, years.
pub const MIN_RUN_IN_PERIOD: usize = 5;

/// Parameters of the Tier 2 three-pool model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tier2Parameters {
    /// Decay rate constant under optimal conditions for the active sub-pool,
    /// yr-1, default: 7.4
    pub active_decay_factor: FloatValue,
    /// Decay rate constant under optimal conditions for the slow sub-pool,
    /// yr-1, default: 0.209
    pub slow_decay_factor: FloatValue,
    /// Decay rate constant under optimal conditions for the passive sub-pool,
    /// yr-1, default: 0.00689
    pub passive_decay_factor: FloatValue,

    /// Stabilisation efficiency for metabolic decay products entering the
    /// active pool, default: 0.378
    pub f_1: FloatValue,
    /// Stabilisation efficiency for structural decay products entering the
    /// active pool under full tillage, default: 0.455
    pub f_2_full_tillage: FloatValue,
    /// As `f_2_full_tillage` under reduced tillage, default: 0.477
    pub f_2_reduced_tillage: FloatValue,
    /// As `f_2_full_tillage` under no tillage, default: 0.5
    pub f_2_no_tillage: FloatValue,
    /// As `f_2_full_tillage` when the tillage regime is unknown,
    /// default: 0.368
    pub f_2_unknown_tillage: FloatValue,
    /// Stabilisation efficiency for structural decay products entering the
    /// slow pool, default: 0.455
    pub f_3: FloatValue,
    /// Stabilisation efficiency for active pool decay products entering the
    /// passive pool, default: 0.0855
    pub f_5: FloatValue,
    /// Stabilisation efficiency for slow pool decay products entering the
    /// passive pool, default: 0.0504
    pub f_6: FloatValue,
    /// Stabilisation efficiency for slow pool decay products entering the
    /// active pool, default: 0.42
    pub f_7: FloatValue,
    /// Stabilisation efficiency for passive pool decay products entering the
    /// active pool, default: 0.45
    pub f_8: FloatValue,

    /// Tillage disturbance modifier on decay rates under full tillage,
    /// default: 3.036
    pub tillage_factor_full_tillage: FloatValue,
    /// Tillage disturbance modifier under reduced tillage, default: 2.075
    pub tillage_factor_reduced_tillage: FloatValue,
    /// Tillage disturbance modifier under no tillage, default: 1
    pub tillage_factor_no_tillage: FloatValue,

    /// Maximum air temperature for decomposition, degrees C, default: 45
    pub maximum_temperature: FloatValue,
    /// Optimum air temperature for decomposition, degrees C, default: 33.69
    pub optimum_temperature: FloatValue,
    /// Slope of the mappet term in the water factor, default: 1.331
    pub water_factor_slope: FloatValue,

    /// Carbon content assumed for carbon sources without one, kg C (kg
    /// d.m.)-1, default: 0.42
    pub default_carbon_content: FloatValue,
    /// Nitrogen content assumed for carbon sources without one, kg N (kg
    /// d.m.)-1, default: 0.0085
    pub default_nitrogen_content: FloatValue,
    /// Lignin content assumed for carbon sources without one, kg lignin (kg
    /// d.m.)-1, default: 0.073
    pub default_lignin_content: FloatValue,
}

impl Default for Tier2Parameters {
    fn default() -> Self {
        Self {
            active_decay_factor: 7.4,
            slow_decay_factor: 0.209,
            passive_decay_factor: 0.00689,
            f_1: 0.378,
            f_2_full_tillage: 0.455,
            f_2_reduced_tillage: 0.477,
            f_2_no_tillage: 0.5,
            f_2_unknown_tillage: 0.368,
            f_3: 0.455,
            f_5: 0.0855,
            f_6: 0.0504,
            f_7: 0.42,
            f_8: 0.45,
            tillage_factor_full_tillage: 3.036,
            tillage_factor_reduced_tillage: 2.075,
            tillage_factor_no_tillage: 1.0,
            maximum_temperature: 45.0,
            optimum_temperature: 33.69,
            water_factor_slope: 1.331,
            default_carbon_content: 0.42,
            default_nitrogen_content: 0.0085,
            default_lignin_content: 0.073,
        }
    }
}

/// Configuration of a model run, as opposed to the physical parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfiguration {
    /// Length of the Tier 2 run-in period, years, default: 5
    pub run_in_period: usize,
    /// Whether monthly irrigation data feeds the water factor, default: true
    pub run_with_irrigation: bool,
    /// Sand content used when the site provides none, decimal proportion,
    /// default: 0.33
    pub default_sand_content: FloatValue,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            run_in_period: MIN_RUN_IN_PERIOD,
            run_with_irrigation: true,
            default_sand_content: 0.33,
        }
    }
}
