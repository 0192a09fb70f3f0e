//! The Tier 2 Steady-State Method (IPCC 2019 Vol. 4, Ch. 5, equations
//! 5.0A-5.0J).
//!
//! SOC is tracked in three sub-pools (active, slow, passive) with decay rates
//! modulated by the annual temperature, water and tillage conditions. The
//! first years of the series form a run-in period that is averaged into a
//! single initialisation year whose pools start at steady state.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use soc_core::categories::ManagementCategory;
use soc_core::errors::{SocError, SocResult};
use soc_core::params::Tier2Parameters;
use soc_core::FloatValue;

/// One year of pre-computed driver data for the Tier 2 model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualInputs {
    pub timestamps: Vec<i32>,
    pub temperature_factors: Vec<FloatValue>,
    pub water_factors: Vec<FloatValue>,
    /// Total organic carbon input, kg C ha-1 yr-1.
    pub carbon_inputs: Vec<FloatValue>,
    /// Average nitrogen content of the carbon inputs, decimal proportion.
    pub nitrogen_contents: Vec<FloatValue>,
    /// Average lignin content of the carbon inputs, decimal proportion.
    pub lignin_contents: Vec<FloatValue>,
    pub tillage_categories: Vec<ManagementCategory>,
}

impl AnnualInputs {
    fn validate(&self, run_in_period: usize) -> SocResult<()> {
        let length = self.timestamps.len();
        let all_same_length = [
            self.temperature_factors.len(),
            self.water_factors.len(),
            self.carbon_inputs.len(),
            self.nitrogen_contents.len(),
            self.lignin_contents.len(),
            self.tillage_categories.len(),
        ]
        .iter()
        .all(|len| *len == length);

        if !all_same_length {
            return Err(SocError::Error(
                "Annual input series must all cover the same years".to_string(),
            ));
        }
        if run_in_period < 1 || run_in_period > length {
            return Err(SocError::Error(format!(
                "Run-in period of {run_in_period} years does not fit a series of {length} years"
            )));
        }
        Ok(())
    }
}

/// Annual SOC stocks per sub-pool, kg C ha-1, starting at the final run-in
/// year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier2Result {
    pub timestamps: Vec<i32>,
    pub active_pool_soc_stocks: Vec<FloatValue>,
    pub slow_pool_soc_stocks: Vec<FloatValue>,
    pub passive_pool_soc_stocks: Vec<FloatValue>,
}

impl Tier2Result {
    /// Total SOC stock per year, the sum of the three sub-pools.
    pub fn total_soc_stocks(&self) -> Vec<FloatValue> {
        self.active_pool_soc_stocks
            .iter()
            .zip(&self.slow_pool_soc_stocks)
            .zip(&self.passive_pool_soc_stocks)
            .map(|((active, slow), passive)| active + slow + passive)
            .collect()
    }
}

/// Collapse the run-in years of a series into their mean, leaving the rest of
/// the series untouched. The result is one entry per inventory year.
fn timeseries_to_inventory(series: &[FloatValue], run_in_period: usize) -> Vec<FloatValue> {
    let run_in_mean = ArrayView1::from(&series[..run_in_period])
        .mean()
        .unwrap_or(0.0);
    std::iter::once(run_in_mean)
        .chain(series[run_in_period..].iter().copied())
        .collect()
}

pub struct Tier2Model {
    parameters: Tier2Parameters,
}

impl Tier2Model {
    pub fn from_parameters(parameters: Tier2Parameters) -> Self {
        Self { parameters }
    }

    /// Stabilisation efficiency for structural decay products entering the
    /// active pool. Unknown tillage regimes take the most conservative value.
    fn f_2(&self, tillage_category: ManagementCategory) -> FloatValue {
        match tillage_category {
            ManagementCategory::FullTillage => self.parameters.f_2_full_tillage,
            ManagementCategory::ReducedTillage => self.parameters.f_2_reduced_tillage,
            ManagementCategory::NoTillage => self.parameters.f_2_no_tillage,
            _ => self.parameters.f_2_unknown_tillage,
        }
    }

    /// Tillage disturbance modifier on the active and slow pool decay rates.
    /// Unknown tillage regimes are assumed fully tilled.
    fn tillage_factor(&self, tillage_category: ManagementCategory) -> FloatValue {
        match tillage_category {
            ManagementCategory::ReducedTillage => self.parameters.tillage_factor_reduced_tillage,
            ManagementCategory::NoTillage => self.parameters.tillage_factor_no_tillage,
            _ => self.parameters.tillage_factor_full_tillage,
        }
    }

    /// Equation 5.0C, part 4. Stabilisation efficiency for active pool decay
    /// products entering the slow pool, a function of the sand content.
    fn f_4(&self, sand_content: FloatValue) -> FloatValue {
        1.0 - self.parameters.f_5 - (0.17 + 0.68 * sand_content)
    }

    /// Equation 5.0G, part 2. C input to the metabolic dead organic matter
    /// component, kg C ha-1.
    fn beta(
        &self,
        carbon_input: FloatValue,
        lignin_content: FloatValue,
        nitrogen_content: FloatValue,
    ) -> FloatValue {
        carbon_input * (0.85 - 0.018 * (lignin_content / nitrogen_content))
    }

    /// Equation 5.0G, part 1. C input to the active sub-pool, kg C ha-1.
    fn alpha(
        &self,
        carbon_input: FloatValue,
        f_2: FloatValue,
        f_4: FloatValue,
        lignin_content: FloatValue,
        nitrogen_content: FloatValue,
    ) -> FloatValue {
        let p = &self.parameters;
        let beta = self.beta(carbon_input, lignin_content, nitrogen_content);
        let x = beta * p.f_1;
        let y = (carbon_input * (1.0 - lignin_content) - beta) * f_2;
        let z = carbon_input * lignin_content * p.f_3 * (p.f_7 + p.f_6 * p.f_8);
        let d = 1.0 - f_4 * p.f_7 - p.f_5 * p.f_8 - f_4 * p.f_6 * p.f_8;
        (x + y + z) / d
    }

    /// Equation 5.0B, part 3.
    fn active_pool_decay_rate(
        &self,
        temperature_factor: FloatValue,
        water_factor: FloatValue,
        tillage_factor: FloatValue,
        sand_content: FloatValue,
    ) -> FloatValue {
        let sand_factor = 0.25 + 0.75 * sand_content;
        temperature_factor
            * water_factor
            * tillage_factor
            * sand_factor
            * self.parameters.active_decay_factor
    }

    /// Equation 5.0C, part 3.
    fn slow_pool_decay_rate(
        &self,
        temperature_factor: FloatValue,
        water_factor: FloatValue,
        tillage_factor: FloatValue,
    ) -> FloatValue {
        temperature_factor * water_factor * tillage_factor * self.parameters.slow_decay_factor
    }

    /// Equation 5.0D, part 3.
    fn passive_pool_decay_rate(
        &self,
        temperature_factor: FloatValue,
        water_factor: FloatValue,
    ) -> FloatValue {
        temperature_factor * water_factor * self.parameters.passive_decay_factor
    }

    /// Equation 5.0C, part 2. Slow pool steady state, kg C ha-1.
    fn slow_pool_steady_state(
        &self,
        carbon_input: FloatValue,
        f_4: FloatValue,
        active_pool_steady_state: FloatValue,
        active_pool_decay_rate: FloatValue,
        slow_pool_decay_rate: FloatValue,
        lignin_content: FloatValue,
    ) -> FloatValue {
        let x = carbon_input * lignin_content * self.parameters.f_3;
        let y = active_pool_steady_state * active_pool_decay_rate * f_4;
        (x + y) / slow_pool_decay_rate
    }

    /// Equation 5.0D, part 2. Passive pool steady state, kg C ha-1.
    fn passive_pool_steady_state(
        &self,
        active_pool_steady_state: FloatValue,
        slow_pool_steady_state: FloatValue,
        active_pool_decay_rate: FloatValue,
        slow_pool_decay_rate: FloatValue,
        passive_pool_decay_rate: FloatValue,
    ) -> FloatValue {
        let x = active_pool_steady_state * active_pool_decay_rate * self.parameters.f_5;
        let y = slow_pool_steady_state * slow_pool_decay_rate * self.parameters.f_6;
        (x + y) / passive_pool_decay_rate
    }

    /// Equations 5.0B/C/D, part 1. Move a sub-pool one timestep towards its
    /// steady state. Decay rates above 1 yr-1 reach the steady state within
    /// the year.
    fn sub_pool_soc_stock(
        &self,
        steady_state: FloatValue,
        previous_stock: FloatValue,
        decay_rate: FloatValue,
    ) -> FloatValue {
        let decay_rate = decay_rate.min(1.0);
        previous_stock + (steady_state - previous_stock) * decay_rate
    }

    /// Run the model over a prepared series of annual inputs.
    ///
    /// The first `run_in_period` years are averaged into the initialisation
    /// year; the result covers the final run-in year and every year after it.
    pub fn run(
        &self,
        inputs: &AnnualInputs,
        sand_content: FloatValue,
        run_in_period: usize,
    ) -> SocResult<Tier2Result> {
        inputs.validate(run_in_period)?;

        let f_4 = self.f_4(sand_content);

        let annual_f_2s: Vec<FloatValue> = inputs
            .tillage_categories
            .iter()
            .map(|category| self.f_2(*category))
            .collect();
        let annual_tillage_factors: Vec<FloatValue> = inputs
            .tillage_categories
            .iter()
            .map(|category| self.tillage_factor(*category))
            .collect();

        let temperature_factors =
            timeseries_to_inventory(&inputs.temperature_factors, run_in_period);
        let water_factors = timeseries_to_inventory(&inputs.water_factors, run_in_period);
        let carbon_inputs = timeseries_to_inventory(&inputs.carbon_inputs, run_in_period);
        let nitrogen_contents = timeseries_to_inventory(&inputs.nitrogen_contents, run_in_period);
        let lignin_contents = timeseries_to_inventory(&inputs.lignin_contents, run_in_period);
        let f_2s = timeseries_to_inventory(&annual_f_2s, run_in_period);
        let tillage_factors = timeseries_to_inventory(&annual_tillage_factors, run_in_period);

        // The last year of the run-in doubles as the first inventory year.
        let timestamps: Vec<i32> = inputs.timestamps[run_in_period - 1..].to_vec();
        let years = timestamps.len();

        let mut active_decay_rates = Vec::with_capacity(years);
        let mut slow_decay_rates = Vec::with_capacity(years);
        let mut passive_decay_rates = Vec::with_capacity(years);
        let mut active_steady_states = Vec::with_capacity(years);
        let mut slow_steady_states = Vec::with_capacity(years);
        let mut passive_steady_states = Vec::with_capacity(years);

        for index in 0..years {
            let active_decay_rate = self.active_pool_decay_rate(
                temperature_factors[index],
                water_factors[index],
                tillage_factors[index],
                sand_content,
            );
            let slow_decay_rate = self.slow_pool_decay_rate(
                temperature_factors[index],
                water_factors[index],
                tillage_factors[index],
            );
            let passive_decay_rate =
                self.passive_pool_decay_rate(temperature_factors[index], water_factors[index]);

            let alpha = self.alpha(
                carbon_inputs[index],
                f_2s[index],
                f_4,
                lignin_contents[index],
                nitrogen_contents[index],
            );
            let active_steady_state = alpha / active_decay_rate;
            let slow_steady_state = self.slow_pool_steady_state(
                carbon_inputs[index],
                f_4,
                active_steady_state,
                active_decay_rate,
                slow_decay_rate,
                lignin_contents[index],
            );
            let passive_steady_state = self.passive_pool_steady_state(
                active_steady_state,
                slow_steady_state,
                active_decay_rate,
                slow_decay_rate,
                passive_decay_rate,
            );

            active_decay_rates.push(active_decay_rate);
            slow_decay_rates.push(slow_decay_rate);
            passive_decay_rates.push(passive_decay_rate);
            active_steady_states.push(active_steady_state);
            slow_steady_states.push(slow_steady_state);
            passive_steady_states.push(passive_steady_state);
        }

        // Pools start at steady state after the run-in, then chase each
        // year's steady state at the capped decay rate.
        let mut active_stocks = vec![active_steady_states[0]];
        let mut slow_stocks = vec![slow_steady_states[0]];
        let mut passive_stocks = vec![passive_steady_states[0]];

        for index in 1..years {
            active_stocks.push(self.sub_pool_soc_stock(
                active_steady_states[index],
                active_stocks[index - 1],
                active_decay_rates[index],
            ));
            slow_stocks.push(self.sub_pool_soc_stock(
                slow_steady_states[index],
                slow_stocks[index - 1],
                slow_decay_rates[index],
            ));
            passive_stocks.push(self.sub_pool_soc_stock(
                passive_steady_states[index],
                passive_stocks[index - 1],
                passive_decay_rates[index],
            ));
        }

        Ok(Tier2Result {
            timestamps,
            active_pool_soc_stocks: active_stocks,
            slow_pool_soc_stocks: slow_stocks,
            passive_pool_soc_stocks: passive_stocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;
    use soc_core::params::MIN_RUN_IN_PERIOD;

    fn constant_inputs(years: usize) -> AnnualInputs {
        AnnualInputs {
            timestamps: (2000..2000 + years as i32).collect(),
            temperature_factors: vec![0.5; years],
            water_factors: vec![1.0; years],
            carbon_inputs: vec![4000.0; years],
            nitrogen_contents: vec![0.0085; years],
            lignin_contents: vec![0.073; years],
            tillage_categories: vec![ManagementCategory::FullTillage; years],
        }
    }

    #[test]
    fn test_run_in_collapses_to_mean() {
        let series = [1.0, 2.0, 3.0, 4.0, 5.0, 10.0, 20.0];
        let inventory = timeseries_to_inventory(&series, 5);
        assert_eq!(inventory, vec![3.0, 10.0, 20.0]);
    }

    #[test]
    fn test_inventory_starts_at_final_run_in_year() {
        let model = Tier2Model::from_parameters(Tier2Parameters::default());
        let inputs = constant_inputs(8);
        let result = model.run(&inputs, 0.33, MIN_RUN_IN_PERIOD).unwrap();
        assert_eq!(result.timestamps, vec![2004, 2005, 2006, 2007]);
        assert_eq!(result.active_pool_soc_stocks.len(), 4);
    }

    #[test]
    fn test_constant_inputs_hold_steady_state() {
        let model = Tier2Model::from_parameters(Tier2Parameters::default());
        let inputs = constant_inputs(10);
        let result = model.run(&inputs, 0.33, MIN_RUN_IN_PERIOD).unwrap();

        let totals = result.total_soc_stocks();
        for total in &totals {
            assert!(
                is_close!(*total, totals[0]),
                "Constant conditions should hold the steady state: {totals:?}"
            );
        }
        assert!(totals[0] > 0.0);
    }

    #[test]
    fn test_higher_carbon_inputs_grow_the_stocks() {
        let model = Tier2Model::from_parameters(Tier2Parameters::default());
        let mut inputs = constant_inputs(10);
        for carbon_input in inputs.carbon_inputs.iter_mut().skip(5) {
            *carbon_input = 8000.0;
        }
        let result = model.run(&inputs, 0.33, MIN_RUN_IN_PERIOD).unwrap();

        let totals = result.total_soc_stocks();
        assert!(
            totals.windows(2).all(|pair| pair[1] > pair[0]),
            "Doubled carbon inputs should grow the stocks year on year: {totals:?}"
        );
    }

    #[test]
    fn test_no_tillage_stores_more_carbon_than_full_tillage() {
        let model = Tier2Model::from_parameters(Tier2Parameters::default());
        let tilled = constant_inputs(6);
        let mut untilled = constant_inputs(6);
        untilled.tillage_categories = vec![ManagementCategory::NoTillage; 6];

        let tilled_total = model
            .run(&tilled, 0.33, MIN_RUN_IN_PERIOD)
            .unwrap()
            .total_soc_stocks()[0];
        let untilled_total = model
            .run(&untilled, 0.33, MIN_RUN_IN_PERIOD)
            .unwrap()
            .total_soc_stocks()[0];
        assert!(
            untilled_total > tilled_total,
            "No tillage should slow decay: {untilled_total} <= {tilled_total}"
        );
    }

    #[test]
    fn test_f_2_and_tillage_factor_mapping() {
        let model = Tier2Model::from_parameters(Tier2Parameters::default());
        assert_eq!(model.f_2(ManagementCategory::FullTillage), 0.455);
        assert_eq!(model.f_2(ManagementCategory::NoTillage), 0.5);
        assert_eq!(model.f_2(ManagementCategory::Other), 0.368);

        assert_eq!(model.tillage_factor(ManagementCategory::NoTillage), 1.0);
        assert_eq!(
            model.tillage_factor(ManagementCategory::Other),
            3.036,
            "Unknown tillage regimes are assumed fully tilled"
        );
    }

    #[test]
    fn test_f_4_depends_on_sand_content() {
        let model = Tier2Model::from_parameters(Tier2Parameters::default());
        assert!(is_close!(
            model.f_4(0.33),
            1.0 - 0.0855 - (0.17 + 0.68 * 0.33)
        ));
        assert!(model.f_4(0.8) < model.f_4(0.2));
    }

    #[test]
    fn test_decay_rates_are_capped_in_the_stock_update() {
        let model = Tier2Model::from_parameters(Tier2Parameters::default());
        let stock = model.sub_pool_soc_stock(1000.0, 0.0, 7.4);
        assert_eq!(
            stock, 1000.0,
            "A decay rate above 1 should reach the steady state exactly"
        );
    }

    #[test]
    fn test_mismatched_series_are_rejected() {
        let model = Tier2Model::from_parameters(Tier2Parameters::default());
        let mut inputs = constant_inputs(8);
        inputs.water_factors.pop();
        assert!(model.run(&inputs, 0.33, MIN_RUN_IN_PERIOD).is_err());
    }

    #[test]
    fn test_run_in_longer_than_series_is_rejected() {
        let model = Tier2Model::from_parameters(Tier2Parameters::default());
        let inputs = constant_inputs(3);
        assert!(model.run(&inputs, 0.33, MIN_RUN_IN_PERIOD).is_err());
    }
}
