//! Annual temperature and water factors of the Tier 2 Steady-State Method
//! (IPCC 2019 Vol. 4, Ch. 5, equations 5.0E and 5.0F).

use soc_core::FloatValue;

/// Temperature effect on decomposition for a single month (equation 5.0E,
/// part 2).
///
/// With $T_{max}$ the maximum and $T_{opt}$ the optimum air temperature for
/// decomposition:
///
/// $t_{frac} = \frac{T_{max} - T}{T_{max} - T_{opt}}$
///
/// $f_T = t_{frac}^{0.2} \cdot e^{\frac{0.2}{2.63} (1 - t_{frac}^{2.63})}$
///
/// Months at or above $T_{max}$ contribute a factor of 0.
pub fn monthly_temperature_factor(
    average_temperature: FloatValue,
    maximum_temperature: FloatValue,
    optimum_temperature: FloatValue,
) -> FloatValue {
    if average_temperature >= maximum_temperature {
        return 0.0;
    }
    let prelim =
        (maximum_temperature - average_temperature) / (maximum_temperature - optimum_temperature);
    prelim.powf(0.2) * ((0.2 / 2.63) * (1.0 - prelim.powf(2.63))).exp()
}

/// Average annual temperature factor (equation 5.0E, part 1), or `None` when
/// no monthly data is available.
pub fn annual_temperature_factor(
    average_temperature_monthly: &[FloatValue],
    maximum_temperature: FloatValue,
    optimum_temperature: FloatValue,
) -> Option<FloatValue> {
    if average_temperature_monthly.is_empty() {
        return None;
    }
    let total: FloatValue = average_temperature_monthly
        .iter()
        .map(|t| monthly_temperature_factor(*t, maximum_temperature, optimum_temperature))
        .sum();
    Some(total / average_temperature_monthly.len() as FloatValue)
}

/// Water effect on decomposition for a single month (equation 5.0F, part 2).
///
/// The precipitation-to-PET ratio is capped at 1.25 (and taken as 1.25 when
/// no evapotranspiration occurred at all). Irrigated months use a fixed
/// factor of 0.775.
pub fn monthly_water_factor(
    precipitation: FloatValue,
    pet: FloatValue,
    is_irrigated: bool,
    water_factor_slope: FloatValue,
) -> FloatValue {
    if is_irrigated {
        return 0.775;
    }
    let mappet = if pet == 0.0 {
        1.25
    } else {
        (precipitation / pet).min(1.25)
    };
    0.2129 + water_factor_slope * mappet - 0.2413 * mappet.powi(2)
}

/// Average annual water factor multiplied by 1.5 (equation 5.0F, part 1), or
/// `None` when either monthly series is missing.
///
/// `is_irrigated_monthly` defaults to no irrigation in any month.
pub fn annual_water_factor(
    precipitation_monthly: &[FloatValue],
    pet_monthly: &[FloatValue],
    is_irrigated_monthly: Option<&[bool]>,
    water_factor_slope: FloatValue,
) -> Option<FloatValue> {
    if precipitation_monthly.is_empty() || pet_monthly.is_empty() {
        return None;
    }
    let months = precipitation_monthly.len().min(pet_monthly.len());
    let total: FloatValue = (0..months)
        .map(|month| {
            let is_irrigated = is_irrigated_monthly
                .and_then(|flags| flags.get(month).copied())
                .unwrap_or(false);
            monthly_water_factor(
                precipitation_monthly[month],
                pet_monthly[month],
                is_irrigated,
                water_factor_slope,
            )
        })
        .sum();
    Some(1.5 * total / months as FloatValue)
}
