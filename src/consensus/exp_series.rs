//! Exponential series 0, 1, .., 9, 10, 20, .., 90, 100, .. used to vote
//! asset trade sizes with a single byte.

use super::EXP_SERIES_MAX_PARAM;

/// Value of the series at `param`. Parameters above the maximum are worth 0.
pub fn exp_series_value(param: u8) -> i64 {
    if param > EXP_SERIES_MAX_PARAM {
        return 0;
    }
    let param = u32::from(param);
    let digit = i64::from(param % 9);
    let magnitude = param / 9;
    if param == 0 || digit != 0 {
        digit * 10i64.pow(magnitude)
    } else {
        9 * 10i64.pow(magnitude - 1)
    }
}

/// Highest parameter whose value does not exceed `value`.
pub fn exponential_parameter(value: i64) -> u8 {
    if value <= 0 {
        return 0;
    }
    // values are increasing, so a binary search over the parameters works
    let (mut low, mut high) = (0u8, EXP_SERIES_MAX_PARAM);
    while low < high {
        let mid = low + (high - low).div_ceil(2);
        if exp_series_value(mid) <= value {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    low
}

/// Re-express `param`, a value counted in units of `10^-from_exponent`, in
/// units of `10^-to_exponent`.
///
/// A non-zero amount never becomes zero; it is raised to parameter 1
/// instead. Amounts too large for the series saturate at the maximum.
pub fn convert_exp_parameter(param: u8, from_exponent: u8, to_exponent: u8) -> u8 {
    let value = i128::from(exp_series_value(param));
    let shift = i32::from(to_exponent) - i32::from(from_exponent);
    let scale = 10i128.pow(shift.unsigned_abs());
    let converted = if shift >= 0 { value * scale } else { value / scale };

    if converted > i128::from(i64::MAX) {
        return EXP_SERIES_MAX_PARAM;
    }
    let result = exponential_parameter(converted as i64);
    if result == 0 && param != 0 { 1 } else { result }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_values() {
        assert_eq!(exp_series_value(0), 0);
        assert_eq!(exp_series_value(9), 9);
        assert_eq!(exp_series_value(10), 10);
        assert_eq!(exp_series_value(18), 90);
        assert_eq!(exp_series_value(19), 100);
        assert_eq!(exp_series_value(EXP_SERIES_MAX_PARAM), 9_000_000_000_000_000_000);
        for param in 1..EXP_SERIES_MAX_PARAM {
            assert!(exp_series_value(param) > exp_series_value(param - 1));
        }
        assert_eq!(exp_series_value(EXP_SERIES_MAX_PARAM + 1), 0);
        assert_eq!(exp_series_value(u8::MAX), 0);
    }

    #[test]
    fn parameter_of_value() {
        assert_eq!(exponential_parameter(0), 0);
        assert_eq!(exponential_parameter(-5), 0);
        assert_eq!(exponential_parameter(99), 18);
        assert_eq!(exponential_parameter(1_555_555), 55);
        assert_eq!(exponential_parameter(4_500_000_000_000), 112);
        assert_eq!(exponential_parameter(50_000_000_000_001), 122);
        assert_eq!(exponential_parameter(999_900_000_000_000_000), 162);
        assert_eq!(exponential_parameter(i64::MAX), 171);
    }

    #[test]
    fn conversion_between_exponents() {
        assert_eq!(convert_exp_parameter(40, 0, 1), 49);
        assert_eq!(convert_exp_parameter(40, 4, 8), 76);
        assert_eq!(convert_exp_parameter(36, 8, 4), 1);
        assert_eq!(convert_exp_parameter(21, 8, 4), 1);
        assert_eq!(convert_exp_parameter(81, 8, 4), 45);
        assert_eq!(convert_exp_parameter(169, 4, 8), 171);
        assert_eq!(convert_exp_parameter(169, 8, 4), 133);
        assert_eq!(convert_exp_parameter(0, 4, 8), 0);
        assert_eq!(convert_exp_parameter(77, 6, 6), 77);
    }
}
