use serde::{Deserialize, Serialize};

use crate::models::SizeUnit;

// Conversion constants used by the listing form. All conversions go through
// square feet as the common base.
const SQFT_PER_SQM: f64 = 10.764;
const SQFT_PER_ACRE: f64 = 43_560.0;
const SQFT_PER_HECTARE: f64 = 107_639.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeBreakdown {
    pub sqft: f64,
    pub sqm: f64,
    pub acres: f64,
    pub hectares: f64,
}

/// Expresses a size in all four supported units. sqft/sqm carry two decimal
/// places, acres/hectares four. Zero and negative magnitudes are converted
/// mechanically; input validation is the caller's concern.
pub fn convert_size(value: f64, unit: SizeUnit) -> SizeBreakdown {
    let sqft = match unit {
        SizeUnit::Sqft => value,
        SizeUnit::Sqm => value * SQFT_PER_SQM,
        SizeUnit::Acres => value * SQFT_PER_ACRE,
        SizeUnit::Hectares => value * SQFT_PER_HECTARE,
    };

    SizeBreakdown {
        sqft: round2(sqft),
        sqm: round2(sqft / SQFT_PER_SQM),
        acres: round4(sqft / SQFT_PER_ACRE),
        hectares: round4(sqft / SQFT_PER_HECTARE),
    }
}

/// Form-input variant: empty or non-numeric text yields no breakdown rather
/// than an error.
pub fn parse_size_input(raw: &str, unit: SizeUnit) -> Option<SizeBreakdown> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(convert_size(value, unit))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_acre_in_all_units() {
        let breakdown = convert_size(1.0, SizeUnit::Acres);
        assert_eq!(breakdown.sqft, 43_560.00);
        assert_eq!(breakdown.sqm, 4_046.82);
        assert_eq!(breakdown.acres, 1.0);
        assert!((breakdown.hectares - 0.4047).abs() < 0.0001);
    }

    #[test]
    fn hundred_sqm_in_sqft() {
        let breakdown = convert_size(100.0, SizeUnit::Sqm);
        assert_eq!(breakdown.sqft, 1_076.40);
        assert_eq!(breakdown.sqm, 100.0);
    }

    #[test]
    fn round_trips_within_rounding_tolerance() {
        for unit in [
            SizeUnit::Sqft,
            SizeUnit::Sqm,
            SizeUnit::Acres,
            SizeUnit::Hectares,
        ] {
            for value in [0.5, 1.0, 42.0, 1_250.75] {
                let breakdown = convert_size(value, unit);
                let back = match unit {
                    SizeUnit::Sqft => breakdown.sqft,
                    SizeUnit::Sqm => breakdown.sqm,
                    SizeUnit::Acres => breakdown.acres,
                    SizeUnit::Hectares => breakdown.hectares,
                };
                let tolerance = match unit {
                    SizeUnit::Sqft | SizeUnit::Sqm => 0.01,
                    SizeUnit::Acres | SizeUnit::Hectares => 0.0001,
                };
                assert!(
                    (back - value).abs() <= tolerance,
                    "{value} {unit:?} round-tripped to {back}"
                );
            }
        }
    }

    #[test]
    fn non_numeric_input_yields_nothing() {
        assert_eq!(parse_size_input("", SizeUnit::Sqft), None);
        assert_eq!(parse_size_input("  ", SizeUnit::Sqm), None);
        assert_eq!(parse_size_input("12 acres", SizeUnit::Acres), None);
        assert_eq!(parse_size_input("NaN", SizeUnit::Sqft), None);
    }

    #[test]
    fn zero_and_negative_convert_mechanically() {
        let zero = convert_size(0.0, SizeUnit::Hectares);
        assert_eq!(zero.sqft, 0.0);
        assert_eq!(zero.acres, 0.0);

        let negative = convert_size(-2.0, SizeUnit::Acres);
        assert_eq!(negative.sqft, -87_120.00);
    }
}
