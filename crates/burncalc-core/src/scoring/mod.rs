//! Burn severity scoring.
//!
//! Percentages are summed in exact quarter-point integers. The severity
//! index is weighted on those exact quarters and rounded to one decimal
//! once, so the band is always taken from the unrounded aggregate.
//! Surface and deep buckets are rounded once each for display, and the
//! total is their sum in tenths, so `total == surface + deep` holds
//! exactly while `index` stays within 0.05 of the exact
//! `surface + 3 * deep`.

pub mod coefficients;

use crate::models::{BurnZoneMeasurement, CalculationResult, SeverityCategory};

/// Weight applied to deep (degree 3-4) burns in the severity index.
pub const DEEP_BURN_WEIGHT: u32 = 3;

/// Compute the clinical result for a list of measured zones.
///
/// Total and infallible: an empty list scores zero, mild, favorable.
pub fn compute_result(zones: &[BurnZoneMeasurement]) -> CalculationResult {
    let (surface_quarters, deep_quarters) =
        zones
            .iter()
            .fold((0u32, 0u32), |(surface, deep), zone| {
                if zone.degree().is_deep() {
                    (surface, deep + zone.quarters())
                } else {
                    (surface + zone.quarters(), deep)
                }
            });

    let surface = quarters_to_tenths(surface_quarters);
    let deep = quarters_to_tenths(deep_quarters);
    let total = surface + deep;
    let index_quarters = surface_quarters + DEEP_BURN_WEIGHT * deep_quarters;
    let index = quarters_to_tenths(index_quarters);

    let severity = SeverityCategory::from_index_quarters(index_quarters);

    CalculationResult {
        total_surface_area_percent: tenths_to_f64(total),
        surface_burn_percent: tenths_to_f64(surface),
        deep_burn_percent: tenths_to_f64(deep),
        severity_index: tenths_to_f64(index),
        severity_category: severity,
        prognosis_category: severity.prognosis(),
    }
}

/// Round a quarter-point amount to tenths, half away from zero.
///
/// `q / 4` in tenths is `2.5 * q`; odd `q` lands exactly on `.5` and rounds up.
fn quarters_to_tenths(quarters: u32) -> u32 {
    (quarters * 5 + 1) / 2
}

fn tenths_to_f64(tenths: u32) -> f64 {
    tenths as f64 / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgeGroup, BodyPart, BurnDegree, BurnFraction, PrognosisCategory, ZoneInput,
    };

    fn measure(
        age: AgeGroup,
        part: BodyPart,
        fraction: BurnFraction,
        degree: BurnDegree,
    ) -> BurnZoneMeasurement {
        ZoneInput::new(part, fraction, degree).measure(age)
    }

    #[test]
    fn test_empty_input() {
        let result = compute_result(&[]);
        assert_eq!(result.total_surface_area_percent, 0.0);
        assert_eq!(result.severity_index, 0.0);
        assert_eq!(result.severity_category, SeverityCategory::Mild);
        assert_eq!(result.prognosis_category, PrognosisCategory::Favorable);
    }

    #[test]
    fn test_adult_example() {
        let zones = [
            measure(AgeGroup::Adult, BodyPart::Front, BurnFraction::Full, BurnDegree::Second),
            measure(AgeGroup::Adult, BodyPart::LeftLeg, BurnFraction::Half, BurnDegree::Third),
        ];
        let result = compute_result(&zones);

        assert_eq!(result.total_surface_area_percent, 27.0);
        assert_eq!(result.surface_burn_percent, 18.0);
        assert_eq!(result.deep_burn_percent, 9.0);
        assert_eq!(result.severity_index, 45.0);
        assert_eq!(result.severity_category, SeverityCategory::Moderate);
        assert_eq!(result.prognosis_category, PrognosisCategory::Questionable);
    }

    #[test]
    fn test_quarter_points_round_once() {
        // 7.25 + 7.25 = 14.5 surface; rounding per zone would give 14.6
        let zones = [
            measure(AgeGroup::Infant, BodyPart::LeftLeg, BurnFraction::Half, BurnDegree::First),
            measure(AgeGroup::Infant, BodyPart::RightLeg, BurnFraction::Half, BurnDegree::Second),
        ];
        let result = compute_result(&zones);
        assert_eq!(result.surface_burn_percent, 14.5);
        assert_eq!(result.total_surface_area_percent, 14.5);
    }

    #[test]
    fn test_odd_quarter_rounds_half_up() {
        let zones = [measure(
            AgeGroup::Infant,
            BodyPart::LeftLeg,
            BurnFraction::Half,
            BurnDegree::Fourth,
        )];
        let result = compute_result(&zones);
        assert_eq!(result.deep_burn_percent, 7.3);
        // 3 * 7.25 = 21.75, not 3 * 7.3
        assert_eq!(result.severity_index, 21.8);
    }

    #[test]
    fn test_band_taken_from_exact_index() {
        // 8.25 + 3 * 7.25 = 30.0 exactly; weighting the rounded buckets
        // would give 8.3 + 3 * 7.3 = 30.2
        let zones = [
            measure(AgeGroup::Infant, BodyPart::LeftLeg, BurnFraction::Half, BurnDegree::First),
            measure(AgeGroup::Infant, BodyPart::RightLeg, BurnFraction::Half, BurnDegree::Third),
            measure(AgeGroup::Infant, BodyPart::Perineum, BurnFraction::Full, BurnDegree::Second),
        ];
        let result = compute_result(&zones);
        assert_eq!(result.surface_burn_percent, 8.3);
        assert_eq!(result.deep_burn_percent, 7.3);
        assert_eq!(result.severity_index, 30.0);
        assert_eq!(result.severity_category, SeverityCategory::Mild);
        assert_eq!(result.prognosis_category, PrognosisCategory::Favorable);
    }

    #[test]
    fn test_zero_fraction_contributes_nothing() {
        let zones = [measure(AgeGroup::Adult, BodyPart::Head, BurnFraction::None, BurnDegree::Fourth)];
        assert_eq!(compute_result(&zones).total_surface_area_percent, 0.0);
    }

    #[test]
    fn test_quarters_to_tenths() {
        assert_eq!(quarters_to_tenths(0), 0);
        assert_eq!(quarters_to_tenths(1), 3); // 0.25 -> 0.3
        assert_eq!(quarters_to_tenths(2), 5); // 0.5
        assert_eq!(quarters_to_tenths(29), 73); // 7.25 -> 7.3
        assert_eq!(quarters_to_tenths(400), 1000);
    }
}
