//! Pediatric-adjusted rule-of-nines coefficient tables.

use crate::models::{AgeGroup, BodyPart};

/// Coefficient for a body part in half percentage points.
///
/// Stored as halves so that 14.5 and 17.5 stay exact integers.
pub(crate) fn coefficient_halves(age_group: AgeGroup, body_part: BodyPart) -> u32 {
    use BodyPart::*;

    match (age_group, body_part) {
        (_, LeftArm | RightArm) => 18,
        (_, Perineum) => 2,

        (AgeGroup::Infant, Head) => 40,
        (AgeGroup::Infant, Front | Back) => 32,
        (AgeGroup::Infant, LeftLeg | RightLeg) => 29,

        (AgeGroup::Child1To4, Head) => 32,
        (AgeGroup::Child1To4, Front | Back) => 35,
        (AgeGroup::Child1To4, LeftLeg | RightLeg) => 30,

        (AgeGroup::Child5To14, Head) => 22,
        (AgeGroup::Child5To14, Front | Back) => 36,
        (AgeGroup::Child5To14, LeftLeg | RightLeg) => 34,

        (AgeGroup::Adult, Head) => 18,
        (AgeGroup::Adult, Front | Back) => 36,
        (AgeGroup::Adult, LeftLeg | RightLeg) => 36,
    }
}

/// Coefficient for a body part, in percent of total body surface.
pub fn coefficient(age_group: AgeGroup, body_part: BodyPart) -> f64 {
    coefficient_halves(age_group, body_part) as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_table_sums_to_100() {
        for group in AgeGroup::ALL {
            let total: u32 = BodyPart::ALL
                .iter()
                .map(|part| coefficient_halves(group, *part))
                .sum();
            assert_eq!(total, 200, "{group} table should sum to 100%");
        }
    }

    #[test]
    fn test_known_values() {
        assert_eq!(coefficient(AgeGroup::Adult, BodyPart::Head), 9.0);
        assert_eq!(coefficient(AgeGroup::Infant, BodyPart::LeftLeg), 14.5);
        assert_eq!(coefficient(AgeGroup::Child1To4, BodyPart::Back), 17.5);
        assert_eq!(coefficient(AgeGroup::Child5To14, BodyPart::Head), 11.0);
        assert_eq!(coefficient(AgeGroup::Child1To4, BodyPart::RightLeg), 15.0);
    }
}
