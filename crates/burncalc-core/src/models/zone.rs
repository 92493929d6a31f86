//! Burn zone models: age groups, anatomical partition, fraction and depth.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scoring::coefficients;

/// Error parsing a stored or FFI-supplied zone value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ZoneParseError {
    #[error("Unknown age group: {0}")]
    AgeGroup(String),

    #[error("Unknown body part: {0}")]
    BodyPart(String),

    #[error("Burn fraction must be 0, 0.5 or 1, got {0}")]
    Fraction(f64),

    #[error("Burn degree must be between 1 and 4, got {0}")]
    Degree(u8),
}

/// Age bracket selecting the body-surface-area coefficient table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    /// Under 1 year
    #[serde(rename = "infant")]
    Infant,
    /// 1 to 4 years
    #[serde(rename = "child1to4")]
    Child1To4,
    /// 5 to 14 years
    #[serde(rename = "child5to14")]
    Child5To14,
    /// 15 years and older
    #[serde(rename = "adult")]
    Adult,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::Infant,
        AgeGroup::Child1To4,
        AgeGroup::Child5To14,
        AgeGroup::Adult,
    ];

    /// Storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Infant => "infant",
            AgeGroup::Child1To4 => "child1to4",
            AgeGroup::Child5To14 => "child5to14",
            AgeGroup::Adult => "adult",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Infant => "< 1 year",
            AgeGroup::Child1To4 => "1-4 years",
            AgeGroup::Child5To14 => "5-14 years",
            AgeGroup::Adult => "15+ years",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = ZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "infant" => Ok(AgeGroup::Infant),
            "child1to4" => Ok(AgeGroup::Child1To4),
            "child5to14" => Ok(AgeGroup::Child5To14),
            "adult" => Ok(AgeGroup::Adult),
            _ => Err(ZoneParseError::AgeGroup(s.to_string())),
        }
    }
}

/// Fixed anatomical partition used by the rule-of-nines tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Head,
    /// Anterior trunk (chest and abdomen)
    Front,
    /// Posterior trunk
    Back,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    Perineum,
}

impl BodyPart {
    pub const ALL: [BodyPart; 8] = [
        BodyPart::Head,
        BodyPart::Front,
        BodyPart::Back,
        BodyPart::LeftArm,
        BodyPart::RightArm,
        BodyPart::LeftLeg,
        BodyPart::RightLeg,
        BodyPart::Perineum,
    ];

    /// Storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyPart::Head => "head",
            BodyPart::Front => "front",
            BodyPart::Back => "back",
            BodyPart::LeftArm => "left_arm",
            BodyPart::RightArm => "right_arm",
            BodyPart::LeftLeg => "left_leg",
            BodyPart::RightLeg => "right_leg",
            BodyPart::Perineum => "perineum",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            BodyPart::Head => "Head",
            BodyPart::Front => "Anterior trunk",
            BodyPart::Back => "Posterior trunk",
            BodyPart::LeftArm => "Left arm",
            BodyPart::RightArm => "Right arm",
            BodyPart::LeftLeg => "Left leg",
            BodyPart::RightLeg => "Right leg",
            BodyPart::Perineum => "Perineum",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyPart {
    type Err = ZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BodyPart::ALL
            .into_iter()
            .find(|part| part.as_str() == s)
            .ok_or_else(|| ZoneParseError::BodyPart(s.to_string()))
    }
}

/// Share of a body part's allotment that is burned.
///
/// Serialized as the plain number `0`, `0.5` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum BurnFraction {
    None,
    Half,
    Full,
}

impl BurnFraction {
    /// Fraction in halves (0, 1 or 2), for exact arithmetic.
    pub(crate) fn halves(&self) -> u32 {
        match self {
            BurnFraction::None => 0,
            BurnFraction::Half => 1,
            BurnFraction::Full => 2,
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.halves() as f64 / 2.0
    }
}

impl TryFrom<f64> for BurnFraction {
    type Error = ZoneParseError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value == 0.0 {
            Ok(BurnFraction::None)
        } else if value == 0.5 {
            Ok(BurnFraction::Half)
        } else if value == 1.0 {
            Ok(BurnFraction::Full)
        } else {
            Err(ZoneParseError::Fraction(value))
        }
    }
}

impl From<BurnFraction> for f64 {
    fn from(fraction: BurnFraction) -> Self {
        fraction.as_f64()
    }
}

/// Burn depth classification (1 to 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BurnDegree {
    First,
    Second,
    Third,
    Fourth,
}

impl BurnDegree {
    pub fn as_u8(&self) -> u8 {
        match self {
            BurnDegree::First => 1,
            BurnDegree::Second => 2,
            BurnDegree::Third => 3,
            BurnDegree::Fourth => 4,
        }
    }

    /// Degrees 3 and 4 count as deep burns.
    pub fn is_deep(&self) -> bool {
        matches!(self, BurnDegree::Third | BurnDegree::Fourth)
    }
}

impl TryFrom<u8> for BurnDegree {
    type Error = ZoneParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BurnDegree::First),
            2 => Ok(BurnDegree::Second),
            3 => Ok(BurnDegree::Third),
            4 => Ok(BurnDegree::Fourth),
            other => Err(ZoneParseError::Degree(other)),
        }
    }
}

impl From<BurnDegree> for u8 {
    fn from(degree: BurnDegree) -> Self {
        degree.as_u8()
    }
}

/// A zone as entered by the user. This is the persisted form; `percent`
/// is never stored alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneInput {
    pub body_part: BodyPart,
    pub fraction: BurnFraction,
    pub degree: BurnDegree,
}

impl ZoneInput {
    pub fn new(body_part: BodyPart, fraction: BurnFraction, degree: BurnDegree) -> Self {
        Self {
            body_part,
            fraction,
            degree,
        }
    }

    /// Resolve the burned percentage for the given age group.
    pub fn measure(&self, age_group: AgeGroup) -> BurnZoneMeasurement {
        let quarters =
            coefficients::coefficient_halves(age_group, self.body_part) * self.fraction.halves();
        BurnZoneMeasurement {
            input: *self,
            quarters,
        }
    }
}

/// A zone with its percentage resolved against an age group.
///
/// Only constructed through [`ZoneInput::measure`], so the percentage can
/// never drift from its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnZoneMeasurement {
    input: ZoneInput,
    /// Burned area in quarter percentage points.
    quarters: u32,
}

impl BurnZoneMeasurement {
    pub fn input(&self) -> &ZoneInput {
        &self.input
    }

    pub fn body_part(&self) -> BodyPart {
        self.input.body_part
    }

    pub fn fraction(&self) -> BurnFraction {
        self.input.fraction
    }

    pub fn degree(&self) -> BurnDegree {
        self.input.degree
    }

    /// Burned share of total body surface, in percent.
    pub fn percent(&self) -> f64 {
        self.quarters as f64 / 4.0
    }

    pub(crate) fn quarters(&self) -> u32 {
        self.quarters
    }
}

impl Serialize for BurnZoneMeasurement {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("BurnZoneMeasurement", 4)?;
        state.serialize_field("bodyPart", &self.input.body_part)?;
        state.serialize_field("fraction", &self.input.fraction)?;
        state.serialize_field("degree", &self.input.degree)?;
        state.serialize_field("percent", &self.percent())?;
        state.end()
    }
}
