//! Calculation result and persisted calculation record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::identity::{Identity, Role};
use super::zone::{AgeGroup, BurnZoneMeasurement, ZoneInput};
use crate::scoring;

/// Severity band derived from the severity index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityCategory {
    /// Index up to and including 30
    Mild,
    /// Index above 30, up to 60
    Moderate,
    /// Index above 60, up to 90
    Severe,
    /// Index above 90
    Critical,
}

impl SeverityCategory {
    /// Band for an exact index expressed in quarter points.
    pub(crate) fn from_index_quarters(quarters: u32) -> Self {
        if quarters > 360 {
            SeverityCategory::Critical
        } else if quarters > 240 {
            SeverityCategory::Severe
        } else if quarters > 120 {
            SeverityCategory::Moderate
        } else {
            SeverityCategory::Mild
        }
    }

    /// Band for a severity index. Band edges belong to the lower band.
    pub fn from_index(index: f64) -> Self {
        if index > 90.0 {
            SeverityCategory::Critical
        } else if index > 60.0 {
            SeverityCategory::Severe
        } else if index > 30.0 {
            SeverityCategory::Moderate
        } else {
            SeverityCategory::Mild
        }
    }

    /// Prognosis label for this band.
    pub fn prognosis(&self) -> PrognosisCategory {
        match self {
            SeverityCategory::Mild => PrognosisCategory::Favorable,
            SeverityCategory::Moderate | SeverityCategory::Severe => {
                PrognosisCategory::Questionable
            }
            SeverityCategory::Critical => PrognosisCategory::Unfavorable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityCategory::Mild => "mild",
            SeverityCategory::Moderate => "moderate",
            SeverityCategory::Severe => "severe",
            SeverityCategory::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityCategory::Mild => "Mild burns",
            SeverityCategory::Moderate => "Moderate burns",
            SeverityCategory::Severe => "Severe burns",
            SeverityCategory::Critical => "Critical burns",
        }
    }
}

impl fmt::Display for SeverityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mild" => Ok(SeverityCategory::Mild),
            "moderate" => Ok(SeverityCategory::Moderate),
            "severe" => Ok(SeverityCategory::Severe),
            "critical" => Ok(SeverityCategory::Critical),
            _ => Err(format!("Unknown severity category: {}", s)),
        }
    }
}

/// Prognosis label. Shares its breakpoints with [`SeverityCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrognosisCategory {
    Favorable,
    Questionable,
    Unfavorable,
}

impl PrognosisCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrognosisCategory::Favorable => "favorable",
            PrognosisCategory::Questionable => "questionable",
            PrognosisCategory::Unfavorable => "unfavorable",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrognosisCategory::Favorable => "Favorable",
            PrognosisCategory::Questionable => "Questionable",
            PrognosisCategory::Unfavorable => "Unfavorable",
        }
    }
}

impl fmt::Display for PrognosisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrognosisCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favorable" => Ok(PrognosisCategory::Favorable),
            "questionable" => Ok(PrognosisCategory::Questionable),
            "unfavorable" => Ok(PrognosisCategory::Unfavorable),
            _ => Err(format!("Unknown prognosis category: {}", s)),
        }
    }
}

/// Scoring output for a list of zones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Total burned body surface (TBSA), percent
    pub total_surface_area_percent: f64,
    /// Burned surface with degree 1 or 2, percent
    pub surface_burn_percent: f64,
    /// Burned surface with degree 3 or 4, percent
    pub deep_burn_percent: f64,
    /// Weighted severity index (ITP)
    pub severity_index: f64,
    pub severity_category: SeverityCategory,
    pub prognosis_category: PrognosisCategory,
}

/// A saved calculation.
///
/// The result fields are a flattened projection of [`scoring::compute_result`]
/// over `zones`; [`CalculationRecord::is_consistent`] checks they still agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRecord {
    /// Client-generated UUID
    pub id: String,
    pub age_group: AgeGroup,
    /// Zones in entry order
    pub zones: Vec<ZoneInput>,
    pub total_tbsa: f64,
    pub itp: f64,
    pub severity: SeverityCategory,
    pub prognosis: PrognosisCategory,
    /// Epoch milliseconds
    pub created_at: i64,
    /// True once the record has been upserted to the remote store
    pub synced: bool,
    /// Set when a patient calculated for themselves
    pub owner_user_id: Option<String>,
    /// Set when a doctor authored the calculation
    pub doctor_id: Option<String>,
    /// Patient the calculation is attached to (doctor-authored only)
    pub patient_id: Option<String>,
}

impl CalculationRecord {
    /// Score the zones and build an unsynced record authored by `author`.
    pub fn new(
        age_group: AgeGroup,
        zones: Vec<ZoneInput>,
        author: &Identity,
        patient_id: Option<String>,
    ) -> Self {
        let result = scoring::compute_result(&measure_all(age_group, &zones));

        let (owner_user_id, doctor_id, patient_id) = match author.role {
            Role::Patient => (Some(author.user_id.clone()), None, None),
            Role::Doctor => (None, Some(author.user_id.clone()), patient_id),
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            age_group,
            zones,
            total_tbsa: result.total_surface_area_percent,
            itp: result.severity_index,
            severity: result.severity_category,
            prognosis: result.prognosis_category,
            created_at: chrono::Utc::now().timestamp_millis(),
            synced: false,
            owner_user_id,
            doctor_id,
            patient_id,
        }
    }

    /// Zones resolved against this record's age group.
    pub fn measurements(&self) -> Vec<BurnZoneMeasurement> {
        measure_all(self.age_group, &self.zones)
    }

    /// Recompute the full result from the stored zones.
    pub fn result(&self) -> CalculationResult {
        scoring::compute_result(&self.measurements())
    }

    /// Check the stored projection against a fresh recomputation.
    pub fn is_consistent(&self) -> bool {
        let result = self.result();
        self.total_tbsa == result.total_surface_area_percent
            && self.itp == result.severity_index
            && self.severity == result.severity_category
            && self.prognosis == result.prognosis_category
    }

    /// Doctor-authored calculations must be attached before they can sync.
    pub fn awaiting_patient(&self) -> bool {
        self.doctor_id.is_some() && self.patient_id.is_none()
    }
}

fn measure_all(age_group: AgeGroup, zones: &[ZoneInput]) -> Vec<BurnZoneMeasurement> {
    zones.iter().map(|zone| zone.measure(age_group)).collect()
}
