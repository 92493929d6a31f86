//! Calculation history filtering and sorting.
//!
//! Plain in-memory predicates over records already loaded for a caller.

use std::cmp::Ordering;

use crate::models::{CalculationRecord, PatientRecord};

/// All set bounds must hold; unset bounds are ignored. Ranges are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationFilter {
    pub patient_id: Option<String>,
    /// Case-insensitive substring of the attached patient's name
    pub patient_name: Option<String>,
    /// Epoch millis, inclusive
    pub created_from: Option<i64>,
    /// Epoch millis, inclusive
    pub created_to: Option<i64>,
    pub min_tbsa: Option<f64>,
    pub max_tbsa: Option<f64>,
    pub min_itp: Option<f64>,
    pub max_itp: Option<f64>,
}

impl CalculationFilter {
    /// `patient_name` is the name of the record's attached patient, if any.
    pub fn matches(&self, record: &CalculationRecord, patient_name: Option<&str>) -> bool {
        if let Some(patient_id) = &self.patient_id {
            if record.patient_id.as_ref() != Some(patient_id) {
                return false;
            }
        }

        if let Some(query) = &self.patient_name {
            let query = query.to_lowercase();
            match patient_name {
                Some(name) if name.to_lowercase().contains(&query) => {}
                _ => return false,
            }
        }

        within(record.created_at, self.created_from, self.created_to)
            && within(record.total_tbsa, self.min_tbsa, self.max_tbsa)
            && within(record.itp, self.min_itp, self.max_itp)
    }

    /// Filter records, resolving patient names from `patients`.
    pub fn apply(
        &self,
        records: Vec<CalculationRecord>,
        patients: &[PatientRecord],
    ) -> Vec<CalculationRecord> {
        records
            .into_iter()
            .filter(|record| {
                let name = record.patient_id.as_deref().and_then(|id| {
                    patients
                        .iter()
                        .find(|p| p.id == id)
                        .map(|p| p.full_name.as_str())
                });
                self.matches(record, name)
            })
            .collect()
    }
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

/// Sort key for history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    Tbsa,
    Itp,
}

/// Sort in place. Descending (newest / largest first) unless `ascending`.
pub fn sort_calculations(records: &mut [CalculationRecord], key: SortKey, ascending: bool) {
    records.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Date => a.created_at.cmp(&b.created_at),
            SortKey::Tbsa => a.total_tbsa.partial_cmp(&b.total_tbsa).unwrap_or(Ordering::Equal),
            SortKey::Itp => a.itp.partial_cmp(&b.itp).unwrap_or(Ordering::Equal),
        };
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}
