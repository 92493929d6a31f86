//! Patient models.

use serde::{Deserialize, Serialize};

/// A patient record, owned by exactly one doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    /// Local UUID
    pub id: String,
    /// Owning clinician
    pub doctor_id: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Epoch milliseconds
    pub created_at: i64,
}

impl PatientRecord {
    /// Create a new patient record for a doctor.
    pub fn new(doctor_id: String, full_name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            doctor_id,
            full_name,
            phone: None,
            address: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Visibility rule: only the owning doctor sees the record.
    pub fn is_visible_to(&self, doctor_id: &str) -> bool {
        self.doctor_id == doctor_id
    }
}
