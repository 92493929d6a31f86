//! Follow-up checkup schedules.

use serde::{Deserialize, Serialize};

/// A scheduled follow-up checkup for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSchedule {
    pub id: String,
    pub doctor_id: String,
    pub patient_id: String,
    /// Calculation that prompted the follow-up
    pub calculation_id: String,
    /// Denormalized for display in the reminder
    pub patient_name: String,
    /// Target checkup time, epoch milliseconds
    pub checkup_timestamp: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub last_notified: Option<i64>,
    /// Platform push-notification id, once scheduled
    pub notification_id: Option<String>,
}

impl NotificationSchedule {
    /// Create an active schedule.
    pub fn new(
        doctor_id: String,
        patient_id: String,
        calculation_id: String,
        patient_name: String,
        checkup_timestamp: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            doctor_id,
            patient_id,
            calculation_id,
            patient_name,
            checkup_timestamp,
            is_active: true,
            created_at: chrono::Utc::now().timestamp_millis(),
            last_notified: None,
            notification_id: None,
        }
    }

    /// Whether the checkup time has passed.
    pub fn is_due(&self, now_millis: i64) -> bool {
        self.checkup_timestamp <= now_millis
    }
}

/// Partial update for a schedule; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleUpdate {
    pub checkup_timestamp: Option<i64>,
    pub is_active: Option<bool>,
    pub last_notified: Option<i64>,
    pub notification_id: Option<String>,
}

impl ScheduleUpdate {
    pub fn is_empty(&self) -> bool {
        self.checkup_timestamp.is_none()
            && self.is_active.is_none()
            && self.last_notified.is_none()
            && self.notification_id.is_none()
    }
}
