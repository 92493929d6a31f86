//! Remote record store: namespaced, idempotent per-document upsert.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{
    AgeGroup, BurnZoneMeasurement, CalculationRecord, Identity, PrognosisCategory, Role,
    SeverityCategory,
};

/// Remote push failures. All of them are transient from the reconciler's
/// point of view: the record stays unsynced and is retried later.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("Push timed out after {0:?}")]
    Timeout(Duration),

    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Remote store rejected write: {0}")]
    Rejected(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Where a calculation lives remotely.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RemotePath {
    /// `users/{uid}/calculations/{calcId}`
    PatientOwned { user_id: String, calculation_id: String },
    /// `doctorPatients/{doctorId}/patients/{patientId}/calculations/{calcId}`
    DoctorOwned {
        doctor_id: String,
        patient_id: String,
        calculation_id: String,
    },
}

impl RemotePath {
    /// Destination for a record pushed by `identity`.
    ///
    /// Doctor-authored records without a patient have no destination yet.
    pub fn for_record(identity: &Identity, record: &CalculationRecord) -> Option<Self> {
        match identity.role {
            Role::Patient => Some(RemotePath::PatientOwned {
                user_id: identity.user_id.clone(),
                calculation_id: record.id.clone(),
            }),
            Role::Doctor => record
                .patient_id
                .as_ref()
                .map(|patient_id| RemotePath::DoctorOwned {
                    doctor_id: identity.user_id.clone(),
                    patient_id: patient_id.clone(),
                    calculation_id: record.id.clone(),
                }),
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemotePath::PatientOwned {
                user_id,
                calculation_id,
            } => write!(f, "users/{}/calculations/{}", user_id, calculation_id),
            RemotePath::DoctorOwned {
                doctor_id,
                patient_id,
                calculation_id,
            } => write!(
                f,
                "doctorPatients/{}/patients/{}/calculations/{}",
                doctor_id, patient_id, calculation_id
            ),
        }
    }
}

/// Remote projection of a calculation: everything but the local `synced`
/// cursor, with zone percentages resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCalculation<'a> {
    pub id: &'a str,
    pub age_group: AgeGroup,
    pub zones: Vec<BurnZoneMeasurement>,
    #[serde(rename = "totalTBSA")]
    pub total_tbsa: f64,
    pub itp: f64,
    pub severity: SeverityCategory,
    pub prognosis: PrognosisCategory,
    pub created_at: i64,
    pub owner_user_id: Option<&'a str>,
    pub doctor_id: Option<&'a str>,
    pub patient_id: Option<&'a str>,
}

impl<'a> From<&'a CalculationRecord> for RemoteCalculation<'a> {
    fn from(record: &'a CalculationRecord) -> Self {
        Self {
            id: &record.id,
            age_group: record.age_group,
            zones: record.measurements(),
            total_tbsa: record.total_tbsa,
            itp: record.itp,
            severity: record.severity,
            prognosis: record.prognosis,
            created_at: record.created_at,
            owner_user_id: record.owner_user_id.as_deref(),
            doctor_id: record.doctor_id.as_deref(),
            patient_id: record.patient_id.as_deref(),
        }
    }
}

/// Durable remote persistence.
///
/// `put` must be an upsert keyed by path: writing the same document twice
/// leaves the store as if it were written once.
pub trait RemoteStore {
    fn put(
        &self,
        path: &RemotePath,
        document: &serde_json::Value,
        timeout: Duration,
    ) -> RemoteResult<()>;
}

/// Hex SHA-256 of a document's canonical JSON.
pub fn content_digest(document: &serde_json::Value) -> String {
    hex::encode(Sha256::digest(document.to_string().as_bytes()))
}

#[derive(Debug, Clone)]
struct StoredDocument {
    digest: String,
    document: serde_json::Value,
}

#[derive(Debug, Default)]
struct InMemoryState {
    documents: HashMap<String, StoredDocument>,
    /// Writes that changed stored content
    effective_writes: usize,
    available: bool,
}

/// In-process remote store, for tests and for hosts without a backend.
#[derive(Debug)]
pub struct InMemoryRemoteStore {
    state: Mutex<InMemoryState>,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self {
            state: Mutex::new(InMemoryState {
                available: true,
                ..Default::default()
            }),
        }
    }
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every put fails while unavailable.
    pub fn set_available(&self, available: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.available = available;
        }
    }

    pub fn get(&self, path: &str) -> Option<serde_json::Value> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.documents.get(path).map(|d| d.document.clone()))
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.documents.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of puts that changed stored content.
    pub fn effective_writes(&self) -> usize {
        self.state.lock().map(|s| s.effective_writes).unwrap_or(0)
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .state
            .lock()
            .map(|s| s.documents.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn put(
        &self,
        path: &RemotePath,
        document: &serde_json::Value,
        _timeout: Duration,
    ) -> RemoteResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        if !state.available {
            return Err(RemoteError::Unavailable("store offline".into()));
        }

        let key = path.to_string();
        let digest = content_digest(document);
        if state.documents.get(&key).map(|d| &d.digest) == Some(&digest) {
            return Ok(());
        }

        state.documents.insert(
            key,
            StoredDocument {
                digest,
                document: document.clone(),
            },
        );
        state.effective_writes += 1;
        Ok(())
    }
}
