//! BurnCalc Core Library
//!
//! Offline-first burn severity scoring with opportunistic sync to a remote store.
//!
//! # Architecture
//!
//! ```text
//!   Zone inputs ──► Scoring Engine ──► CalculationRecord (synced = false)
//!                                                 │
//!                                     [LOCAL: SQLite calculations]
//!                                                 │
//!                              on save / foreground / manual refresh
//!                                                 │
//!                                     ┌───────────▼───────────┐
//!                                     │      Reconciler       │
//!                                     │  online? ─► role? ─►  │
//!                                     │  push each ─► mark    │
//!                                     └───────────┬───────────┘
//!                                                 │
//!                         ┌───────────────────────┴───────────────────────┐
//!                         ▼                                               ▼
//!          users/{uid}/calculations/{id}        doctorPatients/{doc}/patients/{pid}/calculations/{id}
//! ```
//!
//! # Core Principle
//!
//! **Saving is always local and always succeeds first.** Sync is best-effort;
//! the per-record `synced` flag is the only reconciliation cursor.
//!
//! # Modules
//!
//! - [`scoring`]: Pure TBSA / severity index computation
//! - [`models`]: Domain types (zones, records, patients, schedules, identity)
//! - [`db`]: SQLite local record store
//! - [`sync`]: Remote store, connectivity, reconciler
//! - [`session`]: Login session and doctor registration gate
//! - [`history`]: Filtering and sorting of saved calculations
//! - [`config`]: Versioned JSON configuration

pub mod config;
pub mod db;
pub mod history;
pub mod models;
pub mod scoring;
pub mod session;
pub mod sync;

// Re-export commonly used types
pub use config::CoreConfig;
pub use db::Database;
pub use models::{
    AgeGroup, BodyPart, BurnDegree, BurnFraction, BurnZoneMeasurement, CalculationRecord,
    CalculationResult, Identity, NotificationSchedule, PatientRecord, PrognosisCategory, Role,
    SeverityCategory, ZoneInput,
};
pub use scoring::compute_result;
pub use session::{IdentityResolver, SessionHandle};
pub use sync::{Reconciler, SyncReport};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};
use std::time::Duration;

use history::{CalculationFilter, SortKey};
use models::{ScheduleUpdate, ZoneParseError};
use sync::{ConnectivityOracle, RemoteError, RemotePath, RemoteResult, RemoteStore};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum BurnCalcError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Identity error: {0}")]
    IdentityError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Remote error: {0}")]
    RemoteError(String),
}

impl From<db::DbError> for BurnCalcError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => BurnCalcError::NotFound(what),
            other => BurnCalcError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for BurnCalcError {
    fn from(e: serde_json::Error) -> Self {
        BurnCalcError::SerializationError(e.to_string())
    }
}

impl From<ZoneParseError> for BurnCalcError {
    fn from(e: ZoneParseError) -> Self {
        BurnCalcError::InvalidInput(e.to_string())
    }
}

impl From<session::IdentityError> for BurnCalcError {
    fn from(e: session::IdentityError) -> Self {
        match e {
            session::IdentityError::Unauthorized(msg) => BurnCalcError::Unauthorized(msg),
            other => BurnCalcError::IdentityError(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for BurnCalcError {
    fn from(e: config::ConfigError) -> Self {
        BurnCalcError::ConfigError(e.to_string())
    }
}

impl From<sync::SyncError> for BurnCalcError {
    fn from(e: sync::SyncError) -> Self {
        match e {
            sync::SyncError::Identity(inner) => inner.into(),
            sync::SyncError::Local(inner) => inner.into(),
            sync::SyncError::Encode(inner) => inner.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for BurnCalcError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        BurnCalcError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for BurnCalcError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        BurnCalcError::RemoteError(e.reason)
    }
}

// =========================================================================
// Foreign Collaborators (implemented by the host app)
// =========================================================================

/// Remote document store, e.g. a Firestore `setDoc` wrapper.
#[uniffi::export(with_foreign)]
pub trait RemoteDocumentStore: Send + Sync {
    /// Upsert `document_json` at `path`. Must give up after `timeout_ms`.
    fn put(&self, path: String, document_json: String, timeout_ms: u64)
        -> Result<(), BurnCalcError>;
}

/// Platform reachability.
#[uniffi::export(with_foreign)]
pub trait NetworkStatus: Send + Sync {
    fn is_online(&self) -> bool;
}

struct ForeignRemoteStore(Arc<dyn RemoteDocumentStore>);

impl RemoteStore for ForeignRemoteStore {
    fn put(
        &self,
        path: &RemotePath,
        document: &serde_json::Value,
        timeout: Duration,
    ) -> RemoteResult<()> {
        self.0
            .put(
                path.to_string(),
                document.to_string(),
                timeout.as_millis() as u64,
            )
            .map_err(|e| RemoteError::Unavailable(e.to_string()))
    }
}

struct ForeignConnectivity(Arc<dyn NetworkStatus>);

impl ConnectivityOracle for ForeignConnectivity {
    fn is_online(&self) -> bool {
        self.0.is_online()
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
///
/// Schema creation completes before the handle is returned.
#[uniffi::export]
pub fn open_database(
    path: String,
    config_json: Option<String>,
) -> Result<Arc<BurnCalcCore>, BurnCalcError> {
    let config = match config_json {
        Some(json) => CoreConfig::from_json(&json)?,
        None => CoreConfig::default(),
    };
    let db = Database::open(&path)?;
    Ok(Arc::new(BurnCalcCore::new(db, config)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<BurnCalcCore>, BurnCalcError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(BurnCalcCore::new(db, CoreConfig::default())))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe core handle for FFI.
#[derive(uniffi::Object)]
pub struct BurnCalcCore {
    db: Arc<Mutex<Database>>,
    session: SessionHandle,
    config: CoreConfig,
}

impl BurnCalcCore {
    pub fn new(db: Database, config: CoreConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            session: SessionHandle::new(),
            config,
        }
    }

    fn caller(&self, caller_id: &str) -> Result<Identity, BurnCalcError> {
        Ok(self.session.resolve(caller_id)?)
    }

    fn doctor(&self, caller_id: &str) -> Result<Identity, BurnCalcError> {
        let identity = self.caller(caller_id)?;
        match identity.role {
            Role::Doctor => Ok(identity),
            Role::Patient => Err(BurnCalcError::Unauthorized(
                "Only doctors can manage patients".into(),
            )),
        }
    }
}

#[uniffi::export]
impl BurnCalcCore {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Register a new identity and log it in.
    pub fn register(
        &self,
        user_id: String,
        role: String,
        secret: Option<String>,
    ) -> Result<FfiIdentity, BurnCalcError> {
        let role: Role = role.parse().map_err(BurnCalcError::InvalidInput)?;
        let identity = session::register(&user_id, role, secret.as_deref(), &self.config)?;
        self.session.login(identity.clone())?;
        Ok(identity.into())
    }

    /// Start a session for an already-authenticated user.
    ///
    /// No secret is checked here. `role` must come from the host's own
    /// auth record for `user_id` (the one written at registration), never
    /// from user input; new doctors go through [`BurnCalcCore::register`].
    pub fn login(&self, user_id: String, role: String) -> Result<(), BurnCalcError> {
        let role: Role = role.parse().map_err(BurnCalcError::InvalidInput)?;
        self.session.login(Identity::new(user_id, role))?;
        Ok(())
    }

    pub fn logout(&self) -> Result<(), BurnCalcError> {
        self.session.logout()?;
        Ok(())
    }

    // =========================================================================
    // Scoring Operations
    // =========================================================================

    /// Score zones without saving anything.
    pub fn compute_result(
        &self,
        age_group: String,
        zones: Vec<FfiZone>,
    ) -> Result<FfiCalculationResult, BurnCalcError> {
        let age_group: AgeGroup = age_group.parse()?;
        let measurements: Vec<BurnZoneMeasurement> = zones
            .into_iter()
            .map(|zone| ZoneInput::try_from(zone).map(|z| z.measure(age_group)))
            .collect::<Result<_, _>>()?;
        Ok(compute_result(&measurements).into())
    }

    // =========================================================================
    // Calculation Operations
    // =========================================================================

    /// Score and save a calculation locally. Never touches the network.
    pub fn save_calculation(
        &self,
        caller_id: String,
        age_group: String,
        zones: Vec<FfiZone>,
        patient_id: Option<String>,
    ) -> Result<FfiCalculationRecord, BurnCalcError> {
        let identity = self.caller(&caller_id)?;
        let age_group: AgeGroup = age_group.parse()?;
        let zones = zones
            .into_iter()
            .map(ZoneInput::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let db = self.db.lock()?;
        if let (Role::Doctor, Some(pid)) = (identity.role, &patient_id) {
            if db.get_patient_for_doctor(&identity.user_id, pid)?.is_none() {
                return Err(BurnCalcError::NotFound(format!("Patient {}", pid)));
            }
        }

        let record = CalculationRecord::new(age_group, zones, &identity, patient_id);
        db.insert_calculation(&record)?;
        Ok(record.into())
    }

    /// Get a calculation visible to the caller.
    pub fn get_calculation(
        &self,
        caller_id: String,
        calculation_id: String,
    ) -> Result<Option<FfiCalculationRecord>, BurnCalcError> {
        let identity = self.caller(&caller_id)?;
        let db = self.db.lock()?;
        let record = db.get_calculation(&calculation_id)?.filter(|record| {
            let owner = match identity.role {
                Role::Patient => &record.owner_user_id,
                Role::Doctor => &record.doctor_id,
            };
            owner.as_deref() == Some(identity.user_id.as_str())
        });
        Ok(record.map(Into::into))
    }

    /// List the caller's calculations, newest first.
    pub fn list_calculations(
        &self,
        caller_id: String,
    ) -> Result<Vec<FfiCalculationRecord>, BurnCalcError> {
        let identity = self.caller(&caller_id)?;
        let db = self.db.lock()?;
        let records = db.list_calculations_by_owner(&identity)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Filter and sort the caller's calculations.
    pub fn filter_calculations(
        &self,
        caller_id: String,
        filter: FfiCalculationFilter,
        sort_key: String,
        ascending: bool,
    ) -> Result<Vec<FfiCalculationRecord>, BurnCalcError> {
        let identity = self.caller(&caller_id)?;
        let sort_key = parse_sort_key(&sort_key)?;
        let (records, patients) = {
            let db = self.db.lock()?;
            let patients = match identity.role {
                Role::Doctor => db.list_patients_by_doctor(&identity.user_id)?,
                Role::Patient => Vec::new(),
            };
            (db.list_calculations_by_owner(&identity)?, patients)
        };

        let mut records = CalculationFilter::from(filter).apply(records, &patients);
        history::sort_calculations(&mut records, sort_key, ascending);
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Attach an unsynced doctor calculation to one of the doctor's patients.
    pub fn attach_patient(
        &self,
        caller_id: String,
        calculation_id: String,
        patient_id: String,
    ) -> Result<(), BurnCalcError> {
        let doctor = self.doctor(&caller_id)?;
        let db = self.db.lock()?;

        let record = db
            .get_calculation(&calculation_id)?
            .filter(|r| r.doctor_id.as_deref() == Some(doctor.user_id.as_str()))
            .ok_or_else(|| BurnCalcError::NotFound(format!("Calculation {}", calculation_id)))?;

        if !db.attach_calculation_to_patient(&record.id, &patient_id)? {
            return Err(BurnCalcError::InvalidInput(format!(
                "Cannot attach calculation {} to patient {}",
                calculation_id, patient_id
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a patient owned by the calling doctor.
    pub fn create_patient(
        &self,
        caller_id: String,
        full_name: String,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<FfiPatient, BurnCalcError> {
        let doctor = self.doctor(&caller_id)?;
        if full_name.trim().is_empty() {
            return Err(BurnCalcError::InvalidInput("Patient name is required".into()));
        }

        let mut patient = PatientRecord::new(doctor.user_id, full_name);
        patient.phone = phone;
        patient.address = address;

        let db = self.db.lock()?;
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    /// List the calling doctor's patients.
    pub fn list_patients(&self, caller_id: String) -> Result<Vec<FfiPatient>, BurnCalcError> {
        let doctor = self.doctor(&caller_id)?;
        let db = self.db.lock()?;
        let patients = db.list_patients_by_doctor(&doctor.user_id)?;
        Ok(patients.into_iter().map(Into::into).collect())
    }

    /// Search the calling doctor's patients by name.
    pub fn search_patients(
        &self,
        caller_id: String,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, BurnCalcError> {
        let doctor = self.doctor(&caller_id)?;
        let db = self.db.lock()?;
        let patients = db.search_patients_by_doctor(&doctor.user_id, &query, limit as usize)?;
        Ok(patients.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Notification Schedule Operations
    // =========================================================================

    /// Schedule a follow-up checkup, superseding the patient's earlier ones.
    pub fn schedule_checkup(
        &self,
        caller_id: String,
        patient_id: String,
        calculation_id: String,
        checkup_timestamp: i64,
    ) -> Result<FfiNotificationSchedule, BurnCalcError> {
        let doctor = self.doctor(&caller_id)?;
        let now = chrono::Utc::now().timestamp_millis();
        if checkup_timestamp <= now {
            return Err(BurnCalcError::InvalidInput(
                "Checkup time must be in the future".into(),
            ));
        }

        let mut db = self.db.lock()?;
        let patient = db
            .get_patient_for_doctor(&doctor.user_id, &patient_id)?
            .ok_or_else(|| BurnCalcError::NotFound(format!("Patient {}", patient_id)))?;

        let schedule = NotificationSchedule::new(
            doctor.user_id,
            patient.id,
            calculation_id,
            patient.full_name,
            checkup_timestamp,
        );

        db.replace_patient_schedule(&schedule)?;

        Ok(schedule.into())
    }

    /// Active schedules for the calling doctor, soonest first.
    pub fn list_active_schedules(
        &self,
        caller_id: String,
    ) -> Result<Vec<FfiNotificationSchedule>, BurnCalcError> {
        let doctor = self.doctor(&caller_id)?;
        let db = self.db.lock()?;
        let schedules = db.list_active_schedules(&doctor.user_id)?;
        Ok(schedules.into_iter().map(Into::into).collect())
    }

    /// Upcoming checkups for the calling doctor.
    pub fn list_upcoming_schedules(
        &self,
        caller_id: String,
    ) -> Result<Vec<FfiNotificationSchedule>, BurnCalcError> {
        let doctor = self.doctor(&caller_id)?;
        let db = self.db.lock()?;
        let schedules = db.list_upcoming_schedules(
            &doctor.user_id,
            chrono::Utc::now().timestamp_millis(),
            self.config.upcoming_notification_limit as usize,
        )?;
        Ok(schedules.into_iter().map(Into::into).collect())
    }

    /// Record that the platform notification for a schedule was issued.
    pub fn record_schedule_notification(
        &self,
        caller_id: String,
        schedule_id: String,
        notification_id: Option<String>,
    ) -> Result<(), BurnCalcError> {
        let doctor = self.doctor(&caller_id)?;
        let db = self.db.lock()?;
        owned_schedule(&db, &doctor, &schedule_id)?;
        let update = ScheduleUpdate {
            last_notified: Some(chrono::Utc::now().timestamp_millis()),
            notification_id,
            ..Default::default()
        };
        if !db.update_schedule(&schedule_id, &update)? {
            return Err(BurnCalcError::NotFound(format!("Schedule {}", schedule_id)));
        }
        Ok(())
    }

    /// Deactivate schedules whose checkup time has passed.
    pub fn deactivate_expired_schedules(&self) -> Result<u32, BurnCalcError> {
        let db = self.db.lock()?;
        let count = db.deactivate_expired_schedules(chrono::Utc::now().timestamp_millis())?;
        Ok(count as u32)
    }

    /// Explicit user cancellation: deletes the schedule.
    pub fn cancel_schedule(
        &self,
        caller_id: String,
        schedule_id: String,
    ) -> Result<(), BurnCalcError> {
        let doctor = self.doctor(&caller_id)?;
        let db = self.db.lock()?;
        owned_schedule(&db, &doctor, &schedule_id)?;
        db.delete_schedule(&schedule_id)?;
        Ok(())
    }

    // =========================================================================
    // Sync Operations
    // =========================================================================

    /// Push the caller's unsynced calculations if the network is up.
    ///
    /// Remote failures are reported per record, not as errors.
    pub fn reconcile(
        &self,
        caller_id: String,
        remote: Arc<dyn RemoteDocumentStore>,
        network: Arc<dyn NetworkStatus>,
    ) -> Result<FfiSyncReport, BurnCalcError> {
        let remote = ForeignRemoteStore(remote);
        let network = ForeignConnectivity(network);
        let reconciler = Reconciler::new(
            self.db.as_ref(),
            &remote,
            &network,
            &self.session,
            self.config.push_timeout(),
        );
        Ok(reconciler.reconcile(&caller_id)?.into())
    }

    /// Whether any of the caller's calculations still await sync.
    pub fn has_unsynced_changes(&self, caller_id: String) -> Result<bool, BurnCalcError> {
        let identity = self.caller(&caller_id)?;
        let db = self.db.lock()?;
        Ok(!db.list_unsynced_calculations(Some(&identity))?.is_empty())
    }
}

fn owned_schedule(
    db: &Database,
    doctor: &Identity,
    schedule_id: &str,
) -> Result<NotificationSchedule, BurnCalcError> {
    db.get_schedule(schedule_id)?
        .filter(|s| s.doctor_id == doctor.user_id)
        .ok_or_else(|| BurnCalcError::NotFound(format!("Schedule {}", schedule_id)))
}

fn parse_sort_key(key: &str) -> Result<SortKey, BurnCalcError> {
    match key {
        "date" => Ok(SortKey::Date),
        "tbsa" => Ok(SortKey::Tbsa),
        "itp" => Ok(SortKey::Itp),
        other => Err(BurnCalcError::InvalidInput(format!(
            "Unknown sort key: {}",
            other
        ))),
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe identity.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIdentity {
    pub user_id: String,
    pub role: String,
}

impl From<Identity> for FfiIdentity {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            role: identity.role.as_str().to_string(),
        }
    }
}

/// FFI-safe zone input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiZone {
    pub body_part: String,
    pub fraction: f64,
    pub degree: u8,
}

impl TryFrom<FfiZone> for ZoneInput {
    type Error = ZoneParseError;

    fn try_from(zone: FfiZone) -> Result<Self, Self::Error> {
        Ok(ZoneInput::new(
            zone.body_part.parse()?,
            BurnFraction::try_from(zone.fraction)?,
            BurnDegree::try_from(zone.degree)?,
        ))
    }
}

/// FFI-safe measured zone.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeasuredZone {
    pub body_part: String,
    pub body_part_label: String,
    pub fraction: f64,
    pub degree: u8,
    pub percent: f64,
}

impl From<BurnZoneMeasurement> for FfiMeasuredZone {
    fn from(zone: BurnZoneMeasurement) -> Self {
        Self {
            body_part: zone.body_part().as_str().to_string(),
            body_part_label: zone.body_part().label().to_string(),
            fraction: zone.fraction().as_f64(),
            degree: zone.degree().as_u8(),
            percent: zone.percent(),
        }
    }
}

/// FFI-safe calculation result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCalculationResult {
    pub total_tbsa: f64,
    pub surface_tbsa: f64,
    pub deep_tbsa: f64,
    pub itp: f64,
    pub severity: String,
    pub severity_label: String,
    pub prognosis: String,
    pub prognosis_label: String,
}

impl From<CalculationResult> for FfiCalculationResult {
    fn from(result: CalculationResult) -> Self {
        Self {
            total_tbsa: result.total_surface_area_percent,
            surface_tbsa: result.surface_burn_percent,
            deep_tbsa: result.deep_burn_percent,
            itp: result.severity_index,
            severity: result.severity_category.as_str().to_string(),
            severity_label: result.severity_category.label().to_string(),
            prognosis: result.prognosis_category.as_str().to_string(),
            prognosis_label: result.prognosis_category.label().to_string(),
        }
    }
}

/// FFI-safe calculation record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCalculationRecord {
    pub id: String,
    pub age_group: String,
    pub zones: Vec<FfiMeasuredZone>,
    pub total_tbsa: f64,
    pub itp: f64,
    pub severity: String,
    pub prognosis: String,
    pub created_at: i64,
    pub synced: bool,
    pub owner_user_id: Option<String>,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
}

impl From<CalculationRecord> for FfiCalculationRecord {
    fn from(record: CalculationRecord) -> Self {
        Self {
            zones: record.measurements().into_iter().map(Into::into).collect(),
            id: record.id,
            age_group: record.age_group.as_str().to_string(),
            total_tbsa: record.total_tbsa,
            itp: record.itp,
            severity: record.severity.as_str().to_string(),
            prognosis: record.prognosis.as_str().to_string(),
            created_at: record.created_at,
            synced: record.synced,
            owner_user_id: record.owner_user_id,
            doctor_id: record.doctor_id,
            patient_id: record.patient_id,
        }
    }
}

/// FFI-safe history filter.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiCalculationFilter {
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub created_from: Option<i64>,
    pub created_to: Option<i64>,
    pub min_tbsa: Option<f64>,
    pub max_tbsa: Option<f64>,
    pub min_itp: Option<f64>,
    pub max_itp: Option<f64>,
}

impl From<FfiCalculationFilter> for CalculationFilter {
    fn from(filter: FfiCalculationFilter) -> Self {
        CalculationFilter {
            patient_id: filter.patient_id,
            patient_name: filter.patient_name,
            created_from: filter.created_from,
            created_to: filter.created_to,
            min_tbsa: filter.min_tbsa,
            max_tbsa: filter.max_tbsa,
            min_itp: filter.min_itp,
            max_itp: filter.max_itp,
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub doctor_id: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: i64,
}

impl From<PatientRecord> for FfiPatient {
    fn from(patient: PatientRecord) -> Self {
        Self {
            id: patient.id,
            doctor_id: patient.doctor_id,
            full_name: patient.full_name,
            phone: patient.phone,
            address: patient.address,
            created_at: patient.created_at,
        }
    }
}

/// FFI-safe notification schedule.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotificationSchedule {
    pub id: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub calculation_id: String,
    pub patient_name: String,
    pub checkup_timestamp: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub last_notified: Option<i64>,
    pub notification_id: Option<String>,
}

impl From<NotificationSchedule> for FfiNotificationSchedule {
    fn from(schedule: NotificationSchedule) -> Self {
        Self {
            id: schedule.id,
            doctor_id: schedule.doctor_id,
            patient_id: schedule.patient_id,
            calculation_id: schedule.calculation_id,
            patient_name: schedule.patient_name,
            checkup_timestamp: schedule.checkup_timestamp,
            is_active: schedule.is_active,
            created_at: schedule.created_at,
            last_notified: schedule.last_notified,
            notification_id: schedule.notification_id,
        }
    }
}

/// FFI-safe sync report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSyncReport {
    pub offline: bool,
    pub pushed: Vec<String>,
    pub skipped_unassigned: Vec<String>,
    pub failed: Vec<String>,
}

impl From<SyncReport> for FfiSyncReport {
    fn from(report: SyncReport) -> Self {
        Self {
            offline: report.offline,
            pushed: report.pushed,
            skipped_unassigned: report.skipped_unassigned,
            failed: report.failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysOnline;

    impl NetworkStatus for AlwaysOnline {
        fn is_online(&self) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct RecordingRemote {
        paths: Mutex<Vec<String>>,
    }

    impl RemoteDocumentStore for RecordingRemote {
        fn put(
            &self,
            path: String,
            _document_json: String,
            _timeout_ms: u64,
        ) -> Result<(), BurnCalcError> {
            self.paths.lock().unwrap().push(path);
            Ok(())
        }
    }

    fn adult_zones() -> Vec<FfiZone> {
        vec![
            FfiZone {
                body_part: "front".into(),
                fraction: 1.0,
                degree: 2,
            },
            FfiZone {
                body_part: "left_leg".into(),
                fraction: 0.5,
                degree: 3,
            },
        ]
    }

    #[test]
    fn test_compute_result_via_ffi() {
        let core = open_database_in_memory().unwrap();
        let result = core.compute_result("adult".into(), adult_zones()).unwrap();
        assert_eq!(result.total_tbsa, 27.0);
        assert_eq!(result.itp, 45.0);
        assert_eq!(result.severity, "moderate");
        assert_eq!(result.prognosis, "questionable");
    }

    #[test]
    fn test_compute_result_rejects_bad_zone() {
        let core = open_database_in_memory().unwrap();
        let zones = vec![FfiZone {
            body_part: "tail".into(),
            fraction: 1.0,
            degree: 2,
        }];
        assert!(matches!(
            core.compute_result("adult".into(), zones),
            Err(BurnCalcError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_save_requires_session() {
        let core = open_database_in_memory().unwrap();
        let result = core.save_calculation("u-1".into(), "adult".into(), adult_zones(), None);
        assert!(matches!(result, Err(BurnCalcError::IdentityError(_))));
    }

    #[test]
    fn test_doctor_registration_without_secret_is_unauthorized() {
        let core = open_database_in_memory().unwrap();
        let result = core.register("doc-1".into(), "doctor".into(), None);
        assert!(matches!(result, Err(BurnCalcError::Unauthorized(_))));
    }

    #[test]
    fn test_login_rejects_unknown_role() {
        let core = open_database_in_memory().unwrap();
        let result = core.login("u-1".into(), "admin".into());
        assert!(matches!(result, Err(BurnCalcError::InvalidInput(_))));
        assert!(matches!(
            core.list_calculations("u-1".into()),
            Err(BurnCalcError::IdentityError(_))
        ));
    }

    #[test]
    fn test_patient_cannot_create_patients() {
        let core = open_database_in_memory().unwrap();
        core.register("u-1".into(), "patient".into(), None).unwrap();
        let result = core.create_patient("u-1".into(), "Ivan".into(), None, None);
        assert!(matches!(result, Err(BurnCalcError::Unauthorized(_))));
    }

    #[test]
    fn test_doctor_flow_save_attach_reconcile() {
        let config = CoreConfig::default().with_doctor_secret("burn-unit");
        let core = BurnCalcCore::new(Database::open_in_memory().unwrap(), config);
        core.register("doc-1".into(), "doctor".into(), Some("burn-unit".into()))
            .unwrap();

        let patient = core
            .create_patient("doc-1".into(), "Ivan Petrov".into(), None, None)
            .unwrap();
        let calc = core
            .save_calculation("doc-1".into(), "adult".into(), adult_zones(), None)
            .unwrap();

        let remote = Arc::new(RecordingRemote::default());
        let report = core
            .reconcile("doc-1".into(), remote.clone(), Arc::new(AlwaysOnline))
            .unwrap();
        assert_eq!(report.skipped_unassigned, vec![calc.id.clone()]);
        assert!(remote.paths.lock().unwrap().is_empty());

        core.attach_patient("doc-1".into(), calc.id.clone(), patient.id.clone())
            .unwrap();
        let report = core
            .reconcile("doc-1".into(), remote.clone(), Arc::new(AlwaysOnline))
            .unwrap();
        assert_eq!(report.pushed, vec![calc.id.clone()]);
        assert_eq!(
            remote.paths.lock().unwrap().as_slice(),
            &[format!(
                "doctorPatients/doc-1/patients/{}/calculations/{}",
                patient.id, calc.id
            )]
        );
        assert!(!core.has_unsynced_changes("doc-1".into()).unwrap());
    }

    #[test]
    fn test_schedule_checkup_supersedes_previous() {
        let config = CoreConfig::default().with_doctor_secret("burn-unit");
        let core = BurnCalcCore::new(Database::open_in_memory().unwrap(), config);
        core.register("doc-1".into(), "doctor".into(), Some("burn-unit".into()))
            .unwrap();
        let patient = core
            .create_patient("doc-1".into(), "Ivan Petrov".into(), None, None)
            .unwrap();

        let in_a_day = chrono::Utc::now().timestamp_millis() + 86_400_000;
        let first = core
            .schedule_checkup("doc-1".into(), patient.id.clone(), "c-1".into(), in_a_day)
            .unwrap();
        let second = core
            .schedule_checkup(
                "doc-1".into(),
                patient.id.clone(),
                "c-2".into(),
                in_a_day + 1,
            )
            .unwrap();

        let active = core.list_active_schedules("doc-1".into()).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
        assert_eq!(active[0].patient_name, "Ivan Petrov");

        core.cancel_schedule("doc-1".into(), first.id.clone())
            .unwrap();
        assert!(matches!(
            core.cancel_schedule("doc-1".into(), first.id),
            Err(BurnCalcError::NotFound(_))
        ));
    }
}
