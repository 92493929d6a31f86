//! SQLite schema definition.
//!
//! Migration is additive only: every statement is create-if-absent, so the
//! batch can run on every open.

/// Complete database schema for the burn calculator.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY NOT NULL,
    doctor_id TEXT NOT NULL,                     -- owning clinician
    full_name TEXT NOT NULL,
    phone TEXT,
    address TEXT,
    created_at INTEGER NOT NULL                  -- epoch millis
);

CREATE INDEX IF NOT EXISTS idx_patients_doctor ON patients(doctor_id);

-- ============================================================================
-- Calculations
-- ============================================================================

CREATE TABLE IF NOT EXISTS calculations (
    id TEXT PRIMARY KEY NOT NULL,
    owner_user_id TEXT,                          -- patient-authored
    doctor_id TEXT,                              -- doctor-authored
    patient_id TEXT,                             -- NULL until attached
    age_group TEXT NOT NULL,
    zones TEXT NOT NULL,                         -- JSON array of {bodyPart, fraction, degree}
    total_tbsa REAL NOT NULL,
    itp REAL NOT NULL,
    severity TEXT NOT NULL,
    prognosis TEXT NOT NULL,
    created_at INTEGER NOT NULL,                 -- epoch millis
    synced INTEGER NOT NULL DEFAULT 0 CHECK (synced IN (0, 1))
);

CREATE INDEX IF NOT EXISTS idx_calculations_owner ON calculations(owner_user_id);
CREATE INDEX IF NOT EXISTS idx_calculations_doctor ON calculations(doctor_id);
CREATE INDEX IF NOT EXISTS idx_calculations_patient ON calculations(patient_id);
CREATE INDEX IF NOT EXISTS idx_calculations_synced ON calculations(synced);

-- ============================================================================
-- Notification Schedules
-- ============================================================================

CREATE TABLE IF NOT EXISTS notification_schedules (
    id TEXT PRIMARY KEY NOT NULL,
    doctor_id TEXT NOT NULL,
    patient_id TEXT NOT NULL,
    calculation_id TEXT NOT NULL,
    patient_name TEXT NOT NULL,
    next_checkup_date INTEGER NOT NULL,          -- epoch millis
    is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
    created_at INTEGER NOT NULL,
    last_notified INTEGER,
    notification_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_schedules_doctor ON notification_schedules(doctor_id, is_active);
CREATE INDEX IF NOT EXISTS idx_schedules_patient ON notification_schedules(patient_id);
"#;
