//! Patient database operations.
//!
//! Every read is scoped to the owning doctor except [`Database::get_patient`],
//! which the attach flow uses after its own ownership check.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::PatientRecord;

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &PatientRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (id, doctor_id, full_name, phone, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                patient.id,
                patient.doctor_id,
                patient.full_name,
                patient.phone,
                patient.address,
                patient.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a patient by ID, regardless of owner.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<PatientRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT id, doctor_id, full_name, phone, address, created_at
                FROM patients
                WHERE id = ?
                "#,
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a patient by ID only if `doctor_id` owns it.
    pub fn get_patient_for_doctor(
        &self,
        doctor_id: &str,
        id: &str,
    ) -> DbResult<Option<PatientRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT id, doctor_id, full_name, phone, address, created_at
                FROM patients
                WHERE id = ? AND doctor_id = ?
                "#,
                [id, doctor_id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a doctor's patients, newest first.
    pub fn list_patients_by_doctor(&self, doctor_id: &str) -> DbResult<Vec<PatientRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, doctor_id, full_name, phone, address, created_at
            FROM patients
            WHERE doctor_id = ?
            ORDER BY created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([doctor_id], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Search a doctor's patients by name (case-insensitive substring).
    pub fn search_patients_by_doctor(
        &self,
        doctor_id: &str,
        query: &str,
        limit: usize,
    ) -> DbResult<Vec<PatientRecord>> {
        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, doctor_id, full_name, phone, address, created_at
            FROM patients
            WHERE doctor_id = ? AND full_name LIKE ? ESCAPE '\'
            ORDER BY full_name
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![doctor_id, pattern, limit as i64], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<PatientRecord> {
    Ok(PatientRecord {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        full_name: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        created_at: row.get(5)?,
    })
}
