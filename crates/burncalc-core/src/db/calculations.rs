//! Calculation record database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{CalculationRecord, Identity, Role, ZoneInput};

const CALCULATION_COLUMNS: &str = r#"
    id, owner_user_id, doctor_id, patient_id, age_group, zones,
    total_tbsa, itp, severity, prognosis, created_at, synced
"#;

impl Database {
    /// Insert a new calculation record.
    ///
    /// Rejects records whose stored result disagrees with their zones.
    pub fn insert_calculation(&self, record: &CalculationRecord) -> DbResult<()> {
        if !record.is_consistent() {
            return Err(DbError::Constraint(format!(
                "Calculation {} does not match its zones",
                record.id
            )));
        }

        let zones_json = serde_json::to_string(&record.zones)?;

        self.conn.execute(
            r#"
            INSERT INTO calculations (
                id, owner_user_id, doctor_id, patient_id, age_group, zones,
                total_tbsa, itp, severity, prognosis, created_at, synced
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                record.id,
                record.owner_user_id,
                record.doctor_id,
                record.patient_id,
                record.age_group.as_str(),
                zones_json,
                record.total_tbsa,
                record.itp,
                record.severity.as_str(),
                record.prognosis.as_str(),
                record.created_at,
                record.synced,
            ],
        )?;
        Ok(())
    }

    /// Get a calculation by ID.
    pub fn get_calculation(&self, id: &str) -> DbResult<Option<CalculationRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM calculations WHERE id = ?", CALCULATION_COLUMNS),
                [id],
                CalculationRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List calculations visible to a caller, newest first.
    ///
    /// Patients see what they calculated for themselves; doctors see what
    /// they authored.
    pub fn list_calculations_by_owner(&self, owner: &Identity) -> DbResult<Vec<CalculationRecord>> {
        let filter = match owner.role {
            Role::Patient => "owner_user_id = ?",
            Role::Doctor => "doctor_id = ?",
        };
        self.query_calculations(
            &format!(
                "SELECT {} FROM calculations WHERE {} ORDER BY created_at DESC",
                CALCULATION_COLUMNS, filter
            ),
            params![owner.user_id],
        )
    }

    /// List a doctor's calculations attached to one patient, newest first.
    pub fn list_calculations_for_patient(
        &self,
        doctor_id: &str,
        patient_id: &str,
    ) -> DbResult<Vec<CalculationRecord>> {
        self.query_calculations(
            &format!(
                "SELECT {} FROM calculations WHERE doctor_id = ? AND patient_id = ? ORDER BY created_at DESC",
                CALCULATION_COLUMNS
            ),
            params![doctor_id, patient_id],
        )
    }

    /// List calculations not yet upserted to the remote store, oldest first.
    ///
    /// With a caller, only records visible to that caller are returned.
    pub fn list_unsynced_calculations(
        &self,
        caller: Option<&Identity>,
    ) -> DbResult<Vec<CalculationRecord>> {
        match caller {
            None => self.query_calculations(
                &format!(
                    "SELECT {} FROM calculations WHERE synced = 0 ORDER BY created_at ASC",
                    CALCULATION_COLUMNS
                ),
                [],
            ),
            Some(identity) => {
                let filter = match identity.role {
                    Role::Patient => "owner_user_id = ?",
                    Role::Doctor => "doctor_id = ?",
                };
                self.query_calculations(
                    &format!(
                        "SELECT {} FROM calculations WHERE synced = 0 AND {} ORDER BY created_at ASC",
                        CALCULATION_COLUMNS, filter
                    ),
                    params![identity.user_id],
                )
            }
        }
    }

    /// Flag a calculation as synced. Idempotent.
    pub fn mark_calculation_synced(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("UPDATE calculations SET synced = 1 WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Attach a doctor-authored, still unsynced calculation to a patient
    /// owned by the same doctor. Later calls overwrite earlier ones.
    ///
    /// Returns false when no such calculation/patient pairing exists.
    pub fn attach_calculation_to_patient(
        &self,
        calculation_id: &str,
        patient_id: &str,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE calculations SET patient_id = ?2
            WHERE id = ?1
              AND synced = 0
              AND doctor_id IS NOT NULL
              AND doctor_id = (SELECT doctor_id FROM patients WHERE id = ?2)
            "#,
            params![calculation_id, patient_id],
        )?;
        Ok(rows_affected > 0)
    }

    fn query_calculations<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> DbResult<Vec<CalculationRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, CalculationRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }
}

/// Intermediate row struct for database mapping.
struct CalculationRow {
    id: String,
    owner_user_id: Option<String>,
    doctor_id: Option<String>,
    patient_id: Option<String>,
    age_group: String,
    zones: String,
    total_tbsa: f64,
    itp: f64,
    severity: String,
    prognosis: String,
    created_at: i64,
    synced: bool,
}

impl CalculationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(CalculationRow {
            id: row.get(0)?,
            owner_user_id: row.get(1)?,
            doctor_id: row.get(2)?,
            patient_id: row.get(3)?,
            age_group: row.get(4)?,
            zones: row.get(5)?,
            total_tbsa: row.get(6)?,
            itp: row.get(7)?,
            severity: row.get(8)?,
            prognosis: row.get(9)?,
            created_at: row.get(10)?,
            synced: row.get(11)?,
        })
    }
}

impl TryFrom<CalculationRow> for CalculationRecord {
    type Error = DbError;

    fn try_from(row: CalculationRow) -> Result<Self, Self::Error> {
        let zones: Vec<ZoneInput> = serde_json::from_str(&row.zones)?;

        Ok(CalculationRecord {
            id: row.id,
            age_group: row
                .age_group
                .parse()
                .map_err(|e: crate::models::ZoneParseError| DbError::Constraint(e.to_string()))?,
            zones,
            total_tbsa: row.total_tbsa,
            itp: row.itp,
            severity: row.severity.parse().map_err(DbError::Constraint)?,
            prognosis: row.prognosis.parse().map_err(DbError::Constraint)?,
            created_at: row.created_at,
            synced: row.synced,
            owner_user_id: row.owner_user_id,
            doctor_id: row.doctor_id,
            patient_id: row.patient_id,
        })
    }
}
