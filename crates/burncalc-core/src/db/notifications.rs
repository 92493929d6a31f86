//! Notification schedule database operations.

use rusqlite::{params, types::Value, Connection, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{NotificationSchedule, ScheduleUpdate};

const SCHEDULE_COLUMNS: &str = r#"
    id, doctor_id, patient_id, calculation_id, patient_name,
    next_checkup_date, is_active, created_at, last_notified, notification_id
"#;

impl Database {
    /// Insert a new schedule.
    pub fn insert_schedule(&self, schedule: &NotificationSchedule) -> DbResult<()> {
        insert_schedule_row(&self.conn, schedule)?;
        Ok(())
    }

    /// Insert `schedule` as the patient's only active schedule.
    ///
    /// Earlier active schedules are deactivated in the same transaction;
    /// on failure none of them change. Returns how many were deactivated.
    pub fn replace_patient_schedule(&mut self, schedule: &NotificationSchedule) -> DbResult<usize> {
        let tx = self.transaction()?;
        let deactivated = deactivate_patient_rows(&tx, &schedule.patient_id)?;
        insert_schedule_row(&tx, schedule)?;
        tx.commit()?;
        Ok(deactivated)
    }

    /// Get a schedule by ID.
    pub fn get_schedule(&self, id: &str) -> DbResult<Option<NotificationSchedule>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM notification_schedules WHERE id = ?",
                    SCHEDULE_COLUMNS
                ),
                [id],
                schedule_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a doctor's active schedules, soonest checkup first.
    pub fn list_active_schedules(&self, doctor_id: &str) -> DbResult<Vec<NotificationSchedule>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM notification_schedules
            WHERE doctor_id = ? AND is_active = 1
            ORDER BY next_checkup_date ASC
            "#,
            SCHEDULE_COLUMNS
        ))?;

        let rows = stmt.query_map([doctor_id], schedule_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List a doctor's active schedules whose checkup is still ahead of `now`.
    pub fn list_upcoming_schedules(
        &self,
        doctor_id: &str,
        now_millis: i64,
        limit: usize,
    ) -> DbResult<Vec<NotificationSchedule>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM notification_schedules
            WHERE doctor_id = ? AND is_active = 1 AND next_checkup_date > ?
            ORDER BY next_checkup_date ASC
            LIMIT ?
            "#,
            SCHEDULE_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![doctor_id, now_millis, limit as i64],
            schedule_from_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Apply a partial update. Returns false if nothing was changed.
    pub fn update_schedule(&self, id: &str, update: &ScheduleUpdate) -> DbResult<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let mut fields = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(checkup) = update.checkup_timestamp {
            fields.push("next_checkup_date = ?");
            values.push(Value::Integer(checkup));
        }
        if let Some(active) = update.is_active {
            fields.push("is_active = ?");
            values.push(Value::Integer(active as i64));
        }
        if let Some(notified) = update.last_notified {
            fields.push("last_notified = ?");
            values.push(Value::Integer(notified));
        }
        if let Some(notification_id) = &update.notification_id {
            fields.push("notification_id = ?");
            values.push(Value::Text(notification_id.clone()));
        }
        values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE notification_schedules SET {} WHERE id = ?",
            fields.join(", ")
        );
        let rows_affected = self
            .conn
            .execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(rows_affected > 0)
    }

    /// Deactivate a single schedule.
    pub fn deactivate_schedule(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE notification_schedules SET is_active = 0 WHERE id = ? AND is_active = 1",
            [id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Deactivate every active schedule for a patient, e.g. when a new
    /// follow-up replaces them. Returns how many were deactivated.
    pub fn deactivate_patient_schedules(&self, patient_id: &str) -> DbResult<usize> {
        Ok(deactivate_patient_rows(&self.conn, patient_id)?)
    }

    /// Deactivate every schedule whose checkup time has passed.
    pub fn deactivate_expired_schedules(&self, now_millis: i64) -> DbResult<usize> {
        let rows_affected = self.conn.execute(
            "UPDATE notification_schedules SET is_active = 0 WHERE is_active = 1 AND next_checkup_date <= ?",
            [now_millis],
        )?;
        Ok(rows_affected)
    }

    /// Hard-delete a schedule. Only for explicit user cancellation.
    pub fn delete_schedule(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM notification_schedules WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn insert_schedule_row(
    conn: &Connection,
    schedule: &NotificationSchedule,
) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        INSERT INTO notification_schedules (
            id, doctor_id, patient_id, calculation_id, patient_name,
            next_checkup_date, is_active, created_at, last_notified, notification_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            schedule.id,
            schedule.doctor_id,
            schedule.patient_id,
            schedule.calculation_id,
            schedule.patient_name,
            schedule.checkup_timestamp,
            schedule.is_active,
            schedule.created_at,
            schedule.last_notified,
            schedule.notification_id,
        ],
    )
}

fn deactivate_patient_rows(conn: &Connection, patient_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE notification_schedules SET is_active = 0 WHERE patient_id = ? AND is_active = 1",
        [patient_id],
    )
}

fn schedule_from_row(row: &Row<'_>) -> rusqlite::Result<NotificationSchedule> {
    Ok(NotificationSchedule {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        patient_id: row.get(2)?,
        calculation_id: row.get(3)?,
        patient_name: row.get(4)?,
        checkup_timestamp: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
        last_notified: row.get(8)?,
        notification_id: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn schedule(doctor: &str, patient: &str, checkup: i64) -> NotificationSchedule {
        NotificationSchedule::new(
            doctor.into(),
            patient.into(),
            "calc-1".into(),
            "Ivan".into(),
            checkup,
        )
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();
        let s = schedule("doc-1", "p-1", 5_000);
        db.insert_schedule(&s).unwrap();

        let retrieved = db.get_schedule(&s.id).unwrap().unwrap();
        assert_eq!(retrieved, s);
    }

    #[test]
    fn test_list_active_sorted() {
        let db = setup_db();
        let later = schedule("doc-1", "p-1", 9_000);
        let sooner = schedule("doc-1", "p-2", 3_000);
        let other = schedule("doc-2", "p-3", 1_000);
        db.insert_schedule(&later).unwrap();
        db.insert_schedule(&sooner).unwrap();
        db.insert_schedule(&other).unwrap();

        let active = db.list_active_schedules("doc-1").unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, sooner.id);
        assert_eq!(active[1].id, later.id);
    }

    #[test]
    fn test_upcoming_excludes_past() {
        let db = setup_db();
        db.insert_schedule(&schedule("doc-1", "p-1", 1_000)).unwrap();
        let future = schedule("doc-1", "p-2", 10_000);
        db.insert_schedule(&future).unwrap();

        let upcoming = db.list_upcoming_schedules("doc-1", 5_000, 10).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, future.id);
    }

    #[test]
    fn test_deactivate_expired_keeps_rows() {
        let db = setup_db();
        let past = schedule("doc-1", "p-1", 1_000);
        let future = schedule("doc-1", "p-2", 10_000);
        db.insert_schedule(&past).unwrap();
        db.insert_schedule(&future).unwrap();

        assert_eq!(db.deactivate_expired_schedules(5_000).unwrap(), 1);
        assert_eq!(db.deactivate_expired_schedules(5_000).unwrap(), 0);

        let expired = db.get_schedule(&past.id).unwrap().unwrap();
        assert!(!expired.is_active);
        assert_eq!(db.list_active_schedules("doc-1").unwrap().len(), 1);
    }

    #[test]
    fn test_deactivate_patient_schedules() {
        let db = setup_db();
        db.insert_schedule(&schedule("doc-1", "p-1", 1_000)).unwrap();
        db.insert_schedule(&schedule("doc-1", "p-1", 2_000)).unwrap();
        db.insert_schedule(&schedule("doc-1", "p-2", 3_000)).unwrap();

        assert_eq!(db.deactivate_patient_schedules("p-1").unwrap(), 2);
        assert_eq!(db.list_active_schedules("doc-1").unwrap().len(), 1);
    }

    #[test]
    fn test_replace_patient_schedule() {
        let mut db = setup_db();
        let old = schedule("doc-1", "p-1", 1_000);
        db.insert_schedule(&old).unwrap();

        let new = schedule("doc-1", "p-1", 2_000);
        assert_eq!(db.replace_patient_schedule(&new).unwrap(), 1);

        let active = db.list_active_schedules("doc-1").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, new.id);
    }

    #[test]
    fn test_failed_replace_keeps_previous_schedule_active() {
        let mut db = setup_db();
        let old = schedule("doc-1", "p-1", 1_000);
        db.insert_schedule(&old).unwrap();

        // Same primary key: the insert fails after the deactivation ran
        let mut clash = schedule("doc-1", "p-1", 2_000);
        clash.id = old.id.clone();
        assert!(db.replace_patient_schedule(&clash).is_err());

        let retrieved = db.get_schedule(&old.id).unwrap().unwrap();
        assert!(retrieved.is_active);
        assert_eq!(retrieved.checkup_timestamp, 1_000);
    }

    #[test]
    fn test_update_schedule() {
        let db = setup_db();
        let s = schedule("doc-1", "p-1", 1_000);
        db.insert_schedule(&s).unwrap();

        assert!(!db.update_schedule(&s.id, &ScheduleUpdate::default()).unwrap());

        let update = ScheduleUpdate {
            checkup_timestamp: Some(2_000),
            last_notified: Some(1_500),
            notification_id: Some("push-42".into()),
            ..Default::default()
        };
        assert!(db.update_schedule(&s.id, &update).unwrap());

        let retrieved = db.get_schedule(&s.id).unwrap().unwrap();
        assert_eq!(retrieved.checkup_timestamp, 2_000);
        assert_eq!(retrieved.last_notified, Some(1_500));
        assert_eq!(retrieved.notification_id.as_deref(), Some("push-42"));
        assert!(retrieved.is_active);
    }

    #[test]
    fn test_delete_schedule() {
        let db = setup_db();
        let s = schedule("doc-1", "p-1", 1_000);
        db.insert_schedule(&s).unwrap();

        assert!(db.delete_schedule(&s.id).unwrap());
        assert!(!db.delete_schedule(&s.id).unwrap());
        assert!(db.get_schedule(&s.id).unwrap().is_none());
    }
}
