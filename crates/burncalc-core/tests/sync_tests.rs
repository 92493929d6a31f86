//! Reconciler integration tests against the SQLite store and the
//! in-memory remote.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use burncalc_core::db::Database;
use burncalc_core::models::{
    AgeGroup, BodyPart, BurnDegree, BurnFraction, CalculationRecord, Identity, PatientRecord,
    Role, ZoneInput,
};
use burncalc_core::session::SessionHandle;
use burncalc_core::sync::{
    InMemoryRemoteStore, Reconciler, RemoteError, RemotePath, RemoteResult, RemoteStore,
    StaticConnectivity,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn calculation(author: &Identity, patient_id: Option<&str>) -> CalculationRecord {
    CalculationRecord::new(
        AgeGroup::Child5To14,
        vec![
            ZoneInput::new(BodyPart::Head, BurnFraction::Full, BurnDegree::Second),
            ZoneInput::new(BodyPart::RightArm, BurnFraction::Half, BurnDegree::Third),
        ],
        author,
        patient_id.map(String::from),
    )
}

fn session_for(identity: &Identity) -> SessionHandle {
    let session = SessionHandle::new();
    session.login(identity.clone()).unwrap();
    session
}

/// Fails the first `failures` puts, then delegates.
struct FlakyRemote {
    inner: InMemoryRemoteStore,
    failures: AtomicUsize,
}

impl FlakyRemote {
    fn new(failures: usize) -> Self {
        Self {
            inner: InMemoryRemoteStore::new(),
            failures: AtomicUsize::new(failures),
        }
    }
}

impl RemoteStore for FlakyRemote {
    fn put(
        &self,
        path: &RemotePath,
        document: &serde_json::Value,
        timeout: Duration,
    ) -> RemoteResult<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RemoteError::Timeout(timeout));
        }
        self.inner.put(path, document, timeout)
    }
}

#[test]
fn test_second_reconcile_is_noop() {
    let me = Identity::new("u-1", Role::Patient);
    let db = Database::open_in_memory().unwrap();
    let remote = InMemoryRemoteStore::new();
    let online = StaticConnectivity::new(true);
    let session = session_for(&me);

    for _ in 0..3 {
        db.insert_calculation(&calculation(&me, None)).unwrap();
    }

    let reconciler = Reconciler::new(&db, &remote, &online, &session, TIMEOUT);
    let first = reconciler.reconcile("u-1").unwrap();
    assert_eq!(first.pushed.len(), 3);
    assert_eq!(remote.effective_writes(), 3);

    let second = reconciler.reconcile("u-1").unwrap();
    assert!(second.pushed.is_empty());
    assert_eq!(remote.effective_writes(), 3);
    assert_eq!(remote.len(), 3);
}

#[test]
fn test_failed_push_retried_on_next_run() {
    let me = Identity::new("u-1", Role::Patient);
    let db = Database::open_in_memory().unwrap();
    let remote = FlakyRemote::new(1);
    let online = StaticConnectivity::new(true);
    let session = session_for(&me);

    let record = calculation(&me, None);
    db.insert_calculation(&record).unwrap();

    let reconciler = Reconciler::new(&db, &remote, &online, &session, TIMEOUT);
    let first = reconciler.reconcile("u-1").unwrap();
    assert_eq!(first.failed, vec![record.id.clone()]);
    assert!(!db.get_calculation(&record.id).unwrap().unwrap().synced);

    let second = reconciler.reconcile("u-1").unwrap();
    assert_eq!(second.pushed, vec![record.id.clone()]);
    assert!(db.get_calculation(&record.id).unwrap().unwrap().synced);
    assert_eq!(remote.inner.len(), 1);
}

#[test]
fn test_going_online_flushes_offline_saves() {
    let me = Identity::new("u-1", Role::Patient);
    let db = Database::open_in_memory().unwrap();
    let remote = InMemoryRemoteStore::new();
    let online = StaticConnectivity::new(false);
    let session = session_for(&me);

    db.insert_calculation(&calculation(&me, None)).unwrap();
    let reconciler = Reconciler::new(&db, &remote, &online, &session, TIMEOUT);

    assert!(reconciler.reconcile("u-1").unwrap().offline);
    assert!(remote.is_empty());

    online.set_online(true);
    let report = reconciler.reconcile("u-1").unwrap();
    assert!(report.is_complete());
    assert_eq!(remote.len(), 1);
}

#[test]
fn test_doctor_calculation_syncs_after_attach() {
    let doctor = Identity::new("doc-1", Role::Doctor);
    let db = Database::open_in_memory().unwrap();
    let remote = InMemoryRemoteStore::new();
    let online = StaticConnectivity::new(true);
    let session = session_for(&doctor);

    let patient = PatientRecord::new("doc-1".into(), "Anna Sidorova".into());
    db.insert_patient(&patient).unwrap();
    let record = calculation(&doctor, None);
    db.insert_calculation(&record).unwrap();

    let reconciler = Reconciler::new(&db, &remote, &online, &session, TIMEOUT);
    let report = reconciler.reconcile("doc-1").unwrap();
    assert_eq!(report.skipped_unassigned, vec![record.id.clone()]);
    assert!(remote.is_empty());

    assert!(db
        .attach_calculation_to_patient(&record.id, &patient.id)
        .unwrap());
    let report = reconciler.reconcile("doc-1").unwrap();
    assert_eq!(report.pushed, vec![record.id.clone()]);

    let path = format!(
        "doctorPatients/doc-1/patients/{}/calculations/{}",
        patient.id, record.id
    );
    let document = remote.get(&path).unwrap();
    assert_eq!(document["id"], record.id.as_str());
    assert_eq!(document["patientId"], patient.id.as_str());
    assert!(document.get("synced").is_none());
}

#[test]
fn test_reconcile_only_pushes_callers_records() {
    let me = Identity::new("u-1", Role::Patient);
    let other = Identity::new("u-2", Role::Patient);
    let db = Database::open_in_memory().unwrap();
    let remote = InMemoryRemoteStore::new();
    let online = StaticConnectivity::new(true);
    let session = session_for(&me);

    let mine = calculation(&me, None);
    let theirs = calculation(&other, None);
    db.insert_calculation(&mine).unwrap();
    db.insert_calculation(&theirs).unwrap();

    let reconciler = Reconciler::new(&db, &remote, &online, &session, TIMEOUT);
    let report = reconciler.reconcile("u-1").unwrap();

    assert_eq!(report.pushed, vec![mine.id.clone()]);
    assert_eq!(
        remote.paths(),
        vec![format!("users/u-1/calculations/{}", mine.id)]
    );
    assert!(!db.get_calculation(&theirs.id).unwrap().unwrap().synced);
}

#[test]
fn test_pushed_document_round_trips_result() {
    let me = Identity::new("u-1", Role::Patient);
    let db = Database::open_in_memory().unwrap();
    let remote = InMemoryRemoteStore::new();
    let online = StaticConnectivity::new(true);
    let session = session_for(&me);

    let record = calculation(&me, None);
    db.insert_calculation(&record).unwrap();
    Reconciler::new(&db, &remote, &online, &session, TIMEOUT)
        .reconcile("u-1")
        .unwrap();

    let document = remote
        .get(&format!("users/u-1/calculations/{}", record.id))
        .unwrap();
    assert_eq!(document["totalTBSA"], record.total_tbsa);
    assert_eq!(document["itp"], record.itp);
    assert_eq!(document["severity"], record.severity.as_str());
    assert_eq!(document["zones"].as_array().unwrap().len(), 2);
}

#[test]
fn test_concurrent_reconciles_push_each_record_once() {
    let me = Identity::new("u-1", Role::Patient);
    let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
    let remote = Arc::new(InMemoryRemoteStore::new());
    let online = Arc::new(StaticConnectivity::new(true));
    let session = Arc::new(session_for(&me));

    {
        let db = db.lock().unwrap();
        for _ in 0..10 {
            db.insert_calculation(&calculation(&me, None)).unwrap();
        }
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = Arc::clone(&db);
            let remote = Arc::clone(&remote);
            let online = Arc::clone(&online);
            let session = Arc::clone(&session);
            thread::spawn(move || {
                Reconciler::new(
                    db.as_ref(),
                    remote.as_ref(),
                    online.as_ref(),
                    session.as_ref(),
                    TIMEOUT,
                )
                .reconcile("u-1")
                .unwrap()
            })
        })
        .collect();

    for handle in handles {
        let report = handle.join().unwrap();
        assert!(report.failed.is_empty());
    }

    assert_eq!(remote.len(), 10);
    assert_eq!(remote.effective_writes(), 10);
    assert!(db
        .lock()
        .unwrap()
        .list_unsynced_calculations(None)
        .unwrap()
        .is_empty());
}
