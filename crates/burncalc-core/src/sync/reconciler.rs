//! Push locally unsynced calculations to the remote store.
//!
//! Protocol, per call:
//! 1. Offline: return immediately.
//! 2. Resolve the caller's role; failure aborts the call.
//! 3. List the caller's unsynced records.
//! 4. Per record: resolve the destination (doctor records need a patient),
//!    push, then mark synced. Push failures leave the record unsynced.
//!
//! The `synced` flag is the only cursor. Re-running is safe because
//! synced records are never listed again and remote puts are upserts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::{ConnectivityOracle, LocalRecordStore, RemoteCalculation, RemotePath, RemoteStore};
use super::{SyncError, SyncResult};
use crate::session::IdentityResolver;

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Connectivity oracle reported offline; nothing was attempted
    pub offline: bool,
    /// Run was abandoned between records
    pub cancelled: bool,
    /// Records pushed and marked synced
    pub pushed: Vec<String>,
    /// Doctor records skipped because no patient is attached
    pub skipped_unassigned: Vec<String>,
    /// Records whose push failed; still unsynced
    pub failed: Vec<String>,
}

impl SyncReport {
    fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }

    /// True when every listed record was pushed.
    pub fn is_complete(&self) -> bool {
        !self.offline
            && !self.cancelled
            && self.skipped_unassigned.is_empty()
            && self.failed.is_empty()
    }
}

/// Cooperative cancellation for a run in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sync orchestrator. Borrows its collaborators for the duration of a run.
pub struct Reconciler<'a, L: LocalRecordStore + ?Sized> {
    local: &'a L,
    remote: &'a dyn RemoteStore,
    connectivity: &'a dyn ConnectivityOracle,
    identity: &'a dyn IdentityResolver,
    push_timeout: Duration,
}

impl<'a, L: LocalRecordStore + ?Sized> Reconciler<'a, L> {
    /// Create a new reconciler.
    pub fn new(
        local: &'a L,
        remote: &'a dyn RemoteStore,
        connectivity: &'a dyn ConnectivityOracle,
        identity: &'a dyn IdentityResolver,
        push_timeout: Duration,
    ) -> Self {
        Self {
            local,
            remote,
            connectivity,
            identity,
            push_timeout,
        }
    }

    /// Run one reconciliation pass for `caller_id`.
    pub fn reconcile(&self, caller_id: &str) -> SyncResult<SyncReport> {
        self.reconcile_until(caller_id, &CancelFlag::new())
    }

    /// Like [`Reconciler::reconcile`], but stops before the next record once
    /// `cancel` is set. Records already marked stay marked.
    pub fn reconcile_until(&self, caller_id: &str, cancel: &CancelFlag) -> SyncResult<SyncReport> {
        if !self.connectivity.is_online() {
            tracing::debug!(caller_id, "offline, skipping reconciliation");
            return Ok(SyncReport::offline());
        }

        let identity = self.identity.resolve(caller_id)?;
        let unsynced = self.local.list_unsynced(Some(&identity))?;

        tracing::info!(
            caller_id,
            role = %identity.role,
            unsynced = unsynced.len(),
            "reconciliation started"
        );

        let mut report = SyncReport::default();

        for record in &unsynced {
            if cancel.is_cancelled() {
                tracing::info!(caller_id, "reconciliation cancelled");
                report.cancelled = true;
                break;
            }

            let Some(path) = RemotePath::for_record(&identity, record) else {
                tracing::info!(
                    calculation_id = %record.id,
                    "doctor calculation has no patient, not syncing"
                );
                report.skipped_unassigned.push(record.id.clone());
                continue;
            };

            let document = serde_json::to_value(RemoteCalculation::from(record))
                .map_err(SyncError::Encode)?;

            match self.remote.put(&path, &document, self.push_timeout) {
                Ok(()) => {
                    self.local.mark_synced(&record.id)?;
                    report.pushed.push(record.id.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        calculation_id = %record.id,
                        path = %path,
                        error = %e,
                        "push failed, will retry on next reconciliation"
                    );
                    report.failed.push(record.id.clone());
                }
            }
        }

        tracing::info!(
            caller_id,
            pushed = report.pushed.len(),
            skipped = report.skipped_unassigned.len(),
            failed = report.failed.len(),
            "reconciliation finished"
        );

        Ok(report)
    }
}
