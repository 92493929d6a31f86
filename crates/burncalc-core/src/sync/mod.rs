//! Offline-first synchronization of calculations to the remote store.

mod connectivity;
mod reconciler;
mod remote;

pub use connectivity::*;
pub use reconciler::*;
pub use remote::*;

use std::sync::Mutex;

use thiserror::Error;

use crate::db::{Database, DbError, DbResult};
use crate::models::{CalculationRecord, Identity};
use crate::session::IdentityError;

/// Reconciliation errors. Remote failures never appear here; they are
/// per-record and reported in [`SyncReport::failed`].
#[derive(Error, Debug)]
pub enum SyncError {
    /// Caller could not be resolved; configuration or auth problem
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Local store failed; the sync cursor cannot be trusted
    #[error("Local store error: {0}")]
    Local(#[from] DbError),

    #[error("Failed to encode remote document: {0}")]
    Encode(serde_json::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// The slice of the local record store the reconciler needs.
pub trait LocalRecordStore {
    /// Unsynced calculations, optionally scoped to a caller.
    fn list_unsynced(&self, caller: Option<&Identity>) -> DbResult<Vec<CalculationRecord>>;

    /// Flag a calculation as synced. Must be idempotent.
    fn mark_synced(&self, id: &str) -> DbResult<()>;
}

impl LocalRecordStore for Database {
    fn list_unsynced(&self, caller: Option<&Identity>) -> DbResult<Vec<CalculationRecord>> {
        self.list_unsynced_calculations(caller)
    }

    fn mark_synced(&self, id: &str) -> DbResult<()> {
        if self.mark_calculation_synced(id)? {
            Ok(())
        } else {
            Err(DbError::NotFound(id.to_string()))
        }
    }
}

/// Locks per call, so a shared handle is free while a push is in flight.
impl LocalRecordStore for Mutex<Database> {
    fn list_unsynced(&self, caller: Option<&Identity>) -> DbResult<Vec<CalculationRecord>> {
        self.lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))?
            .list_unsynced(caller)
    }

    fn mark_synced(&self, id: &str) -> DbResult<()> {
        self.lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))?
            .mark_synced(id)
    }
}
