//! Explicit login session and role resolution.
//!
//! The session is an owned object whose lifecycle follows login/logout;
//! it is passed by reference to whatever needs the caller's identity.

use std::sync::RwLock;

use thiserror::Error;

use crate::config::CoreConfig;
use crate::models::{Identity, Role};

/// Identity and authorization errors. Never retried automatically.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdentityError {
    #[error("No active session")]
    NoSession,

    #[error("Caller {caller} does not match the active session")]
    CallerMismatch { caller: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Session state unavailable: {0}")]
    Unavailable(String),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Supplies the role of a caller.
pub trait IdentityResolver {
    fn resolve(&self, caller_id: &str) -> IdentityResult<Identity>;
}

/// Holder for the currently logged-in identity.
#[derive(Debug, Default)]
pub struct SessionHandle {
    current: RwLock<Option<Identity>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, replacing any previous one.
    pub fn login(&self, identity: Identity) -> IdentityResult<()> {
        let mut current = self
            .current
            .write()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        tracing::info!(user_id = %identity.user_id, role = %identity.role, "session started");
        *current = Some(identity);
        Ok(())
    }

    /// End the session. Returns the identity that was logged in, if any.
    pub fn logout(&self) -> IdentityResult<Option<Identity>> {
        let mut current = self
            .current
            .write()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        let previous = current.take();
        if let Some(identity) = &previous {
            tracing::info!(user_id = %identity.user_id, "session ended");
        }
        Ok(previous)
    }

    pub fn current(&self) -> IdentityResult<Option<Identity>> {
        self.current
            .read()
            .map(|current| current.clone())
            .map_err(|e| IdentityError::Unavailable(e.to_string()))
    }
}

impl IdentityResolver for SessionHandle {
    fn resolve(&self, caller_id: &str) -> IdentityResult<Identity> {
        match self.current()? {
            None => Err(IdentityError::NoSession),
            Some(identity) if identity.user_id == caller_id => Ok(identity),
            Some(_) => Err(IdentityError::CallerMismatch {
                caller: caller_id.to_string(),
            }),
        }
    }
}

/// Gate for registering a new identity.
///
/// Patients register freely. Doctors must supply the shared secret; a
/// missing or wrong secret is an error, never a downgrade to patient.
pub fn register(
    user_id: &str,
    role: Role,
    secret: Option<&str>,
    config: &CoreConfig,
) -> IdentityResult<Identity> {
    match role {
        Role::Patient => Ok(Identity::new(user_id, role)),
        Role::Doctor => match secret {
            Some(secret) if config.verify_doctor_secret(secret) => {
                Ok(Identity::new(user_id, role))
            }
            Some(_) => {
                tracing::warn!(user_id, "doctor registration rejected: secret mismatch");
                Err(IdentityError::Unauthorized(
                    "Invalid doctor registration secret".into(),
                ))
            }
            None => Err(IdentityError::Unauthorized(
                "Doctor registration requires a secret".into(),
            )),
        },
    }
}
