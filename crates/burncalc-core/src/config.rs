//! Core configuration, stored as versioned JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

const DEFAULT_PUSH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_UPCOMING_LIMIT: u32 = 10;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config_version {found} is newer than this build supports ({supported})")]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("Config is not a JSON object")]
    NotAnObject,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    /// Upper bound on a single remote push. Added in v1.
    #[serde(default = "default_push_timeout_ms")]
    pub push_timeout_ms: u64,
    /// Hex SHA-256 of the doctor registration secret. `None` disables
    /// doctor registration entirely.
    #[serde(default)]
    pub doctor_secret_sha256: Option<String>,
    /// Page size for upcoming checkup reminders.
    #[serde(default = "default_upcoming_limit")]
    pub upcoming_notification_limit: u32,
}

fn default_push_timeout_ms() -> u64 {
    DEFAULT_PUSH_TIMEOUT_MS
}

fn default_upcoming_limit() -> u32 {
    DEFAULT_UPCOMING_LIMIT
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            push_timeout_ms: DEFAULT_PUSH_TIMEOUT_MS,
            doctor_secret_sha256: None,
            upcoming_notification_limit: DEFAULT_UPCOMING_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Parse config JSON, migrating older versions first.
    pub fn from_json(contents: &str) -> ConfigResult<Self> {
        // Parse as raw JSON so we can run migrations before deserializing.
        let json: serde_json::Value = serde_json::from_str(contents)?;
        let on_disk_version = json
            .get("config_version")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let migrated = migrate(json, on_disk_version)?;
        Ok(serde_json::from_value(migrated)?)
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Write atomically via a temp file, always stamped with the current version.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let mut stamped = self.clone();
        stamped.config_version = CURRENT_VERSION;
        let json = serde_json::to_string_pretty(&stamped)?;

        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json.as_bytes()).map_err(io_err)?;
        std::fs::rename(&tmp_path, path).map_err(io_err)?;

        tracing::info!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Store the digest of a doctor registration secret.
    pub fn with_doctor_secret(mut self, secret: &str) -> Self {
        self.doctor_secret_sha256 = Some(secret_digest(secret));
        self
    }

    /// Check a supplied secret against the stored digest.
    pub fn verify_doctor_secret(&self, secret: &str) -> bool {
        match &self.doctor_secret_sha256 {
            Some(expected) => expected.eq_ignore_ascii_case(&secret_digest(secret)),
            None => false,
        }
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }
}

fn secret_digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u64) -> ConfigResult<serde_json::Value> {
    if from_version > u64::from(CURRENT_VERSION) {
        return Err(ConfigError::UnsupportedVersion {
            found: from_version,
            supported: CURRENT_VERSION,
        });
    }

    // v0 -> v1: add push_timeout_ms
    if from_version < 1 {
        let obj = json.as_object_mut().ok_or(ConfigError::NotAnObject)?;
        obj.entry("push_timeout_ms")
            .or_insert(serde_json::Value::from(DEFAULT_PUSH_TIMEOUT_MS));
        obj.insert("config_version".to_string(), serde_json::Value::from(1));
        tracing::info!("migrated config v0 -> v1 (added push_timeout_ms)");
    }

    Ok(json)
}
