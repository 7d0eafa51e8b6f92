//! Deployment configuration.
//!
//! # Responsibility
//! - Load the JSON settings file that injects the firm list, the pending-edit
//!   policy, the admin secret, and store/log locations.
//! - Reject settings that would make the workflow unusable.
//!
//! # Invariants
//! - Every field has a default, so an empty object `{}` is a valid file.

use crate::logging::default_log_level;
use crate::model::firm::FirmRegistry;
use crate::service::lote_service::{PendingEditPolicy, ServicePolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE_PATH: &str = "lotes.db";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Application settings, mirroring the JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite store file.
    pub database_path: PathBuf,
    /// Accepted buyer firms, in picker order.
    pub firms: FirmRegistry,
    pub pending_edit: PendingEditPolicy,
    /// Shared secret unlocking batch creation and report edit/delete.
    /// `None` locks those actions entirely.
    pub admin_secret: Option<String>,
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            firms: FirmRegistry::default(),
            pending_edit: PendingEditPolicy::default(),
            admin_secret: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Reads and validates a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parses and validates settings from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.firms.names().is_empty() {
            return Err(ConfigError::Invalid("firms must not be empty".to_string()));
        }

        let mut seen = BTreeSet::new();
        for firm in self.firms.names() {
            let trimmed = firm.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid(
                    "firm names must not be blank".to_string(),
                ));
            }
            if trimmed != firm {
                return Err(ConfigError::Invalid(format!(
                    "firm `{firm}` has surrounding whitespace"
                )));
            }
            if !seen.insert(trimmed) {
                return Err(ConfigError::Invalid(format!("duplicate firm `{firm}`")));
            }
        }

        if let Some(secret) = &self.admin_secret {
            if secret.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "admin_secret must not be blank; omit it to lock admin actions".to_string(),
                ));
            }
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "database_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Rules handed to the service.
    pub fn service_policy(&self) -> ServicePolicy {
        ServicePolicy {
            firms: self.firms.clone(),
            pending_edit: self.pending_edit,
        }
    }
}
