//! Core domain logic for coffee-sample batch tracking.
//! This crate is the single source of truth for batch/unit invariants.

pub mod config;
pub mod db;
pub mod gate;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use gate::AdminGate;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::firm::FirmRegistry;
pub use model::lote::{Batch, BatchId, CreatedBatch, NewBatch};
pub use model::validation::ValidationError;
pub use model::via::{PendingUnit, ReportRow, Unit, UnitId, UnitStatus};
pub use repo::lote_repo::{LoteRepository, RepoError, RepoResult, SqliteLoteRepository};
pub use service::lote_service::{
    LoteService, PendingEditPolicy, ServiceError, ServicePolicy, ServiceResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
