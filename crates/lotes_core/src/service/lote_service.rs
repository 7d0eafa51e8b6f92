//! Batch/unit use-case service.
//!
//! # Responsibility
//! - Validate user input before any store access.
//! - Create a batch and all of its units as one transaction.
//! - Drive the `Pending -> Delivered` transition and later firm/agent edits.
//!
//! # Invariants
//! - A failed validation never reaches the repository.
//! - `create_batch` leaves either the batch plus all units, or nothing.
//! - Missing units surface as `NotFound`; a second delivery as `Conflict`.
//! - Log lines carry ids and counts only, never agent names.

use crate::model::firm::FirmRegistry;
use crate::model::lote::{Batch, BatchId, CreatedBatch};
use crate::model::validation::{validate_agent, validate_new_batch, ValidationError};
use crate::model::via::{truncate_to_seconds, PendingUnit, ReportRow, Unit, UnitId};
use crate::repo::lote_repo::{LoteRepository, RepoError};
use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Whether firm/agent may be edited on a unit that is still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingEditPolicy {
    /// Pending units accept edits and stay pending.
    #[default]
    Allow,
    /// Only delivered units can be edited.
    Forbid,
}

/// Deployment-specific rules applied by [`LoteService`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServicePolicy {
    pub firms: FirmRegistry,
    pub pending_edit: PendingEditPolicy,
}

/// Service error for batch/unit use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before touching the store.
    Validation(ValidationError),
    /// Target unit does not exist.
    NotFound(UnitId),
    /// Target unit was already delivered.
    Conflict(UnitId),
    /// Edit of a pending unit under `PendingEditPolicy::Forbid`.
    UnitNotDelivered(UnitId),
    /// Store unavailable or write failed.
    Storage(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(unit_id) => write!(f, "unit not found: {unit_id}"),
            Self::Conflict(unit_id) => write!(f, "unit {unit_id} was already delivered"),
            Self::UnitNotDelivered(unit_id) => {
                write!(f, "unit {unit_id} is still pending and cannot be edited")
            }
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(unit_id) => Self::NotFound(unit_id),
            RepoError::Conflict(unit_id) => Self::Conflict(unit_id),
            other => Self::Storage(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Use-case service over a batch/unit repository.
pub struct LoteService<R: LoteRepository> {
    repo: R,
    policy: ServicePolicy,
    clock: fn() -> NaiveDateTime,
}

impl<R: LoteRepository> LoteService<R> {
    /// Creates a service that stamps deliveries with local wall-clock time.
    pub fn new(repo: R, policy: ServicePolicy) -> Self {
        Self {
            repo,
            policy,
            clock: local_now,
        }
    }

    /// Replaces the delivery clock.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &ServicePolicy {
        &self.policy
    }

    /// Creates one batch with `unit_count` pending units numbered from 1.
    ///
    /// # Errors
    /// - `Validation` for a blank number or counts outside `1..=MAX_*_COUNT`.
    /// - `Storage` when any insert fails; no rows are left behind.
    pub fn create_batch(
        &self,
        number: &str,
        bag_count: i64,
        unit_count: i64,
    ) -> ServiceResult<CreatedBatch> {
        let batch = validate_new_batch(number, bag_count, unit_count).map_err(|err| {
            warn!("event=lote_create module=service status=rejected reason={err}");
            err
        })?;

        let created = self.repo.in_transaction(|repo| {
            let batch_id = repo.insert_batch(&batch)?;
            let unit_ids = (1..=batch.unit_count)
                .map(|sequence_number| repo.insert_unit(batch_id, sequence_number))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CreatedBatch { batch_id, unit_ids })
        });

        match created {
            Ok(created) => {
                info!(
                    "event=lote_create module=service status=ok batch_id={} units={}",
                    created.batch_id,
                    created.unit_ids.len()
                );
                Ok(created)
            }
            Err(err) => {
                error!("event=lote_create module=service status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Lists units waiting for delivery. Empty when there are none.
    pub fn list_pending_units(&self) -> ServiceResult<Vec<PendingUnit>> {
        Ok(self.repo.query_pending_units()?)
    }

    /// Records delivery of a pending unit to `firm` by `agent`, stamped now.
    ///
    /// # Errors
    /// - `Validation` for a blank agent or a firm outside the registry.
    /// - `NotFound` / `Conflict` when the unit is missing or already delivered.
    pub fn deliver_unit(&self, unit_id: UnitId, firm: &str, agent: &str) -> ServiceResult<()> {
        let (firm, agent) = self.validate_firm_and_agent(firm, agent)?;
        let delivered_at = truncate_to_seconds((self.clock)());

        let result = self
            .repo
            .update_unit_delivery(unit_id, &firm, &agent, delivered_at)
            .map_err(ServiceError::from);
        log_unit_outcome("via_deliver", unit_id, &result);
        result
    }

    /// Overwrites firm/agent of a unit; status and delivery time stay as-is.
    ///
    /// # Errors
    /// - `Validation` as for delivery.
    /// - `UnitNotDelivered` for a pending unit when edits are forbidden.
    /// - `NotFound` when the unit is missing.
    pub fn edit_unit(&self, unit_id: UnitId, firm: &str, agent: &str) -> ServiceResult<()> {
        let (firm, agent) = self.validate_firm_and_agent(firm, agent)?;

        let result = self.apply_edit(unit_id, &firm, &agent);
        log_unit_outcome("via_edit", unit_id, &result);
        result
    }

    /// Removes a unit. Deleting an unknown id is a no-op.
    pub fn delete_unit(&self, unit_id: UnitId) -> ServiceResult<()> {
        let removed = self.repo.delete_unit(unit_id)?;
        info!("event=via_delete module=service status=ok unit_id={unit_id} removed={removed}");
        Ok(())
    }

    /// Full history: newest batch first, then via number.
    pub fn get_report(&self) -> ServiceResult<Vec<ReportRow>> {
        Ok(self.repo.query_report()?)
    }

    /// Loads one batch header; `None` when the id is unknown.
    pub fn get_batch(&self, batch_id: BatchId) -> ServiceResult<Option<Batch>> {
        Ok(self.repo.get_batch(batch_id)?)
    }

    /// Loads one unit, e.g. to pre-fill an edit form.
    pub fn get_unit(&self, unit_id: UnitId) -> ServiceResult<Unit> {
        self.repo
            .get_unit(unit_id)?
            .ok_or(ServiceError::NotFound(unit_id))
    }

    fn apply_edit(&self, unit_id: UnitId, firm: &str, agent: &str) -> ServiceResult<()> {
        if self.policy.pending_edit == PendingEditPolicy::Forbid {
            let unit = self.get_unit(unit_id)?;
            if !unit.is_delivered() {
                return Err(ServiceError::UnitNotDelivered(unit_id));
            }
        }
        Ok(self.repo.update_unit_fields(unit_id, firm, agent)?)
    }

    fn validate_firm_and_agent(&self, firm: &str, agent: &str) -> ServiceResult<(String, String)> {
        let agent = validate_agent(agent)?;
        let firm = self.policy.firms.resolve(firm)?;
        Ok((firm, agent))
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn log_unit_outcome(event: &str, unit_id: UnitId, result: &ServiceResult<()>) {
    match result {
        Ok(()) => info!("event={event} module=service status=ok unit_id={unit_id}"),
        Err(ServiceError::Storage(err)) => {
            error!("event={event} module=service status=error unit_id={unit_id} error={err}")
        }
        Err(err) => {
            warn!("event={event} module=service status=rejected unit_id={unit_id} reason={err}")
        }
    }
}
