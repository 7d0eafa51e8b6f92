//! Use-case handlers for the form UI.
//!
//! # Responsibility
//! - Route each form action to exactly one service operation.
//! - Check the admin secret before office-only actions.
//! - Turn every outcome into a response envelope with a user-visible message.
//!
//! # Invariants
//! - Handlers never panic and never return raw errors.
//! - A rejected secret means the store is not touched.
//! - Each call builds its repository/service on the borrowed connection and
//!   drops them before returning.

use log::warn;
use lotes_core::{
    AdminGate, AppConfig, LoteService, ReportRow, ServiceError, ServicePolicy,
    SqliteLoteRepository, UnitId,
};
use rusqlite::Connection;

const UNAUTHORIZED_MESSAGE: &str = "Unauthorized: wrong or missing admin password.";

/// Outcome of a create/deliver/edit/delete action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Batch id for create, unit id for unit actions.
    pub id: Option<i64>,
    /// Message shown to the user.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: i64) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// One selectable entry of the deliver view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem {
    pub unit_id: UnitId,
    /// Picker label, e.g. `Batch L100 - unit 2 (50 bags)`.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingListResponse {
    pub items: Vec<PendingItem>,
    pub message: String,
}

/// One display row of the report view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportItem {
    pub unit_id: UnitId,
    pub batch_number: String,
    pub bag_count: u32,
    /// `sequence/total`, e.g. `2/3`.
    pub via: String,
    pub status: String,
    pub firm: String,
    pub agent: String,
    pub delivered_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportResponse {
    pub rows: Vec<ReportItem>,
    pub message: String,
}

/// Request router bound to one open store.
pub struct Shell<'conn> {
    conn: &'conn Connection,
    policy: ServicePolicy,
    gate: AdminGate,
}

impl<'conn> Shell<'conn> {
    pub fn new(conn: &'conn Connection, config: &AppConfig) -> Self {
        Self {
            conn,
            policy: config.service_policy(),
            gate: AdminGate::new(config.admin_secret.clone()),
        }
    }

    /// Firm names for the deliver/edit pickers.
    pub fn firm_options(&self) -> Vec<String> {
        self.policy.firms.names().to_vec()
    }

    /// Office action: creates a batch and its units.
    pub fn create_batch(
        &self,
        secret: &str,
        number: &str,
        bag_count: i64,
        unit_count: i64,
    ) -> ActionResponse {
        if !self.authorize("create_batch", secret) {
            return ActionResponse::failure(UNAUTHORIZED_MESSAGE);
        }

        let outcome = self.with_service(|service| {
            let created = service.create_batch(number, bag_count, unit_count)?;
            let batch = service.get_batch(created.batch_id)?;
            Ok((created, batch))
        });
        match outcome {
            Ok((created, batch)) => {
                let message = match batch {
                    Some(batch) => format!(
                        "Batch {} ({} bags) created with {} pending unit(s).",
                        batch.number,
                        batch.bag_count,
                        created.unit_ids.len()
                    ),
                    None => format!(
                        "Batch {} created with {} pending unit(s).",
                        number.trim(),
                        created.unit_ids.len()
                    ),
                };
                ActionResponse::success(message, created.batch_id)
            }
            Err(message) => ActionResponse::failure(message),
        }
    }

    /// Field action: lists units that can be delivered.
    pub fn pending_units(&self) -> PendingListResponse {
        match self.with_service(|service| service.list_pending_units()) {
            Ok(units) => {
                let items = units
                    .into_iter()
                    .map(|unit| PendingItem {
                        unit_id: unit.unit_id,
                        label: format!(
                            "Batch {} - unit {} ({} bags)",
                            unit.batch_number, unit.sequence_number, unit.bag_count
                        ),
                    })
                    .collect::<Vec<_>>();
                let message = if items.is_empty() {
                    "No pending units.".to_string()
                } else {
                    format!("{} pending unit(s).", items.len())
                };
                PendingListResponse { items, message }
            }
            Err(message) => PendingListResponse {
                items: Vec::new(),
                message,
            },
        }
    }

    /// Field action: confirms delivery of one unit.
    pub fn deliver_unit(&self, unit_id: UnitId, firm: &str, agent: &str) -> ActionResponse {
        match self.with_service(|service| service.deliver_unit(unit_id, firm, agent)) {
            Ok(()) => ActionResponse::success("Delivery recorded.", unit_id),
            Err(message) => ActionResponse::failure(message),
        }
    }

    /// Office action: corrects firm/agent on a report row.
    pub fn edit_unit(
        &self,
        secret: &str,
        unit_id: UnitId,
        firm: &str,
        agent: &str,
    ) -> ActionResponse {
        if !self.authorize("edit_unit", secret) {
            return ActionResponse::failure(UNAUTHORIZED_MESSAGE);
        }

        match self.with_service(|service| service.edit_unit(unit_id, firm, agent)) {
            Ok(()) => ActionResponse::success("Unit updated.", unit_id),
            Err(message) => ActionResponse::failure(message),
        }
    }

    /// Office action: removes a report row.
    pub fn delete_unit(&self, secret: &str, unit_id: UnitId) -> ActionResponse {
        if !self.authorize("delete_unit", secret) {
            return ActionResponse::failure(UNAUTHORIZED_MESSAGE);
        }

        match self.with_service(|service| service.delete_unit(unit_id)) {
            Ok(()) => ActionResponse::success("Unit deleted.", unit_id),
            Err(message) => ActionResponse::failure(message),
        }
    }

    /// Report view: full history.
    pub fn report(&self) -> ReportResponse {
        match self.with_service(|service| service.get_report()) {
            Ok(rows) => {
                let rows = rows.into_iter().map(to_report_item).collect::<Vec<_>>();
                let message = if rows.is_empty() {
                    "No records yet.".to_string()
                } else {
                    format!("{} record(s).", rows.len())
                };
                ReportResponse { rows, message }
            }
            Err(message) => ReportResponse {
                rows: Vec::new(),
                message,
            },
        }
    }

    fn authorize(&self, action: &str, secret: &str) -> bool {
        let authorized = self.gate.is_authorized(secret);
        if !authorized {
            warn!("event=admin_gate module=shell status=denied action={action}");
        }
        authorized
    }

    fn with_service<T>(
        &self,
        f: impl FnOnce(&LoteService<SqliteLoteRepository<'_>>) -> Result<T, ServiceError>,
    ) -> Result<T, String> {
        let repo = SqliteLoteRepository::try_new(self.conn)
            .map_err(|err| format!("Store unavailable: {err}. Try again."))?;
        let service = LoteService::new(repo, self.policy.clone());
        f(&service).map_err(|err| user_message(&err))
    }
}

fn user_message(err: &ServiceError) -> String {
    match err {
        ServiceError::Validation(err) => format!("Invalid input: {err}."),
        ServiceError::NotFound(unit_id) => format!("Unit {unit_id} no longer exists."),
        ServiceError::Conflict(unit_id) => {
            format!("Unit {unit_id} was already delivered by another agent.")
        }
        ServiceError::UnitNotDelivered(unit_id) => {
            format!("Unit {unit_id} has not been delivered yet and cannot be edited.")
        }
        ServiceError::Storage(err) => format!("Store failure: {err}. Try again."),
    }
}

fn to_report_item(row: ReportRow) -> ReportItem {
    ReportItem {
        unit_id: row.unit_id,
        batch_number: row.batch_number,
        bag_count: row.bag_count,
        via: format!("{}/{}", row.sequence_number, row.unit_count),
        status: row.status.label().to_string(),
        firm: row.firm.unwrap_or_default(),
        agent: row.agent.unwrap_or_default(),
        delivered_at: row
            .delivered_at
            .map(|at| at.to_string())
            .unwrap_or_default(),
    }
}
