//! Domain model for batches ("lotes") and their units ("vias").
//!
//! # Responsibility
//! - Define canonical records shared by the store, service and shell.
//! - Own input validation rules that do not need the store.
//!
//! # Invariants
//! - A batch owns one or more units, numbered `1..=unit_count`.
//! - A unit is `Pending` or `Delivered`; delivery happens at most once.

pub mod firm;
pub mod lote;
pub mod validation;
pub mod via;
