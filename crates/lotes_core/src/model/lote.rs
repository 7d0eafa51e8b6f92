//! Batch ("lote") records.

use super::via::UnitId;
use serde::{Deserialize, Serialize};

/// Store-assigned batch identifier.
pub type BatchId = i64;

/// Batch row as persisted in `lotes`.
///
/// Batches are immutable once created; only their units change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    /// Free-text label typed by the office. Not unique.
    pub number: String,
    /// Physical bag count. `0` only for rows imported from the single-table
    /// store, which never recorded it.
    pub bag_count: u32,
    /// Number of units generated at creation.
    pub unit_count: u32,
}

/// Validated creation input for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBatch {
    pub number: String,
    pub bag_count: u32,
    pub unit_count: u32,
}

/// Result of a successful batch creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedBatch {
    pub batch_id: BatchId,
    /// Unit ids in sequence order (`unit_ids[0]` is via 1).
    pub unit_ids: Vec<UnitId>,
}
