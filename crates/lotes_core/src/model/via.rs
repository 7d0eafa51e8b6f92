//! Unit ("via") records and delivery state.
//!
//! # Invariants
//! - `firm`, `agent` and `delivered_at` are all `None` on a freshly created
//!   unit and all `Some` right after delivery.
//! - Edits touch `firm`/`agent` only; `delivered_at` keeps the delivery time.

use super::lote::BatchId;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Store-assigned unit identifier.
pub type UnitId = i64;

/// Persisted text format of `vias.timestamp`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const STATUS_PENDING: &str = "Pendente";
const STATUS_DELIVERED: &str = "Entregue";

/// Two-state unit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Waiting for a field agent.
    Pending,
    /// Handed to a firm.
    Delivered,
}

impl UnitStatus {
    /// Value stored in `vias.status`.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Delivered => STATUS_DELIVERED,
        }
    }

    /// User-facing name, independent of the stored text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Delivered => "Delivered",
        }
    }

    /// Parses a stored `vias.status` value.
    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            STATUS_PENDING => Some(Self::Pending),
            STATUS_DELIVERED => Some(Self::Delivered),
            _ => None,
        }
    }
}

/// Unit row as persisted in `vias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub batch_id: BatchId,
    /// 1-based position inside the batch.
    pub sequence_number: u32,
    pub status: UnitStatus,
    pub firm: Option<String>,
    pub agent: Option<String>,
    pub delivered_at: Option<NaiveDateTime>,
}

impl Unit {
    pub fn is_delivered(&self) -> bool {
        self.status == UnitStatus::Delivered
    }
}

/// Row of the "deliver" view: a pending unit with its batch label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUnit {
    pub unit_id: UnitId,
    pub batch_number: String,
    pub bag_count: u32,
    pub sequence_number: u32,
}

/// Row of the historical report: a unit joined with its batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub unit_id: UnitId,
    pub batch_id: BatchId,
    pub batch_number: String,
    pub bag_count: u32,
    pub unit_count: u32,
    pub sequence_number: u32,
    pub status: UnitStatus,
    pub firm: Option<String>,
    pub agent: Option<String>,
    pub delivered_at: Option<NaiveDateTime>,
}

/// Drops sub-second precision so in-memory values match what the store keeps.
pub fn truncate_to_seconds(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

/// Formats a delivery timestamp for `vias.timestamp`.
pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a stored `vias.timestamp` value.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, parse_timestamp, truncate_to_seconds, UnitStatus};
    use chrono::NaiveDate;

    #[test]
    fn status_uses_legacy_text_values() {
        assert_eq!(UnitStatus::Pending.as_db_str(), "Pendente");
        assert_eq!(UnitStatus::Delivered.as_db_str(), "Entregue");
        assert_eq!(UnitStatus::from_db_str("Entregue"), Some(UnitStatus::Delivered));
        assert_eq!(UnitStatus::from_db_str("delivered"), None);
    }

    #[test]
    fn display_label_differs_from_stored_text() {
        assert_eq!(UnitStatus::Pending.label(), "Pending");
        assert_eq!(UnitStatus::Delivered.label(), "Delivered");
    }

    #[test]
    fn timestamp_text_matches_legacy_format() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 17)
            .and_then(|date| date.and_hms_milli_opt(9, 3, 7, 250))
            .expect("valid datetime");

        let text = format_timestamp(at);
        assert_eq!(text, "2024-05-17 09:03:07");
        assert_eq!(parse_timestamp(&text), Some(truncate_to_seconds(at)));
        assert_eq!(parse_timestamp("17/05/2024"), None);
    }
}
