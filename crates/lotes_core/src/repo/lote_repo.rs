//! Batch/unit repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the store operations over `lotes` and `vias`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Delivery is a single conditional update keyed by unit id; a lost race
//!   surfaces as `Conflict`, a missing id as `NotFound`.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `in_transaction` commits only when the closure returns `Ok`.

use crate::db::introspect::{table_exists, table_has_column};
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::lote::{Batch, BatchId, NewBatch};
use crate::model::via::{
    format_timestamp, parse_timestamp, PendingUnit, ReportRow, Unit, UnitId, UnitStatus,
};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const UNIT_SELECT_SQL: &str = "SELECT
    id,
    lote_id,
    numero_via,
    status,
    firma,
    corretor,
    timestamp
FROM vias";

const REPORT_SELECT_SQL: &str = "SELECT
    v.id AS unit_id,
    l.id AS batch_id,
    l.numero_lote,
    l.sacas,
    l.total_vias,
    v.numero_via,
    v.status,
    v.firma,
    v.corretor,
    v.timestamp
FROM vias v
JOIN lotes l ON l.id = v.lote_id";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("lotes", &["id", "numero_lote", "sacas", "total_vias"]),
    (
        "vias",
        &[
            "id",
            "lote_id",
            "numero_via",
            "status",
            "firma",
            "corretor",
            "timestamp",
        ],
    ),
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for batch/unit persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(UnitId),
    Conflict(UnitId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "unit not found: {id}"),
            Self::Conflict(id) => write!(f, "unit {id} was already delivered"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store schema is at version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store operations over batches and units.
pub trait LoteRepository {
    /// Runs `f` inside one immediate transaction.
    ///
    /// Everything `f` writes through `self` is committed when it returns `Ok`
    /// and rolled back otherwise.
    fn in_transaction<T, F>(&self, f: F) -> RepoResult<T>
    where
        Self: Sized,
        F: FnOnce(&Self) -> RepoResult<T>;

    /// Persists one batch row and returns its new id.
    fn insert_batch(&self, batch: &NewBatch) -> RepoResult<BatchId>;
    /// Persists one pending unit of `batch_id`.
    fn insert_unit(&self, batch_id: BatchId, sequence_number: u32) -> RepoResult<UnitId>;
    fn query_pending_units(&self) -> RepoResult<Vec<PendingUnit>>;
    /// Marks a pending unit delivered.
    fn update_unit_delivery(
        &self,
        unit_id: UnitId,
        firm: &str,
        agent: &str,
        delivered_at: NaiveDateTime,
    ) -> RepoResult<()>;
    /// Overwrites firm/agent only.
    fn update_unit_fields(&self, unit_id: UnitId, firm: &str, agent: &str) -> RepoResult<()>;
    /// Removes a unit. Returns `false` when nothing matched.
    fn delete_unit(&self, unit_id: UnitId) -> RepoResult<bool>;
    /// Full history, newest batch first, then ascending via number.
    fn query_report(&self) -> RepoResult<Vec<ReportRow>>;
    fn get_unit(&self, unit_id: UnitId) -> RepoResult<Option<Unit>>;
    fn get_batch(&self, batch_id: BatchId) -> RepoResult<Option<Batch>>;
}

/// SQLite-backed batch/unit repository.
pub struct SqliteLoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLoteRepository<'conn> {
    /// Constructs a repository from a connection with the latest schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl LoteRepository for SqliteLoteRepository<'_> {
    fn in_transaction<T, F>(&self, f: F) -> RepoResult<T>
    where
        F: FnOnce(&Self) -> RepoResult<T>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    fn insert_batch(&self, batch: &NewBatch) -> RepoResult<BatchId> {
        self.conn.execute(
            "INSERT INTO lotes (numero_lote, sacas, total_vias) VALUES (?1, ?2, ?3);",
            params![batch.number.as_str(), batch.bag_count, batch.unit_count],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_unit(&self, batch_id: BatchId, sequence_number: u32) -> RepoResult<UnitId> {
        self.conn.execute(
            "INSERT INTO vias (lote_id, numero_via, status) VALUES (?1, ?2, ?3);",
            params![batch_id, sequence_number, UnitStatus::Pending.as_db_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn query_pending_units(&self) -> RepoResult<Vec<PendingUnit>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                v.id,
                l.numero_lote,
                l.sacas,
                v.numero_via
             FROM vias v
             JOIN lotes l ON l.id = v.lote_id
             WHERE v.status = ?1
             ORDER BY l.id ASC, v.numero_via ASC;",
        )?;

        let mut rows = stmt.query([UnitStatus::Pending.as_db_str()])?;
        let mut units = Vec::new();
        while let Some(row) = rows.next()? {
            units.push(PendingUnit {
                unit_id: row.get(0)?,
                batch_number: row.get(1)?,
                bag_count: row.get(2)?,
                sequence_number: row.get(3)?,
            });
        }
        Ok(units)
    }

    fn update_unit_delivery(
        &self,
        unit_id: UnitId,
        firm: &str,
        agent: &str,
        delivered_at: NaiveDateTime,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE vias
             SET
                status = ?2,
                firma = ?3,
                corretor = ?4,
                timestamp = ?5
             WHERE id = ?1
               AND status = ?6;",
            params![
                unit_id,
                UnitStatus::Delivered.as_db_str(),
                firm,
                agent,
                format_timestamp(delivered_at),
                UnitStatus::Pending.as_db_str(),
            ],
        )?;

        if changed == 0 {
            return Err(classify_missed_delivery(self.conn, unit_id)?);
        }
        Ok(())
    }

    fn update_unit_fields(&self, unit_id: UnitId, firm: &str, agent: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE vias SET firma = ?2, corretor = ?3 WHERE id = ?1;",
            params![unit_id, firm, agent],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(unit_id));
        }
        Ok(())
    }

    fn delete_unit(&self, unit_id: UnitId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM vias WHERE id = ?1;", [unit_id])?;
        Ok(changed > 0)
    }

    fn query_report(&self) -> RepoResult<Vec<ReportRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REPORT_SELECT_SQL}
             ORDER BY l.id DESC, v.numero_via ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut report = Vec::new();
        while let Some(row) = rows.next()? {
            report.push(parse_report_row(row)?);
        }
        Ok(report)
    }

    fn get_unit(&self, unit_id: UnitId) -> RepoResult<Option<Unit>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{UNIT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([unit_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_unit_row(row)?));
        }
        Ok(None)
    }

    fn get_batch(&self, batch_id: BatchId) -> RepoResult<Option<Batch>> {
        let batch = self
            .conn
            .query_row(
                "SELECT id, numero_lote, sacas, total_vias FROM lotes WHERE id = ?1;",
                [batch_id],
                |row| {
                    Ok(Batch {
                        id: row.get(0)?,
                        number: row.get(1)?,
                        bag_count: row.get(2)?,
                        unit_count: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(batch)
    }
}

fn classify_missed_delivery(conn: &Connection, unit_id: UnitId) -> RepoResult<RepoError> {
    let status: Option<String> = conn
        .query_row("SELECT status FROM vias WHERE id = ?1;", [unit_id], |row| {
            row.get(0)
        })
        .optional()?;

    let Some(status) = status else {
        return Ok(RepoError::NotFound(unit_id));
    };

    match parse_status(status)? {
        UnitStatus::Delivered => Ok(RepoError::Conflict(unit_id)),
        UnitStatus::Pending => Err(RepoError::InvalidData(format!(
            "pending unit {unit_id} rejected the delivery update"
        ))),
    }
}

fn parse_unit_row(row: &Row<'_>) -> RepoResult<Unit> {
    Ok(Unit {
        id: row.get("id")?,
        batch_id: row.get("lote_id")?,
        sequence_number: row.get("numero_via")?,
        status: parse_status(row.get("status")?)?,
        firm: row.get("firma")?,
        agent: row.get("corretor")?,
        delivered_at: parse_optional_timestamp(row.get("timestamp")?)?,
    })
}

fn parse_report_row(row: &Row<'_>) -> RepoResult<ReportRow> {
    Ok(ReportRow {
        unit_id: row.get("unit_id")?,
        batch_id: row.get("batch_id")?,
        batch_number: row.get("numero_lote")?,
        bag_count: row.get("sacas")?,
        unit_count: row.get("total_vias")?,
        sequence_number: row.get("numero_via")?,
        status: parse_status(row.get("status")?)?,
        firm: row.get("firma")?,
        agent: row.get("corretor")?,
        delivered_at: parse_optional_timestamp(row.get("timestamp")?)?,
    })
}

fn parse_status(value: String) -> RepoResult<UnitStatus> {
    UnitStatus::from_db_str(&value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid status `{value}` in vias.status")))
}

fn parse_optional_timestamp(value: Option<String>) -> RepoResult<Option<NaiveDateTime>> {
    match value {
        Some(text) => parse_timestamp(&text).map(Some).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid timestamp `{text}` in vias.timestamp"))
        }),
        None => Ok(None),
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}
