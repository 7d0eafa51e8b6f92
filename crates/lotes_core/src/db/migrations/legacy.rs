//! Adoption of stores written by the single-table deployment.
//!
//! That shape is `lotes(id, numero_lote, status, firma, corretor, timestamp)`:
//! one row per batch, no bag count, no vias. Each row becomes a batch with
//! `sacas = 0`, `total_vias = 1` and a single via carrying the old delivery
//! columns. Ids are preserved so external references stay valid.

use crate::db::introspect::{table_exists, table_has_column};
use rusqlite::Connection;

const LEGACY_STASH_TABLE: &str = "lotes_legacy";

/// Renames a legacy `lotes` table out of the way so the current schema can be
/// created. Returns whether one was found.
pub(super) fn stash_legacy_table(conn: &Connection) -> rusqlite::Result<bool> {
    if !table_exists(conn, "lotes")? {
        return Ok(false);
    }
    let is_legacy =
        table_has_column(conn, "lotes", "status")? && !table_has_column(conn, "lotes", "sacas")?;
    if !is_legacy {
        return Ok(false);
    }

    conn.execute_batch(&format!("ALTER TABLE lotes RENAME TO {LEGACY_STASH_TABLE};"))?;
    Ok(true)
}

/// Copies stashed legacy rows into `lotes` / `vias` and drops the stash.
///
/// Must run after the v1 tables exist. Returns the number of batches imported.
pub(super) fn import_legacy_rows(conn: &Connection) -> rusqlite::Result<usize> {
    let imported = conn.execute(
        &format!(
            "INSERT INTO lotes (id, numero_lote, sacas, total_vias)
             SELECT id, numero_lote, 0, 1
             FROM {LEGACY_STASH_TABLE}
             ORDER BY id;"
        ),
        [],
    )?;

    conn.execute(
        &format!(
            "INSERT INTO vias (lote_id, numero_via, status, firma, corretor, timestamp)
             SELECT id, 1, status, firma, corretor, timestamp
             FROM {LEGACY_STASH_TABLE}
             ORDER BY id;"
        ),
        [],
    )?;

    conn.execute_batch(&format!("DROP TABLE {LEGACY_STASH_TABLE};"))?;
    Ok(imported)
}
