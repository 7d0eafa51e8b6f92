use lotes_core::db::migrations::latest_version;
use lotes_core::db::{create_schema, open_db, open_db_in_memory, DbError};
use lotes_core::{LoteRepository, SqliteLoteRepository, UnitStatus};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_both_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "lotes");
    assert_table_exists(&conn, "vias");
}

#[test]
fn create_schema_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO lotes (numero_lote, sacas, total_vias) VALUES ('L1', 10, 1);",
        [],
    )
    .unwrap();

    create_schema(&mut conn).unwrap();
    create_schema(&mut conn).unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(count_rows(&conn, "lotes"), 1);
}

#[test]
fn opening_same_database_twice_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lotes.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO lotes (numero_lote, sacas, total_vias) VALUES ('L7', 3, 1);",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    assert_eq!(count_rows(&second, "lotes"), 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unversioned_two_table_store_is_adopted_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vias.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE lotes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            numero_lote TEXT NOT NULL,
            sacas INTEGER NOT NULL,
            total_vias INTEGER NOT NULL
        );
        CREATE TABLE vias (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lote_id INTEGER NOT NULL,
            numero_via INTEGER NOT NULL,
            status TEXT NOT NULL,
            firma TEXT,
            corretor TEXT,
            timestamp TEXT
        );
        INSERT INTO lotes (numero_lote, sacas, total_vias) VALUES ('L55', 20, 2);
        INSERT INTO vias (lote_id, numero_via, status) VALUES (1, 1, 'Pendente');
        INSERT INTO vias (lote_id, numero_via, status, firma, corretor, timestamp)
            VALUES (1, 2, 'Entregue', 'Olam', 'Joao', '2024-03-01 10:15:00');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    let repo = SqliteLoteRepository::try_new(&conn).unwrap();
    let report = repo.query_report().unwrap();
    assert_eq!(report.len(), 2);
    assert_eq!(report[1].firm.as_deref(), Some("Olam"));
    assert_eq!(report[1].status, UnitStatus::Delivered);
}

#[test]
fn legacy_single_table_store_is_migrated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE lotes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            numero_lote TEXT NOT NULL,
            status TEXT NOT NULL,
            firma TEXT,
            corretor TEXT,
            timestamp TEXT
        );
        INSERT INTO lotes (numero_lote, status) VALUES ('A1', 'Pendente');
        INSERT INTO lotes (numero_lote, status, firma, corretor, timestamp)
            VALUES ('A2', 'Entregue', 'Cofco', 'Maria', '2024-01-02 08:30:00');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert!(!table_exists(&conn, "lotes_legacy"));

    let repo = SqliteLoteRepository::try_new(&conn).unwrap();
    let batch = repo.get_batch(2).unwrap().unwrap();
    assert_eq!(batch.number, "A2");
    assert_eq!(batch.bag_count, 0);
    assert_eq!(batch.unit_count, 1);

    let report = repo.query_report().unwrap();
    assert_eq!(report.len(), 2);
    assert_eq!(report[0].batch_number, "A2");
    assert_eq!(report[0].sequence_number, 1);
    assert_eq!(report[0].status, UnitStatus::Delivered);
    assert_eq!(report[0].agent.as_deref(), Some("Maria"));
    assert_eq!(
        report[0].delivered_at.map(|at| at.to_string()),
        Some("2024-01-02 08:30:00".to_string())
    );
    assert_eq!(report[1].batch_number, "A1");
    assert_eq!(report[1].status, UnitStatus::Pending);

    let pending = repo.query_pending_units().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].batch_number, "A1");

    // New batches continue after the imported ids.
    let next = conn
        .execute(
            "INSERT INTO lotes (numero_lote, sacas, total_vias) VALUES ('A3', 5, 1);",
            [],
        )
        .map(|_| conn.last_insert_rowid())
        .unwrap();
    assert_eq!(next, 3);
}

#[test]
fn sequence_numbers_are_unique_per_batch() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO lotes (numero_lote, sacas, total_vias) VALUES ('L1', 1, 1);",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO vias (lote_id, numero_via, status) VALUES (1, 1, 'Pendente');",
        [],
    )
    .unwrap();

    let duplicate = conn.execute(
        "INSERT INTO vias (lote_id, numero_via, status) VALUES (1, 1, 'Pendente');",
        [],
    );
    assert!(duplicate.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn table_exists(conn: &Connection, table_name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert!(
        table_exists(conn, table_name),
        "table {table_name} does not exist"
    );
}
