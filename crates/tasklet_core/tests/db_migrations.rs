use rusqlite::Connection;
use tasklet_core::db::migrations::{current_version, latest_version};
use tasklet_core::db::{open_db, open_db_in_memory};
use tasklet_core::{ConnectionProvider, ConnectionString, DbError, PooledProvider};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "tasks");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasklet.db");

    let first = open_db(&path).unwrap();
    first
        .execute("INSERT INTO tasks (name) VALUES ('survives reopen');", [])
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(current_version(&second).unwrap(), latest_version());
    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opened_connections_enable_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn pool_connections_follow_connection_string_pragmas() {
    let dir = tempfile::tempdir().unwrap();
    let conn_str = ConnectionString::parse(&format!(
        "sqlite:{};FOREIGN_KEYS=FALSE;POOL_MAX_SIZE=1",
        dir.path().join("pragmas.db").display()
    ))
    .unwrap();
    let provider = PooledProvider::build(&conn_str).unwrap();

    let conn = provider.acquire().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 0);
    assert_table_exists(&conn, "tasks");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let pooled = PooledProvider::build(&ConnectionString::file(&path));
    assert!(matches!(
        pooled.err(),
        Some(DbError::UnsupportedSchemaVersion { db_version: 999, .. })
    ));
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
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
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
