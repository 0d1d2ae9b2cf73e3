#![allow(dead_code)]

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Integer, Text};
use reel_store::db::{connection, migrate};
use reel_store::repo::Store;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    _dir: TempDir,
    pub path: String,
}

/// Runs embedded migrations against a fresh temp-file database and opens a
/// pooled [`Store`] on it.
pub fn setup_store() -> (TestDb, Store) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_all(&path).expect("migrations");
    let store = Store::open(&path, 5).expect("open store");

    (TestDb { _dir: dir, path }, store)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn connect(path: &str) -> SqliteConnection {
    connection::connect_sqlite(path).expect("connect")
}

pub fn fk_check_empty(conn: &mut SqliteConnection) {
    #[derive(diesel::QueryableByName, Debug)]
    struct Row {
        #[diesel(sql_type = diesel::sql_types::Text)]
        table: String,
    }
    let rows: Vec<Row> = sql_query("PRAGMA foreign_key_check;")
        .load(conn)
        .expect("fk_check");
    assert!(rows.is_empty(), "foreign key check not empty: {rows:?}");
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    #[derive(diesel::QueryableByName)]
    struct C {
        #[diesel(sql_type = diesel::sql_types::BigInt)]
        c: i64,
    }
    let q = format!("SELECT COUNT(*) AS c FROM {table}");
    diesel::sql_query(q).get_result::<C>(conn).unwrap().c
}
