mod common;
use common::{connect, setup_store};

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_query;

#[test]
fn sqlite_connection_applies_pragmas() {
    let (db, _store) = setup_store();
    let mut conn = connect(&db.path);
    common::assert_sqlite_pragmas(&mut conn);

    let mut second = connect(&db.path);
    common::assert_sqlite_pragmas(&mut second);

    drop(second);
    common::fk_check_empty(&mut conn);
}

/// `claim_due_schedules` leases via `immediate_transaction`, which takes a
/// `BEGIN IMMEDIATE` write lock. This proves the underlying SQLite file
/// actually enforces single-writer semantics the lease relies on.
#[test]
fn sqlite_begin_immediate_locking_smoke() {
    let (db, _store) = setup_store();
    let mut conn_a = connect(&db.path);
    let mut conn_b = connect(&db.path);

    sql_query("BEGIN IMMEDIATE;")
        .execute(&mut conn_a)
        .expect("begin immediate on first connection");

    let err = sql_query("BEGIN IMMEDIATE;").execute(&mut conn_b);
    assert!(err.is_err(), "expected second BEGIN IMMEDIATE to block");
    match err.unwrap_err() {
        DieselError::DatabaseError(DatabaseErrorKind::UnableToSendCommand, info) => {
            assert!(info.message().contains("database is locked"));
        }
        DieselError::DatabaseError(_, info) => {
            assert!(info.message().contains("database is locked"));
        }
        other => panic!("unexpected error: {other}"),
    }

    sql_query("ROLLBACK;")
        .execute(&mut conn_a)
        .expect("rollback first connection");

    sql_query("BEGIN IMMEDIATE;")
        .execute(&mut conn_b)
        .expect("begin immediate after release");
    sql_query("ROLLBACK;")
        .execute(&mut conn_b)
        .expect("rollback second connection");
}
