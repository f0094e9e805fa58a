//! Runs compiled clauses against an in-memory SQLite database.
//!
//! Only operators SQLite understands are used here (no `ILIKE`, no `::`
//! casts), so range and pattern filters are covered by unit tests instead.

use mik_where::{Filters, Parameters, Value, batch_remove, compile, remove_one, update_one};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, ToSql};

fn db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, status TEXT, deleted_at TEXT);
         INSERT INTO users VALUES (1, 'ann', 'active', NULL);
         INSERT INTO users VALUES (2, 'bob', 'banned', '2024-01-01');
         INSERT INTO users VALUES (3, 'cid', 'active', NULL);
         INSERT INTO users VALUES (4, 'dee', 'pending', NULL);",
    )
    .unwrap();
    conn
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) => panic!("arrays are expanded before binding"),
    }
}

fn bindings(parameters: &Parameters) -> Vec<(String, SqlValue)> {
    parameters
        .iter()
        .map(|(name, value)| (format!("${name}"), to_sql(value)))
        .collect()
}

fn run(conn: &Connection, sql: &str, parameters: &Parameters) -> Vec<i64> {
    let owned = bindings(parameters);
    let named: Vec<(&str, &dyn ToSql)> = owned
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect();

    let mut stmt = conn.prepare(sql).unwrap();
    stmt.query_map(named.as_slice(), |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn select_ids(conn: &Connection, filters: &Filters) -> Vec<i64> {
    let compiled = compile(filters, &["id", "name", "status", "deleted_at"]);
    let sql = format!("SELECT id FROM users {} ORDER BY id", compiled.clause);
    run(conn, &sql, &compiled.parameters)
}

#[test]
fn test_equality_and_negation() {
    let conn = db();
    assert_eq!(
        select_ids(&conn, &Filters::new().with("status", "active")),
        vec![1, 3]
    );
    assert_eq!(
        select_ids(&conn, &Filters::new().with("not_status", "active")),
        vec![2, 4]
    );
}

#[test]
fn test_in_lists() {
    let conn = db();
    assert_eq!(
        select_ids(&conn, &Filters::new().with("id", vec![2, 4, 9])),
        vec![2, 4]
    );
    assert_eq!(
        select_ids(&conn, &Filters::new().with("not_name", vec!["ann", "bob"])),
        vec![3, 4]
    );
}

#[test]
fn test_empty_in_lists_stay_valid() {
    let conn = db();
    assert!(select_ids(&conn, &Filters::new().with("id", Value::Array(vec![]))).is_empty());
    assert_eq!(
        select_ids(&conn, &Filters::new().with("not_id", Value::Array(vec![]))),
        vec![1, 2, 3, 4]
    );
}

#[test]
fn test_null_filters() {
    let conn = db();
    assert_eq!(
        select_ids(&conn, &Filters::new().with("not_deleted_at", Value::Null)),
        vec![2]
    );
    assert_eq!(
        select_ids(&conn, &Filters::new().with("deleted_at", "IS NULL")),
        vec![1, 3, 4]
    );
}

#[test]
fn test_same_column_equality_and_negation() {
    let conn = db();
    let filters = Filters::new()
        .with("status", vec!["active", "pending"])
        .with("not_status", "pending")
        .with("password", "x");
    assert_eq!(select_ids(&conn, &filters), vec![1, 3]);
}

#[test]
fn test_no_filters_selects_everything() {
    let conn = db();
    assert_eq!(select_ids(&conn, &Filters::new()), vec![1, 2, 3, 4]);
}

#[test]
fn test_update_and_delete_statements() {
    let conn = db();

    let update = update_one("users")
        .writable_cols(&["status"])
        .query(4, &Filters::new().with("status", "active"))
        .unwrap();
    let owned = bindings(&update.parameters);
    let named: Vec<(&str, &dyn ToSql)> = owned
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect();
    assert_eq!(conn.execute(&update.sql, named.as_slice()).unwrap(), 1);
    assert_eq!(
        select_ids(&conn, &Filters::new().with("status", "active")),
        vec![1, 3, 4]
    );

    let delete = remove_one("users").query(1);
    let owned = bindings(&delete.parameters);
    let named: Vec<(&str, &dyn ToSql)> = owned
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect();
    assert_eq!(conn.execute(&delete.sql, named.as_slice()).unwrap(), 1);

    let batch = batch_remove("users").query([2, 3]);
    let owned = bindings(&batch.parameters);
    let named: Vec<(&str, &dyn ToSql)> = owned
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect();
    assert_eq!(conn.execute(&batch.sql, named.as_slice()).unwrap(), 2);

    assert_eq!(select_ids(&conn, &Filters::new()), vec![4]);
}

#[test]
fn test_empty_batch_deletes_nothing() {
    let conn = db();
    let batch = batch_remove("users").query(Vec::<i64>::new());
    assert_eq!(conn.execute(&batch.sql, []).unwrap(), 0);
    assert_eq!(select_ids(&conn, &Filters::new()).len(), 4);
}
