use super::*;
use crate::binding::Binding;
use crate::testing::MockBackend;
use crate::value::TypeHint;
use crate::{bindings, data};

fn engine() -> (Engine, MockBackend) {
    let mock = MockBackend::new();
    (Engine::new(mock.clone()), mock)
}

#[test]
fn select_renders_and_returns_objects() {
    let (mut db, mock) = engine();
    mock.respond_rows(
        &["id", "name"],
        vec![
            vec![Value::Int(1), Value::from("Isis")],
            vec![Value::Int(2), Value::from("Manny")],
        ],
    );

    let rows = db
        .select(["id", "name"])
        .from("users")
        .where_("id >= 1")
        .order("id ASC")
        .limit(2)
        .execute()
        .unwrap()
        .into_objects()
        .unwrap();

    assert_eq!(
        mock.sql(),
        vec!["SELECT id, name FROM \"users\" WHERE id >= 1 ORDER BY id ASC LIMIT 2"]
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["name"], Value::from("Manny"));
    assert_eq!(db.row_count(), 2);
}

#[test]
fn select_shapes() {
    let (mut db, mock) = engine();
    let rows = || vec![vec![Value::Int(1), Value::from("Isis")]];
    mock.respond_rows(&["id", "name"], rows());
    mock.respond_rows(&["id", "name"], rows());
    mock.respond_rows(&["id", "name"], rows());

    let numeric = db
        .select("*")
        .from("users")
        .execute_as(ResultShape::ArrayNumeric)
        .unwrap();
    assert_eq!(numeric, QueryOutput::Numeric(rows()));

    let assoc = db
        .select("*")
        .from("users")
        .execute_as(ResultShape::ArrayAssoc)
        .unwrap()
        .into_assoc()
        .unwrap();
    assert_eq!(assoc[0].keys().collect::<Vec<_>>(), vec!["id", "name"]);

    let count = db
        .select("*")
        .from("users")
        .execute_as(ResultShape::Rows)
        .unwrap();
    assert_eq!(count, QueryOutput::Count(1));
}

#[test]
fn select_with_no_rows_is_empty_not_an_error() {
    let (mut db, _mock) = engine();
    let out = db.select("*").from("users").execute().unwrap();
    assert_eq!(out, QueryOutput::Objects(Vec::new()));
    assert_eq!(db.row_count(), 0);
}

#[test]
fn writes_return_counts_or_last_id() {
    let (mut db, mock) = engine();
    let out = db
        .insert(data! { "name" => "Isis", "age" => 30 })
        .in_table("users")
        .execute()
        .unwrap();
    assert_eq!(out, QueryOutput::Count(1));
    assert_eq!(db.last_insert_id(), 7);

    let out = db
        .insert(data! { "name" => "Manny" })
        .in_table("users")
        .execute_as(ResultShape::LastId)
        .unwrap();
    assert_eq!(out, QueryOutput::LastId(7));

    assert_eq!(
        mock.sql(),
        vec![
            "INSERT INTO \"users\" (name, age) VALUES ('Isis', 30)",
            "INSERT INTO \"users\" (name) VALUES ('Manny')",
        ]
    );
}

#[test]
fn ddl_returns_done() {
    let (mut db, mock) = engine();
    let out = db
        .create([("id", "INTEGER PRIMARY KEY"), ("name", "TEXT")])
        .table("users")
        .execute()
        .unwrap();
    assert_eq!(out, QueryOutput::Done(true));

    assert!(db.truncate().table("users").execute().unwrap().is_done());
    assert!(db.drop_table().table("users").execute().unwrap().is_done());

    assert_eq!(
        mock.sql(),
        vec![
            "CREATE TABLE IF NOT EXISTS \"users\" (id INTEGER PRIMARY KEY, name TEXT)",
            "DELETE FROM \"users\"",
            "DROP TABLE IF EXISTS \"users\"",
        ]
    );
}

#[test]
fn update_and_where_bindings_merge_in_call_order() {
    let (mut db, mock) = engine();
    db.update_with(
        data! { "name" => ":name" },
        bindings![(":name", "Isis")],
    )
    .in_table("users")
    .where_with("id = :id", bindings![(":id", 1)])
    .execute()
    .unwrap();

    let executed = mock.executed();
    assert_eq!(executed[0].sql, "UPDATE \"users\" SET name=:name WHERE id = :id");
    assert_eq!(
        executed[0].bindings,
        vec![Binding::named("name", "Isis"), Binding::named("id", 1)]
    );
}

#[test]
fn where_bindings_alone_become_the_active_set() {
    let (mut db, mock) = engine();
    db.delete()
        .from("users")
        .where_with("id = ?", vec![Binding::positional(1, 3)])
        .execute()
        .unwrap();

    let executed = mock.executed();
    assert_eq!(executed[0].sql, "DELETE FROM \"users\" WHERE id = ?");
    assert_eq!(executed[0].bindings, vec![Binding::positional(1, 3)]);
}

#[test]
fn replace_probes_then_updates_existing_row() {
    let (mut db, mock) = engine();
    mock.respond_rows(&["id"], vec![vec![Value::Int(1)]]);

    db.replace(data! { "id" => 1, "name" => "Isis" })
        .in_table("users")
        .execute()
        .unwrap();

    assert_eq!(
        mock.sql(),
        vec![
            "SELECT id FROM \"users\" WHERE id = 1 LIMIT 1",
            "UPDATE \"users\" SET id=1, name='Isis' WHERE id = 1",
        ]
    );
}

#[test]
fn replace_inserts_when_probe_finds_nothing() {
    let (mut db, mock) = engine();
    db.replace_with(
        data! { "id" => ":id", "name" => ":name" },
        bindings![(":id", 9), (":name", "Manny")],
    )
    .in_table("users")
    .execute()
    .unwrap();

    assert_eq!(
        mock.sql(),
        vec![
            "SELECT id FROM \"users\" WHERE id = 9 LIMIT 1",
            "INSERT INTO \"users\" (id, name) VALUES (:id, :name)",
        ]
    );
}

#[test]
fn execute_resets_configuration() {
    let (mut db, _mock) = engine();
    db.select("*").from("users").where_("id = 1").limit(1);
    assert!(!db.config().is_empty());

    db.execute().unwrap();
    assert!(db.config().is_empty());
}

#[test]
fn missing_query_type_is_rejected_and_state_reset() {
    let (mut db, mock) = engine();
    db.table("users").where_("id = 1");

    let err = db.execute().unwrap_err();
    assert!(err.is_unknown_query_type());
    assert!(db.config().is_empty());
    assert!(mock.sql().is_empty());
}

#[test]
fn missing_table_is_rejected() {
    let (mut db, mock) = engine();
    let err = db.select("*").execute().unwrap_err();
    assert!(err.is_query_execution());
    assert!(err.to_string().contains("no table"));
    assert!(mock.sql().is_empty());
}

#[test]
fn failure_propagates_driver_text_and_resets() {
    let (mut db, mock) = engine();
    mock.respond(Err(DbError::query("UNIQUE constraint failed: users.email")));

    let err = db
        .insert(data! { "email" => "a@b.c" })
        .in_table("users")
        .execute()
        .unwrap_err();
    assert!(err.to_string().contains("UNIQUE constraint failed"));
    assert_eq!(db.error_text(), "UNIQUE constraint failed: users.email");
    assert!(db.config().is_empty());
}

#[test]
fn raw_query_sniffs_keyword() {
    let (mut db, mock) = engine();
    mock.respond_rows(&["n"], vec![vec![Value::Int(3)]]);

    let rows = db
        .query("SELECT count(*) AS n FROM users")
        .unwrap()
        .into_objects()
        .unwrap();
    assert_eq!(rows[0].get::<i64>("n"), Some(3));

    let out = db.query("DELETE FROM users WHERE id = 1").unwrap();
    assert_eq!(out, QueryOutput::Count(1));

    assert!(db.query("DROP TABLE users").unwrap().is_done());
}

#[test]
fn raw_query_with_bindings_uses_bound_execution() {
    let (mut db, mock) = engine();
    db.query_with(
        "UPDATE users SET age = :age WHERE id = :id",
        bindings![(":age", "41", TypeHint::Int), (":id", 1)],
    )
    .unwrap();

    let executed = mock.executed();
    assert_eq!(executed[0].bindings.len(), 2);
    assert_eq!(executed[0].bindings[0].bound_value(), Value::Int(41));
}

#[test]
fn raw_query_with_unknown_keyword_leaves_config_alone() {
    let (mut db, mock) = engine();
    db.select("*").from("users");

    let err = db.query("EXPLAIN SELECT 1").unwrap_err();
    assert!(err.is_unknown_query_type());
    assert!(err.to_string().contains("EXPLAIN"));

    // Keywords are matched exactly.
    assert!(db.query("select * from users").unwrap_err().is_unknown_query_type());

    assert_eq!(db.config().table.as_deref(), Some("users"));
    assert!(mock.sql().is_empty());
}

#[test]
fn dropping_the_engine_releases_the_backend() {
    let (mut db, mock) = engine();
    db.release();
    assert_eq!(mock.released(), 1);
    drop(db);
    assert_eq!(mock.released(), 2);
}
