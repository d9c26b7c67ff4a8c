mod common;

use common::{names, users_db};
use sqlbridge::prelude::*;

#[test]
fn insert_returns_row_count() {
    let mut db = users_db();
    let out = db
        .insert(data! { "name" => "Lena", "email" => "lena@example.com", "age" => 33 })
        .in_table("users")
        .execute()
        .unwrap();
    assert_eq!(out, QueryOutput::Count(1));
    assert_eq!(db.last_insert_id(), 4);
}

#[test]
fn insert_returns_last_id_on_request() {
    let mut db = users_db();
    let out = db
        .insert(data! { "name" => "Lena" })
        .in_table("users")
        .execute_as(ResultShape::LastId)
        .unwrap();
    assert_eq!(out.last_id(), Some(4));
}

#[test]
fn insert_with_bindings_and_null_hint() {
    let mut db = users_db();
    db.insert_with(
        data! { "name" => ":name", "email" => ":email", "age" => ":age" },
        bindings![
            (":name", "O'Brien"),
            (":email", "obrien@example.com"),
            (":age", "ignored", TypeHint::Null),
        ],
    )
    .in_table("users")
    .execute()
    .unwrap();

    let rows = db
        .select("*")
        .from("users")
        .where_("id = 4")
        .execute()
        .unwrap()
        .into_objects()
        .unwrap();
    assert_eq!(rows[0]["name"], Value::from("O'Brien"));
    assert!(rows[0]["age"].is_null());
}

#[test]
fn insert_quotes_literals_without_bindings() {
    let mut db = users_db();
    db.insert(data! { "name" => "D'Arcy", "age" => Option::<i64>::None })
        .in_table("users")
        .execute()
        .unwrap();
    let rows = db
        .select("name")
        .from("users")
        .where_("age IS NULL")
        .execute()
        .unwrap();
    assert_eq!(names(rows), vec!["D'Arcy"]);
}

#[test]
fn duplicate_key_reports_driver_text() {
    let mut db = users_db();
    let err = db
        .insert(data! { "name" => "Isis 2", "email" => "isis@example.com" })
        .in_table("users")
        .execute()
        .unwrap_err();
    assert!(err.is_query_execution());
    assert!(err.to_string().contains("UNIQUE constraint failed: users.email"));
    assert!(db.error_text().contains("UNIQUE constraint failed"));
    assert!(db.config().is_empty());
}

#[test]
fn insert_into_unknown_table_fails() {
    let mut db = users_db();
    let err = db
        .insert(data! { "a" => 1 })
        .in_table("missing")
        .execute()
        .unwrap_err();
    assert!(err.to_string().contains("no such table: missing"));
}

#[test]
fn plain_insert_drops_bindings_from_an_abandoned_chain() {
    let mut db = users_db();
    db.select("*")
        .from("users")
        .where_with("id = :id", bindings![(":id", 1)]);
    let out = db
        .insert(data! { "name" => "Lena" })
        .in_table("users")
        .execute()
        .unwrap();
    assert_eq!(out, QueryOutput::Count(1));

    let rows = db
        .select("name")
        .from("users")
        .where_("id = 4")
        .execute()
        .unwrap();
    assert_eq!(names(rows), vec!["Lena"]);
}
