mod common;

use common::{names, users_db};
use sqlbridge::prelude::*;

#[test]
fn delete_with_where() {
    let mut db = users_db();
    let out = db
        .delete()
        .from("users")
        .where_("name = 'Manny'")
        .execute()
        .unwrap();
    assert_eq!(out, QueryOutput::Count(1));

    let rows = db.select("name").from("users").order("id").execute().unwrap();
    assert_eq!(names(rows), vec!["Isis", "Rosa"]);
}

#[test]
fn delete_with_bindings() {
    let mut db = users_db();
    let out = db
        .delete()
        .from("users")
        .where_with("age < ?", vec![Binding::positional(1, 35)])
        .execute()
        .unwrap();
    assert_eq!(out.count(), Some(2));
}

#[test]
fn repeated_delete_affects_nothing_the_second_time() {
    let mut db = users_db();
    let delete_young = |db: &mut Engine| {
        db.delete()
            .from("users")
            .where_("age < 35")
            .execute()
            .unwrap()
    };
    assert_eq!(delete_young(&mut db), QueryOutput::Count(2));
    assert_eq!(delete_young(&mut db), QueryOutput::Count(0));
}

#[test]
fn delete_without_where_clears_table() {
    let mut db = users_db();
    assert_eq!(db.delete().from("users").execute().unwrap().count(), Some(3));
    assert_eq!(db.delete().from("users").execute().unwrap().count(), Some(0));
    assert_eq!(db.select("*").from("users").execute().unwrap().count(), Some(0));
}

#[test]
fn delete_requires_a_table() {
    let mut db = users_db();
    let err = db.delete().where_("id = 1").execute().unwrap_err();
    assert!(err.is_query_execution());
    assert!(db.config().is_empty());
}
