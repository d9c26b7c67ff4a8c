#![allow(dead_code)]

use sqlbridge::TracingSqlHook;
use sqlbridge::prelude::*;

/// Install a test subscriber once; `RUST_LOG=sqlbridge=debug` shows SQL.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A fresh in-memory engine with a populated `users` table.
pub fn users_db() -> Engine {
    init_tracing();
    let mut db = Engine::new(SqliteBackend::in_memory().unwrap()).with_hook(TracingSqlHook::new());
    db.create([
        ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
        ("name", "TEXT NOT NULL"),
        ("email", "TEXT UNIQUE"),
        ("age", "INTEGER"),
    ])
    .table("users")
    .execute()
    .unwrap();

    for (name, email, age) in [
        ("Isis", "isis@example.com", 30),
        ("Manny", "manny@example.com", 41),
        ("Rosa", "rosa@example.com", 25),
    ] {
        db.insert(data! { "name" => name, "email" => email, "age" => age })
            .in_table("users")
            .execute()
            .unwrap();
    }
    db
}

pub fn names(output: QueryOutput) -> Vec<String> {
    output
        .into_objects()
        .unwrap()
        .iter()
        .map(|row| row.try_get::<String>("name").unwrap())
        .collect()
}
