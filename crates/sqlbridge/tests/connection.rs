use sqlbridge::prelude::*;
use sqlbridge::{MapConfigSource, StatsHook, TomlConfigSource};
use std::io::Write;
use std::sync::Arc;

#[test]
fn registry_reuses_connections_by_identifier() {
    let registry = ConnectionRegistry::new();
    let config = ConnectionConfig::new("sqlite").name(":memory:");

    let first = registry.get_connection("main", Some(&config)).unwrap();
    first
        .lock()
        .unwrap()
        .create([("id", "INTEGER PRIMARY KEY"), ("name", "TEXT")])
        .table("items")
        .execute()
        .unwrap();

    // Parameters are ignored on a cache hit; the table is still there.
    let second = registry
        .get_connection("main", Some(&ConnectionConfig::new("postgres")))
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let mut db = second.lock().unwrap();
    db.insert(data! { "name" => "widget" })
        .in_table("items")
        .execute()
        .unwrap();
    assert_eq!(db.select("*").from("items").execute().unwrap().count(), Some(1));
}

#[test]
fn separate_identifiers_get_separate_databases() {
    let registry = ConnectionRegistry::new();
    let config = ConnectionConfig::new("sqlite");
    let a = registry.get_connection("a", Some(&config)).unwrap();
    let b = registry.get_connection("b", Some(&config)).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));

    a.lock().unwrap().query("CREATE TABLE only_a (id INTEGER)").unwrap();
    let err = b.lock().unwrap().query("SELECT * FROM only_a").unwrap_err();
    assert!(err.to_string().contains("no such table"));
    assert_eq!(registry.current_id().as_deref(), Some("b"));
}

#[test]
fn unknown_provider() {
    let registry = ConnectionRegistry::new();
    let err = registry
        .get_connection("x", Some(&ConnectionConfig::new("mssql")))
        .unwrap_err();
    assert!(err.is_unknown_provider());
}

#[test]
fn unopenable_sqlite_path_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("db.sqlite");
    let registry = ConnectionRegistry::new();
    let config = ConnectionConfig::new("sqlite").name(path.to_string_lossy());

    let err = registry.get_connection("x", Some(&config)).unwrap_err();
    assert!(err.is_connection());
    assert!(!registry.contains("x"));
}

#[test]
fn sqlite_file_database_persists_across_engines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.sqlite");
    let config = ConnectionConfig::new("sqlite").name(path.to_string_lossy());

    {
        let registry = ConnectionRegistry::new();
        let db = registry.get_connection("app", Some(&config)).unwrap();
        let mut db = db.lock().unwrap();
        db.query("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT)").unwrap();
        db.insert(data! { "k" => "a", "v" => "1" })
            .in_table("kv")
            .execute()
            .unwrap();
    }

    let registry = ConnectionRegistry::new();
    let db = registry.get_connection("app", Some(&config)).unwrap();
    let rows = db
        .lock()
        .unwrap()
        .select("v")
        .from("kv")
        .where_("k = 'a'")
        .execute()
        .unwrap()
        .into_objects()
        .unwrap();
    assert_eq!(rows[0]["v"], Value::from("1"));
}

#[test]
fn registry_reads_toml_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("configured.sqlite");
    let config_path = dir.path().join("sqlbridge.toml");

    // SAFETY: test-only variable with a name no other test uses.
    unsafe { std::env::set_var("SQLBRIDGE_CONNECTION_TEST_DB", db_path.to_string_lossy().as_ref()) };
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        r#"
[db.configured]
provider = "sqlite"
name = "${{SQLBRIDGE_CONNECTION_TEST_DB}}"
"#
    )
    .unwrap();

    let registry = ConnectionRegistry::new()
        .with_config_source(TomlConfigSource::load(&config_path).unwrap());
    let db = registry.connection("configured").unwrap();
    db.lock().unwrap().query("CREATE TABLE t (id INTEGER)").unwrap();
    assert!(db_path.exists());

    let err = registry.connection("unlisted").unwrap_err();
    assert!(matches!(err, DbError::Config(_)));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TomlConfigSource::load(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, DbError::Config(_)));
}

#[test]
fn registry_hooks_are_attached_to_new_engines() {
    let stats = Arc::new(StatsHook::new());
    let registry = ConnectionRegistry::new()
        .with_hook_arc(stats.clone())
        .with_config_source(
            MapConfigSource::new().with("mem", ConnectionConfig::new("sqlite")),
        );

    let db = registry.connection("mem").unwrap();
    let mut db = db.lock().unwrap();
    db.query("CREATE TABLE t (id INTEGER)").unwrap();
    db.insert(data! { "id" => 1 }).in_table("t").execute().unwrap();
    db.select("*").from("t").execute().unwrap();

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_queries, 3);
    assert_eq!(snapshot.create_count, 1);
    assert_eq!(snapshot.insert_count, 1);
    assert_eq!(snapshot.select_count, 1);
}

#[test]
fn release_is_idempotent() {
    let mut db = Engine::new(SqliteBackend::in_memory().unwrap());
    assert!(db.is_connected());
    db.release();
    db.release();
    assert!(!db.is_connected());

    let err = db.query("SELECT 1").unwrap_err();
    assert!(err.is_query_execution());
}
