//! Connection configuration sources.
//!
//! A [`ConfigSource`] supplies connection parameters by identifier when a
//! registry is asked for a connection it has not built yet and the caller gave
//! no explicit parameters.
//!
//! The TOML layout is one table per identifier:
//!
//! ```toml
//! [db.main]
//! provider = "postgres"
//! host = "localhost"
//! user = "app"
//! name = "app"
//! password = "${APP_DB_PASSWORD}"
//!
//! [db.main.settings]
//! charset = "UTF8"
//! port = 5433
//! ```

use crate::backend::ConnectOptions;
use crate::error::{DbError, DbResult};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Parameters for one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    /// Backend kind, e.g. `"sqlite"` or `"postgres"`.
    pub provider: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub user: String,
    /// Database name, or the file path for SQLite.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub settings: ConnectionSettings,
}

/// Backend-specific extras.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionSettings {
    pub charset: Option<String>,
    pub port: Option<u16>,
}

impl ConnectionConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.settings.charset = Some(charset.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.settings.port = Some(port);
        self
    }

    /// The options handed to `Backend::connect`.
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.host.clone(),
            user: self.user.clone(),
            db_name: self.name.clone(),
            password: self.password.clone(),
            charset: self.settings.charset.clone(),
            port: self.settings.port,
        }
    }

    fn expand_env(&mut self) -> Result<(), String> {
        self.provider = expand_env_vars(&self.provider)?;
        self.host = expand_env_vars(&self.host)?;
        self.user = expand_env_vars(&self.user)?;
        self.name = expand_env_vars(&self.name)?;
        self.password = expand_env_vars(&self.password)?;
        if let Some(charset) = self.settings.charset.as_mut() {
            *charset = expand_env_vars(charset)?;
        }
        Ok(())
    }
}

/// Looks up connection parameters by identifier.
pub trait ConfigSource: Send + Sync {
    /// `Ok(None)` when the identifier is unknown to this source.
    fn lookup(&self, identifier: &str) -> DbResult<Option<ConnectionConfig>>;
}

/// Connection tables read from TOML.
#[derive(Debug, Clone, Default)]
pub struct TomlConfigSource {
    entries: BTreeMap<String, ConnectionConfig>,
}

#[derive(Debug, Deserialize)]
struct TomlFile {
    #[serde(default)]
    db: BTreeMap<String, ConnectionConfig>,
}

impl TomlConfigSource {
    pub fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DbError::config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&raw).map_err(|e| match e {
            DbError::Config(msg) => DbError::config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse TOML text, expanding `${VAR}` references.
    pub fn parse(raw: &str) -> DbResult<Self> {
        let file: TomlFile = toml::from_str(raw)
            .map_err(|e| DbError::config(format!("failed to parse config: {e}")))?;

        let mut entries = file.db;
        for (identifier, config) in &mut entries {
            config
                .expand_env()
                .map_err(|e| DbError::config(format!("db.{identifier}: {e}")))?;
        }
        Ok(Self { entries })
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl ConfigSource for TomlConfigSource {
    fn lookup(&self, identifier: &str) -> DbResult<Option<ConnectionConfig>> {
        Ok(self.entries.get(identifier).cloned())
    }
}

/// An in-memory source.
#[derive(Debug, Clone, Default)]
pub struct MapConfigSource {
    entries: HashMap<String, ConnectionConfig>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, identifier: impl Into<String>, config: ConnectionConfig) -> Self {
        self.insert(identifier, config);
        self
    }

    pub fn insert(&mut self, identifier: impl Into<String>, config: ConnectionConfig) {
        self.entries.insert(identifier.into(), config);
    }
}

impl ConfigSource for MapConfigSource {
    fn lookup(&self, identifier: &str) -> DbResult<Option<ConnectionConfig>> {
        Ok(self.entries.get(identifier).cloned())
    }
}

fn expand_env_vars(input: &str) -> Result<String, String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                return Err(format!("unterminated env var reference: ${{{key}"));
            }
            if key.is_empty() {
                return Err("invalid env var reference: ${}".to_string());
            }

            let value = std::env::var(&key)
                .map_err(|_| format!("missing env var for config expansion: {key}"))?;
            out.push_str(&value);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tables_and_settings() {
        let source = TomlConfigSource::parse(
            r#"
            [db.main]
            provider = "postgres"
            host = "db.internal"
            user = "app"
            name = "app"

            [db.main.settings]
            charset = "UTF8"
            port = 5433

            [db.cache]
            provider = "sqlite"
            name = ":memory:"
            "#,
        )
        .unwrap();

        let main = source.lookup("main").unwrap().unwrap();
        assert_eq!(main.provider, "postgres");
        assert_eq!(main.settings.port, Some(5433));
        let options = main.connect_options();
        assert_eq!(options.host, "db.internal");
        assert_eq!(options.db_name, "app");
        assert_eq!(options.charset.as_deref(), Some("UTF8"));

        let cache = source.lookup("cache").unwrap().unwrap();
        assert_eq!(cache.host, "");
        assert_eq!(cache.settings, ConnectionSettings::default());

        assert!(source.lookup("missing").unwrap().is_none());
        assert_eq!(source.identifiers().collect::<Vec<_>>(), vec!["cache", "main"]);
    }

    #[test]
    fn expands_environment_references() {
        // SAFETY: test-only variable with a name no other test uses.
        unsafe { std::env::set_var("SQLBRIDGE_SETTINGS_TEST_PW", "s3cret") };
        assert_eq!(
            expand_env_vars("pw=${SQLBRIDGE_SETTINGS_TEST_PW};").unwrap(),
            "pw=s3cret;"
        );
        assert_eq!(expand_env_vars("plain $HOME").unwrap(), "plain $HOME");
    }

    #[test]
    fn missing_variable_is_a_config_error() {
        let err = TomlConfigSource::parse(
            r#"
            [db.main]
            provider = "postgres"
            password = "${SQLBRIDGE_SETTINGS_TEST_UNSET_VAR}"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
        assert!(err.to_string().contains("db.main"));
        assert!(err.to_string().contains("SQLBRIDGE_SETTINGS_TEST_UNSET_VAR"));
    }

    #[test]
    fn malformed_references_are_rejected() {
        assert!(expand_env_vars("${").is_err());
        assert!(expand_env_vars("${}").is_err());
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = TomlConfigSource::parse("[db.main]\nprovider = ").unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn map_source_returns_clones() {
        let source = MapConfigSource::new().with("a", ConnectionConfig::new("sqlite").name(":memory:"));
        assert_eq!(source.lookup("a").unwrap().unwrap().name, ":memory:");
        assert!(source.lookup("b").unwrap().is_none());
    }
}
