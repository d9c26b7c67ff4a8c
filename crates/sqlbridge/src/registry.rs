//! Connection registry: one live engine per logical database.
//!
//! ```ignore
//! use sqlbridge::prelude::*;
//!
//! let registry = ConnectionRegistry::new();
//! let config = ConnectionConfig::new("sqlite").name(":memory:");
//! let db = registry.get_connection("main", Some(&config))?;
//!
//! // Later, anywhere holding the registry:
//! let same = registry.connection("main")?;
//! assert!(Arc::ptr_eq(&db, &same));
//! ```

use crate::backend::Backend;
use crate::engine::Engine;
use crate::error::{DbError, DbResult};
use crate::monitor::QueryHook;
use crate::settings::{ConfigSource, ConnectionConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An engine handed out by the registry.
///
/// Lock it for the duration of one statement chain; an engine's builder state
/// must not be interleaved between threads.
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Builds an unconnected backend of one kind.
pub type BackendFactory = Arc<dyn Fn() -> Box<dyn Backend> + Send + Sync>;

#[derive(Default)]
struct RegistryState {
    engines: HashMap<String, SharedEngine>,
    current_id: Option<String>,
}

/// Maps identifiers to live engines, creating them on first request.
pub struct ConnectionRegistry {
    state: Mutex<RegistryState>,
    factories: HashMap<String, BackendFactory>,
    hooks: Vec<Arc<dyn QueryHook>>,
    config_source: Option<Arc<dyn ConfigSource>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    /// A registry with the built-in backend kinds registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        #[cfg(feature = "sqlite")]
        registry.register_backend("sqlite", || Box::new(crate::backend::SqliteBackend::new()));
        #[cfg(feature = "postgres")]
        registry.register_backend("postgres", || {
            Box::new(crate::backend::PostgresBackend::new())
        });
        registry
    }

    /// A registry with no backend kinds at all.
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            factories: HashMap::new(),
            hooks: Vec::new(),
            config_source: None,
        }
    }

    /// Register (or replace) the factory for a backend kind.
    pub fn register_backend<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Backend> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
    }

    pub fn has_backend(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Fall back to `source` for identifiers requested without parameters.
    pub fn with_config_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.config_source = Some(Arc::new(source));
        self
    }

    /// Attach `hook` to every engine created from now on.
    pub fn with_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.with_hook_arc(Arc::new(hook))
    }

    pub fn with_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The engine for `identifier`, creating and connecting it on first use.
    ///
    /// On a cache hit `config` is ignored. On a miss, `config` (or, without
    /// one, the configured [`ConfigSource`]) supplies the parameters.
    ///
    /// The registry lock is held while a missing engine connects, so two
    /// callers never build the same identifier twice. Every other lookup,
    /// including cache hits for unrelated identifiers, waits until that
    /// connect returns; for Postgres this is a network round-trip.
    ///
    /// # Errors
    ///
    /// - `UnknownProvider` when the provider has no registered backend
    /// - `Connection` when connecting fails, carrying the backend's error text
    /// - `Config` when no parameters are available for `identifier`
    pub fn get_connection(
        &self,
        identifier: &str,
        config: Option<&ConnectionConfig>,
    ) -> DbResult<SharedEngine> {
        let mut state = self.lock();
        state.current_id = Some(identifier.to_string());

        if let Some(engine) = state.engines.get(identifier) {
            return Ok(Arc::clone(engine));
        }

        let config = match config {
            Some(config) => config.clone(),
            None => self.lookup(identifier)?,
        };
        let engine = Arc::new(Mutex::new(self.build(identifier, &config)?));
        state
            .engines
            .insert(identifier.to_string(), Arc::clone(&engine));
        Ok(engine)
    }

    /// Shorthand for [`ConnectionRegistry::get_connection`] without parameters.
    pub fn connection(&self, identifier: &str) -> DbResult<SharedEngine> {
        self.get_connection(identifier, None)
    }

    /// The cached engine for `identifier`, without creating one.
    pub fn get(&self, identifier: &str) -> Option<SharedEngine> {
        self.lock().engines.get(identifier).cloned()
    }

    /// The identifier most recently requested.
    pub fn current_id(&self) -> Option<String> {
        self.lock().current_id.clone()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.lock().engines.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.lock().engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers with a live engine, sorted.
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().engines.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn lookup(&self, identifier: &str) -> DbResult<ConnectionConfig> {
        let Some(source) = &self.config_source else {
            return Err(DbError::config(format!(
                "no connection parameters for '{identifier}' and no config source"
            )));
        };
        source.lookup(identifier)?.ok_or_else(|| {
            DbError::config(format!("no configuration found for '{identifier}'"))
        })
    }

    fn build(&self, identifier: &str, config: &ConnectionConfig) -> DbResult<Engine> {
        let factory = self
            .factories
            .get(&config.provider)
            .ok_or_else(|| DbError::UnknownProvider(config.provider.clone()))?;

        tracing::debug!(
            target: "sqlbridge::registry",
            identifier,
            provider = %config.provider,
            host = %config.host,
            name = %config.name,
            "creating connection"
        );

        let mut engine = Engine::connect(factory(), &config.connect_options())?;
        engine.set_identifier(identifier);
        for hook in &self.hooks {
            engine.add_hook_arc(Arc::clone(hook));
        }
        Ok(engine)
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&String> = self.factories.keys().collect();
        kinds.sort();
        f.debug_struct("ConnectionRegistry")
            .field("backends", &kinds)
            .field("connections", &self.identifiers())
            .field("hooks", &self.hooks.len())
            .field("config_source", &self.config_source.is_some())
            .finish()
    }
}
