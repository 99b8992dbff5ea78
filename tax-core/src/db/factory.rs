use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use super::repository::{RepositoryError, ReturnRepository};

/// Which storage backend to open, and how.
///
/// `connection_string` is handed to the selected factory untouched.
///
/// | backend  | connection_string examples                  |
/// |----------|---------------------------------------------|
/// | `sqlite` | `sqlite://returns.db`, `sqlite::memory:`    |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Name of a registered factory, e.g. `"sqlite"`.
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "sqlite::memory:".to_string(),
        }
    }
}

/// Opens a [`ReturnRepository`] for one backend. Each storage crate exports
/// a unit struct implementing this trait.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Connects and prepares the store. Implementations may run migrations
    /// here.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ReturnRepository>, RepositoryError>;
}

/// Factories keyed by backend name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Adds a factory, replacing any previous one with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens a repository with the factory named by `config.backend`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Configuration`] when no such backend is registered;
    /// otherwise whatever the factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn ReturnRepository>, RepositoryError> {
        let factory = self.factories.get(config.backend.as_str()).ok_or_else(|| {
            RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            ))
        })?;

        debug!(backend = %config.backend, "opening return repository");
        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::db::repository::{StoredResult, StoredReturn};
    use crate::models::{CalculationResult, TaxReturn};

    // Routing is all that is exercised; the storage methods are never called.
    struct StubRepository;

    #[async_trait]
    impl ReturnRepository for StubRepository {
        async fn save_return(
            &self,
            _tax_return: &TaxReturn,
        ) -> Result<StoredReturn, RepositoryError> {
            unimplemented!()
        }

        async fn update_return(
            &self,
            _id: i64,
            _tax_return: &TaxReturn,
        ) -> Result<StoredReturn, RepositoryError> {
            unimplemented!()
        }

        async fn get_return(
            &self,
            _id: i64,
        ) -> Result<StoredReturn, RepositoryError> {
            unimplemented!()
        }

        async fn list_returns(
            &self,
            _tax_year: Option<i32>,
        ) -> Result<Vec<StoredReturn>, RepositoryError> {
            unimplemented!()
        }

        async fn delete_return(
            &self,
            _id: i64,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }

        async fn save_result(
            &self,
            _return_id: i64,
            _result: &CalculationResult,
        ) -> Result<StoredResult, RepositoryError> {
            unimplemented!()
        }

        async fn get_result(
            &self,
            _return_id: i64,
        ) -> Result<StoredResult, RepositoryError> {
            unimplemented!()
        }
    }

    struct StubFactory {
        name: &'static str,
        opened: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn ReturnRepository>, RepositoryError> {
            self.opened.store(true, Ordering::SeqCst);
            Ok(Box::new(StubRepository))
        }
    }

    struct UnreachableFactory;

    #[async_trait]
    impl RepositoryFactory for UnreachableFactory {
        fn backend_name(&self) -> &'static str {
            "unreachable"
        }

        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn ReturnRepository>, RepositoryError> {
            Err(RepositoryError::Connection("host down".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let opened = Arc::new(AtomicBool::new(false));
        let factory = StubFactory {
            name,
            opened: Arc::clone(&opened),
        };
        (Box::new(factory), opened)
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: "sqlite::memory:".to_string(),
        }
    }

    // =========================================================================
    // registry tests
    // =========================================================================

    #[test]
    fn default_config_is_in_memory_sqlite() {
        let config = DbConfig::default();

        assert_eq!(config.backend, "sqlite");
        assert_eq!(config.connection_string, "sqlite::memory:");
    }

    #[test]
    fn empty_registry_lists_nothing() {
        assert!(RepositoryRegistry::default().available_backends().is_empty());
    }

    #[test]
    fn available_backends_sorted_and_deduplicated() {
        let mut registry = RepositoryRegistry::new();
        registry.register(stub_factory("sqlite").0);
        registry.register(stub_factory("postgres").0);
        registry.register(stub_factory("sqlite").0);

        assert_eq!(registry.available_backends(), vec!["postgres", "sqlite"]);
    }

    // =========================================================================
    // create tests
    // =========================================================================

    #[tokio::test]
    async fn create_opens_only_the_named_backend() {
        let mut registry = RepositoryRegistry::new();
        let (sqlite, sqlite_opened) = stub_factory("sqlite");
        let (postgres, postgres_opened) = stub_factory("postgres");
        registry.register(sqlite);
        registry.register(postgres);

        let result = registry.create(&config("sqlite")).await;

        assert!(result.is_ok());
        assert!(sqlite_opened.load(Ordering::SeqCst));
        assert!(!postgres_opened.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn create_unknown_backend_names_the_alternatives() {
        let mut registry = RepositoryRegistry::new();
        registry.register(stub_factory("sqlite").0);

        let result = registry.create(&config("postgres")).await;

        match result {
            Err(RepositoryError::Configuration(message)) => {
                assert!(message.contains("postgres"));
                assert!(message.contains("sqlite"));
            }
            Err(other) => panic!("expected configuration error, got {other:?}"),
            Ok(_) => panic!("expected configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn create_surfaces_factory_error() {
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(UnreachableFactory));

        let result = registry.create(&config("unreachable")).await;

        assert!(matches!(
            result,
            Err(RepositoryError::Connection(message)) if message == "host down"
        ));
    }
}
