//! Repository factory for runtime backend selection.
//!
//! The connection string decides the backend once, at startup:
//!
//! - `:memory:`, `sqlite::memory:`, `file::memory:?cache=shared`: in-memory `SQLite`
//! - `sqlite:<path>` / `sqlite://<path>`: `SQLite` database file (created if missing)
//! - `postgres://...` / `postgresql://...`: `PostgreSQL`
//!
//! # Example
//!
//! ```ignore
//! let store = StoreConfig::from_url(&config.database_url)?;
//! let repository = RepositoryFactory::new(store).create().await?;
//! ```

use std::str::FromStr;
use std::sync::Arc;

use sqlx::ConnectOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

use super::{PostgresTodoRepository, RepositoryError, SqliteTodoRepository, TodoRepository};
use crate::config::ConfigurationError;

/// Connection limit for the `PostgreSQL` pool.
const POSTGRES_MAX_CONNECTIONS: u32 = 5;

/// Connection limit for a file-backed `SQLite` pool.
const SQLITE_FILE_MAX_CONNECTIONS: u32 = 5;

// =============================================================================
// Configuration Types
// =============================================================================

/// Backing store selected from the connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// Private in-memory `SQLite` database, gone when the process exits.
    SqliteInMemory,
    /// `SQLite` database file, given as a `sqlite:` URL.
    SqliteFile(String),
    /// `PostgreSQL` server, given as a `postgres://` URL.
    Postgres(String),
}

impl StoreConfig {
    /// Classifies a connection string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::UnsupportedDatabaseUrl` if the string
    /// matches none of the known shapes.
    pub fn from_url(url: &str) -> Result<Self, ConfigurationError> {
        let url = url.trim();
        let lowered = url.to_lowercase();

        if matches!(
            lowered.as_str(),
            ":memory:" | "sqlite::memory:" | "sqlite://:memory:" | "file::memory:?cache=shared"
        ) {
            return Ok(Self::SqliteInMemory);
        }

        if lowered.starts_with("sqlite:") {
            return Ok(Self::SqliteFile(url.to_string()));
        }

        if lowered.starts_with("postgres://") || lowered.starts_with("postgresql://") {
            return Ok(Self::Postgres(url.to_string()));
        }

        Err(ConfigurationError::UnsupportedDatabaseUrl(url.to_string()))
    }

    /// Returns a short backend name for logging.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::SqliteInMemory => "sqlite-memory",
            Self::SqliteFile(_) => "sqlite-file",
            Self::Postgres(_) => "postgres",
        }
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The store could not be reached.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    /// The schema could not be provisioned.
    #[error("Schema provisioning error: {0}")]
    Schema(#[from] RepositoryError),
}

impl From<sqlx::Error> for FactoryError {
    fn from(error: sqlx::Error) -> Self {
        Self::DatabaseConnection(error.to_string())
    }
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Factory that opens the configured store and provisions its schema.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: StoreConfig,
}

impl RepositoryFactory {
    /// Creates a new repository factory for the given store.
    #[must_use]
    pub const fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Creates a factory from a raw connection string.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError::Configuration` for an unsupported URL.
    pub fn from_url(url: &str) -> Result<Self, FactoryError> {
        Ok(Self::new(StoreConfig::from_url(url)?))
    }

    /// Returns the store this factory connects to.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Connects to the store, ensures the schema and returns the repository.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the connection or schema creation fails.
    pub async fn create(&self) -> Result<Arc<dyn TodoRepository + Send + Sync>, FactoryError> {
        let repository: Arc<dyn TodoRepository + Send + Sync> = match &self.config {
            StoreConfig::SqliteInMemory => Arc::new(Self::create_sqlite_in_memory().await?),
            StoreConfig::SqliteFile(url) => Arc::new(Self::create_sqlite_file(url).await?),
            StoreConfig::Postgres(url) => Arc::new(Self::create_postgres(url).await?),
        };

        tracing::info!(backend = self.config.backend_name(), "Todo repository ready");
        Ok(repository)
    }

    /// Opens a fresh in-memory `SQLite` database with the schema applied.
    ///
    /// The pool is pinned to one connection that never expires; the database
    /// lives exactly as long as the pool.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the database cannot be opened.
    pub async fn create_sqlite_in_memory() -> Result<SqliteTodoRepository, FactoryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.disable_statement_logging();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let repository = SqliteTodoRepository::new(pool);
        repository.ensure_schema().await?;
        Ok(repository)
    }

    /// Opens (or creates) an `SQLite` database file with the schema applied.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the file cannot be opened or created.
    pub async fn create_sqlite_file(url: &str) -> Result<SqliteTodoRepository, FactoryError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_FILE_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let repository = SqliteTodoRepository::new(pool);
        repository.ensure_schema().await?;
        Ok(repository)
    }

    /// Connects to `PostgreSQL` with the schema applied.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the server cannot be reached.
    pub async fn create_postgres(url: &str) -> Result<PostgresTodoRepository, FactoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(POSTGRES_MAX_CONNECTIONS)
            .connect(url)
            .await?;

        let repository = PostgresTodoRepository::new(pool);
        repository.ensure_schema().await?;
        Ok(repository)
    }
}

// =============================================================================
// Tests
// =============================================================================
