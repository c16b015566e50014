//! Database connection module for the VitalSentry backend
//!
//! Vital readings, alerts and patient profiles are stored in SQLite.
//! The pool is created exactly once at process startup through
//! `initialize_database_pool` and shared process-wide behind a `OnceCell`.

use std::env;
use std::sync::Arc;
use thiserror::Error;
use once_cell::sync::OnceCell;
use tracing::{info, error, warn};

use super::migrations;

/// Global database pool used throughout the application
static DB_POOL: OnceCell<DatabasePool> = OnceCell::new();

/// SQLite connection pool shared across repositories
pub type DatabasePool = Arc<r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>>;

/// Connection error
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Database pool already initialized
    #[error("Database pool is already initialized")]
    PoolAlreadyInitialized,

    /// Database pool not initialized
    #[error("Database pool is not initialized")]
    PoolNotInitialized,

    /// Migration error
    #[error("Database migration error: {0}")]
    Migration(String),
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub sqlite_path: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "./data/vitalsentry.db".to_string(),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration from environment variables
    pub fn from_env() -> Self {
        let sqlite_path = env::var("DB_SQLITE_PATH")
            .unwrap_or_else(|_| "./data/vitalsentry.db".to_string());

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let timeout_seconds = env::var("DB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        info!("Database configuration: path={}, max_connections={}, timeout={}s",
            sqlite_path, max_connections, timeout_seconds);

        DatabaseConfig {
            sqlite_path,
            max_connections,
            timeout_seconds,
        }
    }
}

/// Initialize the database connection pool.
///
/// Idempotent at the process level: the pool is stored in a `OnceCell`,
/// so a second call returns `PoolAlreadyInitialized` rather than
/// re-creating connections.
pub fn initialize_database_pool() -> Result<(), ConnectionError> {
    if DB_POOL.get().is_some() {
        return Err(ConnectionError::PoolAlreadyInitialized);
    }

    let config = DatabaseConfig::from_env();
    let pool = create_sqlite_pool(&config)?;

    match DB_POOL.set(pool) {
        Ok(_) => {
            migrations::run_migrations(&get_db_pool()?)
                .map_err(|e| ConnectionError::Migration(e.to_string()))?;
            Ok(())
        }
        Err(_) => Err(ConnectionError::PoolAlreadyInitialized),
    }
}

/// Get the database connection pool
pub fn get_db_pool() -> Result<DatabasePool, ConnectionError> {
    DB_POOL.get()
        .cloned()
        .ok_or(ConnectionError::PoolNotInitialized)
}

/// Create the SQLite connection pool
fn create_sqlite_pool(config: &DatabaseConfig) -> Result<DatabasePool, ConnectionError> {
    use rusqlite::OpenFlags;
    use std::fs;
    use std::path::Path;

    info!("Initializing SQLite database at: {}", config.sqlite_path);

    // Create parent directory if it doesn't exist
    if let Some(parent) = Path::new(&config.sqlite_path).parent() {
        if !parent.exists() {
            info!("Creating parent directory: {:?}", parent);
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Failed to create directory: {}, falling back to in-memory database", e);
                return create_in_memory_pool(config);
            }
        }
    }

    let manager = r2d2_sqlite::SqliteConnectionManager::file(&config.sqlite_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);

    match r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .build(manager)
    {
        Ok(pool) => {
            // Test connection to make sure it works
            match pool.get() {
                Ok(_) => {
                    info!("SQLite connection pool created successfully");
                    Ok(Arc::new(pool))
                }
                Err(e) => {
                    error!("Failed to connect to SQLite database: {}", e);
                    warn!("Falling back to in-memory SQLite database");
                    create_in_memory_pool(config)
                }
            }
        }
        Err(e) => {
            error!("Failed to create SQLite connection pool: {}", e);
            warn!("Falling back to in-memory SQLite database");
            create_in_memory_pool(config)
        }
    }
}

/// Create an in-memory SQLite pool when the file path is unusable
fn create_in_memory_pool(config: &DatabaseConfig) -> Result<DatabasePool, ConnectionError> {
    info!("Initializing in-memory SQLite database");

    let manager = r2d2_sqlite::SqliteConnectionManager::memory();

    let pool = r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .build(manager)?;

    Ok(Arc::new(pool))
}

/// Get information about the current database connection
pub fn get_connection_info() -> Option<String> {
    let pool = DB_POOL.get()?;

    match pool.get() {
        Ok(conn) => {
            let connection_info = match conn.query_row(
                "PRAGMA database_list",
                [],
                |row| row.get::<_, String>(2),
            ) {
                Ok(path) => {
                    if path.is_empty() || path == ":memory:" {
                        "SQLite in-memory database".to_string()
                    } else {
                        format!("SQLite database at {}", path)
                    }
                }
                Err(_) => "SQLite database (path unknown)".to_string(),
            };

            let state = pool.state();
            Some(format!("{} (connections: active={}, idle={})",
                connection_info,
                state.connections,
                state.idle_connections
            ))
        }
        Err(e) => {
            error!("Failed to get SQLite connection: {}", e);
            Some(format!("SQLite connection error: {}", e))
        }
    }
}
