//! Database connection management with SQLx
//!
//! Provides connection pooling for both PostgreSQL and SQLite

use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Postgres, Sqlite};
use std::time::Duration;
use tracing::info;

use keygen_core::{Error, Result};

/// Database connection pool enum supporting both PostgreSQL and SQLite
#[derive(Clone)]
pub enum DatabasePool {
    Postgres(Pool<Postgres>),
    Sqlite(Pool<Sqlite>),
}

impl DatabasePool {
    /// Create a new PostgreSQL connection pool
    pub async fn new_postgres(config: &DatabaseConfig) -> Result<Self> {
        info!("Creating PostgreSQL connection pool with {} max connections", config.max_connections);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.database_url)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create PostgreSQL pool: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to run migrations: {}", e)))?;

        info!("PostgreSQL connection pool created successfully");
        Ok(DatabasePool::Postgres(pool))
    }

    /// Create a new SQLite connection pool
    pub async fn new_sqlite(config: &DatabaseConfig) -> Result<Self> {
        info!("Creating SQLite connection pool with {} max connections", config.max_connections);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.database_url)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create SQLite pool: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to run migrations: {}", e)))?;

        info!("SQLite connection pool created successfully");
        Ok(DatabasePool::Sqlite(pool))
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<()> {
        match self {
            DatabasePool::Postgres(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(|e| Error::Storage(format!("PostgreSQL health check failed: {}", e)))?;
            }
            DatabasePool::Sqlite(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .map_err(|e| Error::Storage(format!("SQLite health check failed: {}", e)))?;
            }
        }
        Ok(())
    }

    pub fn backend(&self) -> &'static str {
        match self {
            DatabasePool::Postgres(_) => "postgres",
            DatabasePool::Sqlite(_) => "sqlite",
        }
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::Postgres(pool) => pool.close().await,
            DatabasePool::Sqlite(pool) => pool.close().await,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
}

pub const DEFAULT_DATABASE_URL: &str = "sqlite://keygen.db?mode=rwc";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connection_timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Self::default()
        }
    }

    /// In-memory SQLite, single connection so every query sees the same database
    pub fn sqlite_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connection_timeout_seconds: 5,
        }
    }

    fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }
}

/// Initialize database connection pool based on the URL scheme
pub async fn initialize_database(config: &DatabaseConfig) -> Result<DatabasePool> {
    // The URL may carry credentials
    info!(max_connections = config.max_connections, "Initializing database");

    if config.database_url.starts_with("postgres://") || config.database_url.starts_with("postgresql://") {
        DatabasePool::new_postgres(config).await
    } else if config.database_url.starts_with("sqlite:") {
        DatabasePool::new_sqlite(config).await
    } else {
        Err(Error::Config(
            "Unsupported database URL format. Use postgres:// or sqlite:".to_string(),
        ))
    }
}
