//! Database layer: connection pool and repositories

pub mod connection;
pub mod repositories;

pub use connection::{initialize_database, DatabaseConfig, DatabasePool};
pub use repositories::SqlxKeyRecordRepository;
