//! Keygen API
//!
//! HTTP server issuing deterministic per-user keys backed by SQLx storage.

pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod state;

pub use config::{Cli, ServiceConfig};
pub use error::ApiError;
pub use services::router;
pub use state::AppState;
