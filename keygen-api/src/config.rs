//! Service configuration from the environment and command line

use std::path::PathBuf;

use clap::Parser;

use keygen_core::crypto::keys::bitcoin::parse_network;
use keygen_core::{AddressFormat, BitcoinConfig, Error, KeygenConfig, Result};

use crate::database::connection::{DatabaseConfig, DEFAULT_DATABASE_URL, DEFAULT_MAX_CONNECTIONS};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Command line flags. Each one overrides its environment variable.
#[derive(Parser, Debug, Default)]
#[command(name = "keygen-api")]
#[command(about = "Deterministic per-user key issuance over HTTP", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Load variables from this file instead of ./.env
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// postgres://, postgresql:// or sqlite: URL
    #[arg(long)]
    pub database_url: Option<String>,
}

impl Cli {
    /// Load the env file named on the command line, or `.env` when present
    pub fn load_env_file(&self) -> Result<()> {
        match &self.env_file {
            Some(path) => dotenvy::from_path(path)
                .map_err(|e| Error::Config(format!("Failed to load {}: {}", path.display(), e))),
            None => ignore_missing(dotenvy::dotenv().map(|_| ())),
        }
    }
}

/// An absent optional `.env` is fine; an unreadable or malformed one is not
fn ignore_missing(result: dotenvy::Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(Error::Config(format!("Failed to load .env: {}", e))),
    }
}

/// Everything the server needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub keygen: KeygenConfig,
    pub database: DatabaseConfig,
    pub host: String,
    pub port: u16,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let master_seed = var("MASTER_SEED")
            .ok_or_else(|| Error::Config("MASTER_SEED not set".to_string()))?;
        let encryption_key = var("ENCRYPTION_KEY")
            .ok_or_else(|| Error::Config("ENCRYPTION_KEY not set".to_string()))?;

        let mut bitcoin = BitcoinConfig::default();
        if let Some(network) = var("BITCOIN_NETWORK") {
            bitcoin.network = parse_network(&network)?;
        }
        if let Some(format) = var("BITCOIN_ADDRESS_FORMAT") {
            bitcoin.address_format = format.parse::<AddressFormat>()?;
        }

        let keygen = KeygenConfig::from_raw(&master_seed, &encryption_key)?.with_bitcoin(bitcoin);

        let database = DatabaseConfig {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_var(var("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            ..DatabaseConfig::default()
        };

        Ok(Self {
            keygen,
            database,
            host: var("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_var(var("SERVER_PORT"), "SERVER_PORT")?.unwrap_or(DEFAULT_PORT),
        })
    }

    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(url) = &cli.database_url {
            self.database.database_url = url.clone();
        }
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(value: Option<String>, key: &str) -> Result<Option<T>> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| Error::Config(format!("Invalid {}: {}", key, raw)))
        })
        .transpose()
}
