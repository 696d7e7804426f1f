//! CLI argument definitions for the Sahayak binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Sahayak — a multilingual customer-service chat backend.
#[derive(Parser, Debug)]
#[command(name = "sahayak", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Path to the SQLite database file.
    #[arg(short = 'd', long = "db")]
    pub db: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SAHAYAK_CONFIG env var > ./sahayak.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SAHAYAK_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("sahayak.toml")
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > SAHAYAK_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("SAHAYAK_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Resolve the database path.
    ///
    /// Priority: --db flag > config file value.
    pub fn resolve_db_path(&self, config_path: &str) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_path))
    }
}
