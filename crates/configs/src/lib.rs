//! # configs
//!
//! Layered runtime settings: built-in defaults, then an optional
//! `config/default.toml`, then `COMMUNITY__*` environment variables
//! (a `.env` file is honoured). `COMMUNITY__DATABASE__URL` sets
//! `database.url`, and so on.

use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "COMMUNITY";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Which store implementation the binary wires into the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// Connection string; kept secret because it usually embeds a password.
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PaginationSettings {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub storage: StorageSettings,
    pub database: DatabaseSettings,
    pub pagination: PaginationSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Loads `.env`, then the default file and environment layers.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Same as [`Settings::load`] but reads `file` (if present) instead of
    /// the default location, and skips `.env`.
    pub fn load_from(file: &Path) -> Result<Self, SettingsError> {
        let raw = with_defaults(Config::builder())?
            .add_source(File::from(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Self::from_config(raw)
    }

    pub fn from_config(raw: Config) -> Result<Self, SettingsError> {
        let settings: Self = raw.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let PaginationSettings {
            default_page_size,
            max_page_size,
        } = self.pagination;
        if default_page_size == 0 {
            return Err(SettingsError::Invalid(
                "pagination.default_page_size must be at least 1".to_string(),
            ));
        }
        if default_page_size > max_page_size {
            return Err(SettingsError::Invalid(format!(
                "pagination.default_page_size ({default_page_size}) exceeds pagination.max_page_size ({max_page_size})"
            )));
        }
        if self.database.max_connections == 0 {
            return Err(SettingsError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Built-in defaults: in-memory storage and a local database URL.
pub fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, SettingsError> {
    Ok(builder
        .set_default("storage.backend", "memory")?
        .set_default("database.url", "postgres://localhost:5432/community")?
        .set_default("database.max_connections", 5_i64)?
        .set_default("pagination.default_page_size", 10_i64)?
        .set_default("pagination.max_page_size", 100_i64)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?)
}
