use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),

    #[error("invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Rest,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage backend '{other}' (expected rest|memory)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl FromStr for AppEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Process-wide settings, read once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: AppEnvironment,
    pub storage: StorageBackend,
    pub supabase_url: String,
    pub service_key: String,
    /// Direct database connection. Only used to provision the schema.
    pub postgres_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let storage: StorageBackend = try_load("STORAGE_BACKEND", "rest")?;

        let supabase_url = var("SUPABASE_URL")
            .or_else(|| var("NEXT_PUBLIC_SUPABASE_URL"))
            .unwrap_or_default();
        let service_key = var("SUPABASE_SERVICE_ROLE_KEY").unwrap_or_default();

        if storage == StorageBackend::Rest {
            if supabase_url.is_empty() {
                return Err(ConfigError::Missing("SUPABASE_URL"));
            }
            if service_key.is_empty() {
                return Err(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"));
            }
        }

        Ok(Self {
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "3000")?,
            environment: try_load("APP_ENV", "development")?,
            storage,
            supabase_url,
            service_key,
            postgres_url: var("POSTGRES_URL"),
        })
    }

    /// Settings for an in-memory development instance.
    pub fn memory() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: AppEnvironment::Development,
            storage: StorageBackend::Memory,
            supabase_url: String::new(),
            service_key: String::new(),
            postgres_url: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == AppEnvironment::Production
    }

    /// Port tried when `port` is taken. `None` when there is no next port.
    pub fn fallback_port(&self) -> Option<u16> {
        self.port.checked_add(1)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}
