//! Runtime configuration for the agency service.
//!
//! Everything is resolved from environment variables so deployments stay
//! twelve-factor: `APP_ENV`, `APP_BIND_ADDR` and `APP_SEED_DEMO`, with a
//! `.env` file honored in development.

use std::{env, net::SocketAddr};

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Loads environment variables from `.env` when available.
///
/// Missing files are ignored so the function is safe in production builds
/// where dotenv files are not deployed.
pub fn load_env_file() {
    let _ = dotenvy::dotenv();
}

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    /// Populate the registry with sample fixtures at startup. Only honored
    /// in development.
    pub seed_demo: bool,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment
    /// variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::parse(&env_value)?;

        let bind_value =
            env::var("APP_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_value
            .parse()
            .map_err(|err| ConfigError::BindAddress(bind_value, err))?;

        let seed_demo = match env::var("APP_SEED_DEMO") {
            Ok(raw) => parse_flag(&raw)?,
            Err(_) => false,
        };

        Ok(Self {
            bind_addr,
            environment,
            seed_demo,
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool, ConfigError> {
    match raw {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(ConfigError::InvalidFlag(other.to_string())),
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("APP_ENV must be one of 'development', 'production', or 'test' (got {0})")]
    InvalidEnvironment(String),
    #[error("invalid APP_BIND_ADDR value {0:?}: {1}")]
    BindAddress(String, std::net::AddrParseError),
    #[error("APP_SEED_DEMO must be a boolean flag (got {0})")]
    InvalidFlag(String),
}
