//! Process configuration read from environment variables.
//!
//! | variable                   | default                      |
//! |----------------------------|------------------------------|
//! | `DATABASE_URL`             | `postgres://localhost/library` |
//! | `DATABASE_MAX_CONNECTIONS` | `5`                          |
//! | `PORT`                     | `8083`                       |
//! | `BOOK_SERVICE_URL`         | `http://localhost:8082/api`  |
//! | `USER_SERVICE_URL`         | `http://localhost:8081/api`  |
//! | `APP_ENV`                  | `production`                 |
//!
//! Circuit breakers are tuned with `CIRCUIT_DEFAULT_<FIELD>` for every breaker and
//! `CIRCUIT_<FUNCTION>_<FIELD>` for one guarded function, e.g.
//! `CIRCUIT_GET_BOOK_BY_ID_TIMEOUT_MS=1500`.

use crate::resilience::{BreakerConfig, BreakerOverride};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

const CIRCUIT_PREFIX: &str = "CIRCUIT_";
const DEFAULT_SCOPE: &str = "DEFAULT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("invalid circuit breaker settings for `{name}`: {reason}")]
    InvalidBreaker { name: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            _ => Environment::Production,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub book_service_url: String,
    pub user_service_url: String,
    pub environment: Environment,
    pub circuit_defaults: BreakerOverride,
    pub circuit_overrides: HashMap<String, BreakerOverride>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Builds the configuration from `(name, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let text = |key: &str, default: &str| {
            vars.get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        let (circuit_defaults, circuit_overrides) = circuit_settings(&vars)?;

        Ok(Self {
            database_url: text("DATABASE_URL", "postgres://localhost/library"),
            database_max_connections: parse_or(&vars, "DATABASE_MAX_CONNECTIONS", 5)?,
            port: parse_or(&vars, "PORT", 8083)?,
            book_service_url: text("BOOK_SERVICE_URL", "http://localhost:8082/api"),
            user_service_url: text("USER_SERVICE_URL", "http://localhost:8081/api"),
            environment: Environment::parse(&text("APP_ENV", "production")),
            circuit_defaults,
            circuit_overrides,
        })
    }

    /// Internal error details are only sent to clients in development.
    pub fn expose_internal_errors(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse_or<T>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(key) {
        None => Ok(default),
        Some(value) => parse_value(key, value),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Timeout,
    ErrorThresholdPercentage,
    ResetTimeout,
    VolumeThreshold,
    RollingWindow,
    BucketCount,
}

// RESET_TIMEOUT_MS must be tried before TIMEOUT_MS.
const FIELDS: [(&str, Field); 6] = [
    ("_RESET_TIMEOUT_MS", Field::ResetTimeout),
    ("_TIMEOUT_MS", Field::Timeout),
    ("_ERROR_THRESHOLD_PERCENTAGE", Field::ErrorThresholdPercentage),
    ("_VOLUME_THRESHOLD", Field::VolumeThreshold),
    ("_ROLLING_WINDOW_MS", Field::RollingWindow),
    ("_BUCKET_COUNT", Field::BucketCount),
];

fn set_field(
    target: &mut BreakerOverride,
    field: Field,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    match field {
        Field::Timeout => target.timeout = Some(Duration::from_millis(parse_value(key, value)?)),
        Field::ErrorThresholdPercentage => {
            target.error_threshold_percentage = Some(parse_value(key, value)?)
        }
        Field::ResetTimeout => {
            target.reset_timeout = Some(Duration::from_millis(parse_value(key, value)?))
        }
        Field::VolumeThreshold => target.volume_threshold = Some(parse_value(key, value)?),
        Field::RollingWindow => {
            target.rolling_window = Some(Duration::from_millis(parse_value(key, value)?))
        }
        Field::BucketCount => target.bucket_count = Some(parse_value(key, value)?),
    }
    Ok(())
}

/// Splits `CIRCUIT_<SCOPE>_<FIELD>` into scope and field.
fn split_circuit_key(key: &str) -> Option<(&str, Field)> {
    let rest = key.strip_prefix(CIRCUIT_PREFIX)?;
    FIELDS.iter().find_map(|(suffix, field)| {
        rest.strip_suffix(suffix)
            .filter(|scope| !scope.is_empty())
            .map(|scope| (scope, *field))
    })
}

type CircuitSettings = (BreakerOverride, HashMap<String, BreakerOverride>);

fn circuit_settings(vars: &HashMap<String, String>) -> Result<CircuitSettings, ConfigError> {
    let mut defaults = BreakerOverride::default();
    let mut overrides: HashMap<String, BreakerOverride> = HashMap::new();

    for (key, value) in vars {
        let Some((scope, field)) = split_circuit_key(key) else {
            continue;
        };
        if scope == DEFAULT_SCOPE {
            set_field(&mut defaults, field, key, value)?;
        } else {
            let name = scope.to_ascii_lowercase();
            set_field(overrides.entry(name).or_default(), field, key, value)?;
        }
    }

    let base = defaults.apply(BreakerConfig::default());
    base.validate().map_err(|reason| ConfigError::InvalidBreaker {
        name: DEFAULT_SCOPE.to_ascii_lowercase(),
        reason,
    })?;
    for (name, over) in &overrides {
        over.apply(base.clone())
            .validate()
            .map_err(|reason| ConfigError::InvalidBreaker {
                name: name.clone(),
                reason,
            })?;
    }

    Ok((defaults, overrides))
}
