use std::env;
use std::fmt;

use chrono::Duration;
use log::warn;
use thiserror::Error;

pub const DEFAULT_SECRET_KEY: &str = "dev-secret-key";
const DEVELOPMENT_DATABASE_URL: &str = "sqlite://taskmanager_dev.db";
const TESTING_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in the {1} profile")]
    Missing(&'static str, Profile),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

// Deployment profile, selected through APP_ENV (FLASK_ENV is still honoured).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Testing,
    Production,
    Default,
}

impl Profile {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "development" => Profile::Development,
            "testing" => Profile::Testing,
            "production" => Profile::Production,
            "default" | "" => Profile::Default,
            other => {
                warn!("Unknown profile {:?}, falling back to default", other);
                Profile::Default
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Testing => "testing",
            Profile::Production => "production",
            Profile::Default => "default",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Profile::Production)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional surfaces mounted next to the REST API.
///
/// With every flag off the server is the plain API; the other combinations
/// give the documented API, the realtime API and the server-rendered site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surfaces {
    pub api_docs: bool,
    pub websocket: bool,
    pub frontend: bool,
}

impl Surfaces {
    pub fn all() -> Self {
        Surfaces {
            api_docs: true,
            websocket: true,
            frontend: true,
        }
    }

    pub fn api_only() -> Self {
        Surfaces {
            api_docs: false,
            websocket: false,
            frontend: false,
        }
    }
}

impl Default for Surfaces {
    fn default() -> Self {
        Surfaces::all()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub profile: Profile,
    pub debug: bool,
    pub testing: bool,
    pub secret_key: String,
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub api_base_url: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub surfaces: Surfaces,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Builds the configuration from any key lookup so tests never touch the
    // process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile_name = lookup("APP_ENV")
            .or_else(|| lookup("FLASK_ENV"))
            .unwrap_or_default();
        let profile = Profile::from_name(&profile_name);

        let env_database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let database_url = match profile {
            Profile::Testing => TESTING_DATABASE_URL.to_string(),
            Profile::Development | Profile::Default => {
                env_database_url.unwrap_or_else(|| DEVELOPMENT_DATABASE_URL.to_string())
            }
            Profile::Production => {
                env_database_url.ok_or(ConfigError::Missing("DATABASE_URL", profile))?
            }
        };

        let secret_key = lookup("SECRET_KEY")
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string());
        if profile.is_production() && secret_key == DEFAULT_SECRET_KEY {
            warn!("SECRET_KEY is not set, production is running with the development key");
        }

        let port = parse_or("PORT", lookup("PORT"), 5000u16)?;
        let access_minutes = parse_or("JWT_ACCESS_TOKEN_MINUTES", lookup("JWT_ACCESS_TOKEN_MINUTES"), 15i64)?;
        let refresh_days = parse_or("JWT_REFRESH_TOKEN_DAYS", lookup("JWT_REFRESH_TOKEN_DAYS"), 30i64)?;

        let surfaces = Surfaces {
            api_docs: parse_flag("ENABLE_API_DOCS", lookup("ENABLE_API_DOCS"), true)?,
            websocket: parse_flag("ENABLE_WEBSOCKET", lookup("ENABLE_WEBSOCKET"), true)?,
            frontend: parse_flag("ENABLE_FRONTEND", lookup("ENABLE_FRONTEND"), true)?,
        };

        let testing = matches!(profile, Profile::Testing);

        Ok(Config {
            profile,
            debug: matches!(profile, Profile::Development | Profile::Default),
            testing,
            secret_key,
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            api_base_url: lookup("API_BASE_URL")
                .unwrap_or_else(|| "http://localhost:5000".to_string()),
            access_token_ttl: Duration::minutes(access_minutes),
            refresh_token_ttl: Duration::days(refresh_days),
            // Cheap hashes keep the test suite fast.
            bcrypt_cost: if testing { 4 } else { bcrypt::DEFAULT_COST },
            surfaces,
        })
    }

    // Testing profile with the in-memory database and every surface enabled.
    pub fn testing() -> Self {
        Config {
            profile: Profile::Testing,
            debug: false,
            testing: true,
            secret_key: "test-secret-key".to_string(),
            database_url: TESTING_DATABASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            api_base_url: "http://localhost:5000".to_string(),
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(30),
            bcrypt_cost: 4,
            surfaces: Surfaces::all(),
        }
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn parse_flag(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value.as_deref().map(|raw| raw.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(raw) => match raw.as_str() {
            "" => Ok(default),
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value: value.unwrap_or_default(),
            }),
        },
    }
}
