use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::set_security_headers;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. `None` selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
    pub reset_code_ttl_minutes: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set outside development")]
    MissingJwtSecret,

    #[error("DATABASE_URL must be set outside development")]
    MissingDatabaseUrl,

    #[error("JWT_EXPIRY_HOURS must be between 1 and {max}, got {0}", max = MAX_JWT_EXPIRY_HOURS)]
    InvalidJwtExpiry(u64),
}

/// Upper bound on token lifetime: one year
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let defaults = match environment {
            Environment::Production => Self::deployed(environment, 20, 5),
            Environment::Staging => Self::deployed(environment, 10, 10),
            Environment::Development => Self::development(),
        };
        defaults.with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("CORS_ALLOWED_ORIGINS") {
            self.security.cors_origins = split_origins(&v);
        }
        if let Ok(v) = env::var("FRONTEND_URL") {
            let v = v.trim();
            if !v.is_empty() && !self.security.cors_origins.iter().any(|o| o == v) {
                self.security.cors_origins.push(v.to_string());
            }
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("RESET_CODE_TTL_MINUTES") {
            self.security.reset_code_ttl_minutes =
                v.parse().unwrap_or(self.security.reset_code_ttl_minutes);
        }

        self
    }

    /// Reject configurations that are only acceptable on a developer machine
    pub fn check(&self) -> Result<(), ConfigError> {
        let expiry = self.security.jwt_expiry_hours;
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&expiry) {
            return Err(ConfigError::InvalidJwtExpiry(expiry));
        }
        if self.environment == Environment::Development {
            return Ok(());
        }
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }
        if self.database.url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: "campus-events-dev-secret".to_string(),
                jwt_expiry_hours: 24,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                bcrypt_cost: 4,
                reset_code_ttl_minutes: 10,
            },
        }
    }

    /// Staging and production differ only in pool sizing; secrets and
    /// origins must come from the environment
    fn deployed(environment: Environment, max_connections: u32, connection_timeout: u64) -> Self {
        Self {
            environment,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections,
                connection_timeout,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: Vec::new(),
                bcrypt_cost: bcrypt::DEFAULT_COST,
                reset_code_ttl_minutes: 10,
            },
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read once on first access
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
