//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use sweetjobs_models::{LanguagePair, DEFAULT_LANGUAGE_KEY, SECONDARY_LANGUAGE_KEY};

/// Token secret used when none is configured. Accepted in development only.
pub const DEV_JWT_SECRET: &str = "change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set to a non-default value in the {0} environment")]
    InsecureJwtSecret(String),
}

/// Outgoing mail settings. Without an SMTP host, mail is only logged.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Sender address of every notification
    pub from: String,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: "SweetJobs <no-reply@sweetjobs.local>".to_string(),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Postgres connection string
    pub database_url: String,
    pub database_max_connections: u32,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
    /// HS256 secret shared with the token issuer
    pub jwt_secret: String,
    /// Default and secondary language keys of the localized write protocol
    pub languages: LanguagePair,
    /// Directory uploaded files are written to
    pub upload_root: PathBuf,
    /// URL prefix under which `upload_root` is served
    pub public_base_url: String,
    pub mail: MailConfig,
    /// Base URL of the frontend event page; the event link is appended
    pub event_base_url: String,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Answer application errors with HTTP 200 and an error body
    pub legacy_error_status: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: "postgres://localhost/sweetjobs".to_string(),
            database_max_connections: 10,
            run_migrations: true,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            languages: LanguagePair::default(),
            upload_root: PathBuf::from("./public"),
            public_base_url: "http://localhost:8000".to_string(),
            mail: MailConfig::default(),
            event_base_url: "http://localhost:3000/video-esemeny".to_string(),
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 20,
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            legacy_error_status: false,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// Fails outside development when `JWT_SECRET` is unset or left at the
    /// development default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            host: env_or("API_HOST", &defaults.host),
            port: env_parse("API_PORT", defaults.port),
            database_url: env_or("DATABASE_URL", &defaults.database_url),
            database_max_connections: env_parse(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            run_migrations: env_flag("RUN_MIGRATIONS", defaults.run_migrations),
            jwt_secret: env_or("JWT_SECRET", &defaults.jwt_secret),
            languages: LanguagePair::new(
                env_or("DEFAULT_LANGUAGE_KEY", DEFAULT_LANGUAGE_KEY),
                env_or("SECONDARY_LANGUAGE_KEY", SECONDARY_LANGUAGE_KEY),
            ),
            upload_root: std::env::var("UPLOAD_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_root),
            public_base_url: env_or("PUBLIC_BASE_URL", &defaults.public_base_url)
                .trim_end_matches('/')
                .to_string(),
            mail: MailConfig {
                from: env_or("MAIL_FROM", &defaults.mail.from),
                smtp_host: std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
                smtp_port: env_parse("SMTP_PORT", defaults.mail.smtp_port),
                smtp_username: std::env::var("SMTP_USERNAME").ok(),
                smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            },
            event_base_url: env_or("EVENT_BASE_URL", &defaults.event_base_url)
                .trim_end_matches('/')
                .to_string(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS", defaults.rate_limit_rps),
            request_timeout: Duration::from_secs(env_parse("REQUEST_TIMEOUT", 30)),
            max_body_size: env_parse("MAX_BODY_SIZE", defaults.max_body_size),
            environment: env_or("ENVIRONMENT", &defaults.environment),
            legacy_error_status: env_flag("LEGACY_ERROR_STATUS", false),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that are only safe on a developer machine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let insecure = self.jwt_secret.trim().is_empty() || self.jwt_secret == DEV_JWT_SECRET;
        if insecure && !self.is_development() {
            return Err(ConfigError::InsecureJwtSecret(self.environment.clone()));
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "development"
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
