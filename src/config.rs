use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_SAP_CLIENT: &str = "100";
const DEFAULT_SAP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;
const DEV_DEFAULT_SESSION_SECRET: &str =
    "development-only-session-secret-replace-outside-dev-0c9f1e7a";

/// Connection settings of the SAP system every portal talks to
#[derive(Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SapConfig {
    /// Scheme, host and port of the SAP application server
    #[validate(custom = "validate_base_url")]
    pub base_url: String,

    /// SAP client number, sent as the `sap-client` query parameter
    #[serde(default = "default_sap_client")]
    #[validate(length(min = 3, max = 3))]
    pub client: String,

    /// Service user for basic authentication
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_sap_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
}

impl fmt::Debug for SapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SapConfig")
            .field("base_url", &self.base_url)
            .field("client", &self.client)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Application configuration structure with validation
#[derive(Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// CORS: allow credentials
    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// HMAC key for session tokens
    #[validate(length(min = 32))]
    pub session_secret: String,

    /// Session token lifetime in seconds (1 minute to 7 days)
    #[serde(default = "default_session_ttl_secs")]
    #[validate(range(min = 60, max = 604800))]
    pub session_ttl_secs: u64,

    /// Reject non-login calls without a valid session token
    #[serde(default)]
    pub require_session: bool,

    #[validate]
    pub sap: SapConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("cors_allow_any_origin", &self.cors_allow_any_origin)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("require_session", &self.require_session)
            .field("sap", &self.sap)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the SAP connection
    pub fn new(sap: SapConfig, session_secret: String, environment: String) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            environment,
            log_level: default_log_level(),
            log_json: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            session_secret,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            require_session: false,
            sap,
        }
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if !self.is_development() && self.session_secret.trim() == DEV_DEFAULT_SESSION_SECRET {
            let mut err = ValidationError::new("session_secret_default_dev");
            err.message = Some(
                "The bundled development session secret must not be used outside development. Set APP__SESSION_SECRET to a unique, secure value."
                    .into(),
            );
            errors.add("session_secret", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_sap_client() -> String {
    DEFAULT_SAP_CLIENT.to_string()
}

fn default_sap_timeout_secs() -> u64 {
    DEFAULT_SAP_TIMEOUT_SECS
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_base_url(raw: &str) -> Result<(), ValidationError> {
    match url::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => {
            let mut err = ValidationError::new("base_url");
            err.message = Some("SAP base_url must be an absolute http(s) URL".into());
            Err(err)
        }
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("sap_portal_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Loads configuration from `dir`, selecting the `{run_env}.toml` profile.
pub fn load_config_from(dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    let builder = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("sap.client", DEFAULT_SAP_CLIENT)?
        .set_default("sap.timeout_secs", DEFAULT_SAP_TIMEOUT_SECS as i64)?;

    // Only development gets a bundled session secret; everywhere else it must be configured.
    let builder = if run_env.eq_ignore_ascii_case(DEFAULT_ENV) {
        builder.set_default("session_secret", DEV_DEFAULT_SESSION_SECRET)?
    } else {
        builder
    };

    let config = builder
        .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
        .add_source(File::with_name(&dir.join(run_env).to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("session_secret").is_err() {
        error!("Session secret is not configured. Set APP__SESSION_SECRET to a random string of at least 32 characters.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "session_secret is required but not configured. Set APP__SESSION_SECRET environment variable."
                .into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).unwrap();
        }
        temp_dir
    }

    #[test]
    fn profile_overrides_defaults() {
        let dir = config_dir(&[
            (
                "default.toml",
                r#"
                    port = 9000
                    [sap]
                    base_url = "http://sap.local:8000"
                    username = "PORTAL"
                    password = "secret"
                "#,
            ),
            (
                "development.toml",
                r#"
                    log_level = "debug"
                    [sap]
                    base_url = "http://sap-dev.local:8000"
                    username = "PORTAL"
                    password = "secret"
                    timeout_secs = 30
                "#,
            ),
        ]);

        let config = load_config_from(dir.path(), "development").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.sap.base_url, "http://sap-dev.local:8000");
        assert_eq!(config.sap.client, DEFAULT_SAP_CLIENT);
        assert_eq!(config.sap.timeout_secs, 30);
        assert_eq!(config.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert!(config.is_development());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = config_dir(&[(
            "default.toml",
            r#"
                log_level = "loud"
                [sap]
                base_url = "sap.local"
                client = "1"
                username = "PORTAL"
                password = "secret"
                timeout_secs = 0
            "#,
        )]);

        let err = load_config_from(dir.path(), "development").unwrap_err();
        let AppConfigError::Validation(errors) = err else {
            panic!("expected validation failure, got {err:?}");
        };
        assert!(errors.field_errors().contains_key("log_level"));
        assert!(errors.errors().contains_key("sap"));
    }

    #[test]
    fn session_secret_is_required_outside_development() {
        let dir = config_dir(&[(
            "default.toml",
            r#"
                cors_allow_any_origin = true
                [sap]
                base_url = "http://sap.local:8000"
                username = "PORTAL"
                password = "secret"
            "#,
        )]);

        let err = load_config_from(dir.path(), "production").unwrap_err();
        assert!(matches!(err, AppConfigError::Load(ConfigError::NotFound(_))));
    }
}
