use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 3000;
const CONFIG_DIR: &str = "config";

/// Application configuration, layered from `config/*.toml` files and `APP__*`
/// environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (SQLite or Postgres)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to run database migrations on startup
    #[serde(default = "default_true_bool")]
    pub auto_migrate: bool,

    /// DB pool: max connections (small fixed pool; callers queue when exhausted)
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// CORS: comma-separated list of allowed origins; unset means permissive
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Session lifetime (hours)
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Login throttle: attempt budget per window
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: u32,

    /// Login throttle: window size (seconds)
    #[serde(default = "default_login_window_secs")]
    pub login_window_secs: u64,

    /// The only principal allowed to edit the OP field
    #[serde(default = "default_op_editor")]
    pub op_editor: String,

    /// Object storage: base URL of the Supabase project (unset disables uploads)
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Object storage: service key
    #[serde(default)]
    pub supabase_key: Option<String>,

    /// Object storage: bucket for attachment uploads
    #[serde(default = "default_supabase_bucket")]
    pub supabase_bucket: String,

    /// Transactional email: Resend API key (unset disables email)
    #[serde(default)]
    pub resend_api_key: Option<String>,

    /// Email sender
    #[serde(default = "default_email_from")]
    pub email_from: String,

    /// Approvals inbox the notification goes to
    #[serde(default = "default_email_to")]
    pub email_to: String,

    /// Optional CC recipient
    #[serde(default)]
    pub email_to_cc: Option<String>,
}

impl AppConfig {
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            auto_migrate: default_true_bool(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            cors_allowed_origins: None,
            session_ttl_hours: default_session_ttl_hours(),
            login_max_attempts: default_login_max_attempts(),
            login_window_secs: default_login_window_secs(),
            op_editor: default_op_editor(),
            supabase_url: None,
            supabase_key: None,
            supabase_bucket: default_supabase_bucket(),
            resend_api_key: None,
            email_from: default_email_from(),
            email_to: default_email_to(),
            email_to_cc: None,
        }
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

fn default_database_url() -> String {
    "sqlite://pagos.db?mode=rwc".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_true_bool() -> bool {
    true
}
fn default_db_max_connections() -> u32 {
    5
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_session_ttl_hours() -> i64 {
    24
}
fn default_login_max_attempts() -> u32 {
    5
}
fn default_login_window_secs() -> u64 {
    15 * 60
}
fn default_op_editor() -> String {
    "Julian Salvatierra".to_string()
}
fn default_supabase_bucket() -> String {
    "gastos-imagenes".to_string()
}
fn default_email_from() -> String {
    "Formulario Pagos <onboarding@resend.dev>".to_string()
}
fn default_email_to() -> String {
    "gastosop10@gmail.com".to_string()
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("pagos_api={level},tower_http=info");
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let _ = fmt().with_env_filter(EnvFilter::new(filter_directive)).try_init();
}

/// Loads application configuration.
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
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

    let config = Config::builder()
        .add_source(File::with_name(&format!("{CONFIG_DIR}/default")).required(false))
        .add_source(File::with_name(&format!("{CONFIG_DIR}/{run_env}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_max_connections, 5);
        assert_eq!(cfg.op_editor, "Julian Salvatierra");
        assert!(cfg.auto_migrate);
        assert!(cfg.is_development());
    }

    #[test]
    fn email_defaults_leave_cc_unset() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.email_to, "gastosop10@gmail.com");
        assert_eq!(cfg.email_to_cc, None);
    }
}
