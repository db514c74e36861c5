use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use clap::Parser;
use std::fs;
use thiserror::Error;
use tracing::{info, warn};

/// Configuration for the storefront server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Address to listen on
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Secret for signing session tokens; a random one is generated when unset
    pub jwt_secret: Option<String>,
    /// Lifetime of session tokens in hours
    pub token_ttl_hours: i64,
    /// Failed logins per email before further attempts are refused
    pub max_login_attempts: u32,
    /// Minutes after the last failed login until an email is unblocked
    pub login_attempt_timeout_minutes: u64,
    /// Login requests allowed per client address in one window
    pub ip_rate_limit_max: u32,
    /// Length of the per-address login window in minutes
    pub ip_rate_limit_window_minutes: u64,
    /// Minutes between sweeps of expired sessions and limiter entries
    pub purge_interval_minutes: u64,
    /// TOML file with users and products to create at startup
    pub seed_file: Option<PathBuf>,
    /// Directory for daily rolling log files; logs go to stdout only when unset
    pub log_dir: Option<PathBuf>,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigUpdate {
    pub database_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: Option<i64>,
    pub max_login_attempts: Option<u32>,
    pub login_attempt_timeout_minutes: Option<u64>,
    pub ip_rate_limit_max: Option<u32>,
    pub ip_rate_limit_window_minutes: Option<u64>,
    pub purge_interval_minutes: Option<u64>,
    pub seed_file: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub log_json: Option<bool>,
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "storefront", about = "Storefront shop API server")]
pub struct CliArgs {
    /// Path to a config file, instead of the one in the user config directory
    #[clap(long, env = "STOREFRONT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Address to listen on
    #[clap(long, env = "STOREFRONT_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[clap(long, env = "STOREFRONT_PORT")]
    pub port: Option<u16>,

    /// Secret for signing session tokens
    #[clap(long, env = "STOREFRONT_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Session token lifetime in hours
    #[clap(long, env = "STOREFRONT_TOKEN_TTL_HOURS")]
    pub token_ttl_hours: Option<i64>,

    /// Failed logins per email before it is blocked
    #[clap(long, env = "STOREFRONT_MAX_LOGIN_ATTEMPTS")]
    pub max_login_attempts: Option<u32>,

    /// Minutes an email stays blocked after its last failed login
    #[clap(long, env = "STOREFRONT_LOGIN_ATTEMPT_TIMEOUT_MINUTES")]
    pub login_attempt_timeout_minutes: Option<u64>,

    /// Login requests per client address per window
    #[clap(long, env = "STOREFRONT_IP_RATE_LIMIT_MAX")]
    pub ip_rate_limit_max: Option<u32>,

    /// Per-address login window in minutes
    #[clap(long, env = "STOREFRONT_IP_RATE_LIMIT_WINDOW_MINUTES")]
    pub ip_rate_limit_window_minutes: Option<u64>,

    /// Minutes between sweeps of expired state
    #[clap(long, env = "STOREFRONT_PURGE_INTERVAL_MINUTES")]
    pub purge_interval_minutes: Option<u64>,

    /// Seed file with users and products
    #[clap(long, env = "STOREFRONT_SEED_FILE")]
    pub seed_file: Option<PathBuf>,

    /// Directory for log files
    #[clap(long, env = "STOREFRONT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[clap(long, env = "STOREFRONT_LOG_JSON")]
    pub log_json: bool,

    /// Debug mode
    #[clap(long, env = "STOREFRONT_DEBUG", default_value_t = false)]
    pub debug: bool,
}

/// A configuration value the server cannot run with
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("{0} must not exceed {1}")]
    TooLarge(&'static str, u64),
}

/// Longest accepted session token lifetime (ten years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 10 * 365 * 24;

/// Longest accepted timeout, window or purge interval (one year)
pub const MAX_MINUTES: u64 = 365 * 24 * 60;

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            host: update.host.unwrap_or(self.host),
            port: update.port.unwrap_or(self.port),
            jwt_secret: update.jwt_secret.or(self.jwt_secret),
            token_ttl_hours: update.token_ttl_hours.unwrap_or(self.token_ttl_hours),
            max_login_attempts: update.max_login_attempts.unwrap_or(self.max_login_attempts),
            login_attempt_timeout_minutes: update
                .login_attempt_timeout_minutes
                .unwrap_or(self.login_attempt_timeout_minutes),
            ip_rate_limit_max: update.ip_rate_limit_max.unwrap_or(self.ip_rate_limit_max),
            ip_rate_limit_window_minutes: update
                .ip_rate_limit_window_minutes
                .unwrap_or(self.ip_rate_limit_window_minutes),
            purge_interval_minutes: update.purge_interval_minutes.unwrap_or(self.purge_interval_minutes),
            seed_file: update.seed_file.or(self.seed_file),
            log_dir: update.log_dir.or(self.log_dir),
            log_json: update.log_json.unwrap_or(self.log_json),
        }
    }

    /// Checks the values that would otherwise break the server at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_ttl_hours <= 0 {
            return Err(ConfigError::NotPositive("token_ttl_hours"));
        }
        if self.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::TooLarge("token_ttl_hours", MAX_TOKEN_TTL_HOURS as u64));
        }
        if self.max_login_attempts == 0 {
            return Err(ConfigError::NotPositive("max_login_attempts"));
        }
        if self.ip_rate_limit_max == 0 {
            return Err(ConfigError::NotPositive("ip_rate_limit_max"));
        }
        if self.ip_rate_limit_window_minutes == 0 {
            return Err(ConfigError::NotPositive("ip_rate_limit_window_minutes"));
        }
        if self.purge_interval_minutes == 0 {
            return Err(ConfigError::NotPositive("purge_interval_minutes"));
        }
        for (name, minutes) in [
            ("login_attempt_timeout_minutes", self.login_attempt_timeout_minutes),
            ("ip_rate_limit_window_minutes", self.ip_rate_limit_window_minutes),
            ("purge_interval_minutes", self.purge_interval_minutes),
        ] {
            if minutes > MAX_MINUTES {
                return Err(ConfigError::TooLarge(name, MAX_MINUTES));
            }
        }
        Ok(())
    }

    /// The socket address to bind, as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Session lifetime, capped at `MAX_TOKEN_TTL_HOURS`
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours.clamp(0, MAX_TOKEN_TTL_HOURS))
    }

    pub fn login_attempt_timeout(&self) -> Duration {
        minutes(self.login_attempt_timeout_minutes)
    }

    pub fn ip_rate_limit_window(&self) -> Duration {
        minutes(self.ip_rate_limit_window_minutes)
    }

    pub fn purge_interval(&self) -> Duration {
        minutes(self.purge_interval_minutes)
    }

    /// Logs the effective configuration, leaving out the secret
    pub fn log_summary(&self, config_file: Option<&Path>) {
        info!(
            "Final configuration: config_file={:?}, database_url={}, bind={}, token_ttl={}h, login_attempts={}/{}min, ip_limit={}/{}min",
            config_file,
            self.database_url,
            self.bind_address(),
            self.token_ttl_hours,
            self.max_login_attempts,
            self.login_attempt_timeout_minutes,
            self.ip_rate_limit_max,
            self.ip_rate_limit_window_minutes,
        );
    }
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.min(MAX_MINUTES) * 60)
}

/// Returns the base (default) configuration
pub fn base_config(config_dir: Option<PathBuf>) -> Config {
    let database_url = config_dir.map_or("storefront.db".to_string(), |path| {
        path.join("storefront.db").to_string_lossy().to_string()
    });

    Config {
        database_url,
        host: "127.0.0.1".to_string(),
        port: 3000,
        jwt_secret: None,
        token_ttl_hours: 6,
        max_login_attempts: 5,
        login_attempt_timeout_minutes: 30,
        ip_rate_limit_max: 5,
        ip_rate_limit_window_minutes: 15,
        purge_interval_minutes: 5,
        seed_file: None,
        log_dir: None,
        log_json: false,
    }
}

/// Gets the user config directory, if it can be determined
pub fn get_config_dir_path() -> Option<PathBuf> {
    match ProjectDirs::from("com", "storefront", "storefront") {
        Some(proj_dirs) => Some(proj_dirs.config_dir().to_path_buf()),
        None => {
            warn!("Could not determine XDG config directory, skipping config file");
            None
        }
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            },
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {}", e))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {}", e))
        }
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: &CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url.clone(),
        host: args.host.clone(),
        port: args.port,
        jwt_secret: args.jwt_secret.clone(),
        token_ttl_hours: args.token_ttl_hours,
        max_login_attempts: args.max_login_attempts,
        login_attempt_timeout_minutes: args.login_attempt_timeout_minutes,
        ip_rate_limit_max: args.ip_rate_limit_max,
        ip_rate_limit_window_minutes: args.ip_rate_limit_window_minutes,
        purge_interval_minutes: args.purge_interval_minutes,
        seed_file: args.seed_file.clone(),
        log_dir: args.log_dir.clone(),
        // A bare flag can only switch JSON logs on
        log_json: args.log_json.then_some(true),
    }
}

/// The config file to read: the one given on the command line, otherwise
/// `config.toml` in the user config directory if that directory exists
pub fn config_file_path(args: &CliArgs) -> Option<PathBuf> {
    args.config.clone().or_else(|| {
        get_config_dir_path()
            .filter(|dir| dir.exists())
            .map(|dir| dir.join("config.toml"))
    })
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
///
/// Runs before logging is set up, so problems are returned rather than logged.
///
/// ### Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn get_config(args: &CliArgs) -> Result<Config, String> {
    let config_dir = get_config_dir_path().filter(|path| path.exists());
    let base = base_config(config_dir);

    // Apply updates in order of increasing precedence
    let config = base
        .apply_update(config_from_file(config_file_path(args))?)
        .apply_update(config_from_args(args));

    Ok(config)
}
