use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::logging::LogTimezone;

pub const DEFAULT_BASE_URL: &str = "https://testnet.binancefuture.com";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// REST base URL, testnet by default
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// `recvWindow` sent with signed requests
    #[serde(default = "default_recv_window")]
    pub recv_window_ms: u64,
    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Decimal places for prices on the wire (unset: sent as typed)
    #[serde(default)]
    pub price_scale: Option<u32>,
    /// Decimal places for quantities on the wire (unset: sent as typed)
    #[serde(default)]
    pub quantity_scale: Option<u32>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_recv_window() -> u64 {
    5000
}

fn default_request_timeout() -> u64 {
    10_000
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            recv_window_ms: default_recv_window(),
            request_timeout_ms: default_request_timeout(),
            price_scale: None,
            quantity_scale: None,
        }
    }
}

/// Names of the environment variables holding the API key pair
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_api_secret_env")]
    pub api_secret_env: String,
}

fn default_api_key_env() -> String {
    "BINANCE_API_KEY".to_string()
}

fn default_api_secret_env() -> String {
    "BINANCE_API_SECRET".to_string()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_secret_env: default_api_secret_env(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// JSON log file; empty disables file output
    #[serde(default = "default_log_file")]
    pub file: String,
    #[serde(default = "default_console")]
    pub console: bool,
    /// Timestamp zone: `local`, `UTC` or a fixed offset such as `+05:30`
    #[serde(default = "default_log_timezone")]
    pub timezone: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "bot.log".to_string()
}

fn default_console() -> bool {
    true
}

fn default_log_timezone() -> String {
    "local".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
            console: default_console(),
            timezone: default_log_timezone(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            exchange: ExchangeConfig::default(),
            credentials: CredentialsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("exchange.base_url", DEFAULT_BASE_URL)?
            .set_default("exchange.recv_window_ms", default_recv_window())?
            .set_default("exchange.request_timeout_ms", default_request_timeout())?
            .set_default("logging.level", "info")?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("STRATEX_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (STRATEX__EXCHANGE__BASE_URL, etc.)
            .add_source(
                Environment::with_prefix("STRATEX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match url::Url::parse(&self.exchange.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "exchange.base_url must be http or https, got {}",
                url.scheme()
            )),
            Err(e) => errors.push(format!("exchange.base_url is not a valid URL: {}", e)),
        }

        if self.exchange.recv_window_ms == 0 || self.exchange.recv_window_ms > 60_000 {
            errors.push("exchange.recv_window_ms must be between 1 and 60000".to_string());
        }

        if self.exchange.request_timeout_ms == 0 {
            errors.push("exchange.request_timeout_ms must be positive".to_string());
        }

        for (name, scale) in [
            ("price_scale", self.exchange.price_scale),
            ("quantity_scale", self.exchange.quantity_scale),
        ] {
            if scale.is_some_and(|s| s > 28) {
                errors.push(format!("exchange.{name} must be at most 28"));
            }
        }

        if self.credentials.api_key_env.trim().is_empty()
            || self.credentials.api_secret_env.trim().is_empty()
        {
            errors.push("credentials env variable names must not be empty".to_string());
        }

        if self.logging.level.trim().is_empty() {
            errors.push("logging.level must not be empty".to_string());
        }

        if LogTimezone::parse(&self.logging.timezone).is_none() {
            errors.push(format!(
                "logging.timezone must be local, UTC or an offset like +05:30, got {:?}",
                self.logging.timezone
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
