mod defaults;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::LeetbotError;
use defaults::*;

/// Env var that overrides `telegram.bot_token`.
pub const BOT_TOKEN_ENV: &str = "LEETBOT_BOT_TOKEN";
/// Older deployments exported the token under this name.
pub const LEGACY_BOT_TOKEN_ENV: &str = "SENDING_TOKEN";
/// Env var that overrides `store.db_path`.
pub const DB_PATH_ENV: &str = "LEETBOT_DB_PATH";

/// Top-level leetbot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily-rolling log files. Unset = stdout only.
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

/// Fast cache: one JSON file per task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    /// File name pattern; `{day_key}` is replaced with the task's key.
    #[serde(default = "default_cache_mask")]
    pub file_mask: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
            file_mask: default_cache_mask(),
        }
    }
}

/// Durable store: tasks and users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: default_db_path(),
        }
    }
}

/// LeetCode GraphQL provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
    #[serde(default = "default_problems_url")]
    pub problems_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sent as `x-csrftoken` when set.
    #[serde(default)]
    pub csrf_token: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            graphql_url: default_graphql_url(),
            problems_url: default_problems_url(),
            timeout_secs: default_timeout_secs(),
            csrf_token: None,
        }
    }
}

/// Telegram Bot API transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_url: default_telegram_api_url(),
            parse_mode: default_parse_mode(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Hourly delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Upper bound for one whole sweep.
    #[serde(default = "default_sweep_timeout")]
    pub sweep_timeout_secs: u64,
    /// Upper bound for one interactive request (e.g. `today`).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_timeout_secs: default_sweep_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file, then apply env overrides.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, LeetbotError> {
    let path = Path::new(path);
    let mut config = if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    } else {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LeetbotError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        parse(&content)?
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Parse a TOML document into a config.
pub fn parse(content: &str) -> Result<Config, LeetbotError> {
    toml::from_str(content)
        .map_err(|e| LeetbotError::Config(format!("failed to parse config: {}", e)))
}

/// Apply env overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let token = lookup(BOT_TOKEN_ENV)
        .filter(|v| !v.is_empty())
        .or_else(|| lookup(LEGACY_BOT_TOKEN_ENV).filter(|v| !v.is_empty()));
    if let Some(token) = token {
        config.telegram.bot_token = token;
    }
    if let Some(db_path) = lookup(DB_PATH_ENV).filter(|v| !v.is_empty()) {
        config.store.db_path = db_path;
    }
}
