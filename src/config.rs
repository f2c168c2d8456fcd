use std::{
    env,
    fmt,
    fs::{create_dir_all, read_to_string, File},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use home::home_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::poller::{CursorMode, PollSettings};

pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

const SECONDS_PER_DAY: u64 = 86400;

#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_endpoint")]
    endpoint: String,
    #[serde(default = "default_telegram_api_base")]
    telegram_api_base: String,
    #[serde(default = "default_retry_period_secs")]
    retry_period_secs: u64,
    #[serde(default = "default_lookback_days")]
    lookback_days: u64,
    #[serde(default)]
    cursor: CursorMode,
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "default_log_file")]
    log_file: String,
}

impl Config {
    pub fn endpoint_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid endpoint URL '{}'", self.endpoint))
    }

    pub fn telegram_api_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.telegram_api_base).with_context(|| {
            format!("Invalid Telegram API URL '{}'", self.telegram_api_base)
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Empty `log_file` disables the file destination
    pub fn log_file_path(&self) -> Option<PathBuf> {
        if self.log_file.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.log_file))
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            retry_period: Duration::from_secs(self.retry_period_secs),
            lookback: Duration::from_secs(self.lookback_days.saturating_mul(SECONDS_PER_DAY)),
            cursor_mode: self.cursor,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        let lookback_secs = self
            .lookback_days
            .checked_mul(SECONDS_PER_DAY)
            .filter(|secs| i64::try_from(*secs).is_ok());
        if lookback_secs.is_none() {
            anyhow::bail!("lookback_days = {} is too large", self.lookback_days);
        }
        Ok(())
    }
}

fn default_endpoint() -> String {
    "https://practicum.yandex.ru/api/user_api/homework_statuses/".to_string()
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_retry_period_secs() -> u64 {
    600
}

fn default_lookback_days() -> u64 {
    40
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_file() -> String {
    "app.log".to_string()
}

fn default_config_path() -> anyhow::Result<PathBuf> {
    let mut config_buf = home_dir().ok_or(anyhow::anyhow!("Can't determine home dir"))?;
    config_buf.push(".config/hwbot/config.toml");
    Ok(config_buf)
}

/// Loads settings from `path`, or from `~/.config/hwbot/config.toml`,
/// creating an empty file there on first run.
pub fn get_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config_file = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let config_file = default_config_path()?;
            if let Some(config_dir) = config_file.parent() {
                if !config_dir.exists() {
                    create_dir_all(config_dir)?;
                }
            }
            if !config_file.exists() {
                File::create(&config_file)?;
            }
            config_file
        }
    };
    let config_str = read_to_string(&config_file)
        .with_context(|| format!("Failed to read config file {}", config_file.display()))?;
    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file {}", config_file.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", config_file.display()))?;
    Ok(config)
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Missing required environment variables: {}", .0.join(", "))]
pub struct MissingCredentials(pub Vec<&'static str>);

/// Secrets read once at startup
pub struct Credentials {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, MissingCredentials> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, MissingCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut require = |name: &'static str| match lookup(name) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(name);
                String::new()
            }
        };
        let practicum_token = require(PRACTICUM_TOKEN_VAR);
        let telegram_token = require(TELEGRAM_TOKEN_VAR);
        let telegram_chat_id = require(TELEGRAM_CHAT_ID_VAR);

        if !missing.is_empty() {
            return Err(MissingCredentials(missing));
        }
        Ok(Credentials {
            practicum_token,
            telegram_token,
            telegram_chat_id,
        })
    }
}
