use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use telefs_catalog::CatalogConfig;
use telefs_transport::{RetryConfig, TelegramConfig, DEFAULT_API_BASE};

use crate::error::{FsError, FsResult};

pub const ENV_BOT_TOKEN: &str = "TELEFS_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEFS_CHAT_ID";
pub const ENV_API_BASE: &str = "TELEFS_API_BASE";

/// Top-level telefs settings, as read from a TOML file or the environment.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelefsConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
    pub catalog: CatalogSection,
    pub retry: RetrySection,
}

impl Default for TelefsConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: DEFAULT_API_BASE.into(),
            request_timeout_secs: 60,
            catalog: CatalogSection::default(),
            retry: RetrySection::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub lookback_window: usize,
    pub max_conflict_retries: u32,
    pub strict_window: bool,
}

impl Default for CatalogSection {
    fn default() -> Self {
        let c = CatalogConfig::default();
        Self {
            lookback_window: c.lookback_window,
            max_conflict_retries: c.max_conflict_retries,
            strict_window: c.strict_window,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let r = RetryConfig::default();
        Self {
            max_attempts: r.max_attempts,
            initial_backoff_ms: r.initial_backoff.as_millis() as u64,
            max_backoff_ms: r.max_backoff.as_millis() as u64,
        }
    }
}

impl TelefsConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            ..Self::default()
        }
    }

    /// Read a TOML config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> FsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FsError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&text).map_err(|e| FsError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(text: &str) -> FsResult<Self> {
        toml::from_str(text).map_err(|e| FsError::Config(e.to_string()))
    }

    /// Defaults with credentials from `TELEFS_*` variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_from(|key| std::env::var(key).ok());
        config
    }

    /// Overlay `TELEFS_*` variables onto this config.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = set(ENV_BOT_TOKEN) {
            self.bot_token = token;
        }
        if let Some(chat) = set(ENV_CHAT_ID) {
            self.chat_id = chat;
        }
        if let Some(base) = set(ENV_API_BASE) {
            self.api_base = base;
        }
    }

    pub fn validate(&self) -> FsResult<()> {
        if self.bot_token.trim().is_empty() {
            return Err(FsError::Config(format!("bot_token is not set (or set {ENV_BOT_TOKEN})")));
        }
        if self.chat_id.trim().is_empty() {
            return Err(FsError::Config(format!("chat_id is not set (or set {ENV_CHAT_ID})")));
        }
        if self.api_base.trim().is_empty() {
            return Err(FsError::Config("api_base is empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(FsError::Config("request_timeout_secs must be positive".into()));
        }
        if self.catalog.lookback_window == 0 {
            return Err(FsError::Config("catalog.lookback_window must be positive".into()));
        }
        if self.catalog.max_conflict_retries == 0 {
            return Err(FsError::Config("catalog.max_conflict_retries must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(FsError::Config("retry.max_attempts must be positive".into()));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(FsError::Config(
                "retry.initial_backoff_ms exceeds retry.max_backoff_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn telegram(&self) -> TelegramConfig {
        let mut config = TelegramConfig::new(self.bot_token.trim(), self.chat_id.trim())
            .with_api_base(self.api_base.trim());
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }

    pub fn catalog(&self) -> CatalogConfig {
        CatalogConfig {
            lookback_window: self.catalog.lookback_window,
            max_conflict_retries: self.catalog.max_conflict_retries,
            strict_window: self.catalog.strict_window,
            ..CatalogConfig::default()
        }
    }
}

impl fmt::Debug for TelefsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelefsConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("catalog", &self.catalog)
            .field("retry", &self.retry)
            .finish()
    }
}
