use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Connection settings for [`TelegramTransport`](crate::TelegramTransport).
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token as issued by BotFather.
    pub bot_token: String,
    /// Destination chat: a numeric id (`-100...`) or a public `@username`.
    pub chat_id: String,
    /// Bot API base URL, without trailing slash.
    pub api_base: String,
    /// Upper bound for a single HTTP request.
    pub request_timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: DEFAULT_API_BASE.into(),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Both credentials are present. Their contents are not checked.
    pub fn has_credentials(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Backoff settings for [`RetryingTransport`](crate::RetryingTransport).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// Exponential backoff before retry number `retry` (1-based), capped at
    /// `max_backoff`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_config() {
        let c = RetryConfig::default();
        assert_eq!(c.max_attempts, 4);
        assert_eq!(c.initial_backoff, Duration::from_millis(250));
        assert_eq!(c.max_backoff, Duration::from_secs(8));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let c = RetryConfig::default();
        assert_eq!(c.backoff_for(1), Duration::from_millis(250));
        assert_eq!(c.backoff_for(2), Duration::from_millis(500));
        assert_eq!(c.backoff_for(3), Duration::from_millis(1000));
        assert_eq!(c.backoff_for(10), Duration::from_secs(8));
        assert_eq!(c.backoff_for(1000), Duration::from_secs(8));
    }

    #[test]
    fn debug_redacts_token() {
        let c = TelegramConfig::new("123:secret", "-100");
        let shown = format!("{c:?}");
        assert!(!shown.contains("secret"));
        assert!(shown.contains("-100"));
    }

    #[test]
    fn credentials_presence() {
        assert!(TelegramConfig::new("t", "c").has_credentials());
        assert!(!TelegramConfig::new("", "c").has_credentials());
        assert!(!TelegramConfig::new("t", "  ").has_credentials());
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let c = TelegramConfig::new("t", "c").with_api_base("http://localhost:8081/");
        assert_eq!(c.api_base, "http://localhost:8081");
    }
}
