use crate::error::{Error, Result};
use std::env;

pub const DEFAULT_API_URL: &str = "https://api.battlemetrics.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the BattleMetrics client.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: Option<String>,
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Sleep through server rate limits instead of raising [`Error::RateLimited`].
    pub sleep_on_ratelimit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            sleep_on_ratelimit: true,
        }
    }
}

fn default_user_agent() -> String {
    format!(
        "battlemetrics-rs/{} (+https://github.com/thegamecracks/battlemetrics-rs)",
        env!("CARGO_PKG_VERSION")
    )
}

impl Config {
    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - BATTLEMETRICS_TOKEN (optional)
    /// - BATTLEMETRICS_API_URL (default: https://api.battlemetrics.com)
    /// - BATTLEMETRICS_HTTP_TIMEOUT_SECS (default: 30)
    /// - BATTLEMETRICS_USER_AGENT (default: battlemetrics-rs/<version>)
    /// - BATTLEMETRICS_SLEEP_ON_RATELIMIT (default: true)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let token = env::var("BATTLEMETRICS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let api_url = env::var("BATTLEMETRICS_API_URL").unwrap_or(defaults.api_url);
        let timeout_secs = match env::var("BATTLEMETRICS_HTTP_TIMEOUT_SECS") {
            Ok(s) => s.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("BATTLEMETRICS_HTTP_TIMEOUT_SECS is not a number: {:?}", s))
            })?,
            Err(_) => defaults.timeout_secs,
        };
        let user_agent = env::var("BATTLEMETRICS_USER_AGENT").unwrap_or(defaults.user_agent);
        let sleep_on_ratelimit = match env::var("BATTLEMETRICS_SLEEP_ON_RATELIMIT") {
            Ok(s) => parse_flag(&s).ok_or_else(|| {
                Error::Config(format!("BATTLEMETRICS_SLEEP_ON_RATELIMIT is not a boolean: {:?}", s))
            })?,
            Err(_) => defaults.sleep_on_ratelimit,
        };

        Ok(Self {
            token,
            api_url,
            user_agent,
            timeout_secs,
            sleep_on_ratelimit,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert!(cfg.token.is_none());
        assert!(cfg.sleep_on_ratelimit);
        assert!(cfg.user_agent.starts_with("battlemetrics-rs/"));
        assert_eq!(cfg.with_token("abc").token.as_deref(), Some("abc"));
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
