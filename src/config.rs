//! Configuration module for environment variables and client settings

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    /// REST API base, origin plus `/api/v1`
    pub api_base_url: String,

    /// WebSocket endpoint for push notifications. `None` disables the live channel.
    pub notifications_url: Option<String>,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,

    /// JSON file holding tokens and the notification history
    pub storage_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base_url = lookup("DEVSYNC_API_URL")
            .unwrap_or_else(|| "http://localhost:8000/api/v1".to_string());
        let parsed = Url::parse(&api_base_url)
            .with_context(|| format!("DEVSYNC_API_URL is not a valid URL: {api_base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("DEVSYNC_API_URL must use http or https, got {}", parsed.scheme()));
        }

        let notifications_url = match lookup("DEVSYNC_NOTIFICATIONS_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => {
                let parsed = Url::parse(&url)
                    .with_context(|| format!("DEVSYNC_NOTIFICATIONS_URL is not a valid URL: {url}"))?;
                if !matches!(parsed.scheme(), "ws" | "wss") {
                    return Err(anyhow!("DEVSYNC_NOTIFICATIONS_URL must use ws or wss, got {}", parsed.scheme()));
                }
                Some(url)
            }
            None => None,
        };

        let http_timeout_secs: u64 = match lookup("DEVSYNC_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DEVSYNC_HTTP_TIMEOUT_SECS must be a whole number of seconds, got {raw}"))?,
            None => 30,
        };

        let storage_path = lookup("DEVSYNC_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".devsync/storage.json"));

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            notifications_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
            storage_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.api_base_url, "http://localhost:8000/api/v1");
        assert!(config.notifications_url.is_none());
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.storage_path, PathBuf::from(".devsync/storage.json"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DEVSYNC_API_URL", "https://api.devsync.io/api/v1/"),
            ("DEVSYNC_NOTIFICATIONS_URL", "wss://api.devsync.io/ws/notifications/"),
            ("DEVSYNC_HTTP_TIMEOUT_SECS", "5"),
            ("DEVSYNC_STORAGE_PATH", "/tmp/devsync.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.devsync.io/api/v1");
        assert_eq!(config.notifications_url.as_deref(), Some("wss://api.devsync.io/ws/notifications/"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.storage_path, PathBuf::from("/tmp/devsync.json"));
    }

    #[test]
    fn test_empty_notifications_url_disables_channel() {
        let config = Config::from_lookup(lookup(&[("DEVSYNC_NOTIFICATIONS_URL", "  ")])).unwrap();
        assert!(config.notifications_url.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("DEVSYNC_API_URL", "not a url")])).is_err());
        assert!(Config::from_lookup(lookup(&[("DEVSYNC_API_URL", "ftp://host/api")])).is_err());
        assert!(Config::from_lookup(lookup(&[("DEVSYNC_NOTIFICATIONS_URL", "http://host/ws")])).is_err());
        assert!(Config::from_lookup(lookup(&[("DEVSYNC_HTTP_TIMEOUT_SECS", "soon")])).is_err());
    }
}
