// Startup configuration. Everything is read once from the environment and
// handed to the server and the renewer as an immutable `Config`; nothing
// here is re-read after startup.
use std::time::Duration;

/// Path the hub calls back on. The callback URL is `PUBLIC_BASE_URL` + this.
pub const CALLBACK_PATH: &str = "/websub";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_VERIFY_TOKEN: &str = "devtoken";
pub const DEFAULT_HUB_URL: &str = "https://pubsubhubbub.appspot.com/subscribe";

/// Renewal cadence. Leases granted by the hub are not tracked.
pub const RENEW_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env {0}")]
    Missing(&'static str),

    #[error("invalid value for env {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub callback_url: String,
    pub topic_url: String,
    pub verify_token: String,
    pub hub_url: String,
    pub renew_interval: Duration,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup. Empty values are treated the same
    /// as unset ones, so `PORT=` falls back to the default and
    /// `PUBLIC_BASE_URL=` is reported as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let public_base = get("PUBLIC_BASE_URL").ok_or(ConfigError::Missing("PUBLIC_BASE_URL"))?;
        let channel_id = get("YOUTUBE_CHANNEL_ID").ok_or(ConfigError::Missing("YOUTUBE_CHANNEL_ID"))?;
        let verify_token = get("VERIFY_TOKEN").unwrap_or_else(|| DEFAULT_VERIFY_TOKEN.to_string());
        let hub_url = get("HUB_URL").unwrap_or_else(|| DEFAULT_HUB_URL.to_string());

        Ok(Config {
            port,
            callback_url: callback_url(&public_base),
            topic_url: topic_url(&channel_id),
            verify_token,
            hub_url,
            renew_interval: RENEW_INTERVAL,
        })
    }
}

pub fn callback_url(public_base: &str) -> String {
    format!("{}{}", public_base.trim_end_matches('/'), CALLBACK_PATH)
}

/// Video feed of a YouTube channel; this is the topic the hub knows about.
pub fn topic_url(channel_id: &str) -> String {
    format!("https://www.youtube.com/feeds/videos.xml?channel_id={}", channel_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_applied() {
        let cfg = load(&[("PUBLIC_BASE_URL", "https://abcd.ngrok.io"), ("YOUTUBE_CHANNEL_ID", "UC123")]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.verify_token, "devtoken");
        assert_eq!(cfg.hub_url, DEFAULT_HUB_URL);
        assert_eq!(cfg.callback_url, "https://abcd.ngrok.io/websub");
        assert_eq!(cfg.topic_url, "https://www.youtube.com/feeds/videos.xml?channel_id=UC123");
        assert_eq!(cfg.renew_interval, Duration::from_secs(86_400));
    }

    #[test]
    fn test_overrides() {
        let cfg = load(&[
            ("PORT", "9000"),
            ("PUBLIC_BASE_URL", "https://example.org/"),
            ("YOUTUBE_CHANNEL_ID", "UCabc"),
            ("VERIFY_TOKEN", "s3cret"),
            ("HUB_URL", "http://127.0.0.1:1/subscribe"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.verify_token, "s3cret");
        assert_eq!(cfg.hub_url, "http://127.0.0.1:1/subscribe");
        // trailing slash must not produce `//websub`
        assert_eq!(cfg.callback_url, "https://example.org/websub");
    }

    #[test]
    fn test_missing_public_base_url() {
        let err = load(&[("YOUTUBE_CHANNEL_ID", "UC123")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("PUBLIC_BASE_URL"));
        assert_eq!(err.to_string(), "missing required env PUBLIC_BASE_URL");
    }

    #[test]
    fn test_missing_channel_id() {
        let err = load(&[("PUBLIC_BASE_URL", "https://x")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("YOUTUBE_CHANNEL_ID"));
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let err = load(&[("PUBLIC_BASE_URL", ""), ("YOUTUBE_CHANNEL_ID", "UC1")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("PUBLIC_BASE_URL"));

        let cfg = load(&[("PORT", ""), ("VERIFY_TOKEN", ""), ("PUBLIC_BASE_URL", "https://x"), ("YOUTUBE_CHANNEL_ID", "UC1")]).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.verify_token, DEFAULT_VERIFY_TOKEN);
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("PORT", "eighty"), ("PUBLIC_BASE_URL", "https://x"), ("YOUTUBE_CHANNEL_ID", "UC1")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { key: "PORT", value: "eighty".to_string() });
    }
}
