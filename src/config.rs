use std::time::Duration;

use clap::Parser;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_RECONNECT_BASE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Timing and endpoint settings for a [`crate::websocket::PollChannel`].
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Realtime base URL, e.g. `ws://localhost:8000`.
    pub endpoint: String,
    pub heartbeat_interval: Duration,
    pub reconnect_base_delay: Duration,
    pub max_reconnect_attempts: u32,
}

impl ChannelConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: ws_url_for(DEFAULT_API_URL),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_base_delay: DEFAULT_RECONNECT_BASE_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

/// Watch a poll's vote and like counts live.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Config {
    /// Poll to watch
    pub poll_id: i64,

    #[arg(long, env = "POLL_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Realtime base URL; derived from the API URL when omitted
    #[arg(long, env = "POLL_WS_URL")]
    pub ws_url: Option<String>,

    /// Bearer token; when omitted the watcher logs in with username/password
    #[arg(long, env = "POLL_TOKEN")]
    pub token: Option<String>,

    #[arg(long, env = "POLL_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "POLL_PASSWORD")]
    pub password: Option<String>,

    #[arg(
        long,
        default_value_t = DEFAULT_HEARTBEAT_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub heartbeat_secs: u64,
}

impl Config {
    pub fn channel(&self) -> ChannelConfig {
        let endpoint = self
            .ws_url
            .clone()
            .unwrap_or_else(|| ws_url_for(&self.api_url));
        ChannelConfig {
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs),
            ..ChannelConfig::new(endpoint)
        }
    }
}

/// `http://` becomes `ws://` and `https://` becomes `wss://`.
pub fn ws_url_for(api_url: &str) -> String {
    api_url.replacen("http", "ws", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_realtime_protocol() {
        let config = ChannelConfig::default();
        assert_eq!(config.endpoint, "ws://localhost:8000");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.reconnect_base_delay, Duration::from_millis(1000));
        assert_eq!(config.max_reconnect_attempts, 5);
    }

    #[test]
    fn ws_url_follows_api_scheme() {
        assert_eq!(ws_url_for("http://polls.local"), "ws://polls.local");
        assert_eq!(ws_url_for("https://polls.example.com"), "wss://polls.example.com");
    }

    #[test]
    fn cli_derives_channel_config() {
        let config = Config::try_parse_from([
            "poll-live",
            "12",
            "--api-url",
            "https://polls.example.com",
            "--token",
            "abc",
            "--heartbeat-secs",
            "10",
        ])
        .unwrap();

        assert_eq!(config.poll_id, 12);
        assert_eq!(config.token.as_deref(), Some("abc"));

        let channel = config.channel();
        assert_eq!(channel.endpoint, "wss://polls.example.com");
        assert_eq!(channel.heartbeat_interval, Duration::from_secs(10));
        assert_eq!(channel.max_reconnect_attempts, 5);
    }

    #[test]
    fn zero_heartbeat_is_rejected() {
        let result = Config::try_parse_from(["poll-live", "1", "--heartbeat-secs", "0"]);
        assert!(result.is_err());

        let config = Config::try_parse_from(["poll-live", "1", "--heartbeat-secs", "1"]).unwrap();
        assert_eq!(config.channel().heartbeat_interval, Duration::from_secs(1));
    }

    #[test]
    fn new_keeps_default_timings() {
        let config = ChannelConfig::new("ws://rt.local");
        assert_eq!(config.endpoint, "ws://rt.local");
        assert_eq!(config.heartbeat_interval, DEFAULT_HEARTBEAT_INTERVAL);
        assert_eq!(config.max_reconnect_attempts, DEFAULT_MAX_RECONNECT_ATTEMPTS);
    }

    #[test]
    fn explicit_ws_url_wins() {
        let config =
            Config::try_parse_from(["poll-live", "1", "--ws-url", "ws://rt.local:9000"]).unwrap();
        assert_eq!(config.channel().endpoint, "ws://rt.local:9000");
    }
}
