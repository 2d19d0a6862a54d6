use std::time::Duration;

use playercache_core::codec::PayloadCodec;
use playercache_upstream::client::{DEFAULT_API_BASE_URL, DEFAULT_PROFILE_BASE_URL};
use playercache_upstream::UpstreamConfig;
use playercache_worker::WorkerConfig;

/// Server configuration loaded from environment variables.
///
/// Every field has a default (`127.0.0.1:8001`, `player_cache.db` in the
/// working directory). The upstream credential may be absent.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// SQLite URL of the cache table.
    pub database_url: String,
    /// Upstream credential; `None` disables refreshes.
    pub api_key: Option<String>,
    pub upstream_base_url: String,
    pub profile_base_url: String,
    /// Encoding applied to every payload in the table.
    pub payload_codec: PayloadCodec,
    /// Lifetime of a refreshed entry in seconds.
    pub cache_ttl_secs: u64,
    /// Clients announcing a lower `X-Protocol-Version` never trigger refreshes.
    pub min_refresh_protocol: u32,
    pub request_timeout_secs: u64,
    pub upstream_timeout_secs: u64,
    /// How long shutdown waits for the refresh worker to stop.
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                              | Default                             |
    /// |--------------------------------------|-------------------------------------|
    /// | `HOST`                               | `127.0.0.1`                         |
    /// | `PORT`                               | `8001`                              |
    /// | `DATABASE_URL`                       | `sqlite://player_cache.db`          |
    /// | `HYPIXEL_API_KEY` (or `HYPIXEL`)     | unset                               |
    /// | `UPSTREAM_BASE_URL`                  | `https://api.hypixel.net`           |
    /// | `PROFILE_BASE_URL`                   | `https://api.ashcon.app/mojang/v2`  |
    /// | `PAYLOAD_CODEC`                      | `plain`                             |
    /// | `CACHE_TTL_SECS`                     | `1800`                              |
    /// | `MIN_REFRESH_PROTOCOL`               | `0`                                 |
    /// | `REQUEST_TIMEOUT_SECS`               | `30`                                |
    /// | `UPSTREAM_TIMEOUT_SECS`              | `10`                                |
    /// | `SHUTDOWN_TIMEOUT_SECS`              | `10`                                |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    ///
    /// Panics on malformed values so misconfiguration fails at startup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_key = lookup("HYPIXEL_API_KEY")
            .or_else(|| lookup("HYPIXEL"))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let payload_codec: PayloadCodec = var("PAYLOAD_CODEC", "plain")
            .parse()
            .unwrap_or_else(|e| panic!("PAYLOAD_CODEC is invalid: {e}"));

        Self {
            host: var("HOST", "127.0.0.1"),
            port: var("PORT", "8001")
                .parse()
                .expect("PORT must be a valid u16"),
            database_url: var("DATABASE_URL", "sqlite://player_cache.db"),
            api_key,
            upstream_base_url: var("UPSTREAM_BASE_URL", DEFAULT_API_BASE_URL),
            profile_base_url: var("PROFILE_BASE_URL", DEFAULT_PROFILE_BASE_URL),
            payload_codec,
            cache_ttl_secs: var("CACHE_TTL_SECS", "1800")
                .parse()
                .expect("CACHE_TTL_SECS must be a valid u64"),
            min_refresh_protocol: var("MIN_REFRESH_PROTOCOL", "0")
                .parse()
                .expect("MIN_REFRESH_PROTOCOL must be a valid u32"),
            request_timeout_secs: var("REQUEST_TIMEOUT_SECS", "30")
                .parse()
                .expect("REQUEST_TIMEOUT_SECS must be a valid u64"),
            upstream_timeout_secs: var("UPSTREAM_TIMEOUT_SECS", "10")
                .parse()
                .expect("UPSTREAM_TIMEOUT_SECS must be a valid u64"),
            shutdown_timeout_secs: var("SHUTDOWN_TIMEOUT_SECS", "10")
                .parse()
                .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64"),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn upstream(&self) -> UpstreamConfig {
        let timeout = Duration::from_secs(self.upstream_timeout_secs);
        UpstreamConfig {
            api_base_url: self.upstream_base_url.clone(),
            profile_base_url: self.profile_base_url.clone(),
            api_key: self.api_key.clone(),
            connect_timeout: timeout.min(Duration::from_secs(5)),
            request_timeout: timeout,
        }
    }

    pub fn worker(&self) -> WorkerConfig {
        WorkerConfig {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            ..WorkerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]);
        assert_eq!(c.host, "127.0.0.1");
        assert_eq!(c.port, 8001);
        assert_eq!(c.database_url, "sqlite://player_cache.db");
        assert_eq!(c.api_key, None);
        assert_eq!(c.payload_codec, PayloadCodec::Plain);
        assert_eq!(c.cache_ttl_secs, 1800);
        assert_eq!(c.min_refresh_protocol, 0);
        assert_eq!(c.worker().ttl, Duration::from_secs(1800));
    }

    #[test]
    fn api_key_falls_back_to_legacy_variable() {
        assert_eq!(config(&[("HYPIXEL", "abc")]).api_key.as_deref(), Some("abc"));
        assert_eq!(
            config(&[("HYPIXEL", "abc"), ("HYPIXEL_API_KEY", "def")])
                .api_key
                .as_deref(),
            Some("def")
        );
    }

    #[test]
    fn blank_api_key_is_absent() {
        assert!(!config(&[("HYPIXEL_API_KEY", "  ")]).has_api_key());
    }

    #[test]
    fn codec_and_ttl_are_parsed() {
        let c = config(&[("PAYLOAD_CODEC", "zstd:22"), ("CACHE_TTL_SECS", "60")]);
        assert_eq!(c.payload_codec, PayloadCodec::Zstd { level: 22 });
        assert_eq!(c.worker().ttl, Duration::from_secs(60));
    }

    #[test]
    fn upstream_config_carries_key_and_timeouts() {
        let c = config(&[("HYPIXEL_API_KEY", "k"), ("UPSTREAM_TIMEOUT_SECS", "3")]);
        let up = c.upstream();
        assert_eq!(up.api_key.as_deref(), Some("k"));
        assert_eq!(up.request_timeout, Duration::from_secs(3));
        assert_eq!(up.connect_timeout, Duration::from_secs(3));
        assert_eq!(up.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    #[should_panic(expected = "PORT must be a valid u16")]
    fn bad_port_panics() {
        config(&[("PORT", "eighty")]);
    }

    #[test]
    #[should_panic(expected = "PAYLOAD_CODEC is invalid")]
    fn bad_codec_panics() {
        config(&[("PAYLOAD_CODEC", "gzip")]);
    }
}
