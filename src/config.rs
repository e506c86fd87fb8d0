//! Daemon configuration.
//!
//! Loaded once at startup from an optional JSON file, then overridden by
//! command-line flags, then validated. Read-only afterwards.
//!
//! ```json
//! {
//!     "bind_address": "0.0.0.0",
//!     "bind_port": 162,
//!     "community": ["public", "monitoring"],
//!     "workers": 4
//! }
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::receiver::{
    DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PORT, DEFAULT_SLOW_DECODE_THRESHOLD, DEFAULT_WORKERS,
    MIN_MAX_MESSAGE_SIZE, TrapReceiverBuilder,
};

/// Daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub bind_address: IpAddr,
    pub bind_port: u16,
    /// Accepted communities. A single string is accepted as a one-item list.
    #[serde(deserialize_with = "one_or_many")]
    pub community: Vec<String>,
    pub workers: usize,
    pub max_message_size: usize,
    /// Requested socket receive buffer, bytes. Kernel default when unset.
    pub recv_buffer_size: Option<usize>,
    pub slow_decode_threshold_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bind_port: DEFAULT_PORT,
            community: Vec::new(),
            workers: DEFAULT_WORKERS,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            recv_buffer_size: None,
            slow_decode_threshold_ms: DEFAULT_SLOW_DECODE_THRESHOLD.as_millis() as u64,
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

impl Config {
    /// Read a JSON config file. Not validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse JSON config text. Not validated.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::config(e.to_string()))
    }

    /// Check the settings can run a receiver.
    pub fn validate(&self) -> Result<()> {
        if self.community.is_empty() {
            return Err(Error::config("at least one community is required"));
        }
        if self.community.iter().any(String::is_empty) {
            return Err(Error::config("community must not be empty"));
        }
        if self.workers == 0 {
            return Err(Error::config("workers must be at least 1"));
        }
        if !(MIN_MAX_MESSAGE_SIZE..=DEFAULT_MAX_MESSAGE_SIZE).contains(&self.max_message_size) {
            return Err(Error::config(format!(
                "max_message_size must be between {} and {}, got {}",
                MIN_MAX_MESSAGE_SIZE, DEFAULT_MAX_MESSAGE_SIZE, self.max_message_size
            )));
        }
        Ok(())
    }

    /// Listening socket address.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.bind_port)
    }

    /// A receiver builder carrying these settings. The event sink is left at
    /// its default.
    pub fn receiver_builder(&self) -> TrapReceiverBuilder {
        let builder = TrapReceiverBuilder::new()
            .bind(self.bind_addr())
            .communities(&self.community)
            .workers(self.workers)
            .max_message_size(self.max_message_size)
            .slow_decode_threshold(Duration::from_millis(self.slow_decode_threshold_ms));
        match self.recv_buffer_size {
            Some(size) => builder.recv_buffer_size(size),
            None => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:162".parse().unwrap());
        assert_eq!(config.workers, 4);
        assert_eq!(config.max_message_size, 65535);
        assert_eq!(config.slow_decode_threshold_ms, 50);
        // No community is configured by default
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_single_community_string() {
        let config = Config::from_json(r#"{"community": "public"}"#).unwrap();
        assert_eq!(config.community, vec!["public"]);
        assert_eq!(config.bind_port, 162);
        config.validate().unwrap();
    }

    #[test]
    fn test_community_list() {
        let config = Config::from_json(
            r#"{"bind_address": "::", "bind_port": 1162, "community": ["a", "b"]}"#,
        )
        .unwrap();
        assert_eq!(config.community, vec!["a", "b"]);
        assert_eq!(config.bind_addr(), "[::]:1162".parse().unwrap());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_json(r#"{"community": "public", "comunity": "typo"}"#).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("comunity"));
    }

    #[test]
    fn test_bad_address_rejected() {
        assert!(Config::from_json(r#"{"bind_address": "not-an-ip"}"#).is_err());
    }

    #[test]
    fn test_validation() {
        let valid = Config {
            community: vec!["public".into()],
            ..Config::default()
        };
        valid.validate().unwrap();

        let empty_community = Config {
            community: vec!["public".into(), String::new()],
            ..Config::default()
        };
        assert!(empty_community.validate().is_err());

        let no_workers = Config {
            workers: 0,
            ..valid.clone()
        };
        assert!(no_workers.validate().is_err());

        let tiny = Config {
            max_message_size: 483,
            ..valid.clone()
        };
        assert!(tiny.validate().is_err());

        let minimum = Config {
            max_message_size: 484,
            ..valid
        };
        minimum.validate().unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/snmp-trapd.json").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/nonexistent/snmp-trapd.json"));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("snmp-trapd-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"community": "s3cr3t", "workers": 8}"#).unwrap();
        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.workers, 8);
        assert_eq!(config.community, vec!["s3cr3t"]);
    }

    #[tokio::test]
    async fn test_receiver_builder() {
        let config = Config {
            bind_address: "127.0.0.1".parse().unwrap(),
            bind_port: 0,
            community: vec!["public".into()],
            ..Config::default()
        };
        let receiver = config
            .receiver_builder()
            .emitter(crate::emit::EventEmitter::new(std::io::sink()))
            .build()
            .await
            .unwrap();
        assert!(receiver.local_addr().ip().is_loopback());
        assert_eq!(receiver.config().workers, 4);
    }
}
