use std::{env, fmt, net::SocketAddr, time::Duration};

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_BIND_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Connection settings for the MXP backend, handed to the client at construction.
#[derive(Clone)]
pub struct UpstreamConfig {
    pub base_url: Url,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub api_token: Option<String>,
    pub bind_addr: String,
    pub bind_port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MXP_BASE_URL is required and must not be empty")]
    MissingBaseUrl,
    #[error("MXP_BASE_URL must be an absolute http(s) URL without query or fragment")]
    InvalidBaseUrl,
    #[error("MXP_USERNAME is required and must not be empty")]
    MissingUsername,
    #[error("MXP_PASSWORD is required and must not be empty")]
    MissingPassword,
    #[error("MXP_TIMEOUT_SECS must be an integer between 1 and 600")]
    InvalidTimeout,
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let raw_base_url = non_empty("MXP_BASE_URL").ok_or(ConfigError::MissingBaseUrl)?;
        let base_url = parse_base_url(&raw_base_url)?;
        let username = non_empty("MXP_USERNAME").ok_or(ConfigError::MissingUsername)?;
        let password = lookup("MXP_PASSWORD")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingPassword)?;

        let timeout_secs = non_empty("MXP_TIMEOUT_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| (1..=MAX_TIMEOUT_SECS).contains(secs))
                    .ok_or(ConfigError::InvalidTimeout)
            })
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let api_token = non_empty("MCP_API_TOKEN");
        let bind_addr = non_empty("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = non_empty("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_BIND_PORT);

        let config = Self {
            upstream: UpstreamConfig {
                base_url,
                username,
                password,
                timeout: Duration::from_secs(timeout_secs),
            },
            api_token,
            bind_addr,
            bind_port,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidBaseUrl)?;
    if !matches!(url.scheme(), "http" | "https")
        || url.cannot_be_a_base()
        || url.query().is_some()
        || url.fragment().is_some()
    {
        return Err(ConfigError::InvalidBaseUrl);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("MXP_BASE_URL", "http://mxp.internal/MXP_Virgin.exe"),
        ("MXP_USERNAME", "gateway"),
        ("MXP_PASSWORD", "s3cret"),
    ];

    #[test]
    fn parse_defaults() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).expect("config should parse");

        assert_eq!(
            config.upstream.base_url.as_str(),
            "http://mxp.internal/MXP_Virgin.exe"
        );
        assert_eq!(config.upstream.username, "gateway");
        assert_eq!(config.upstream.password, "s3cret");
        assert_eq!(config.upstream.timeout, Duration::from_secs(30));
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 8000);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn missing_base_url_fails() {
        let err = Config::from_lookup(lookup_from(&REQUIRED[1..]))
            .expect_err("expected missing base url error");
        assert!(matches!(err, ConfigError::MissingBaseUrl));
    }

    #[test]
    fn missing_credentials_fail() {
        let err = Config::from_lookup(lookup_from(&[REQUIRED[0], REQUIRED[2]]))
            .expect_err("expected missing username error");
        assert!(matches!(err, ConfigError::MissingUsername));

        let err = Config::from_lookup(lookup_from(&REQUIRED[..2]))
            .expect_err("expected missing password error");
        assert!(matches!(err, ConfigError::MissingPassword));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = Config::from_lookup(lookup_from(&[
            ("MXP_BASE_URL", "ftp://mxp.internal"),
            REQUIRED[1],
            REQUIRED[2],
        ]))
        .expect_err("expected invalid base url error");
        assert!(matches!(err, ConfigError::InvalidBaseUrl));

        let err = Config::from_lookup(lookup_from(&[
            ("MXP_BASE_URL", "http://mxp.internal/api?x=1"),
            REQUIRED[1],
            REQUIRED[2],
        ]))
        .expect_err("expected invalid base url error");
        assert!(matches!(err, ConfigError::InvalidBaseUrl));
    }

    #[test]
    fn parses_optional_settings() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("MXP_TIMEOUT_SECS", "5"),
            ("MCP_API_TOKEN", " token-abc "),
            ("BIND_ADDR", "0.0.0.0"),
            ("BIND_PORT", "9100"),
        ]);

        let config = Config::from_lookup(lookup_from(&pairs)).expect("config should parse");
        assert_eq!(config.upstream.timeout, Duration::from_secs(5));
        assert_eq!(config.api_token.as_deref(), Some("token-abc"));
        assert_eq!(
            config.bind_socket().expect("valid socket"),
            "0.0.0.0:9100".parse().expect("valid addr")
        );
    }

    #[test]
    fn invalid_timeout_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("MXP_TIMEOUT_SECS", "0"));

        let err = Config::from_lookup(lookup_from(&pairs)).expect_err("expected invalid timeout");
        assert!(matches!(err, ConfigError::InvalidTimeout));
    }

    #[test]
    fn invalid_port_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("BIND_PORT", "70000"));

        let err = Config::from_lookup(lookup_from(&pairs)).expect_err("expected invalid port");
        assert!(matches!(err, ConfigError::InvalidPort));
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).expect("config should parse");
        let rendered = format!("{:?}", config.upstream);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
