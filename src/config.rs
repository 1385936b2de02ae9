//! Configuration loader and validator for the season schedule service.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the Annict personal access token.
pub const ACCESS_TOKEN_ENV: &str = "ANNICT_ACCESS_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub annict: Annict,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Server {
    pub bind: String,
}

/// Upstream Annict GraphQL settings and pagination guards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Annict {
    pub endpoint: String,
    pub user_agent: String,
    /// Fallback when `ANNICT_ACCESS_TOKEN` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub page_size: u32,
    pub max_pages: usize,
    pub max_rows: usize,
    pub request_timeout_ms: u64,
    pub fetch_deadline_ms: u64,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".into(),
        }
    }
}

impl Default for Annict {
    fn default() -> Self {
        Self {
            endpoint: crate::annict::ANNICT_GRAPHQL_ENDPOINT.into(),
            user_agent: concat!("annict-season/", env!("CARGO_PKG_VERSION")).into(),
            access_token: None,
            page_size: 50,
            max_pages: 200,
            max_rows: 50_000,
            request_timeout_ms: 15_000,
            fetch_deadline_ms: 120_000,
        }
    }
}

impl Server {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("server.bind must be a socket address"))
    }
}

impl Annict {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.endpoint.trim())
            .map_err(|_| ConfigError::Invalid("annict.endpoint must be a valid URL"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn fetch_deadline(&self) -> Duration {
        Duration::from_millis(self.fetch_deadline_ms)
    }
}

impl Config {
    /// Credential read once from the process environment, falling back to
    /// `annict.access_token`. Empty values count as absent.
    pub fn access_token(&self) -> Option<String> {
        self.access_token_from(std::env::var(ACCESS_TOKEN_ENV).ok())
    }

    pub fn access_token_from(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                self.annict
                    .access_token
                    .clone()
                    .filter(|t| !t.trim().is_empty())
            })
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, the built-in defaults are used.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    cfg.server.socket_addr()?;
    cfg.annict.endpoint_url()?;

    if cfg.annict.user_agent.trim().is_empty() {
        return Err(ConfigError::Invalid("annict.user_agent must be non-empty"));
    }
    if !(1..=50).contains(&cfg.annict.page_size) {
        return Err(ConfigError::Invalid("annict.page_size must be within 1..=50"));
    }
    if cfg.annict.max_pages == 0 {
        return Err(ConfigError::Invalid("annict.max_pages must be > 0"));
    }
    if cfg.annict.max_rows == 0 {
        return Err(ConfigError::Invalid("annict.max_rows must be > 0"));
    }
    if cfg.annict.request_timeout_ms == 0 {
        return Err(ConfigError::Invalid("annict.request_timeout_ms must be > 0"));
    }
    if cfg.annict.fetch_deadline_ms == 0 {
        return Err(ConfigError::Invalid("annict.fetch_deadline_ms must be > 0"));
    }

    Ok(())
}

/// Example YAML with every setting spelled out.
pub fn example() -> &'static str {
    r#"server:
  bind: "127.0.0.1:3000"

annict:
  endpoint: "https://api.annict.com/graphql"
  user_agent: "annict-season/0.1"
  page_size: 50
  max_pages: 200
  max_rows: 50000
  request_timeout_ms: 15000
  fetch_deadline_ms: 120000
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.annict.page_size, 50);
        assert_eq!(cfg.server.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: Config = serde_yaml::from_str("server:\n  bind: \"0.0.0.0:8080\"\n").unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.annict, Annict::default());
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn load_without_path_uses_defaults() {
        let cfg = load(None).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn invalid_bind() {
        let mut cfg = Config::default();
        cfg.server.bind = "not-an-addr".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("server.bind")), _ => panic!("wrong error") }
    }

    #[test]
    fn invalid_annict_settings() {
        let mut cfg = Config::default();
        cfg.annict.endpoint = "::nope".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("annict.endpoint")), _ => panic!("wrong error") }

        let mut cfg = Config::default();
        cfg.annict.page_size = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.annict.page_size = 51;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.annict.max_pages = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.annict.max_rows = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.annict.request_timeout_ms = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.annict.fetch_deadline_ms = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn access_token_prefers_environment() {
        let mut cfg = Config::default();
        assert_eq!(cfg.access_token_from(None), None);
        assert_eq!(cfg.access_token_from(Some("".into())), None);
        assert_eq!(cfg.access_token_from(Some("env".into())).as_deref(), Some("env"));

        cfg.annict.access_token = Some("file".into());
        assert_eq!(cfg.access_token_from(None).as_deref(), Some("file"));
        assert_eq!(cfg.access_token_from(Some("  ".into())).as_deref(), Some("file"));
        assert_eq!(cfg.access_token_from(Some("env".into())).as_deref(), Some("env"));

        cfg.annict.access_token = Some(String::new());
        assert_eq!(cfg.access_token_from(None), None);
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.annict.max_pages, 200);
        assert_eq!(cfg.annict.request_timeout(), Duration::from_millis(15_000));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let td = tempdir().unwrap();
        let err = load(Some(&td.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
