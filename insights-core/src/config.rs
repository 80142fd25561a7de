use crate::error::{ConfigError, CoreError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_USER_AGENT: &str = "RedditInsightsTool/1.0 (Educational Purpose)";
pub const DEFAULT_REDDIT_BASE_URL: &str = "https://www.reddit.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Service configuration. Values come from an optional TOML file named by
/// `INSIGHTS_CONFIG`, then environment variables override individual fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub user_agent: String,
    pub reddit_base_url: String,
    pub fetch_timeout_secs: u64,

    /// Server-wide key; a key supplied with a request takes priority.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,

    pub analysis_cache_capacity: usize,
    pub analysis_cache_ttl_secs: u64,
    pub share_cache_capacity: usize,
    pub share_cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5050,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            reddit_base_url: DEFAULT_REDDIT_BASE_URL.to_string(),
            fetch_timeout_secs: 15,
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            analysis_cache_capacity: 100,
            analysis_cache_ttl_secs: 3600,
            share_cache_capacity: 500,
            share_cache_ttl_secs: 86400,
        }
    }
}

impl AppConfig {
    /// Load `.env`, the optional TOML file, and environment overrides.
    pub fn load() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var("INSIGHTS_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;

        info!(
            "Configuration loaded: listening on {}, LLM key {}",
            config.bind_address(),
            if config.openai_api_key.is_some() {
                "configured"
            } else {
                "not configured"
            }
        );
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        debug!("Parsing configuration file {}", path.display());
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, CoreError> {
        let config: AppConfig = toml::from_str(contents).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Taking a closure keeps tests
    /// away from the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = parse_field("PORT", &port)?;
        }
        if let Some(user_agent) = lookup("USER_AGENT") {
            self.user_agent = user_agent;
        }
        if let Some(base_url) = lookup("REDDIT_BASE_URL") {
            self.reddit_base_url = base_url;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            let key = key.trim().to_string();
            self.openai_api_key = if key.is_empty() { None } else { Some(key) };
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            self.openai_base_url = base_url;
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.openai_model = model;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "user_agent must not be empty; Reddit blocks anonymous clients".to_string(),
            }
            .into());
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.analysis_cache_capacity == 0 || self.share_cache_capacity == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "cache capacities must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn analysis_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.analysis_cache_ttl_secs)
    }

    pub fn share_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.share_cache_ttl_secs)
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, CoreError> {
    value.trim().parse().map_err(|_| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}
