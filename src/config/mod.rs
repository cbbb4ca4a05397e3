use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "ORDER_SERVICE_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml_bw::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub sharding: ShardingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Deadline for one inbound request, enrichment through publish
    pub request_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_ms: 10_000,
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Postgres settings. Without a URL the service keeps orders in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

impl DatabaseConfig {
    /// The configured URL, treating an empty interpolation as absent
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub stock_url: String,
    pub pricing_url: String,
    pub timeout_ms: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            stock_url: "http://localhost:8081".to_string(),
            pricing_url: "http://localhost:8082".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl ServicesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    pub brokers: String,
    pub topic: String,
    pub message_timeout_ms: u64,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: "127.0.0.1:9092".to_string(),
            topic: "order-events".to_string(),
            message_timeout_ms: 5_000,
        }
    }
}

impl KafkaConfig {
    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardingConfig {
    pub num_shards: usize,
}

impl Default for ShardingConfig {
    fn default() -> Self {
        Self { num_shards: 4 }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.app.request_timeout_ms == 0 {
            return invalid("app.request_timeout_ms must be positive");
        }
        if self.database.max_connections == 0 {
            return invalid("database.max_connections must be positive");
        }
        if self.services.stock_url.trim().is_empty() {
            return invalid("services.stock_url must not be empty");
        }
        if self.services.pricing_url.trim().is_empty() {
            return invalid("services.pricing_url must not be empty");
        }
        if self.services.timeout_ms == 0 {
            return invalid("services.timeout_ms must be positive");
        }
        if self.kafka.brokers.trim().is_empty() {
            return invalid("kafka.brokers must not be empty");
        }
        if self.kafka.topic.trim().is_empty() {
            return invalid("kafka.topic must not be empty");
        }
        if self.kafka.message_timeout_ms == 0 {
            return invalid("kafka.message_timeout_ms must be positive");
        }
        if self.sharding.num_shards == 0 {
            return invalid("sharding.num_shards must be at least 1");
        }

        Ok(())
    }
}

/// Load configuration from a YAML file with `${VAR}` interpolation.
///
/// The path falls back to `ORDER_SERVICE_CONFIG`, then `config.yaml`.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(path) => path.to_string(),
        None => std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
    };

    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    load_config_from_string(&contents)
}

pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    config.validate()?;
    Ok(config)
}

/// Replace `${VAR}` and `${VAR:-default}` with values from the environment.
/// Unset variables without a default become empty strings.
fn interpolate_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

    let re = match ENV_VAR_REGEX
        .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}"))
    {
        Ok(re) => re,
        Err(e) => {
            tracing::error!(error = %e, "Invalid env var pattern, skipping interpolation");
            return input.to_string();
        }
    };

    re.replace_all(input, |caps: &regex::Captures| {
        let default = caps.get(2).map_or("", |m| m.as_str());
        match std::env::var(&caps[1]) {
            Ok(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    })
    .into_owned()
}
