use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub services: ServicesConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServicesConfig {
    pub vision: ServiceEndpoint,
    pub knowledge: ServiceEndpoint,
    pub reasoning: ServiceEndpoint,
}

#[derive(Clone, Debug)]
pub struct ServiceEndpoint {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub max_attempts: u32,
    pub retry_base_delay_secs: u64,
    pub retry_backoff_multiplier: u32,
    pub deadline_secs: u64,
    pub confidence_threshold: f64,
    pub conflict_reload_limit: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://reloom.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            services: ServicesConfig {
                vision: ServiceEndpoint {
                    base_url: "http://localhost:7810".to_string(),
                    api_key: None,
                    timeout_secs: 30,
                },
                knowledge: ServiceEndpoint {
                    base_url: "http://localhost:7820".to_string(),
                    api_key: None,
                    timeout_secs: 30,
                },
                reasoning: ServiceEndpoint {
                    base_url: "http://localhost:7830".to_string(),
                    api_key: None,
                    timeout_secs: 60,
                },
            },
            pipeline: PipelineConfig {
                max_attempts: 3,
                retry_base_delay_secs: 1,
                retry_backoff_multiplier: 2,
                deadline_secs: 120,
                confidence_threshold: 70.0,
                conflict_reload_limit: 3,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("reloom.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(services) = patch.services {
            apply_endpoint_patch(&mut self.services.vision, services.vision);
            apply_endpoint_patch(&mut self.services.knowledge, services.knowledge);
            apply_endpoint_patch(&mut self.services.reasoning, services.reasoning);
        }

        if let Some(pipeline) = patch.pipeline {
            if let Some(max_attempts) = pipeline.max_attempts {
                self.pipeline.max_attempts = max_attempts;
            }
            if let Some(base_delay) = pipeline.retry_base_delay_secs {
                self.pipeline.retry_base_delay_secs = base_delay;
            }
            if let Some(multiplier) = pipeline.retry_backoff_multiplier {
                self.pipeline.retry_backoff_multiplier = multiplier;
            }
            if let Some(deadline_secs) = pipeline.deadline_secs {
                self.pipeline.deadline_secs = deadline_secs;
            }
            if let Some(threshold) = pipeline.confidence_threshold {
                self.pipeline.confidence_threshold = threshold;
            }
            if let Some(limit) = pipeline.conflict_reload_limit {
                self.pipeline.conflict_reload_limit = limit;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RELOOM_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("RELOOM_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("RELOOM_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("RELOOM_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("RELOOM_DATABASE_TIMEOUT_SECS", &value)?;
        }

        for (endpoint, name) in [
            (&mut self.services.vision, "VISION"),
            (&mut self.services.knowledge, "KNOWLEDGE"),
            (&mut self.services.reasoning, "REASONING"),
        ] {
            if let Some(value) = read_env(&format!("RELOOM_{name}_BASE_URL")) {
                endpoint.base_url = value;
            }
            if let Some(value) = read_env(&format!("RELOOM_{name}_API_KEY")) {
                endpoint.api_key = Some(value.into());
            }
            if let Some(value) = read_env(&format!("RELOOM_{name}_TIMEOUT_SECS")) {
                endpoint.timeout_secs = parse_u64(&format!("RELOOM_{name}_TIMEOUT_SECS"), &value)?;
            }
        }

        if let Some(value) = read_env("RELOOM_PIPELINE_MAX_ATTEMPTS") {
            self.pipeline.max_attempts = parse_u32("RELOOM_PIPELINE_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = read_env("RELOOM_PIPELINE_DEADLINE_SECS") {
            self.pipeline.deadline_secs = parse_u64("RELOOM_PIPELINE_DEADLINE_SECS", &value)?;
        }
        if let Some(value) = read_env("RELOOM_PIPELINE_CONFIDENCE_THRESHOLD") {
            self.pipeline.confidence_threshold =
                parse_f64("RELOOM_PIPELINE_CONFIDENCE_THRESHOLD", &value)?;
        }

        if let Some(value) = read_env("RELOOM_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("RELOOM_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.database_url {
            self.database.url = url;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        for (endpoint, name) in [
            (&self.services.vision, "services.vision"),
            (&self.services.knowledge, "services.knowledge"),
            (&self.services.reasoning, "services.reasoning"),
        ] {
            if endpoint.base_url.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name}.base_url must not be empty")));
            }
        }
        if self.pipeline.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "pipeline.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.pipeline.retry_backoff_multiplier == 0 {
            return Err(ConfigError::Validation(
                "pipeline.retry_backoff_multiplier must be at least 1".to_string(),
            ));
        }
        if self.pipeline.deadline_secs == 0 {
            return Err(ConfigError::Validation(
                "pipeline.deadline_secs must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.pipeline.confidence_threshold) {
            return Err(ConfigError::Validation(
                "pipeline.confidence_threshold must be within [0, 100]".to_string(),
            ));
        }

        Ok(())
    }
}

fn apply_endpoint_patch(endpoint: &mut ServiceEndpoint, patch: Option<EndpointPatch>) {
    let Some(patch) = patch else {
        return;
    };
    if let Some(base_url) = patch.base_url {
        endpoint.base_url = base_url;
    }
    if let Some(api_key) = patch.api_key {
        endpoint.api_key = Some(api_key.into());
    }
    if let Some(timeout_secs) = patch.timeout_secs {
        endpoint.timeout_secs = timeout_secs;
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    services: Option<ServicesPatch>,
    pipeline: Option<PipelinePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServicesPatch {
    vision: Option<EndpointPatch>,
    knowledge: Option<EndpointPatch>,
    reasoning: Option<EndpointPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EndpointPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelinePatch {
    max_attempts: Option<u32>,
    retry_base_delay_secs: Option<u64>,
    retry_backoff_multiplier: Option<u32>,
    deadline_secs: Option<u64>,
    confidence_threshold: Option<f64>,
    conflict_reload_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("reloom.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}
