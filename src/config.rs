use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use sms_core::ConfigurationError;
use sms_sendcloud::{TemplateAssignmentConfig, TemplateConfig};
use std::env;

/// Request timeout applied to vendor calls when a provider does not set one.
pub const DEFAULT_PROVIDER_TIMEOUT_SECONDS: u64 = 30;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Path to the YAML file describing providers and application bindings
    pub sms_provider_config_path: String,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive (default: info)
    pub level: String,
    /// Log format (default: json)
    pub format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            sms_provider_config_path: "config/sms_providers.yaml".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // e.g. SMS_GATEWAY__SERVER__PORT=8091
            .add_source(
                Environment::with_prefix("SMS_GATEWAY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize()
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Providers and the applications bound to them.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SmsProviderConfig {
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub applications: Vec<ApplicationConfig>,
}

/// One configured vendor account, selected by its `type` tag.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "accessyou")]
    AccessYou(AccessYouConfig),
    #[serde(rename = "sendcloud")]
    SendCloud(SendCloudConfig),
}

impl ProviderConfig {
    pub fn name(&self) -> &str {
        match self {
            ProviderConfig::AccessYou(c) => &c.name,
            ProviderConfig::SendCloud(c) => &c.name,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AccessYouConfig {
    pub name: String,
    /// Empty means the vendor default.
    #[serde(default)]
    pub base_url: String,
    pub account_no: String,
    pub user: String,
    pub password: String,
    pub sender: String,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SendCloudConfig {
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    pub sms_user: String,
    pub sms_key: String,
    #[serde(default)]
    pub templates: Vec<TemplateConfig>,
    #[serde(default)]
    pub template_assignments: Vec<TemplateAssignmentConfig>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// Binds a tenant application id to a provider by name.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApplicationConfig {
    pub app_id: String,
    pub use_provider: String,
}

impl SmsProviderConfig {
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigurationError> {
        Self::from_source(File::new(path, FileFormat::Yaml).required(true))
            .map_err(|e| ConfigurationError::Load(format!("{}: {}", path, e)))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigurationError> {
        Self::from_source(File::from_str(yaml, FileFormat::Yaml))
            .map_err(|e| ConfigurationError::Load(e.to_string()))
    }

    fn from_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}
