use crmdesk_egress::HttpClientConfig;
use crmdesk_theme::{DEFAULT_TENANT, ThemeResolverConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// CRM backend that `/api/*` is forwarded to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    #[serde(default)]
    pub client: HttpClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Tenant verification endpoint
    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    #[serde(default = "default_device_type")]
    pub device_type: String,

    #[serde(default = "default_tenant")]
    pub default_tenant: String,

    /// Title used by the page shell
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_false")]
    pub log_requests: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backend: BackendConfig::default(),
            theme: ThemeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            client: HttpClientConfig::default(),
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            verify_url: default_verify_url(),
            device_type: default_device_type(),
            default_tenant: default_tenant(),
            app_name: default_app_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_requests: false,
        }
    }
}

impl ThemeConfig {
    pub fn resolver_config(&self) -> ThemeResolverConfig {
        ThemeResolverConfig {
            device_type: self.device_type.clone(),
            default_tenant: self.default_tenant.clone(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        // Server settings
        if let Ok(val) = std::env::var("CRMDESK_HOST") {
            self.host = val;
        }

        if let Ok(val) = std::env::var("CRMDESK_PORT")
            && let Ok(port) = val.parse::<u16>()
        {
            self.port = port;
        }

        // Backend settings
        if let Ok(val) = std::env::var("CRMDESK_BACKEND_URL") {
            self.backend.base_url = val;
        }

        if let Ok(val) = std::env::var("CRMDESK_BACKEND_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            self.backend.client.timeout_secs = secs;
        }

        // Theme settings
        if let Ok(val) = std::env::var("CRMDESK_VERIFY_URL") {
            self.theme.verify_url = val;
        }

        if let Ok(val) = std::env::var("CRMDESK_DEVICE_TYPE") {
            self.theme.device_type = val;
        }

        if let Ok(val) = std::env::var("CRMDESK_DEFAULT_TENANT") {
            self.theme.default_tenant = val;
        }

        if let Ok(val) = std::env::var("CRMDESK_APP_NAME") {
            self.theme.app_name = val;
        }

        // Logging settings
        if let Ok(val) = std::env::var("CRMDESK_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Ok(val) = std::env::var("CRMDESK_LOG_REQUESTS")
            && let Ok(enabled) = val.parse::<bool>()
        {
            self.logging.log_requests = enabled;
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_verify_url() -> String {
    "http://127.0.0.1:8080/api/tenant/verify".to_string()
}

fn default_device_type() -> String {
    "web".to_string()
}

fn default_tenant() -> String {
    DEFAULT_TENANT.to_string()
}

fn default_app_name() -> String {
    "CRMDesk".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}
