use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::interfaces::InterfaceConfig;
use super::logging::LoggingConfig;
use super::mdns::MdnsConfig;
use super::services::ServiceConfig;
use crate::name::validate_name;

const LOCAL_CONFIG: &str = "mdnsd.toml";
const SYSTEM_CONFIG: &str = "/etc/mdnsd/mdnsd.toml";

/// Main configuration structure for mdnsd
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Responder settings (host name, TTLs, lookup timeout)
    #[serde(default)]
    pub mdns: MdnsConfig,

    /// Interfaces to run on
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,

    /// Services to publish
    #[serde(default)]
    pub services: Vec<ServiceConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. mdnsd.toml in current directory
    /// 3. /etc/mdnsd/mdnsd.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(path) = Self::get_config_path() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(hostname) = overrides.hostname {
            self.mdns.hostname = Some(hostname);
        }
        if let Some(secs) = overrides.lookup_timeout_secs {
            self.mdns.lookup_timeout_secs = secs;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(hostname) = &self.mdns.hostname {
            validate_name(hostname).map_err(|e| {
                ConfigError::Validation(format!("Invalid hostname '{}': {}", hostname, e))
            })?;
        }

        if self.mdns.host_ttl == 0 || self.mdns.service_ttl == 0 {
            return Err(ConfigError::Validation("TTLs cannot be 0".to_string()));
        }

        if self.mdns.lookup_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Lookup timeout cannot be 0".to_string(),
            ));
        }

        for iface in &self.interfaces {
            if iface.name.is_empty() {
                return Err(ConfigError::Validation(
                    "Interface name cannot be empty".to_string(),
                ));
            }
        }

        for service in &self.services {
            if !service.has_valid_type() {
                return Err(ConfigError::Validation(format!(
                    "Service '{}' has invalid type '{}'",
                    service.instance, service.service_type
                )));
            }
            validate_name(&service.instance_name()).map_err(|e| {
                ConfigError::Validation(format!("Service '{}': {}", service.instance, e))
            })?;
            if let Some(long) = service.txt.iter().find(|s| s.len() > 255) {
                return Err(ConfigError::Validation(format!(
                    "Service '{}' has a TXT string of {} bytes",
                    service.instance,
                    long.len()
                )));
            }
        }

        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        [LOCAL_CONFIG, SYSTEM_CONFIG]
            .into_iter()
            .find(|p| std::path::Path::new(p).exists())
            .map(str::to_string)
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub hostname: Option<String>,
    pub lookup_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}
