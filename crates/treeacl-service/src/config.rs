//! Configuration management for the ACL service.
//!
//! Sources, lowest precedence first:
//! 1. Default values
//! 2. Configuration file (YAML)
//! 3. Environment variables (`TREEACL_` prefix, `__` between nested keys)
//!
//! # Example
//!
//! ```yaml
//! acl:
//!   backend: ini
//!   ini_path: /etc/treeacl/acl.ini
//!   actions: [create, read, update, delete, publish]
//!   max_depth: 64
//!
//! logging:
//!   level: debug
//!   json: true
//! ```

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use treeacl_domain::model::ActionSet;
use treeacl_domain::{DomainError, ResolverConfig};

/// Backends selectable through `acl.backend`.
pub const VALID_BACKENDS: [&str; 2] = ["db", "ini"];

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AclServiceConfig {
    /// ACL backend settings
    #[serde(default)]
    pub acl: AclSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// ACL backend settings.
///
/// Environment overrides:
/// - `TREEACL_ACL__BACKEND=ini`
/// - `TREEACL_ACL__INI_PATH=/etc/treeacl/acl.ini`
/// - `TREEACL_ACL__ACTIONS=read,publish`
/// - `TREEACL_ACL__MAX_DEPTH=64`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AclSettings {
    /// Backend type: "db" (tree ACL over the node store) or "ini" (flat file)
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Flat-file location (required if backend is "ini")
    pub ini_path: Option<String>,

    /// Known action names for the tree ACL
    #[serde(default = "default_actions")]
    pub actions: Vec<String>,

    /// Longest ancestor chain accepted before a node forest is treated as cyclic
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for AclSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            ini_path: None,
            actions: default_actions(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_backend() -> String {
    "db".to_string()
}

fn default_actions() -> Vec<String> {
    ActionSet::crud().names().to_vec()
}

fn default_max_depth() -> usize {
    ResolverConfig::default().max_depth
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading and backend construction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },

    #[error("failed to build ACL backend: {0}")]
    Build(#[from] DomainError),
}

impl AclServiceConfig {
    /// Loads configuration from a YAML file with environment variable overrides.
    ///
    /// For example `TREEACL_ACL__BACKEND=ini` overrides `acl.backend`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&AclServiceConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(Self::environment())
            .build()?;

        let service_config: AclServiceConfig = config.try_deserialize()?;
        service_config.validate()?;

        Ok(service_config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&AclServiceConfig::default())?)
            .add_source(Self::environment())
            .build()?;

        let service_config: AclServiceConfig = config.try_deserialize()?;
        service_config.validate()?;

        Ok(service_config)
    }

    // TREEACL_ACL__MAX_DEPTH -> acl.max_depth
    fn environment() -> Environment {
        Environment::with_prefix("TREEACL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("acl.actions")
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if !VALID_BACKENDS.contains(&self.acl.backend.as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "acl.backend must be one of: {:?}, got: {}",
                    VALID_BACKENDS, self.acl.backend
                ),
            });
        }

        if self.acl.backend == "ini"
            && self
                .acl
                .ini_path
                .as_deref()
                .map_or(true, |s| s.trim().is_empty())
        {
            return Err(ConfigLoadError::Invalid {
                message: "acl.ini_path is required when backend is 'ini'".to_string(),
            });
        }

        if self.acl.max_depth == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "acl.max_depth must be greater than 0".to_string(),
            });
        }

        self.action_set()?;

        if !VALID_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    VALID_LEVELS, self.logging.level
                ),
            });
        }

        Ok(())
    }

    /// The configured action list as a normalized [`ActionSet`].
    pub fn action_set(&self) -> Result<ActionSet, ConfigLoadError> {
        ActionSet::new(&self.acl.actions).map_err(|e| ConfigLoadError::Invalid {
            message: format!("acl.actions: {e}"),
        })
    }

    /// Resolver settings derived from the `acl` section.
    pub fn resolver_config(&self) -> Result<ResolverConfig, ConfigLoadError> {
        Ok(ResolverConfig::default()
            .with_actions(self.action_set()?)
            .with_max_depth(self.acl.max_depth))
    }
}
