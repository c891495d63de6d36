//! TOML configuration file for the client.
//!
//! The file wraps a [`SessionConfig`] with the settings that only matter to
//! the binary (log level and an optional receive filter):
//!
//! ```toml
//! log_level = "info"
//!
//! [session]
//! interface = "tcp://192.168.1.7:9598"
//! flags = 0
//! response_timeout_ms = 3000
//! connection_timeout_ms = 3000
//! max_queue_size = 1000
//!
//! [filter]
//! priority_value = 0
//! priority_mask = 0
//! class_value = 10
//! class_mask = 65535
//! type_value = 6
//! type_mask = 65535
//! guid_value = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
//! guid_mask = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
//! ```
//!
//! # Serde default values
//!
//! Every section and field has a default, so an empty file, a file that
//! only sets `[session] interface`, and a file written by an older version
//! all load.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vscp_core::EventFilter;

use crate::application::config::{ConfigError, SessionConfig};

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub session: SessionConfig,

    /// Receive filter applied right after connecting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<EventFilter>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            session: SessionConfig::default(),
            filter: None,
        }
    }
}

/// Loads the configuration at `path`, returning the default when the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] if the session section is unusable.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: ClientConfig = toml::from_str(&content)?;
            cfg.session.validate()?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
