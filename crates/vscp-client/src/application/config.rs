//! Session configuration and its portable export forms.
//!
//! A [`SessionConfig`] holds everything a session needs besides its driver:
//! the interface string handed to the driver, the flag word, the two
//! timeouts, and the receive queue bound.  It can be exported to TOML (the
//! format of the configuration file) and to JSON (the format other VSCP
//! client libraries use for `getConfigAsJson`-style dumps).
//!
//! Missing fields fall back to their defaults when importing, so an older
//! or hand-written file with only `interface = "..."` still loads.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vscp_core::protocol::{flags, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_RESPONSE_TIMEOUT_MS};

/// Largest timeout the configuration file can hold.
///
/// TOML integers are signed 64-bit, so millisecond values above `i64::MAX`
/// could be set in memory but never written out.
pub const MAX_TIMEOUT_MS: u64 = i64::MAX as u64;

/// Converts a duration to whole milliseconds, saturating at [`MAX_TIMEOUT_MS`].
pub fn timeout_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).map_or(MAX_TIMEOUT_MS, |ms| ms.min(MAX_TIMEOUT_MS))
}

/// Error type for configuration parsing, validation, and persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The JSON export could not be produced or read.
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The values parsed fine but cannot be used.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Interface, flags, timeouts, and queue bound for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Driver-specific interface string, e.g. `"tcp://192.168.1.7:9598"`.
    #[serde(default)]
    pub interface: String,

    /// Flag word.  Bit 31 ([`flags::ENABLE_DEBUG`]) turns on verbose logging.
    #[serde(default)]
    pub flags: u32,

    /// Default wait for `send` and `receive` when no explicit timeout is given.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,

    /// Upper bound for the driver's `connect`.  Zero means no bound.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Receive queue capacity.  Must be at least one.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
}

fn default_response_timeout_ms() -> u64 {
    DEFAULT_RESPONSE_TIMEOUT_MS
}
fn default_connection_timeout_ms() -> u64 {
    DEFAULT_RESPONSE_TIMEOUT_MS
}
fn default_max_queue_size() -> usize {
    DEFAULT_MAX_QUEUE_SIZE
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interface: String::new(),
            flags: 0,
            response_timeout_ms: default_response_timeout_ms(),
            connection_timeout_ms: default_connection_timeout_ms(),
            max_queue_size: default_max_queue_size(),
        }
    }
}

impl SessionConfig {
    /// Config for `interface` with every other field at its default.
    pub fn for_interface(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            ..Self::default()
        }
    }

    pub fn debug_enabled(&self) -> bool {
        self.flags & flags::ENABLE_DEBUG != 0
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// `None` when the connect wait is unbounded.
    pub fn connection_timeout(&self) -> Option<Duration> {
        (self.connection_timeout_ms > 0).then(|| Duration::from_millis(self.connection_timeout_ms))
    }

    /// Checks the values a session cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `max_queue_size` is zero or a
    /// timeout exceeds [`MAX_TIMEOUT_MS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_queue_size == 0 {
            return Err(ConfigError::Invalid(
                "max_queue_size must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("response_timeout_ms", self.response_timeout_ms),
            ("connection_timeout_ms", self.connection_timeout_ms),
        ] {
            if value > MAX_TIMEOUT_MS {
                return Err(ConfigError::Invalid(format!(
                    "{name} must not exceed {MAX_TIMEOUT_MS}"
                )));
            }
        }
        Ok(())
    }

    /// Pretty TOML text, the format of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for unusable values.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Pretty JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::Invalid`] for unusable values.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

// ── Partial update ────────────────────────────────────────────────────────────

/// A JSON object that changes only the keys it contains.
///
/// Keys a [`SessionConfig`] does not have (for example `connected` and
/// `stats` in a session dump) are ignored, so a dump can be fed back in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionConfigUpdate {
    pub interface: Option<String>,
    pub flags: Option<u32>,
    pub response_timeout_ms: Option<u64>,
    pub connection_timeout_ms: Option<u64>,
    pub max_queue_size: Option<usize>,
}

impl SessionConfigUpdate {
    /// Parses a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON or wrongly typed keys.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// `base` with the present keys overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the result fails validation.
    pub fn apply_to(&self, base: &SessionConfig) -> Result<SessionConfig, ConfigError> {
        let mut cfg = base.clone();
        if let Some(interface) = &self.interface {
            cfg.interface = interface.clone();
        }
        if let Some(flags) = self.flags {
            cfg.flags = flags;
        }
        if let Some(ms) = self.response_timeout_ms {
            cfg.response_timeout_ms = ms;
        }
        if let Some(ms) = self.connection_timeout_ms {
            cfg.connection_timeout_ms = ms;
        }
        if let Some(size) = self.max_queue_size {
            cfg.max_queue_size = size;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
