//! Receiver configuration
//!
//! Every field has a default, so an empty YAML document is a valid config:
//!
//! ```yaml
//! listen_address: 0.0.0.0
//! listen_port: 40739
//! window_size: 5
//! read_buffer_size: 1024
//! logging:
//!   level: info
//!   file: null
//! ```

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::latency::DEFAULT_WINDOW_SIZE;
use crate::session::DEFAULT_READ_BUFFER_SIZE;
use crate::{ReceiverError, Result};

/// Default TCP port the receiver listens on.
pub const DEFAULT_PORT: u16 = 40739;

/// Largest accepted read buffer.
const MAX_READ_BUFFER_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set
    pub level: String,
    /// Append logs to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), file: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub listen_address: IpAddr,
    pub listen_port: u16,
    /// Samples in the rolling average
    pub window_size: usize,
    /// Bytes requested per transport read
    pub read_buffer_size: usize,
    pub logging: LoggingConfig,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: DEFAULT_PORT,
            window_size: DEFAULT_WINDOW_SIZE.get(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            logging: LoggingConfig::default(),
        }
    }
}

impl ReceiverConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| ReceiverError::parse_error("receiver config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| ReceiverError::ConfigFile { path: path.to_path_buf(), source })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check values the type system does not.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(ReceiverError::config_invalid("window_size must be at least 1"));
        }
        if self.read_buffer_size == 0 || self.read_buffer_size > MAX_READ_BUFFER_SIZE {
            return Err(ReceiverError::config_invalid(format!(
                "read_buffer_size must be between 1 and {}, got {}",
                MAX_READ_BUFFER_SIZE, self.read_buffer_size
            )));
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ReceiverError::config_invalid(format!(
                "unknown log level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.listen_port)
    }

    /// Rolling window size as a non-zero count.
    pub fn window(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.window_size)
            .ok_or_else(|| ReceiverError::config_invalid("window_size must be at least 1"))
    }
}
