//! tracing subscriber setup for the binaries
//!
//! The library itself only emits events. Binaries call [`init`] once at startup.

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;
use crate::{ReceiverError, Result};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Output goes to the
/// configured file, or to stderr so it does not interleave with a dashboard
/// drawn on stdout.
pub fn init(cfg: &LoggingConfig) -> Result<()> {
    let filter = build_filter(cfg)?;

    let installed = match &cfg.file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|source| ReceiverError::ConfigFile {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ReceiverError::ConfigFile { path: path.clone(), source })?;

            fmt().with_env_filter(filter).with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init(),
    };

    installed
        .map_err(|e| ReceiverError::config_invalid(format!("logging already initialized: {e}")))
}

fn build_filter(cfg: &LoggingConfig) -> Result<EnvFilter> {
    let level = cfg
        .level
        .parse::<tracing::Level>()
        .map_err(|_| ReceiverError::config_invalid(format!("unknown log level '{}'", cfg.level)))?;

    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string())))
}
