use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use streaming::StyleConfig;
use thiserror::Error;

pub const DEFAULT_URL: &str = "ws://127.0.0.1:5000/live";
pub const DEFAULT_RECONNECT_MS: u64 = 2000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Live survey-marker map client")]
pub struct Args {
    /// JSON file with marker colors, icons and legend entries
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// Layer the markers are attached to
    #[arg(long, default_value_t = 1)]
    pub layer: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Follow a live server over WebSocket
    Connect {
        /// Socket URL (default: $FIELDMAP_URL, then ws://127.0.0.1:5000/live)
        #[arg(long)]
        url: Option<String>,

        /// Delay before reconnecting after the socket drops (default: $FIELDMAP_RECONNECT_MS, then 2000)
        #[arg(long)]
        reconnect_ms: Option<u64>,
    },

    /// Feed recorded frames from a file, one per line
    Replay {
        path: PathBuf,

        /// Pause between frames
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid style file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Socket settings after CLI flags and environment have been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConfig {
    pub url: String,
    pub reconnect_delay: Duration,
}

impl SocketConfig {
    pub fn resolve(url: Option<String>, reconnect_ms: Option<u64>) -> Self {
        let url = url.unwrap_or_else(|| {
            env::var("FIELDMAP_URL").unwrap_or_else(|_| DEFAULT_URL.to_string())
        });
        let reconnect_ms = reconnect_ms
            .unwrap_or_else(|| env_var_u64("FIELDMAP_RECONNECT_MS", DEFAULT_RECONNECT_MS));
        Self {
            url,
            reconnect_delay: Duration::from_millis(reconnect_ms),
        }
    }
}

/// Style from `path`, or the built-in style when no file is given.
pub fn load_style(path: Option<&Path>) -> Result<StyleConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(StyleConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    StyleConfig::from_json_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
