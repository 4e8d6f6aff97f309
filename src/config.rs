use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

/// Runtime configuration for the server.
///
/// Loaded from an optional YAML file named by `COOKIEJAR_CONFIG`, then
/// overridden by the `LISTEN` and `SESSION_DIR` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the listening socket binds to.
    pub listen_addr: String,
    /// Directory holding one log file per session.
    pub session_dir: PathBuf,
    /// Receive cap while the header block is still arriving.
    pub max_header_bytes: usize,
    /// Largest declared `Content-Length` accepted.
    pub max_body_bytes: usize,
    /// Readiness events fetched per poll.
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            session_dir: PathBuf::from("cookies"),
            max_header_bytes: 2047,
            max_body_bytes: 1024 * 1024,
            event_capacity: 1024,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("COOKIEJAR_CONFIG") {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {}", path))?;
                Self::from_yaml_str(&text)
                    .with_context(|| format!("failed to parse config file {}", path))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(addr) = std::env::var("LISTEN") {
            cfg.listen_addr = addr;
        }
        if let Ok(dir) = std::env::var("SESSION_DIR") {
            cfg.session_dir = PathBuf::from(dir);
        }

        Ok(cfg)
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(text)?;
        Ok(cfg)
    }
}
