/// Runtime configuration, loaded from an optional TOML file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub toolchain: ToolchainConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub c_compiler: String,
    pub node: String,
    /// Flag that turns on node's permission model. Node 20 and 21 spell it
    /// `--experimental-permission`.
    pub node_permission_flag: String,
    pub compile_timeout_secs: u64,
    pub run_timeout_secs: u64,
    /// Parent of the per-request scratch directories; the system temp dir
    /// when unset.
    pub temp_dir: Option<PathBuf>,
    pub extra_cflags: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            c_compiler: "gcc".to_string(),
            node: "node".to_string(),
            node_permission_flag: "--permission".to_string(),
            compile_timeout_secs: 10,
            run_timeout_secs: 5,
            temp_dir: None,
            extra_cflags: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    /// Read `path` when given, otherwise start from the defaults. The `PORT`
    /// environment variable overrides the configured port.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Cannot read config file {}", path.display()))?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        if let Ok(port) = std::env::var("PORT") {
            config.apply_port_override(&port)?;
        }
        Ok(config)
    }

    fn apply_port_override(&mut self, port: &str) -> Result<()> {
        self.server.port = port
            .trim()
            .parse()
            .with_context(|| format!("PORT must be a port number, got `{}`", port))?;
        Ok(())
    }
}
