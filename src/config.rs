use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DB_ENV: &str = "ASSET_FLOW_DB";
pub const ADDR_ENV: &str = "ASSET_FLOW_ADDR";

/// Runtime settings shared by the CLI and the API server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_addr: String,

    /// Canvas handed to flow-diagram renderers
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("assets.db"),
            bind_addr: "0.0.0.0:3000".into(),
            canvas_width: 960,
            canvas_height: 500,
        }
    }
}

impl Config {
    /// Defaults overridden by `ASSET_FLOW_DB` / `ASSET_FLOW_ADDR` when set.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Read a JSON config file; a missing file yields the defaults.
    /// Environment variables still win over the file.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let data = fs::read_to_string(path)?;
            serde_json::from_str(&data)?
        } else {
            Config::default()
        };

        Ok(config.with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(db) = env::var_os(DB_ENV).filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(db);
        }
        if let Ok(addr) = env::var(ADDR_ENV) {
            if !addr.trim().is_empty() {
                self.bind_addr = addr.trim().to_string();
            }
        }
        self
    }
}
