//! Server settings.

use crate::error::{DbError, Result};
use crate::VecDB;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Vector log file. `None` keeps the store in memory.
    pub db: Option<PathBuf>,
    /// Largest accepted request body, in bytes.
    pub max_payload: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7878,
            db: None,
            max_payload: 64 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Reads settings from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .map_err(|e| DbError::InvalidInput(format!("Fail to read config '{}': {}", path.display(), e)))?;

        serde_json::from_slice(&raw)
            .map_err(|e| DbError::InvalidInput(format!("Bad config '{}': {}", path.display(), e)))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Opens the configured store: file-backed when `db` is set, in-memory otherwise.
    pub fn open_db(&self) -> Result<VecDB> {
        match &self.db {
            Some(path) => VecDB::open(path),
            None => Ok(VecDB::new()),
        }
    }
}
