use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Logger configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggerConfig {
    /// An env-filter directive, e.g. `"info"` or `"info,kestrel=trace"`.
    /// The `RUST_LOG` environment variable takes precedence when set.
    pub filter: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Main host configuration.
#[derive(Serialize, Deserialize, Debug)]
pub struct AppConfig {
    pub app_name: String,
    pub logger: LoggerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "kestrel".to_string(),
            logger: Default::default(),
        }
    }
}

impl AppConfig {
    /// Read the configuration file, generating one with defaults when it
    /// does not exist yet.
    pub fn read_or_create_default(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            let config = AppConfig::default();
            let mut file = File::create(path)
                .with_context(|| format!("create {}", path.display()))?;
            file.write_all(&serde_json::to_vec_pretty(&config)?)?;
            return Ok(config);
        }
        Self::read(path)
    }

    fn read(path: &Path) -> Result<AppConfig> {
        let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let config = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse {}", path.display()))?;
        Ok(config)
    }
}
