//! Configuration loading and persistence.
//!
//! Handles reading and writing the quizhub configuration file.
//! The session token is not kept here; it lives in the session store
//! (OS keyring, or a file in test mode).

#[cfg(not(test))]
use anyhow::Context;
use anyhow::Result;
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::{fs, path::PathBuf};

use crate::constants::DEFAULT_SERVER_URL;

/// Configuration for the quizhub client.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    /// Base URL of the Quiz Master server.
    pub server_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// Directory selection priority:
    /// 1. `#[cfg(test)]` (unit tests): `tmp/quizhub-test`
    /// 2. `QUIZHUB_CONFIG_DIR` env var: explicit override
    /// 3. `QUIZHUB_ENV=test`: `tmp/quizhub-test` (integration tests)
    /// 4. Default: platform config dir (macOS: ~/Library/Application Support/quizhub)
    pub fn config_dir() -> Result<PathBuf> {
        let dir = {
            #[cfg(test)]
            {
                // Unit tests: use the crate's tmp/ directory
                PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tmp/quizhub-test")
            }

            #[cfg(not(test))]
            {
                if let Ok(test_dir) = std::env::var("QUIZHUB_CONFIG_DIR") {
                    // Explicit override via env var
                    PathBuf::from(test_dir)
                } else if crate::env::should_skip_keyring() {
                    // Integration tests: use the crate's tmp/ directory
                    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tmp/quizhub-test")
                } else {
                    // Production: use platform-standard config directory
                    dirs::config_dir()
                        .context("Could not determine config directory")?
                        .join("quizhub")
                }
            }
        };
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Loads configuration from file, with environment variable overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file().unwrap_or_else(|_| Self::default());
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        let config_path = Self::config_dir()?.join("config.json");
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            anyhow::bail!("Config file not found")
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(server_url) = std::env::var("QUIZHUB_SERVER_URL") {
            self.server_url = server_url;
        }
    }

    /// Persists the current configuration to disk.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_dir()?.join("config.json");
        fs::write(&config_path, serde_json::to_string_pretty(self)?)?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        fs::set_permissions(&config_path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }

    /// Builds a config pointing at an arbitrary server, bypassing disk.
    ///
    /// Used by tests to aim the client at a mock server.
    #[must_use]
    pub fn with_server_url(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
        }
    }
}
