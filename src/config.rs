use std::{
    fs,
    path::{Path, PathBuf}
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::adapter::storage::StoreType;

/// A sign-in provider the local identity service accepts
///
/// Signing in through a provider links the configured email to an account.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProviderAccount {
    pub name:  String,
    pub email: String
}

/// Configuration structure for the event desk CLI
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Directory store backend
    pub store:              StoreType,
    /// Override for the directory holding the database and the identity file
    pub data_dir:           Option<PathBuf>,
    /// Providers available to `auth provider`
    pub identity_providers: Vec<ProviderAccount>,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level:          String
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store:              StoreType::RocksDb,
            data_dir:           None,
            identity_providers: Vec::new(),
            log_level:          "warn".to_string()
        }
    }
}

impl Config {
    /// Directory holding persistent state
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_project_dirs()?.data_dir().to_path_buf())
        }
    }

    /// RocksDB directory for the directory store
    pub fn store_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("directory"))
    }

    /// File persisting accounts and the current session
    pub fn identity_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("identity.yaml"))
    }
}

/// Get the project directories for cross-platform config path resolution
pub fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "eventdesk").context("Failed to determine project directories")
}

/// Get the configuration directory path
pub fn get_config_dir() -> Result<PathBuf> {
    let project_dirs = get_project_dirs()?;
    Ok(project_dirs.config_dir().to_path_buf())
}

/// Get the config file path
pub fn get_config_file_path() -> Result<PathBuf> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join("config.yaml"))
}

/// Load configuration from file or create default if it doesn't exist
pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_file_path()?)
}

/// Save configuration to file
pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &get_config_file_path()?)
}

pub fn load_config_from(config_path: &Path) -> Result<Config> {
    if config_path.exists() {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        serde_yaml::from_str(&content).with_context(|| "Failed to parse config file")
    } else {
        let config = Config::default();
        save_config_to(&config, config_path)?;
        Ok(config)
    }
}

pub fn save_config_to(config: &Config, config_path: &Path) -> Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    let content = serde_yaml::to_string(config).context("Failed to serialize config")?;

    fs::write(config_path, content)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    Ok(())
}

/// Set the store backend in configuration
pub fn set_store(store: StoreType) -> Result<()> {
    let mut config = load_config()?;
    config.store = store;
    save_config(&config)?;
    Ok(())
}
