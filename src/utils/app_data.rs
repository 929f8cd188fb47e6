use crate::index::types::IndexConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "urlindex";
const CONFIG_FILE: &str = "config.json";

/// File name of the index snapshot inside a profile directory
pub const CACHE_FILE_NAME: &str = "History Provider Cache";

/// Environment variable overriding the profile directory
pub const PROFILE_ENV: &str = "URLINDEX_PROFILE";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Profile directory holding the cache file. Defaults to the app data directory.
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,

    /// Languages passed to index initialization
    #[serde(default = "default_languages")]
    pub languages: String,

    #[serde(default)]
    pub index: IndexConfig,
}

fn default_languages() -> String {
    "en".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile_dir: None,
            languages: default_languages(),
            index: IndexConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(config_path).context("Failed to read config file")?;
        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Resolve the profile directory: explicit override, then the
    /// environment, then the config file, then the app data directory.
    pub fn resolve_profile_dir(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = explicit {
            return Ok(dir.to_path_buf());
        }
        if let Some(dir) = std::env::var_os(PROFILE_ENV) {
            return Ok(PathBuf::from(dir));
        }
        match &self.profile_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_app_data_dir(),
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        dirs::data_dir()
    };

    let app_dir = base
        .context("Could not determine app data directory")?
        .join(APP_NAME);
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Location of the index snapshot for a profile
pub fn cache_file_path(profile_dir: &Path) -> PathBuf {
    profile_dir.join(CACHE_FILE_NAME)
}
