//! Persisted application configuration.
//!
//! A single JSON document in the per-user data directory. Recognized
//! keys get typed accessors; unknown keys round-trip verbatim so an
//! older build never destroys settings written by a newer one. Every
//! setter persists immediately. The value is passed explicitly to the
//! operations that need it; nothing reads it ambiently.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_WEB_SERVER_PORT: u16 = 1212;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub default_folder: String,
    #[serde(default)]
    pub web_server_enabled: bool,
    #[serde(default = "default_port")]
    pub web_server_port: u16,
    #[serde(default)]
    pub poppler_path: String,
    /// Keys this build does not recognize, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_port() -> u16 {
    DEFAULT_WEB_SERVER_PORT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_folder: String::new(),
            web_server_enabled: false,
            web_server_port: DEFAULT_WEB_SERVER_PORT,
            poppler_path: String::new(),
            extra: Map::new(),
        }
    }
}

impl Config {
    pub fn default_folder(&self) -> Option<PathBuf> {
        if self.default_folder.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.default_folder))
        }
    }

    pub fn poppler_path(&self) -> Option<PathBuf> {
        if self.poppler_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.poppler_path))
        }
    }
}

/// Handle binding a config value to its file. Setters write through.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    pub config: Config,
}

impl ConfigStore {
    /// Load from `path`, falling back to defaults when the file is
    /// absent or unparseable. A broken config file is logged, never
    /// fatal.
    pub fn load(path: &Path) -> Self {
        let config = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("failed to parse config {}: {e}", path.display());
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        };
        Self {
            path: path.to_path_buf(),
            config,
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.config)
            .map_err(|e| std::io::Error::other(e))?;
        fs::write(&self.path, content)
    }

    pub fn set_default_folder(&mut self, folder: &str) -> std::io::Result<()> {
        self.config.default_folder = folder.to_string();
        self.save()
    }

    pub fn set_web_server_enabled(&mut self, enabled: bool) -> std::io::Result<()> {
        self.config.web_server_enabled = enabled;
        self.save()
    }

    pub fn set_web_server_port(&mut self, port: u16) -> std::io::Result<()> {
        self.config.web_server_port = port;
        self.save()
    }

    pub fn set_poppler_path(&mut self, path: &str) -> std::io::Result<()> {
        self.config.poppler_path = path.to_string();
        self.save()
    }
}
