use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::versioning::VersionPolicy;

const CONFIG_FILE: &str = "config.yaml";

/// Project configuration, stored as `.vellum/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which edits bump a document's version
    pub version_policy: VersionPolicy,
    pub http: HttpConfig,
    /// Default tracing filter when VELLUM_LOG is unset
    pub log_filter: String,
    /// Export directory, relative to `.vellum/`
    pub export_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version_policy: VersionPolicy::default(),
            http: HttpConfig::default(),
            log_filter: "warn".to_string(),
            export_dir: PathBuf::from("exports"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3210".to_string(),
        }
    }
}

impl Config {
    /// Load the config from a `.vellum` directory. A missing file yields
    /// the defaults.
    pub fn load(vellum_dir: &Path) -> Result<Self> {
        let path = vellum_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&text)?)
    }

    pub fn save(&self, vellum_dir: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(vellum_dir.join(CONFIG_FILE), yaml)?;
        Ok(())
    }

    /// Absolute export directory for a `.vellum` directory.
    pub fn export_path(&self, vellum_dir: &Path) -> PathBuf {
        if self.export_dir.is_absolute() {
            self.export_dir.clone()
        } else {
            vellum_dir.join(&self.export_dir)
        }
    }
}
