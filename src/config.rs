use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Preferences remembered between sessions.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub server_url: Option<String>,
  pub bitrate: Option<String>,
  pub output_dir: Option<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "ytmp3")
}

/// Directory for the rolling log files, if the platform provides one.
pub fn log_dir() -> Option<PathBuf> {
  project_dirs().map(|d| d.data_local_dir().join("logs"))
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) -> Result<()> {
    let proj_dirs = project_dirs().context("No home directory to store preferences in")?;
    let config_dir = proj_dirs.config_dir();
    std::fs::create_dir_all(config_dir).with_context(|| format!("Failed to create {}", config_dir.display()))?;
    let content = toml::to_string(self).context("Failed to serialise preferences")?;
    std::fs::write(config_dir.join("prefs.toml"), content).context("Failed to write preferences")?;
    Ok(())
  }
}
