use crate::planner::RenameRule;
use crate::sequence::DEFAULT_SEQUENCE_MARKER;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub case_sensitive: bool,
    pub replace_all: bool,
    pub sequenced: bool,
    pub sequence_start: i64,
    pub sequence_marker: char,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            replace_all: false,
            sequenced: false,
            sequence_start: 1,
            sequence_marker: DEFAULT_SEQUENCE_MARKER,
        }
    }
}

impl AppConfig {
    pub fn rule(&self, pattern: impl Into<String>, template: impl Into<String>) -> RenameRule {
        RenameRule {
            source_pattern: pattern.into(),
            target_template: template.into(),
            case_sensitive: self.case_sensitive,
            replace_all: self.replace_all,
            sequenced: self.sequenced,
            sequence_start: self.sequence_start,
            sequence_marker: self.sequence_marker,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
    pub history_dir: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "nametwister", "name-twister")
        .context("could not determine the OS configuration directory")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        history_dir: proj.data_dir().join("history"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&app_paths()?.config_path)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(&app_paths()?.config_path, config)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read config file: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("could not parse config file: {}", path.display()))?;
    Ok(config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("could not create config directory: {}", dir.display()))?;
    }
    let body = toml::to_string_pretty(config).context("could not serialize config")?;
    fs::write(path, body)
        .with_context(|| format!("could not write config file: {}", path.display()))?;
    Ok(())
}
