//! Configuration management for folio
//!
//! Handles the ~/.folio/ directory and config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::models::DEFAULT_TITLE;

/// Environment variable that overrides `[builder] origin`
pub const BUILDER_ORIGIN_ENV: &str = "FOLIO_BUILDER_ORIGIN";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub picker: PickerConfig,
    #[serde(default)]
    pub project: ProjectConfig,
}

/// Where the builder binary is downloaded from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub origin: String,
    pub path: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            path: "/builder.exe".to_string(),
        }
    }
}

/// Accept-list for the image file picker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub description: String,
    pub multiple: bool,
    /// MIME type -> accepted extensions (with leading dot)
    pub accept: BTreeMap<String, Vec<String>>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        let mut accept = BTreeMap::new();
        accept.insert(
            "image/*".to_string(),
            vec![
                ".png".to_string(),
                ".gif".to_string(),
                ".jpeg".to_string(),
                ".jpg".to_string(),
                ".webp".to_string(),
            ],
        );
        Self {
            description: "Images".to_string(),
            multiple: true,
            accept,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub default_title: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl Config {
    /// Builder origin, honouring `FOLIO_BUILDER_ORIGIN`
    pub fn builder_origin(&self) -> String {
        resolve_origin(std::env::var(BUILDER_ORIGIN_ENV).ok(), &self.builder.origin)
    }
}

/// An empty override counts as unset
pub fn resolve_origin(env: Option<String>, configured: &str) -> String {
    match env {
        Some(origin) if !origin.trim().is_empty() => origin,
        _ => configured.to_string(),
    }
}

/// Returns the path to the folio home directory (~/.folio)
pub fn folio_home() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".folio"))
}

/// Returns paths to folio's own files
pub struct FolioPaths {
    pub root: PathBuf,
    pub config: PathBuf,
    pub history: PathBuf,
}

impl FolioPaths {
    pub fn new() -> Result<Self> {
        let root = folio_home()?;
        Ok(Self::at(root))
    }

    /// Paths rooted at an arbitrary directory
    pub fn at(root: PathBuf) -> Self {
        Self {
            config: root.join("config.toml"),
            history: root.join("session_history.txt"),
            root,
        }
    }

    /// Create the root directory if it doesn't exist
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.root).context("Failed to create folio root")?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.config.exists()
    }
}

/// Load configuration from disk, falling back to defaults when absent
pub fn load_config() -> Result<Config> {
    let paths = FolioPaths::new()?;
    load_config_from(&paths)
}

pub fn load_config_from(paths: &FolioPaths) -> Result<Config> {
    if !paths.config.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&paths.config).context("Failed to read config.toml")?;
    toml::from_str(&content).context("Failed to parse config.toml")
}

/// Save configuration to disk
pub fn save_config(paths: &FolioPaths, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&paths.config, content).context("Failed to write config.toml")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let paths = FolioPaths::at(temp.path().to_path_buf());
        let config = load_config_from(&paths).unwrap();
        assert_eq!(config.builder.path, "/builder.exe");
        assert_eq!(config.project.default_title, DEFAULT_TITLE);
        assert!(config.picker.multiple);
    }

    #[test]
    fn test_partial_config_fills_sections() {
        let temp = TempDir::new().unwrap();
        let paths = FolioPaths::at(temp.path().to_path_buf());
        fs::write(
            &paths.config,
            "[builder]\norigin = \"https://assets.example\"\npath = \"/bin/builder.exe\"\n",
        )
        .unwrap();

        let config = load_config_from(&paths).unwrap();
        assert_eq!(config.builder.origin, "https://assets.example");
        assert_eq!(config.builder.path, "/bin/builder.exe");
        assert!(config.picker.accept.contains_key("image/*"));
    }

    #[test]
    fn test_section_with_missing_keys_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let paths = FolioPaths::at(temp.path().to_path_buf());
        fs::write(
            &paths.config,
            "[builder]\norigin = \"https://x\"\n\n[picker]\nmultiple = false\n",
        )
        .unwrap();

        let config = load_config_from(&paths).unwrap();
        assert_eq!(config.builder.origin, "https://x");
        assert_eq!(config.builder.path, "/builder.exe");
        assert!(!config.picker.multiple);
        assert_eq!(config.picker.description, "Images");
        assert!(config.picker.accept.contains_key("image/*"));
        assert_eq!(config.project.default_title, DEFAULT_TITLE);
    }

    #[test]
    fn test_resolve_origin() {
        assert_eq!(
            resolve_origin(Some("http://elsewhere".to_string()), "http://localhost:8080"),
            "http://elsewhere"
        );
        assert_eq!(resolve_origin(None, "http://localhost:8080"), "http://localhost:8080");
        assert_eq!(
            resolve_origin(Some("  ".to_string()), "http://localhost:8080"),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let paths = FolioPaths::at(temp.path().to_path_buf());
        let mut config = Config::default();
        config.project.default_title = "Sprites".to_string();
        save_config(&paths, &config).unwrap();

        assert!(paths.is_initialized());
        let loaded = load_config_from(&paths).unwrap();
        assert_eq!(loaded.project.default_title, "Sprites");
    }
}
