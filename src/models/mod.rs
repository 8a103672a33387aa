//! Data models for folio projects
//!
//! A project is a directory holding `projectData.json` and an `img/`
//! folder. The manifest is the canonical on-disk form; `ProjectState` is the
//! working set edited in memory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "projectData.json";
pub const IMAGE_DIR: &str = "img";
pub const BUILDER_FILE: &str = "builder.exe";
pub const DEFAULT_TITLE: &str = "This is your project";

/// The on-disk manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectManifest {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub images: Vec<String>,

    /// Fields folio doesn't know about, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl ProjectManifest {
    /// Image names with duplicates removed, first occurrence kept
    pub fn unique_images(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.images
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect()
    }
}

/// Where an image's bytes come from
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match self {
            ImageSource::File(path) => tokio::fs::read(path).await,
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageSource::File(path) => Some(path),
            ImageSource::Bytes(_) => None,
        }
    }
}

/// A named image plus a reference to its content
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    pub name: String,
    pub source: ImageSource,
}

impl ImageEntry {
    pub fn from_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: ImageSource::File(path.into()),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: ImageSource::Bytes(bytes),
        }
    }
}

/// In-memory project state
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectState {
    pub title: String,
    pub images: Vec<ImageEntry>,
    pub extra: Map<String, Value>,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self::with_title(DEFAULT_TITLE)
    }
}

impl ProjectState {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            images: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn image_names(&self) -> Vec<&str> {
        self.images.iter().map(|i| i.name.as_str()).collect()
    }

    /// Images deduplicated by name; the first entry with a given name wins
    pub fn unique_images(&self) -> Vec<&ImageEntry> {
        let mut seen = HashSet::new();
        self.images
            .iter()
            .filter(|image| seen.insert(image.name.as_str()))
            .collect()
    }

    /// Flatten into the manifest written on save
    pub fn to_manifest(&self) -> ProjectManifest {
        ProjectManifest {
            title: self.title.clone(),
            images: self
                .unique_images()
                .into_iter()
                .map(|i| i.name.clone())
                .collect(),
            extra: self.extra.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manifest_keeps_unknown_fields() {
        let raw = json!({"title": "T", "images": ["a.png"], "author": "kim", "version": 3});
        let manifest: ProjectManifest = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(manifest.extra.get("author"), Some(&json!("kim")));

        let back = serde_json::to_value(&manifest).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_manifest_defaults() {
        let manifest: ProjectManifest = serde_json::from_str("{}").unwrap();
        assert_eq!(manifest.title, DEFAULT_TITLE);
        assert!(manifest.images.is_empty());
    }

    #[test]
    fn test_state_flattens_to_deduplicated_manifest() {
        let mut state = ProjectState::with_title("T");
        state.images.push(ImageEntry::from_bytes("a.png", vec![1]));
        state.images.push(ImageEntry::from_bytes("b.png", vec![2]));
        state.images.push(ImageEntry::from_bytes("a.png", vec![3]));

        let manifest = state.to_manifest();
        assert_eq!(manifest.images, vec!["a.png", "b.png"]);

        let unique = state.unique_images();
        assert_eq!(unique[0].source, ImageSource::Bytes(vec![1]));
    }
}
