//! Project folder synchronization
//!
//! A project is opened from a directory, edited in memory and flattened back
//! to `projectData.json` + `img/` on save.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::{BUILDER_FILE, IMAGE_DIR, MANIFEST_FILE};

pub mod store;
pub mod sync;

pub use store::{Action, Session};
pub use sync::{BuildReport, OpenOutcome, SaveReport, SessionStatus, Synchronizer};

/// Errors returned by project operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("No project folder opened")]
    NoProjectOpen,

    #[error("Invalid image name {0:?}: must be a plain file name")]
    InvalidImageName(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} image(s) could not be saved: {}", failures.len(), join_failures(failures))]
    ImageWrites { failures: Vec<ImageWriteFailure> },

    #[error("Failed to download builder from {url}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ProjectError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> ProjectError + '_ {
        move |source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A single image that failed to copy into `img/`
#[derive(Debug)]
pub struct ImageWriteFailure {
    pub name: String,
    pub source: std::io::Error,
}

impl fmt::Display for ImageWriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.source)
    }
}

fn join_failures(failures: &[ImageWriteFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reference to an opened project directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectHandle {
    root: PathBuf,
    name: String,
}

impl ProjectHandle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { root, name }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join(IMAGE_DIR)
    }

    pub fn image_path(&self, name: &str) -> PathBuf {
        self.image_dir().join(name)
    }

    pub fn builder_path(&self) -> PathBuf {
        self.root.join(BUILDER_FILE)
    }
}

/// Image names end up as paths under `img/`, so they must not escape it
pub fn validate_image_name(name: &str) -> Result<(), ProjectError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(ProjectError::InvalidImageName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_layout() {
        let handle = ProjectHandle::new("/work/sprites");
        assert_eq!(handle.name(), "sprites");
        assert_eq!(handle.manifest_path(), Path::new("/work/sprites/projectData.json"));
        assert_eq!(handle.image_path("a.png"), Path::new("/work/sprites/img/a.png"));
        assert_eq!(handle.builder_path(), Path::new("/work/sprites/builder.exe"));
    }

    #[test]
    fn test_image_name_validation() {
        assert!(validate_image_name("a.png").is_ok());
        assert!(validate_image_name("with space.jpg").is_ok());
        assert!(validate_image_name("").is_err());
        assert!(validate_image_name("..").is_err());
        assert!(validate_image_name("../a.png").is_err());
        assert!(validate_image_name("dir\\a.png").is_err());
    }

    #[test]
    fn test_image_writes_message_lists_names() {
        let err = ProjectError::ImageWrites {
            failures: vec![ImageWriteFailure {
                name: "a.png".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            }],
        };
        let msg = err.to_string();
        assert!(msg.contains("1 image(s)"));
        assert!(msg.contains("a.png (gone)"));
    }
}
