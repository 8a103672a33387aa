//! Directory and image pickers
//!
//! Resolves user-supplied paths into a project handle or image entries,
//! filtering images by the configured accept-list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::PickerConfig;
use crate::models::ImageEntry;
use crate::project::ProjectHandle;

#[derive(Debug, thiserror::Error)]
pub enum PickError {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Picker accepts a single file, got {0}")]
    MultipleNotAllowed(usize),

    #[error("Failed to resolve {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Extensions the image picker accepts
#[derive(Debug, Clone)]
pub struct AcceptList {
    pub description: String,
    pub multiple: bool,
    extensions: HashSet<String>,
}

impl AcceptList {
    pub fn from_config(config: &PickerConfig) -> Self {
        let extensions = config
            .accept
            .values()
            .flatten()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        Self {
            description: config.description.clone(),
            multiple: config.multiple,
            extensions,
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for AcceptList {
    fn default() -> Self {
        Self::from_config(&PickerConfig::default())
    }
}

/// Result of picking image files
#[derive(Debug, Default)]
pub struct Selection {
    pub images: Vec<ImageEntry>,
    /// Files skipped because the accept-list doesn't cover them
    pub rejected: Vec<PathBuf>,
}

/// Resolve a project directory
pub fn pick_directory(path: &Path) -> Result<ProjectHandle, PickError> {
    let root = std::fs::canonicalize(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => PickError::NotFound(path.to_path_buf()),
        _ => PickError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    if !root.is_dir() {
        return Err(PickError::NotADirectory(path.to_path_buf()));
    }
    Ok(ProjectHandle::new(root))
}

/// Turn file paths into image entries named after their file names
pub fn pick_images(paths: &[PathBuf], accept: &AcceptList) -> Result<Selection, PickError> {
    if !accept.multiple && paths.len() > 1 {
        return Err(PickError::MultipleNotAllowed(paths.len()));
    }

    let mut selection = Selection::default();
    for path in paths {
        if !path.exists() {
            return Err(PickError::NotFound(path.clone()));
        }
        if !path.is_file() {
            return Err(PickError::NotAFile(path.clone()));
        }
        if !accept.accepts(path) {
            tracing::warn!(path = %path.display(), filter = %accept.description, "file not in accept-list, skipping");
            selection.rejected.push(path.clone());
            continue;
        }
        // is_file() above guarantees a final component
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return Err(PickError::NotAFile(path.clone())),
        };
        selection.images.push(ImageEntry::from_file(name, path.clone()));
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_accept_list_is_case_insensitive() {
        let accept = AcceptList::default();
        assert!(accept.accepts(Path::new("a.PNG")));
        assert!(accept.accepts(Path::new("dir/b.jpeg")));
        assert!(!accept.accepts(Path::new("notes.txt")));
        assert!(!accept.accepts(Path::new("no_extension")));
    }

    #[test]
    fn test_pick_images_skips_unaccepted() {
        let temp = TempDir::new().unwrap();
        let png = temp.path().join("a.png");
        let txt = temp.path().join("readme.txt");
        fs::write(&png, b"png").unwrap();
        fs::write(&txt, b"txt").unwrap();

        let selection = pick_images(&[png.clone(), txt.clone()], &AcceptList::default()).unwrap();
        assert_eq!(selection.images.len(), 1);
        assert_eq!(selection.images[0].name, "a.png");
        assert_eq!(selection.rejected, vec![txt]);
    }

    #[test]
    fn test_pick_images_missing_file() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("gone.png");
        let err = pick_images(&[missing], &AcceptList::default()).unwrap_err();
        assert!(matches!(err, PickError::NotFound(_)));
    }

    #[test]
    fn test_single_file_picker() {
        let mut config = PickerConfig::default();
        config.multiple = false;
        let accept = AcceptList::from_config(&config);

        let paths = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        let err = pick_images(&paths, &accept).unwrap_err();
        assert!(matches!(err, PickError::MultipleNotAllowed(2)));
    }

    #[test]
    fn test_pick_directory() {
        let temp = TempDir::new().unwrap();
        let handle = pick_directory(temp.path()).unwrap();
        assert!(handle.root().is_absolute());

        let file = temp.path().join("f.png");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(pick_directory(&file), Err(PickError::NotADirectory(_))));
        assert!(matches!(
            pick_directory(&temp.path().join("nope")),
            Err(PickError::NotFound(_))
        ));
    }
}
