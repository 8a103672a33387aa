//! Project synchronizer
//!
//! Reconciles a project directory with the in-memory session:
//! - open: manifest + `img/` listing -> state (name intersection)
//! - save: state -> `img/` copies, then manifest
//! - build: builder binary -> `<project>/builder.exe`

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::store::{Action, Session};
use super::{validate_image_name, ImageWriteFailure, ProjectError, ProjectHandle};
use crate::builder::{builder_url, BinaryFetcher};
use crate::config::Config;
use crate::models::{ImageEntry, ProjectManifest, ProjectState};
use crate::preview::PreviewData;

/// What `open` found in the project directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// No `projectData.json`; the project starts out empty
    NoManifest,
    Loaded {
        images: usize,
        /// Manifest entries with no file in `img/`
        missing: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub manifest: PathBuf,
    /// (name, bytes written) in manifest order
    pub images: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub url: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Summary for the status display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub project: Option<String>,
    pub title: Option<String>,
    pub images: Vec<String>,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(project) = &self.project else {
            return write!(f, "No project opened yet");
        };
        write!(f, "{} opened", project)?;
        if let Some(title) = &self.title {
            write!(f, "\n  Title: {}", title)?;
        }
        for image in &self.images {
            write!(f, "\n  {} opened", image)?;
        }
        Ok(())
    }
}

/// Owns the session and performs all project I/O
pub struct Synchronizer {
    session: Session,
    fetcher: Box<dyn BinaryFetcher>,
    builder_url: String,
    default_title: String,
}

impl Synchronizer {
    pub fn new(config: &Config, fetcher: Box<dyn BinaryFetcher>) -> Self {
        Self {
            session: Session::Unopened,
            fetcher,
            builder_url: builder_url(config),
            default_title: config.project.default_title.clone(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn builder_url(&self) -> &str {
        &self.builder_url
    }

    fn dispatch(&mut self, action: Action) -> Result<(), ProjectError> {
        // reduce only fails from Unopened, which is also what take() leaves behind
        let current = std::mem::take(&mut self.session);
        self.session = current.reduce(action)?;
        Ok(())
    }

    /// Open a project directory, replacing any open project
    pub async fn open(&mut self, handle: ProjectHandle) -> Result<OpenOutcome, ProjectError> {
        let manifest_path = handle.manifest_path();
        let raw = match tokio::fs::read_to_string(&manifest_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(project = %handle.root().display(), "no manifest, starting empty project");
                let state = ProjectState::with_title(self.default_title.clone());
                self.dispatch(Action::Opened { handle, state })?;
                return Ok(OpenOutcome::NoManifest);
            }
            Err(source) => {
                return Err(ProjectError::Io {
                    path: manifest_path,
                    source,
                })
            }
        };

        let manifest: ProjectManifest =
            serde_json::from_str(&raw).map_err(|source| ProjectError::Manifest {
                path: manifest_path.clone(),
                source,
            })?;

        let on_disk = list_image_files(&handle.image_dir()).await?;

        let mut images = Vec::new();
        let mut missing = Vec::new();
        for name in manifest.unique_images() {
            if on_disk.contains(&name) {
                let path = handle.image_path(&name);
                images.push(ImageEntry::from_file(name, path));
            } else {
                missing.push(name);
            }
        }

        if !missing.is_empty() {
            warn!(missing = ?missing, "manifest lists images that are not in img/, dropping them");
        }
        info!(
            project = %handle.root().display(),
            images = images.len(),
            "opened project"
        );

        let outcome = OpenOutcome::Loaded {
            images: images.len(),
            missing,
        };
        let state = ProjectState {
            title: manifest.title,
            images,
            extra: manifest.extra,
        };
        self.dispatch(Action::Opened { handle, state })?;
        Ok(outcome)
    }

    /// Append picked images; duplicates are kept until save
    pub fn add_images(&mut self, images: Vec<ImageEntry>) -> Result<usize, ProjectError> {
        self.session.require_open()?;
        for image in &images {
            validate_image_name(&image.name)?;
        }
        let count = images.len();
        self.dispatch(Action::ImagesAdded(images))?;
        debug!(count, "images added");
        Ok(count)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), ProjectError> {
        self.session.require_open()?;
        self.dispatch(Action::TitleChanged(title.into()))
    }

    /// Write images into `img/` and then the manifest.
    ///
    /// Image copies run concurrently and are all awaited. If any of them
    /// fails the manifest is left untouched, so it never lists an image
    /// that isn't on disk.
    pub async fn save(&mut self) -> Result<SaveReport, ProjectError> {
        let (handle, state) = self.session.require_open()?;
        let handle = handle.clone();
        let manifest = state.to_manifest();
        let unique: Vec<ImageEntry> = state.unique_images().into_iter().cloned().collect();

        let image_dir = handle.image_dir();
        tokio::fs::create_dir_all(&image_dir)
            .await
            .map_err(ProjectError::io(&image_dir))?;

        let writes: Vec<_> = unique
            .iter()
            .map(|image| {
                let image = image.clone();
                let dest = handle.image_path(&image.name);
                let name = image.name.clone();
                (name, tokio::spawn(async move { copy_image(&image, &dest).await }))
            })
            .collect();

        let mut written = Vec::with_capacity(writes.len());
        let mut failures = Vec::new();
        for (name, task) in writes {
            match task.await {
                Ok(Ok(bytes)) => written.push((name, bytes)),
                Ok(Err(source)) => failures.push(ImageWriteFailure { name, source }),
                Err(join_err) => failures.push(ImageWriteFailure {
                    name,
                    source: io::Error::new(io::ErrorKind::Other, join_err),
                }),
            }
        }

        if !failures.is_empty() {
            warn!(failed = failures.len(), "save aborted before writing manifest");
            return Err(ProjectError::ImageWrites { failures });
        }

        let manifest_path = handle.manifest_path();
        let json = serde_json::to_string_pretty(&manifest).map_err(|source| {
            ProjectError::Manifest {
                path: manifest_path.clone(),
                source,
            }
        })?;
        tokio::fs::write(&manifest_path, json)
            .await
            .map_err(ProjectError::io(&manifest_path))?;

        let saved = unique
            .into_iter()
            .map(|image| {
                let path = handle.image_path(&image.name);
                ImageEntry::from_file(image.name, path)
            })
            .collect();
        self.dispatch(Action::Saved(saved))?;

        info!(
            project = %handle.root().display(),
            images = written.len(),
            "project saved"
        );
        Ok(SaveReport {
            manifest: manifest_path,
            images: written,
        })
    }

    /// Download the builder binary into the project directory
    pub async fn build(&self) -> Result<BuildReport, ProjectError> {
        let (handle, _) = self.session.require_open()?;
        let dest = handle.builder_path();
        info!(url = %self.builder_url, dest = %dest.display(), "downloading builder");

        let bytes = self
            .fetcher
            .fetch_to(&self.builder_url, &dest)
            .await
            .map_err(|source| ProjectError::Fetch {
                url: self.builder_url.clone(),
                source,
            })?;

        Ok(BuildReport {
            url: self.builder_url.clone(),
            path: dest,
            bytes,
        })
    }

    pub fn status(&self) -> SessionStatus {
        match &self.session {
            Session::Unopened => SessionStatus {
                project: None,
                title: None,
                images: Vec::new(),
            },
            Session::Opened { handle, state } => SessionStatus {
                project: Some(handle.name().to_string()),
                title: Some(state.title.clone()),
                images: state.images.iter().map(|i| i.name.clone()).collect(),
            },
        }
    }

    /// Preview data for the current state, recomputed on each call
    pub async fn preview(&self) -> Result<PreviewData, ProjectError> {
        let (_, state) = self.session.require_open()?;
        PreviewData::build(state).await
    }
}

/// Names of regular files directly inside `dir`; a missing dir is empty
async fn list_image_files(dir: &Path) -> Result<HashSet<String>, ProjectError> {
    let mut names = HashSet::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(names),
        Err(source) => {
            return Err(ProjectError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    while let Some(entry) = entries.next_entry().await.map_err(ProjectError::io(dir))? {
        let file_type = entry.file_type().await.map_err(ProjectError::io(dir))?;
        if !file_type.is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.insert(name);
        }
    }
    Ok(names)
}

/// Source bytes are read in full before `dest` is truncated, so an image
/// that already lives at `dest` survives being saved onto itself.
async fn copy_image(image: &ImageEntry, dest: &Path) -> io::Result<u64> {
    let bytes = image.source.read().await?;
    tokio::fs::write(dest, &bytes).await?;
    Ok(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let unopened = SessionStatus {
            project: None,
            title: None,
            images: vec![],
        };
        assert_eq!(unopened.to_string(), "No project opened yet");

        let opened = SessionStatus {
            project: Some("sprites".to_string()),
            title: Some("T".to_string()),
            images: vec!["a.png".to_string()],
        };
        assert_eq!(opened.to_string(), "sprites opened\n  Title: T\n  a.png opened");
    }
}
