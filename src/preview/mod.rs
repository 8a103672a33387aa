//! Derived preview data for a renderer
//!
//! Rebuilt from scratch on every call: every image is re-read and
//! re-encoded as a data URL.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::path::Path;

use crate::models::{ImageEntry, ProjectState};
use crate::project::ProjectError;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PreviewData {
    pub title: String,
    pub images: Vec<PreviewImage>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PreviewImage {
    pub name: String,
    pub mime: &'static str,
    pub size: usize,
    pub data_url: String,
}

impl PreviewData {
    pub async fn build(state: &ProjectState) -> Result<Self, ProjectError> {
        let mut images = Vec::with_capacity(state.images.len());
        for image in &state.images {
            images.push(preview_image(image).await?);
        }
        Ok(Self {
            title: state.title.clone(),
            images,
        })
    }
}

async fn preview_image(image: &ImageEntry) -> Result<PreviewImage, ProjectError> {
    let bytes = image.source.read().await.map_err(|source| ProjectError::Io {
        path: image
            .source
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| image.name.clone().into()),
        source,
    })?;
    let mime = mime_for(&image.name);
    Ok(PreviewImage {
        name: image.name.clone(),
        mime,
        size: bytes.len(),
        data_url: format!("data:{};base64,{}", mime, STANDARD.encode(&bytes)),
    })
}

/// MIME type guessed from the file extension
pub fn mime_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("a.PNG"), "image/png");
        assert_eq!(mime_for("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_for("blob"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_preview_encodes_every_entry() {
        let mut state = ProjectState::with_title("Preview");
        state.images.push(ImageEntry::from_bytes("a.png", b"abc".to_vec()));
        state.images.push(ImageEntry::from_bytes("a.png", b"abc".to_vec()));

        let preview = PreviewData::build(&state).await.unwrap();
        assert_eq!(preview.title, "Preview");
        assert_eq!(preview.images.len(), 2);
        assert_eq!(preview.images[0].size, 3);
        assert_eq!(preview.images[0].data_url, "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn test_preview_reports_unreadable_file() {
        let mut state = ProjectState::default();
        state
            .images
            .push(ImageEntry::from_file("gone.png", "/definitely/not/here/gone.png"));

        let err = PreviewData::build(&state).await.unwrap_err();
        assert!(matches!(err, ProjectError::Io { .. }));
    }
}
