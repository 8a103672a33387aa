//! Session store for the open project
//!
//! Transitions:
//! - Unopened -> Opened: `Action::Opened`
//! - Opened -> Opened: any action; `Opened` replaces the handle and state
//!
//! There is no closed state. Every action other than `Opened` fails with
//! `ProjectError::NoProjectOpen` while the session is unopened.

use super::{ProjectError, ProjectHandle};
use crate::models::{ImageEntry, ProjectState};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Session {
    #[default]
    Unopened,
    Opened {
        handle: ProjectHandle,
        state: ProjectState,
    },
}

/// State transitions applied through `Session::reduce`
#[derive(Debug, Clone)]
pub enum Action {
    /// A project directory was opened; replaces whatever was open before
    Opened {
        handle: ProjectHandle,
        state: ProjectState,
    },
    /// Images appended as picked, duplicates included
    ImagesAdded(Vec<ImageEntry>),
    TitleChanged(String),
    /// Save finished; the image list becomes the saved, deduplicated list
    Saved(Vec<ImageEntry>),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Opened { .. } => "opened",
            Action::ImagesAdded(_) => "images_added",
            Action::TitleChanged(_) => "title_changed",
            Action::Saved(_) => "saved",
        }
    }
}

impl Session {
    pub fn reduce(self, action: Action) -> Result<Session, ProjectError> {
        tracing::debug!(action = action.name(), open = self.is_open(), "session transition");

        match (self, action) {
            (_, Action::Opened { handle, state }) => Ok(Session::Opened { handle, state }),
            (Session::Unopened, _) => Err(ProjectError::NoProjectOpen),
            (Session::Opened { handle, mut state }, Action::ImagesAdded(images)) => {
                state.images.extend(images);
                Ok(Session::Opened { handle, state })
            }
            (Session::Opened { handle, mut state }, Action::TitleChanged(title)) => {
                state.title = title;
                Ok(Session::Opened { handle, state })
            }
            (Session::Opened { handle, mut state }, Action::Saved(images)) => {
                state.images = images;
                Ok(Session::Opened { handle, state })
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Session::Opened { .. })
    }

    pub fn handle(&self) -> Option<&ProjectHandle> {
        match self {
            Session::Opened { handle, .. } => Some(handle),
            Session::Unopened => None,
        }
    }

    pub fn state(&self) -> Option<&ProjectState> {
        match self {
            Session::Opened { state, .. } => Some(state),
            Session::Unopened => None,
        }
    }

    /// Handle and state of the open project, or `NoProjectOpen`
    pub fn require_open(&self) -> Result<(&ProjectHandle, &ProjectState), ProjectError> {
        match self {
            Session::Opened { handle, state } => Ok((handle, state)),
            Session::Unopened => Err(ProjectError::NoProjectOpen),
        }
    }
}
