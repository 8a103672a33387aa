//! folio - keeps an image-asset project folder and its manifest in sync

pub mod builder;
pub mod commands;
pub mod config;
pub mod models;
pub mod picker;
pub mod preview;
pub mod project;
