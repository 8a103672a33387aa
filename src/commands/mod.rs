//! CLI commands for folio

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::builder::HttpFetcher;
use crate::config::{load_config, save_config, Config, FolioPaths};
use crate::picker::{pick_directory, pick_images, AcceptList, Selection};
use crate::project::{OpenOutcome, Synchronizer};

pub mod session;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Summary,
}

/// Write the default config to ~/.folio/config.toml
pub fn init() -> Result<()> {
    let paths = FolioPaths::new()?;

    if paths.is_initialized() {
        println!("folio is already initialized at {}", paths.root.display());
        return Ok(());
    }

    paths.ensure_dirs()?;
    save_config(&paths, &Config::default())?;
    println!("Created {}", paths.config.display());
    println!();
    println!("Next steps:");
    println!("  folio add <project-dir> <images...>   Add images to a project");
    println!("  folio session                         Start an interactive session");

    Ok(())
}

/// Synchronizer with an HTTP fetcher, configured from ~/.folio
pub fn synchronizer(config: &Config) -> Result<Synchronizer> {
    let fetcher = HttpFetcher::new()?;
    Ok(Synchronizer::new(config, Box::new(fetcher)))
}

/// Open `dir` and report what was found
pub async fn open_project(sync: &mut Synchronizer, dir: &Path) -> Result<OpenOutcome> {
    let handle = pick_directory(dir)?;
    let outcome = sync.open(handle).await?;
    print_open_outcome(&outcome);
    Ok(outcome)
}

pub(crate) fn print_open_outcome(outcome: &OpenOutcome) {
    match outcome {
        OpenOutcome::NoManifest => {
            println!("No projectData.json found; starting an empty project");
        }
        OpenOutcome::Loaded { missing, .. } => {
            for name in missing {
                println!("⚠ {} is listed in the manifest but missing from img/", name);
            }
        }
    }
}

pub(crate) fn print_selection(selection: &Selection) {
    for path in &selection.rejected {
        println!("⚠ Skipped {} (not an accepted image type)", path.display());
    }
}

/// Show a project
pub async fn show(dir: &Path, format: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let mut sync = synchronizer(&config)?;
    open_project(&mut sync, dir).await?;

    match format {
        OutputFormat::Json => {
            let (_, state) = sync.session().require_open()?;
            let json = serde_json::to_string_pretty(&state.to_manifest())?;
            println!("{}", json);
        }
        OutputFormat::Summary => {
            println!("{}", sync.status());
            if let Some(handle) = sync.session().handle() {
                println!("  Last saved: {}", last_saved(&handle.manifest_path()));
            }
        }
    }

    Ok(())
}

/// Open a project, add images and save
pub async fn add(dir: &Path, files: &[PathBuf]) -> Result<()> {
    let config = load_config()?;
    let mut sync = synchronizer(&config)?;
    open_project(&mut sync, dir).await?;

    let accept = AcceptList::from_config(&config.picker);
    let selection = pick_images(files, &accept)?;
    print_selection(&selection);
    if selection.images.is_empty() {
        bail!("No accepted images to add");
    }

    let added = sync.add_images(selection.images)?;
    let report = sync.save().await?;

    println!("✓ Added {} image(s)", added);
    println!("✓ Saved {} ({} image(s))", report.manifest.display(), report.images.len());
    Ok(())
}

/// Open a project, change its title and save
pub async fn set_title(dir: &Path, title: &str) -> Result<()> {
    let config = load_config()?;
    let mut sync = synchronizer(&config)?;
    open_project(&mut sync, dir).await?;

    sync.set_title(title)?;
    let report = sync.save().await?;
    println!("✓ Title set to {:?} in {}", title, report.manifest.display());
    Ok(())
}

/// Download the builder into a project
pub async fn build(dir: &Path) -> Result<()> {
    let config = load_config()?;
    let mut sync = synchronizer(&config)?;
    open_project(&mut sync, dir).await?;

    let report = sync.build().await?;
    println!("✓ Downloaded {} ({} bytes) to {}", report.url, report.bytes, report.path.display());
    Ok(())
}

/// Write preview data as JSON to `output` or stdout
pub async fn preview(dir: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let mut sync = synchronizer(&config)?;
    open_project(&mut sync, dir).await?;

    let data = sync.preview().await?;
    write_preview(&data, output)
}

pub(crate) fn write_preview(data: &crate::preview::PreviewData, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize preview")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Wrote preview for {} image(s) to {}", data.images.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn last_saved(manifest: &Path) -> String {
    std::fs::metadata(manifest)
        .and_then(|m| m.modified())
        .map(|t| {
            chrono::DateTime::<chrono::Utc>::from(t)
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
        })
        .unwrap_or_else(|_| "never".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_last_saved_without_manifest() {
        let temp = TempDir::new().unwrap();
        assert_eq!(last_saved(&temp.path().join("projectData.json")), "never");
    }

    #[test]
    fn test_last_saved_formats_timestamp() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("projectData.json");
        std::fs::write(&manifest, "{}").unwrap();
        assert!(last_saved(&manifest).ends_with(" UTC"));
    }
}
