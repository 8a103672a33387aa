//! folio - image-asset project manager
//!
//! Opens a project folder, adds images, saves projectData.json and fetches
//! the builder binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use folio::commands;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about = "Keeps an image-asset project folder and its manifest in sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create ~/.folio/config.toml with defaults
    Init,

    /// Open a project and show its contents
    Show {
        /// Project directory
        dir: PathBuf,

        /// Output the manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add images to a project and save it
    Add {
        /// Project directory
        dir: PathBuf,

        /// Image files to add
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Change a project's title and save it
    Title {
        /// Project directory
        dir: PathBuf,

        /// New title
        title: String,
    },

    /// Download the builder binary into a project
    Build {
        /// Project directory
        dir: PathBuf,
    },

    /// Produce preview data (data URLs) for a project
    Preview {
        /// Project directory
        dir: PathBuf,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Interactive session with open/load/save/build
    Session {
        /// Project directory to open on start
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            commands::init()?;
        }
        Commands::Show { dir, json } => {
            let format = if json {
                commands::OutputFormat::Json
            } else {
                commands::OutputFormat::Summary
            };
            commands::show(&dir, format).await?;
        }
        Commands::Add { dir, images } => {
            commands::add(&dir, &images).await?;
        }
        Commands::Title { dir, title } => {
            commands::set_title(&dir, &title).await?;
        }
        Commands::Build { dir } => {
            commands::build(&dir).await?;
        }
        Commands::Preview { dir, output } => {
            commands::preview(&dir, output.as_deref()).await?;
        }
        Commands::Session { dir } => {
            commands::session::run(dir).await?;
        }
    }

    Ok(())
}
