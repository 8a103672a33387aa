//! Interactive session: open, load images, save, build

use anyhow::Result;
use rustyline::history::History;
use rustyline::{error::ReadlineError, DefaultEditor};
use std::path::{Path, PathBuf};

use super::{open_project, print_selection, synchronizer, write_preview};
use crate::config::{load_config, Config, FolioPaths};
use crate::picker::{pick_images, AcceptList};
use crate::project::Synchronizer;

/// A parsed session command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Open(PathBuf),
    Load(Vec<PathBuf>),
    Title(String),
    Save,
    Build,
    Status,
    Preview(Option<PathBuf>),
    Help,
    Exit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();

        match cmd {
            "/open" => match args.as_slice() {
                [dir] => Ok(SessionCommand::Open(dir.clone())),
                _ => Err("Usage: /open <project-dir>".to_string()),
            },
            "/load" => {
                if args.is_empty() {
                    Err("Usage: /load <image> [image...]".to_string())
                } else {
                    Ok(SessionCommand::Load(args))
                }
            }
            "/title" => {
                if rest.is_empty() {
                    Err("Usage: /title <text>".to_string())
                } else {
                    Ok(SessionCommand::Title(rest.to_string()))
                }
            }
            "/save" => Ok(SessionCommand::Save),
            "/build" => Ok(SessionCommand::Build),
            "/status" => Ok(SessionCommand::Status),
            "/preview" => Ok(SessionCommand::Preview(args.into_iter().next())),
            "/help" => Ok(SessionCommand::Help),
            "/exit" | "/quit" => Ok(SessionCommand::Exit),
            other => Err(format!("Unknown command: {}. Type /help", other)),
        }
    }
}

pub struct ProjectSession {
    sync: Synchronizer,
    accept: AcceptList,
    history: Option<PathBuf>,
}

impl ProjectSession {
    pub fn new(config: &Config) -> Result<Self> {
        let history = FolioPaths::new().ok().map(|p| p.history);
        Ok(Self {
            sync: synchronizer(config)?,
            accept: AcceptList::from_config(&config.picker),
            history,
        })
    }

    pub async fn run(&mut self, initial: Option<PathBuf>) -> Result<()> {
        println!("folio interactive session. Type /help for commands.");
        println!();

        if let Some(dir) = initial {
            if let Err(e) = self.dispatch(SessionCommand::Open(dir)).await {
                println!("✗ Error: {:#}", e);
            }
        }

        let mut rl = DefaultEditor::new()?;
        if let Some(history) = &self.history {
            restore_history(rl.history_mut(), history);
        }

        loop {
            match rl.readline("folio> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    let command = match SessionCommand::parse(trimmed) {
                        Ok(command) => command,
                        Err(msg) => {
                            println!("{}", msg);
                            continue;
                        }
                    };
                    match self.dispatch(command).await {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => println!("✗ Error: {:#}", e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted. Use /exit to quit.");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(history) = &self.history {
            if let Err(e) = rl.save_history(history) {
                tracing::debug!("could not save session history: {}", e);
            }
        }
        println!("Session ended.");
        Ok(())
    }

    /// Run one command; returns true when the session should end
    async fn dispatch(&mut self, command: SessionCommand) -> Result<bool> {
        match command {
            SessionCommand::Open(dir) => {
                open_project(&mut self.sync, &dir).await?;
                println!("{}", self.sync.status());
            }
            SessionCommand::Load(paths) => {
                // checked before touching the picked files
                self.sync.session().require_open()?;
                let selection = pick_images(&paths, &self.accept)?;
                print_selection(&selection);
                let added = self.sync.add_images(selection.images)?;
                println!("✓ Loaded {} image(s), not saved yet", added);
            }
            SessionCommand::Title(title) => {
                self.sync.set_title(title)?;
                println!("✓ Title updated, not saved yet");
            }
            SessionCommand::Save => {
                let report = self.sync.save().await?;
                println!(
                    "✓ Saved {} with {} image(s)",
                    report.manifest.display(),
                    report.images.len()
                );
            }
            SessionCommand::Build => {
                let report = self.sync.build().await?;
                println!("✓ Downloaded builder ({} bytes) to {}", report.bytes, report.path.display());
            }
            SessionCommand::Status => println!("{}", self.sync.status()),
            SessionCommand::Preview(output) => {
                let data = self.sync.preview().await?;
                write_preview(&data, output.as_deref())?;
            }
            SessionCommand::Help => print_help(),
            SessionCommand::Exit => return Ok(true),
        }
        Ok(false)
    }
}

/// Load saved history; a missing or unreadable file starts empty
fn restore_history<H: History>(history: &mut H, path: &Path) -> bool {
    match history.load(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("could not load session history: {}", e);
            false
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /open <dir>          Open a project folder");
    println!("  /load <images...>    Load images into the project");
    println!("  /title <text>        Change the project title");
    println!("  /save                Save manifest and images");
    println!("  /build               Download the builder into the project");
    println!("  /status              Show the open project");
    println!("  /preview [file]      Print or write preview data");
    println!("  /exit                Exit session");
}

/// Start an interactive session, optionally opening `dir` first
pub async fn run(dir: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let mut session = ProjectSession::new(&config)?;
    session.run(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use rustyline::history::FileHistory;
    use tempfile::TempDir;

    #[test]
    fn test_restore_history() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session_history.txt");

        let mut empty = FileHistory::new();
        assert!(!restore_history(&mut empty, &path));
        assert_eq!(empty.len(), 0);

        let mut saved = FileHistory::new();
        saved.add("/save").unwrap();
        saved.save(&path).unwrap();

        let mut restored = FileHistory::new();
        assert!(restore_history(&mut restored, &path));
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            SessionCommand::parse("/open ./sprites"),
            Ok(SessionCommand::Open(PathBuf::from("./sprites")))
        );
        assert_eq!(
            SessionCommand::parse("/load a.png b.png"),
            Ok(SessionCommand::Load(vec![PathBuf::from("a.png"), PathBuf::from("b.png")]))
        );
        assert_eq!(SessionCommand::parse("/save"), Ok(SessionCommand::Save));
        assert_eq!(SessionCommand::parse("/build"), Ok(SessionCommand::Build));
        assert_eq!(SessionCommand::parse("/quit"), Ok(SessionCommand::Exit));
        assert_eq!(SessionCommand::parse("/preview"), Ok(SessionCommand::Preview(None)));
    }

    #[test]
    fn test_title_keeps_spaces() {
        assert_eq!(
            SessionCommand::parse("/title  My   Sprite Sheet "),
            Ok(SessionCommand::Title("My   Sprite Sheet".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(SessionCommand::parse("/open").is_err());
        assert!(SessionCommand::parse("/load").is_err());
        assert!(SessionCommand::parse("/nope").unwrap_err().contains("Unknown command"));
    }
}
