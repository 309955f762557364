//! CLI module for the pinboard application
//!
//! This module runs the subcommands against a note file: the interactive
//! session and the one-shot `push` and `list` commands.
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use console::style;
use log::{info, warn};
use tokio::io::BufReader;

use crate::{
    load_init_file, text_preview, Board, Canvas, Commands, Config, ExtensionApi, Keymap, Note,
    NoteStore, Placement, Result, Session, YamlStorage, DEFAULT_TOAST_TIMEOUT_MS,
};

/// CLI Application handler - dispatches subcommands to the board and its storage
pub struct App {
    /// Application configuration
    config: Config,

    /// Init file run when a board is opened
    init_file: PathBuf,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    pub fn new(config: Config, init_file: PathBuf, verbose: bool) -> Self {
        Self {
            config,
            init_file,
            verbose,
        }
    }

    /// Run the CLI application with the given command
    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Open { file } => self.open_board(&file).await?,
            Commands::Push { file, text } => {
                let note = self.push_note(&file, text)?;
                println!("Added note {} at ({}, {})", note.id, note.x, note.y);
            }
            Commands::List { file, json } => self.list_notes(&file, json)?,
        }

        Ok(())
    }

    async fn open_board(&self, file: &Path) -> Result<()> {
        let store: Arc<dyn NoteStore> = Arc::new(YamlStorage::new(file));
        let (notes, next_id) = store.load()?;

        let mut canvas = Canvas::new(self.config.clone());
        canvas.load(notes, next_id);

        let mut api = ExtensionApi::new(file);
        if let Err(e) = load_init_file(&self.init_file, &mut api) {
            warn!("Init file failed: {}", e);
            api.toast(format!("Init file failed: {}", e), DEFAULT_TOAST_TIMEOUT_MS);
        }

        let mut session = Session::new(canvas, Keymap::default(), api, store);
        session.start();
        let result = session.run(BufReader::new(tokio::io::stdin())).await;
        session.shutdown().await?;
        result
    }

    /// Appends a note with `text` next to the most recently created note and saves.
    pub fn push_note(&self, file: &Path, text: String) -> Result<Note> {
        let store = YamlStorage::new(file);
        let mut board = self.load_board(&store)?;

        let position = board.position_for_new_note(None, Placement::Right);
        let note = board.create_with_text(position, text);
        store.save(&board.get_all(), board.next_id())?;

        info!("Pushed note {} to {}", note.id, file.display());
        Ok(note)
    }

    fn list_notes(&self, file: &Path, json: bool) -> Result<()> {
        let board = self.load_board(&YamlStorage::new(file))?;
        let notes = board.notes().stacking_order();

        if json {
            println!("{}", serde_json::to_string_pretty(&notes)?);
            return Ok(());
        }

        if notes.is_empty() {
            println!("No notes in {}", file.display());
            return Ok(());
        }

        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }
            println!(
                "{} at ({}, {}) {}x{}  {}",
                style(format!("#{}", note.id)).bold(),
                note.x,
                note.y,
                note.width,
                note.height,
                style(note.color).dim()
            );
            if self.verbose {
                for (label, stamp) in [
                    ("Created", note.created_at),
                    ("Edited", note.edited_at),
                    ("Adjusted", note.adjusted_at),
                ] {
                    if let Some(stamp) = stamp {
                        println!("{}: {}", label, stamp.format("%Y-%m-%d %H:%M:%S"));
                    }
                }
                println!("\n{}", note.text);
            } else {
                let preview = text_preview(&note.text, 100);
                if !preview.is_empty() {
                    println!("{}", preview);
                }
            }
        }

        println!(
            "\n{} note{}",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    fn load_board(&self, store: &impl NoteStore) -> Result<Board> {
        let (notes, next_id) = store.load()?;
        let mut board = Board::new(self.config.clone());
        board.load(notes, next_id);
        Ok(board)
    }
}
