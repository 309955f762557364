//! Line-driven interactive session over one open board.
//!
//! Outside edit mode every line is either a parameterised command
//! (`move 300 40`, `color 255 0 0`) or a key name resolved through the
//! [`Keymap`]. In edit mode lines are appended to the draft until `esc`.

use std::{
    future::Future,
    io::{self, stdout, Write},
    path::PathBuf,
    sync::Arc,
};

use console::style;
use log::{debug, error, info, warn};
use shell_words::split;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::signal;
use tokio::sync::mpsc;

use crate::{
    parse_color, parse_number, text_preview, Action, BoardEvent, Canvas, Command, ExtensionApi,
    Keymap, Note, NoteRenderer, NoteState, NoteStore, PinError, Placement, Result, SaveScheduler,
    Viewport,
};

/// Whether the session keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    canvas: Canvas,
    keymap: Keymap,
    api: ExtensionApi,
    store: Arc<dyn NoteStore>,
    scheduler: SaveScheduler,
    changes: mpsc::UnboundedReceiver<BoardEvent>,
    file_path: PathBuf,
}

impl Session {
    pub fn new(
        mut canvas: Canvas,
        mut keymap: Keymap,
        mut api: ExtensionApi,
        store: Arc<dyn NoteStore>,
    ) -> Self {
        let changes = canvas.subscribe();
        api.attach(&mut keymap);
        let file_path = api.file_path().to_path_buf();
        Self {
            canvas,
            keymap,
            api,
            scheduler: SaveScheduler::new(Arc::clone(&store)),
            store,
            changes,
            file_path,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn api_mut(&mut self) -> &mut ExtensionApi {
        &mut self.api
    }

    /// Starts the debounced saver. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        self.scheduler.start();
        self.show_toasts();
    }

    /// Reads lines from `input` until it ends, a quit command arrives or
    /// the process receives Ctrl-C.
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        self.run_until(input, signal::ctrl_c()).await
    }

    /// Like [`Session::run`], stopping early when `interrupt` completes.
    pub async fn run_until<R, I>(&mut self, input: R, interrupt: I) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        I: Future<Output = io::Result<()>>,
    {
        info!("Session started on {}", self.file_path.display());
        let mut lines = input.lines();
        tokio::pin!(interrupt);
        loop {
            self.prompt();
            let line = tokio::select! {
                line = lines.next_line() => line?,
                result = &mut interrupt => {
                    result?;
                    info!("Interrupted, closing session");
                    println!();
                    break;
                }
            };
            let Some(line) = line else {
                debug!("Input closed");
                break;
            };
            if self.handle_line(&line) == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Handles one line of input, printing any error.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        let flow = match self.execute(line) {
            Ok(flow) => flow,
            Err(e) => {
                warn!("Command '{}' failed: {}", line.trim(), e);
                println!("{}", style(format!("Error: {}", e)).red());
                Flow::Continue
            }
        };
        self.sync();
        flow
    }

    /// Commits any open edit, stops the saver and writes the board once more.
    pub async fn shutdown(mut self) -> Result<()> {
        if self.canvas.is_editing() {
            self.canvas.exit_edit_mode();
        }
        self.scheduler.stop().await?;

        let board = self.canvas.board();
        self.store.save(&board.get_all(), board.next_id())?;
        info!("Saved {} notes on exit", board.len());
        Ok(())
    }

    fn execute(&mut self, line: &str) -> Result<Flow> {
        if self.canvas.is_editing() {
            let trimmed = line.trim();
            if matches!(self.keymap.resolve(trimmed), Some(Action::Escape)) {
                return Ok(self.dispatch(Action::Escape));
            }
            self.canvas.type_line(line);
            return Ok(Flow::Continue);
        }

        let words = split(line).map_err(|e| PinError::InvalidFormat {
            message: format!("Failed to parse command: {}", e),
        })?;
        let Some((head, args)) = words.split_first() else {
            return Ok(Flow::Continue);
        };

        match head.as_str() {
            "select" => {
                let id = parse_id(args)?;
                let selected = self.canvas.select(id);
                self.report(selected, &format!("No note {}", id));
            }
            "move" => {
                let id = self.require_selected()?;
                let (x, y) = parse_pair(args, "x", "y")?;
                let moved = self.canvas.move_note(id, x, y);
                self.report(moved, "Note is already there");
            }
            "resize" => {
                let id = self.require_selected()?;
                let (width, height) = parse_pair(args, "width", "height")?;
                let resized = self.canvas.resize_note(id, width, height);
                self.report(resized, "Note already has that size");
            }
            "color" => {
                let id = self.require_selected()?;
                let color = parse_color(args)?;
                let recolored = self.canvas.recolor(id, color);
                self.report(recolored, "Note already has that color");
            }
            "front" => return Ok(self.dispatch(Action::BringToFront)),
            "back" => return Ok(self.dispatch(Action::SendToBack)),
            "show" => return Ok(self.dispatch(Action::ShowText)),
            "board" => self.print_board(),
            "bind" => {
                let [key, action] = args else {
                    return Err(invalid("usage: bind KEY ACTION"));
                };
                let action: Action = serde_yaml::from_str(action)
                    .map_err(|_| invalid(&format!("Unknown action '{}'", action)))?;
                self.api.add_keybinding(key.clone(), action);
                self.api.flush_keybindings(&mut self.keymap);
                println!("Bound {} to {:?}", key, action);
            }
            _ => match self.keymap.resolve(line) {
                Some(action) => return Ok(self.dispatch(action)),
                None => println!("Unknown command or key: {}", line.trim()),
            },
        }
        Ok(Flow::Continue)
    }

    fn dispatch(&mut self, action: Action) -> Flow {
        debug!("Dispatching {:?}", action);
        match action {
            Action::Undo => {
                let name = self.canvas.board().history().peek_undo().map(Command::name);
                match (self.canvas.undo(), name) {
                    (true, Some(name)) => println!("{}", style(format!("Undid {}", name)).dim()),
                    _ => self.report(false, "Nothing to undo"),
                }
            }
            Action::Redo => {
                let name = self.canvas.board().history().peek_redo().map(Command::name);
                match (self.canvas.redo(), name) {
                    (true, Some(name)) => println!("{}", style(format!("Redid {}", name)).dim()),
                    _ => self.report(false, "Nothing to redo"),
                }
            }
            Action::Yank => {
                if self.canvas.yank_selected_text() {
                    self.api.toast("Yanked note text", crate::DEFAULT_TOAST_TIMEOUT_MS);
                } else {
                    self.report(false, "No note selected");
                }
            }
            Action::Cut => {
                let done = self.canvas.cut_selected();
                self.report(done, "No note selected");
            }
            Action::Delete => {
                let done = self.canvas.delete_selected();
                self.report(done, "No note selected");
            }
            Action::Paste => {
                let done = self.canvas.paste_as_new_note();
                self.report(done, "Nothing to paste");
            }
            Action::SelectNext => {
                let done = self.canvas.select_next();
                self.report(done, "No notes");
            }
            Action::SelectPrev => {
                let done = self.canvas.select_prev();
                self.report(done, "No notes");
            }
            Action::DeselectAll => {
                self.canvas.deselect_all();
            }
            Action::InsertRight => {
                self.canvas.create_and_edit(Placement::Right);
            }
            Action::InsertBelow => {
                self.canvas.create_and_edit(Placement::Below);
            }
            Action::Edit => {
                let done = self.canvas.enter_edit_mode();
                self.report(done, "No note selected");
            }
            Action::Escape => {
                self.canvas.escape();
            }
            Action::ResetViewport => {
                self.canvas.reset_viewport();
            }
            Action::ScrollLeft => {
                self.canvas.scroll(-1, 0);
            }
            Action::ScrollRight => {
                self.canvas.scroll(1, 0);
            }
            Action::ScrollUp => {
                self.canvas.scroll(0, -1);
            }
            Action::ScrollDown => {
                self.canvas.scroll(0, 1);
            }
            Action::BringToFront => {
                let done = self
                    .canvas
                    .get_selected()
                    .map(|note| note.id)
                    .is_some_and(|id| self.canvas.bring_to_front(id));
                self.report(done, "Already in front");
            }
            Action::SendToBack => {
                let done = self
                    .canvas
                    .get_selected()
                    .map(|note| note.id)
                    .is_some_and(|id| self.canvas.send_to_back(id));
                self.report(done, "Already at the back");
            }
            Action::ShowText => match self.canvas.get_selected() {
                Some(note) => println!("{}", note.text),
                None => self.report(false, "No note selected"),
            },
            Action::Quit => {
                if self.canvas.is_editing() {
                    return Flow::Continue;
                }
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Feeds board changes to the saver and shows queued toasts.
    fn sync(&mut self) {
        let mut changed = false;
        while self.changes.try_recv().is_ok() {
            changed = true;
        }
        if changed && !self.scheduler.schedule(self.canvas.board().snapshot()) {
            debug!("Save scheduler not running, change not scheduled");
        }
        self.api.flush_keybindings(&mut self.keymap);
        self.show_toasts();
    }

    fn show_toasts(&mut self) {
        for toast in self.api.take_toasts() {
            println!("{}", style(&toast.message).cyan());
        }
    }

    fn require_selected(&self) -> Result<u64> {
        self.canvas
            .get_selected()
            .map(|note| note.id)
            .ok_or_else(|| invalid("No note selected"))
    }

    fn report(&self, done: bool, message: &str) {
        if !done {
            println!("{}", style(message).dim());
        }
    }

    fn print_board(&self) {
        let mut renderer = TextRenderer::default();
        self.canvas.render(&mut renderer);
        for line in renderer.lines {
            println!("{}", line);
        }
    }

    fn prompt(&self) {
        let prompt = if self.canvas.is_editing() {
            style("edit> ").yellow()
        } else {
            style("pinboard> ").green()
        };
        print!("{}", prompt);
        if let Err(e) = stdout().flush() {
            error!("Failed to flush prompt: {}", e);
        }
    }
}

/// Draws the board as one line per note.
#[derive(Debug, Default)]
pub struct TextRenderer {
    pub lines: Vec<String>,
}

impl NoteRenderer for TextRenderer {
    fn begin(&mut self, viewport: &Viewport) {
        self.lines.push(format!(
            "view at ({}, {}), {}x{}",
            viewport.offset.x, viewport.offset.y, viewport.size.width, viewport.size.height
        ));
    }

    fn draw_note(&mut self, note: &Note, text: &str, state: NoteState) {
        let marker = match (state.editing, state.selected) {
            (true, _) => ">",
            (false, true) => "*",
            _ => " ",
        };
        self.lines.push(format!(
            "{} #{} ({}, {}) {}x{} {} {}",
            marker,
            note.id,
            note.x,
            note.y,
            note.width,
            note.height,
            note.color,
            text_preview(text, 40)
        ));
    }
}

fn invalid(message: &str) -> PinError {
    PinError::InvalidFormat {
        message: message.to_string(),
    }
}

fn parse_id(args: &[String]) -> Result<u64> {
    let [id] = args else {
        return Err(invalid("usage: select ID"));
    };
    id.parse::<u64>()
        .map_err(|_| invalid(&format!("note id must be a positive integer, got '{}'", id)))
}

fn parse_pair(args: &[String], first: &str, second: &str) -> Result<(f64, f64)> {
    let [a, b] = args else {
        return Err(invalid(&format!("expected {} and {}", first, second)));
    };
    Ok((parse_number(a, first)?, parse_number(b, second)?))
}
