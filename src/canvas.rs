//! The command surface a presentation shell drives.
//!
//! [`Canvas`] ties the board, the selection state, the viewport and the yank
//! register together. Every command reports whether it did anything so the
//! shell can decide to show a confirmation, and every command other than
//! leaving edit mode is refused while a note is being edited.

use log::{debug, info};
use tokio::sync::mpsc;

use crate::{
    Board, BoardEvent, Config, Note, Placement, Rect, Rgba, Selection, SelectionState,
    Viewport, SCROLL_STEP,
};

/// How a note should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteState {
    pub selected: bool,
    pub editing: bool,
}

/// Implemented by whatever draws notes.
pub trait NoteRenderer {
    /// Called once before the notes, with the current view.
    fn begin(&mut self, _viewport: &Viewport) {}

    /// Draws one note; notes arrive bottom to top. `text` is the draft while editing.
    fn draw_note(&mut self, note: &Note, text: &str, state: NoteState);
}

/// Board, selection and view state of one open file.
#[derive(Debug)]
pub struct Canvas {
    board: Board,
    selection: Selection,
    viewport: Viewport,
    /// Text of the last yank, pasted by `paste_as_new_note`
    register: Option<String>,
}

impl Canvas {
    pub fn new(config: Config) -> Self {
        Self::from_board(Board::new(config))
    }

    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            selection: Selection::new(),
            viewport: Viewport::default(),
            register: None,
        }
    }

    /// Replaces the notes, clearing history and selection.
    pub fn load(&mut self, notes: Vec<Note>, next_id: u64) {
        self.board.load(notes, next_id);
        self.selection = Selection::new();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &Config {
        self.board.config()
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<BoardEvent> {
        self.board.subscribe()
    }

    pub fn get_all(&self) -> Vec<Note> {
        self.board.get_all()
    }

    pub fn get_selected(&self) -> Option<&Note> {
        self.selection.selected().and_then(|id| self.board.get(id))
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn is_editing(&self) -> bool {
        self.selection.is_editing()
    }

    pub fn draft(&self) -> Option<&str> {
        self.selection.draft()
    }

    pub fn can_undo(&self) -> bool {
        self.board.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.board.can_redo()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn overview_bounds(&self) -> Rect {
        self.viewport.overview_bounds(&self.board)
    }

    pub fn register(&self) -> Option<&str> {
        self.register.as_deref()
    }

    /// Puts text in the yank register, as if it had been yanked.
    pub fn set_register(&mut self, text: impl Into<String>) {
        self.register = Some(text.into());
    }

    pub fn undo(&mut self) -> bool {
        if self.is_editing() || !self.board.undo() {
            return false;
        }
        self.selection.forget_missing(&self.board);
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.is_editing() || !self.board.redo() {
            return false;
        }
        self.selection.forget_missing(&self.board);
        true
    }

    /// Copies the selected note's text into the register.
    pub fn yank_selected_text(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        let Some(text) = self.get_selected().map(|note| note.text.clone()) else {
            return false;
        };
        debug!("Yanked {} bytes", text.len());
        self.register = Some(text);
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        let Some(id) = self.selection.selected() else {
            return false;
        };
        let deleted = self.board.delete(id);
        self.selection.forget_missing(&self.board);
        deleted
    }

    /// Yank followed by delete.
    pub fn cut_selected(&mut self) -> bool {
        self.yank_selected_text() && self.delete_selected()
    }

    /// Creates a note from the register, right of the anchor, and selects it.
    pub fn paste_as_new_note(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        let Some(text) = self.register.clone().filter(|text| !text.is_empty()) else {
            return false;
        };
        let position = self
            .board
            .position_for_new_note(self.selection.selected(), Placement::Right);
        let note = self.board.create_with_text(position, text);
        self.selection.select(note.id, &self.board)
    }

    /// Selects a note, as a click on it would.
    ///
    /// Clicking another note while editing commits the edit first.
    pub fn select(&mut self, id: u64) -> bool {
        if self.is_editing() {
            if self.selection.editing() == Some(id) || !self.board.contains(id) {
                return false;
            }
            self.exit_edit_mode();
        }
        self.selection.select(id, &self.board)
    }

    pub fn select_next(&mut self) -> bool {
        self.selection.select_next(&self.board)
    }

    pub fn select_prev(&mut self) -> bool {
        self.selection.select_prev(&self.board)
    }

    pub fn deselect_all(&mut self) -> bool {
        self.selection.deselect()
    }

    /// Inserts an empty note next to the anchor and starts editing it.
    pub fn create_and_edit(&mut self, placement: Placement) -> bool {
        if self.is_editing() {
            return false;
        }
        let position = self
            .board
            .position_for_new_note(self.selection.selected(), placement);
        let note = self.board.create(position);
        info!("Created note {} at ({}, {})", note.id, note.x, note.y);
        self.selection.select(note.id, &self.board) && self.selection.enter_edit(&self.board)
    }

    pub fn enter_edit_mode(&mut self) -> bool {
        self.selection.enter_edit(&self.board)
    }

    /// Leaves edit mode, committing the text if it changed.
    pub fn exit_edit_mode(&mut self) -> bool {
        self.selection.exit_edit(&mut self.board)
    }

    /// Leaves edit mode if editing, otherwise clears the selection.
    pub fn escape(&mut self) -> bool {
        if self.is_editing() {
            self.exit_edit_mode()
        } else {
            self.deselect_all()
        }
    }

    pub fn type_line(&mut self, line: &str) -> bool {
        self.selection.push_line(line)
    }

    pub fn set_draft(&mut self, text: &str) -> bool {
        self.selection.set_draft(text)
    }

    pub fn reset_viewport(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        self.viewport.reset();
        true
    }

    /// Scrolls by whole steps in each direction.
    pub fn scroll(&mut self, steps_x: i32, steps_y: i32) -> bool {
        if self.is_editing() {
            return false;
        }
        self.viewport
            .scroll(steps_x as f64 * SCROLL_STEP, steps_y as f64 * SCROLL_STEP);
        true
    }

    /// Completes a drag of a note.
    pub fn move_note(&mut self, id: u64, x: f64, y: f64) -> bool {
        !self.is_editing() && self.board.move_note(id, x, y)
    }

    /// Completes a resize of a note.
    pub fn resize_note(&mut self, id: u64, width: f64, height: f64) -> bool {
        !self.is_editing() && self.board.resize(id, width, height)
    }

    pub fn recolor(&mut self, id: u64, color: Rgba) -> bool {
        !self.is_editing() && self.board.set_color(id, color)
    }

    pub fn bring_to_front(&mut self, id: u64) -> bool {
        !self.is_editing() && self.board.bring_to_front(id)
    }

    pub fn send_to_back(&mut self, id: u64) -> bool {
        !self.is_editing() && self.board.send_to_back(id)
    }

    /// Hands every note to `renderer`, bottom to top.
    pub fn render(&self, renderer: &mut impl NoteRenderer) {
        renderer.begin(&self.viewport);
        let selected = self.selection.selected();
        let editing = self.selection.editing();
        for note in self.board.notes().stacking_order() {
            let state = NoteState {
                selected: selected == Some(note.id),
                editing: editing == Some(note.id),
            };
            let text = match (state.editing, self.selection.draft()) {
                (true, Some(draft)) => draft,
                _ => note.text.as_str(),
            };
            renderer.draw_note(note, text, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas_with(count: usize) -> Canvas {
        let mut canvas = Canvas::new(Config::default());
        for _ in 0..count {
            let position = canvas.board.position_for_new_note(None, Placement::Right);
            canvas.board.create(position);
        }
        canvas
    }

    #[test]
    fn editing_gates_every_other_command() {
        let mut canvas = canvas_with(2);
        canvas.select(1);
        canvas.set_register("clip");
        assert!(canvas.enter_edit_mode());

        assert!(!canvas.delete_selected());
        assert!(!canvas.select_next());
        assert!(!canvas.select_prev());
        assert!(!canvas.undo());
        assert!(!canvas.redo());
        assert!(!canvas.reset_viewport());
        assert!(!canvas.scroll(1, 0));
        assert!(!canvas.yank_selected_text());
        assert!(!canvas.paste_as_new_note());
        assert!(!canvas.deselect_all());
        assert!(!canvas.create_and_edit(Placement::Right));
        assert!(!canvas.move_note(1, 500.0, 500.0));
        assert!(!canvas.resize_note(1, 300.0, 300.0));
        assert!(!canvas.recolor(1, Rgba::new(1, 1, 1, 255)));
        assert!(!canvas.bring_to_front(1));
        assert!(!canvas.send_to_back(2));
        assert_eq!(canvas.board().len(), 2);

        assert!(canvas.type_line("draft"));
        assert!(canvas.exit_edit_mode());
        assert_eq!(canvas.get_selected().unwrap().text, "draft");
        assert_eq!(canvas.selection_state(), SelectionState::Selected(1));
    }

    #[test]
    fn create_and_edit_places_next_to_selection() {
        let mut canvas = canvas_with(2);
        canvas.select(1);
        assert!(canvas.create_and_edit(Placement::Below));
        let note = canvas.get_selected().unwrap();
        assert_eq!(note.id, 3);
        assert_eq!((note.x, note.y), (20.0, 160.0));
        assert_eq!(canvas.selection_state(), SelectionState::Editing(3));
    }

    #[test]
    fn yank_and_paste_creates_selected_copy() {
        let mut canvas = canvas_with(1);
        assert!(!canvas.yank_selected_text());
        assert!(!canvas.paste_as_new_note());

        canvas.select(1);
        canvas.enter_edit_mode();
        canvas.set_draft("copy me");
        canvas.exit_edit_mode();

        assert!(canvas.yank_selected_text());
        assert!(canvas.paste_as_new_note());
        let pasted = canvas.get_selected().unwrap();
        assert_eq!(pasted.id, 2);
        assert_eq!(pasted.text, "copy me");
        assert_eq!((pasted.x, pasted.y), (220.0, 20.0));
    }

    #[test]
    fn cut_removes_selected_note() {
        let mut canvas = canvas_with(2);
        canvas.select(2);
        assert!(canvas.cut_selected());
        assert_eq!(canvas.register(), Some(""));
        assert!(canvas.get_selected().is_none());
        assert_eq!(canvas.board().len(), 1);
    }

    #[test]
    fn undo_of_create_clears_selection() {
        let mut canvas = canvas_with(0);
        assert!(canvas.create_and_edit(Placement::Right));
        canvas.exit_edit_mode();
        assert!(canvas.undo());
        assert_eq!(canvas.selection_state(), SelectionState::Idle);
        assert!(canvas.board().is_empty());
        assert!(canvas.redo());
        assert_eq!(canvas.board().len(), 1);
    }

    #[test]
    fn escape_exits_edit_then_deselects() {
        let mut canvas = canvas_with(1);
        canvas.select(1);
        canvas.enter_edit_mode();
        assert!(canvas.escape());
        assert_eq!(canvas.selection_state(), SelectionState::Selected(1));
        assert!(canvas.escape());
        assert_eq!(canvas.selection_state(), SelectionState::Idle);
        assert!(!canvas.escape());
    }

    #[test]
    fn clicking_another_note_commits_the_edit() {
        let mut canvas = canvas_with(2);
        canvas.select(1);
        canvas.enter_edit_mode();
        canvas.type_line("kept");

        assert!(!canvas.select(1));
        assert!(!canvas.select(42));
        assert!(canvas.is_editing());

        assert!(canvas.select(2));
        assert_eq!(canvas.selection_state(), SelectionState::Selected(2));
        assert_eq!(canvas.board().get(1).unwrap().text, "kept");
    }

    struct Recorder(Vec<(u64, String, NoteState)>);

    impl NoteRenderer for Recorder {
        fn draw_note(&mut self, note: &Note, text: &str, state: NoteState) {
            self.0.push((note.id, text.to_string(), state));
        }
    }

    #[test]
    fn render_shows_draft_of_edited_note() {
        let mut canvas = canvas_with(2);
        canvas.board.bring_to_front(1);
        canvas.select(1);
        canvas.enter_edit_mode();
        canvas.type_line("typing");

        let mut recorder = Recorder(Vec::new());
        canvas.render(&mut recorder);
        assert_eq!(recorder.0.len(), 2);
        assert_eq!(recorder.0[0].0, 2);
        assert_eq!(
            recorder.0[1],
            (
                1,
                "typing".to_string(),
                NoteState {
                    selected: true,
                    editing: true
                }
            )
        );
        assert_eq!(canvas.board().get(1).unwrap().text, "");
        assert!(canvas.overview_bounds().width() >= 1024.0);
    }
}
