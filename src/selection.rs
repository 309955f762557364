//! Selection and edit-mode state.
//!
//! At most one note is selected, and only the selected note can be in edit
//! mode. While a note is being edited every command except leaving edit mode
//! (and typing into the draft) is refused.

use log::debug;

use crate::Board;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Selected(u64),
    Editing(u64),
}

/// Tracks the selected note and the text being composed in edit mode.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    state: SelectionState,
    /// In-progress text, meaningful only while editing
    draft: String,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// The selected note, including one being edited.
    pub fn selected(&self) -> Option<u64> {
        match self.state {
            SelectionState::Idle => None,
            SelectionState::Selected(id) | SelectionState::Editing(id) => Some(id),
        }
    }

    pub fn editing(&self) -> Option<u64> {
        match self.state {
            SelectionState::Editing(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, SelectionState::Editing(_))
    }

    pub fn draft(&self) -> Option<&str> {
        self.editing().map(|_| self.draft.as_str())
    }

    /// Selects an existing note.
    pub fn select(&mut self, id: u64, board: &Board) -> bool {
        if self.is_editing() || !board.contains(id) {
            return false;
        }
        self.state = SelectionState::Selected(id);
        true
    }

    pub fn deselect(&mut self) -> bool {
        match self.state {
            SelectionState::Selected(_) => {
                self.state = SelectionState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Selects the note with the next higher id, wrapping around.
    pub fn select_next(&mut self, board: &Board) -> bool {
        self.step(board, true)
    }

    /// Selects the note with the next lower id, wrapping around.
    pub fn select_prev(&mut self, board: &Board) -> bool {
        self.step(board, false)
    }

    fn step(&mut self, board: &Board, forward: bool) -> bool {
        if self.is_editing() {
            return false;
        }
        let ids = board.notes().sorted_ids();
        let (Some(&first), Some(&last)) = (ids.first(), ids.last()) else {
            return false;
        };

        let current = self
            .selected()
            .and_then(|id| ids.iter().position(|candidate| *candidate == id));
        let target = match current {
            None if forward => first,
            None => last,
            Some(index) if forward => ids[(index + 1) % ids.len()],
            Some(index) => ids[(index + ids.len() - 1) % ids.len()],
        };

        self.state = SelectionState::Selected(target);
        true
    }

    /// Starts editing the selected note, seeding the draft with its text.
    pub fn enter_edit(&mut self, board: &Board) -> bool {
        let SelectionState::Selected(id) = self.state else {
            return false;
        };
        let Some(note) = board.get(id) else {
            return false;
        };
        self.draft = note.text.clone();
        self.state = SelectionState::Editing(id);
        debug!("Editing note {}", id);
        true
    }

    /// Replaces the draft. Only valid while editing.
    pub fn set_draft(&mut self, text: &str) -> bool {
        if !self.is_editing() {
            return false;
        }
        self.draft = text.to_string();
        true
    }

    /// Appends a line to the draft. Only valid while editing.
    pub fn push_line(&mut self, line: &str) -> bool {
        if !self.is_editing() {
            return false;
        }
        if !self.draft.is_empty() {
            self.draft.push('\n');
        }
        self.draft.push_str(line);
        true
    }

    /// Leaves edit mode, committing the draft through the board if it changed.
    pub fn exit_edit(&mut self, board: &mut Board) -> bool {
        let SelectionState::Editing(id) = self.state else {
            return false;
        };
        let draft = std::mem::take(&mut self.draft);
        if board.contains(id) {
            board.set_text(id, &draft);
            self.state = SelectionState::Selected(id);
        } else {
            self.state = SelectionState::Idle;
        }
        debug!("Finished editing note {}", id);
        true
    }

    /// Drops the selection if its note is no longer on the board.
    pub fn forget_missing(&mut self, board: &Board) {
        if let Some(id) = self.selected() {
            if !board.contains(id) {
                debug!("Selected note {} disappeared, clearing selection", id);
                self.state = SelectionState::Idle;
                self.draft.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Point};

    fn board_with(count: usize) -> Board {
        let mut board = Board::new(Config::default());
        for _ in 0..count {
            board.create(Point::new(0.0, 0.0));
        }
        board
    }

    #[test]
    fn next_wraps_by_id() {
        let board = board_with(3);
        let mut selection = Selection::new();
        assert!(selection.select(1, &board));
        assert!(selection.select_next(&board));
        assert_eq!(selection.selected(), Some(2));
        assert!(selection.select_next(&board));
        assert_eq!(selection.selected(), Some(3));
        assert!(selection.select_next(&board));
        assert_eq!(selection.selected(), Some(1));
    }

    #[test]
    fn prev_from_nothing_selects_last() {
        let board = board_with(3);
        let mut selection = Selection::new();
        assert!(selection.select_prev(&board));
        assert_eq!(selection.selected(), Some(3));
        assert!(selection.select_prev(&board));
        assert_eq!(selection.selected(), Some(2));

        let mut fresh = Selection::new();
        assert!(fresh.select_next(&board));
        assert_eq!(fresh.selected(), Some(1));
    }

    #[test]
    fn navigation_on_empty_board_does_nothing() {
        let board = board_with(0);
        let mut selection = Selection::new();
        assert!(!selection.select_next(&board));
        assert!(!selection.select_prev(&board));
        assert!(!selection.select(1, &board));
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn edit_requires_selection() {
        let mut board = board_with(1);
        let mut selection = Selection::new();
        assert!(!selection.enter_edit(&board));
        assert!(!selection.exit_edit(&mut board));

        selection.select(1, &board);
        assert!(selection.enter_edit(&board));
        assert!(!selection.enter_edit(&board));
        assert_eq!(selection.state(), SelectionState::Editing(1));
    }

    #[test]
    fn editing_blocks_selection_changes() {
        let board = board_with(2);
        let mut selection = Selection::new();
        selection.select(1, &board);
        selection.enter_edit(&board);

        assert!(!selection.select(2, &board));
        assert!(!selection.select_next(&board));
        assert!(!selection.select_prev(&board));
        assert!(!selection.deselect());
        assert_eq!(selection.editing(), Some(1));
    }

    #[test]
    fn exit_commits_changed_draft_once() {
        let mut board = board_with(1);
        let mut selection = Selection::new();
        selection.select(1, &board);
        selection.enter_edit(&board);
        selection.push_line("hello");
        selection.push_line("world");
        assert_eq!(selection.draft(), Some("hello\nworld"));

        let undo_before = board.history().undo_count();
        assert!(selection.exit_edit(&mut board));
        assert_eq!(board.get(1).unwrap().text, "hello\nworld");
        assert!(board.get(1).unwrap().edited_at.is_some());
        assert_eq!(board.history().undo_count(), undo_before + 1);
        assert_eq!(selection.state(), SelectionState::Selected(1));

        // Unchanged draft commits nothing
        selection.enter_edit(&board);
        selection.exit_edit(&mut board);
        assert_eq!(board.history().undo_count(), undo_before + 1);
    }

    #[test]
    fn missing_note_clears_selection() {
        let mut board = board_with(2);
        let mut selection = Selection::new();
        selection.select(2, &board);
        board.delete(2);
        selection.forget_missing(&board);
        assert_eq!(selection.state(), SelectionState::Idle);
    }
}
