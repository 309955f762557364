//! Undo/redo history for board mutations.
//!
//! Every completed mutation is recorded as a [`Command`] carrying only value
//! state: the note id and the before/after values of what changed. Applying
//! or reverting a command looks the note up by id at that moment, so a
//! command stays valid however often the note has been removed and restored
//! in between.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::{Note, NoteArena, Point, Rgba, Size, Timestamp};

/// Default number of commands kept on the undo stack.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// Which way a command is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Re-apply the change (redo).
    Forward,
    /// Invert the change (undo).
    Backward,
}

/// The value of a field before and after a change.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T> {
    pub before: T,
    pub after: T,
}

impl<T> Transition<T> {
    pub fn new(before: T, after: T) -> Self {
        Self { before, after }
    }

    /// The value a field should hold after running in `direction`.
    pub fn target(&self, direction: Direction) -> &T {
        match direction {
            Direction::Forward => &self.after,
            Direction::Backward => &self.before,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Create,
    Delete,
    Move,
    Resize,
    EditText,
    ChangeColor,
    ChangeOrder,
}

/// An immutable, reversible record of one board mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A note was created; `note` is its state right after creation.
    Create { note: Note },
    /// A note was deleted; `note` is its full state right before deletion.
    Delete { note: Note },
    Move {
        id: u64,
        position: Transition<Point>,
        adjusted_at: Transition<Option<Timestamp>>,
    },
    Resize {
        id: u64,
        size: Transition<Size>,
        adjusted_at: Transition<Option<Timestamp>>,
    },
    EditText {
        id: u64,
        text: Transition<String>,
        edited_at: Transition<Option<Timestamp>>,
    },
    ChangeColor {
        id: u64,
        color: Transition<Rgba>,
        adjusted_at: Transition<Option<Timestamp>>,
    },
    ChangeOrder {
        id: u64,
        order: Transition<i64>,
        adjusted_at: Transition<Option<Timestamp>>,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create { .. } => CommandKind::Create,
            Command::Delete { .. } => CommandKind::Delete,
            Command::Move { .. } => CommandKind::Move,
            Command::Resize { .. } => CommandKind::Resize,
            Command::EditText { .. } => CommandKind::EditText,
            Command::ChangeColor { .. } => CommandKind::ChangeColor,
            Command::ChangeOrder { .. } => CommandKind::ChangeOrder,
        }
    }

    /// The id of the note this command targets.
    pub fn note_id(&self) -> u64 {
        match self {
            Command::Create { note } | Command::Delete { note } => note.id,
            Command::Move { id, .. }
            | Command::Resize { id, .. }
            | Command::EditText { id, .. }
            | Command::ChangeColor { id, .. }
            | Command::ChangeOrder { id, .. } => *id,
        }
    }

    /// Returns the name of the command for display.
    pub fn name(&self) -> &'static str {
        match self.kind() {
            CommandKind::Create => "Create Note",
            CommandKind::Delete => "Delete Note",
            CommandKind::Move => "Move Note",
            CommandKind::Resize => "Resize Note",
            CommandKind::EditText => "Edit Text",
            CommandKind::ChangeColor => "Change Color",
            CommandKind::ChangeOrder => "Change Order",
        }
    }

    /// Applies the change. Returns false if the target note is gone.
    pub fn apply(&self, notes: &mut NoteArena) -> bool {
        self.run(notes, Direction::Forward)
    }

    /// Inverts the change. Returns false if the target note is gone.
    pub fn revert(&self, notes: &mut NoteArena) -> bool {
        self.run(notes, Direction::Backward)
    }

    fn run(&self, notes: &mut NoteArena, direction: Direction) -> bool {
        let done = match (self, direction) {
            (Command::Create { note }, Direction::Forward)
            | (Command::Delete { note }, Direction::Backward) => notes.insert(note.clone()),
            (Command::Create { note }, Direction::Backward)
            | (Command::Delete { note }, Direction::Forward) => notes.remove(note.id).is_some(),
            (
                Command::Move {
                    id,
                    position,
                    adjusted_at,
                },
                direction,
            ) => notes.update(*id, |note| {
                let target = position.target(direction);
                note.x = target.x;
                note.y = target.y;
                note.adjusted_at = *adjusted_at.target(direction);
            }),
            (
                Command::Resize {
                    id,
                    size,
                    adjusted_at,
                },
                direction,
            ) => notes.update(*id, |note| {
                let target = size.target(direction);
                note.width = target.width;
                note.height = target.height;
                note.adjusted_at = *adjusted_at.target(direction);
            }),
            (
                Command::EditText {
                    id,
                    text,
                    edited_at,
                },
                direction,
            ) => notes.update(*id, |note| {
                note.text = text.target(direction).clone();
                note.edited_at = *edited_at.target(direction);
            }),
            (
                Command::ChangeColor {
                    id,
                    color,
                    adjusted_at,
                },
                direction,
            ) => notes.update(*id, |note| {
                note.color = *color.target(direction);
                note.adjusted_at = *adjusted_at.target(direction);
            }),
            (
                Command::ChangeOrder {
                    id,
                    order,
                    adjusted_at,
                },
                direction,
            ) => notes.update(*id, |note| {
                note.order = *order.target(direction);
                note.adjusted_at = *adjusted_at.target(direction);
            }),
        };

        if !done {
            debug!(
                "{} ({:?}) skipped: note {} is not on the board",
                self.name(),
                direction,
                self.note_id()
            );
        }
        done
    }
}

/// Manages the bounded undo stack and the redo stack.
#[derive(Debug)]
pub struct UndoManager {
    undo_stack: VecDeque<Command>,
    redo_stack: Vec<Command>,
    max_depth: usize,
}

impl UndoManager {
    /// Create a new undo manager with default depth (100)
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_HISTORY_DEPTH)
    }

    /// Create with custom maximum undo depth
    pub fn with_depth(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Records a completed command. The redo path is discarded.
    pub fn push(&mut self, command: Command) {
        trace!("Recording {} for note {}", command.name(), command.note_id());
        self.redo_stack.clear();
        self.undo_stack.push_back(command);

        // Evicted entries are gone for good
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Reverts the most recent command against `notes`.
    pub fn undo(&mut self, notes: &mut NoteArena) -> bool {
        let Some(command) = self.undo_stack.pop_back() else {
            return false;
        };
        debug!("Undo {} for note {}", command.name(), command.note_id());
        command.revert(notes);
        self.redo_stack.push(command);
        true
    }

    /// Re-applies the most recently undone command against `notes`.
    pub fn redo(&mut self, notes: &mut NoteArena) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };
        debug!("Redo {} for note {}", command.name(), command.note_id());
        command.apply(notes);
        self.undo_stack.push_back(command);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The command the next `undo` would revert.
    pub fn peek_undo(&self) -> Option<&Command> {
        self.undo_stack.back()
    }

    /// The command the next `redo` would re-apply.
    pub fn peek_redo(&self) -> Option<&Command> {
        self.redo_stack.last()
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}
