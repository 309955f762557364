//! The authoritative note collection of an open board.
//!
//! All mutation goes through [`Board`]: each operation builds the matching
//! [`Command`], applies it to the id-keyed [`NoteArena`], records it in the
//! history and raises a change notification.

use std::collections::HashMap;

use log::{debug, info, trace, warn};
use rand::seq::IndexedRandom;
use tokio::sync::mpsc;

use crate::{
    clamp_size, utc_now, Command, Config, Note, Placement, Point, Rect, Rgba, Size, Transition,
    UndoManager,
};

/// Raised after every change to the note collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    NotesChanged,
}

/// Everything the note file stores, captured at one instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoardSnapshot {
    pub notes: Vec<Note>,
    pub next_id: u64,
}

#[derive(Debug, Clone)]
struct Slot {
    /// Insertion sequence, breaks ties between equal orders
    seq: u64,
    note: Note,
}

/// Notes keyed by id.
#[derive(Debug, Clone, Default)]
pub struct NoteArena {
    slots: HashMap<u64, Slot>,
    /// Insertion sequence of removed notes, reused if the id comes back
    retired: HashMap<u64, u64>,
    next_seq: u64,
}

impl NoteArena {
    pub fn get(&self, id: u64) -> Option<&Note> {
        self.slots.get(&id).map(|slot| &slot.note)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.slots.values().map(|slot| &slot.note)
    }

    /// Ids in ascending order.
    pub fn sorted_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.slots.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Notes bottom to top: by order, ties by insertion.
    pub fn stacking_order(&self) -> Vec<&Note> {
        let mut slots: Vec<&Slot> = self.slots.values().collect();
        slots.sort_by_key(|slot| (slot.note.order, slot.seq));
        slots.into_iter().map(|slot| &slot.note).collect()
    }

    pub fn max_order(&self) -> Option<i64> {
        self.iter().map(|note| note.order).max()
    }

    pub fn min_order(&self) -> Option<i64> {
        self.iter().map(|note| note.order).min()
    }

    /// Inserts a note unless its id is already taken.
    pub(crate) fn insert(&mut self, note: Note) -> bool {
        if self.slots.contains_key(&note.id) {
            warn!("Note {} is already on the board, not inserting", note.id);
            return false;
        }
        let seq = match self.retired.remove(&note.id) {
            Some(seq) => seq,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                seq
            }
        };
        self.slots.insert(note.id, Slot { seq, note });
        true
    }

    pub(crate) fn remove(&mut self, id: u64) -> Option<Note> {
        let slot = self.slots.remove(&id)?;
        self.retired.insert(id, slot.seq);
        Some(slot.note)
    }

    /// Runs `f` on the live note with `id`; false if there is none.
    pub(crate) fn update(&mut self, id: u64, f: impl FnOnce(&mut Note)) -> bool {
        match self.slots.get_mut(&id) {
            Some(slot) => {
                f(&mut slot.note);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.retired.clear();
        self.next_seq = 0;
    }
}

/// The in-memory note collection of the open file, with its history.
#[derive(Debug)]
pub struct Board {
    config: Config,
    notes: NoteArena,
    history: UndoManager,
    next_id: u64,
    subscribers: Vec<mpsc::UnboundedSender<BoardEvent>>,
}

impl Board {
    pub fn new(config: Config) -> Self {
        Self::with_history(config, UndoManager::new())
    }

    pub fn with_history(config: Config, history: UndoManager) -> Self {
        Self {
            config,
            notes: NoteArena::default(),
            history,
            next_id: 1,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the whole collection with persisted notes and clears the history.
    ///
    /// Paint order follows the persisted `order` values. `next_id` is raised
    /// past the highest loaded id if the file carried a stale counter.
    pub fn load(&mut self, notes: Vec<Note>, next_id: u64) {
        self.notes.clear();
        self.history.clear();

        let mut sorted = notes;
        sorted.sort_by_key(|note| note.order);

        let mut max_id = 0;
        for mut note in sorted {
            let size = clamp_size(note.size());
            if size != note.size() {
                warn!("Note {} is smaller than the minimum size, clamping", note.id);
                note.width = size.width;
                note.height = size.height;
            }
            max_id = max_id.max(note.id);
            self.notes.insert(note);
        }

        self.next_id = next_id.max(max_id.saturating_add(1)).max(1);
        info!(
            "Loaded {} notes, next id {}",
            self.notes.len(),
            self.next_id
        );
    }

    /// Snapshot of every note, ordered by id.
    pub fn get_all(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.notes.iter().cloned().collect();
        notes.sort_by_key(|note| note.id);
        notes
    }

    pub fn get(&self, id: u64) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.notes.contains(id)
    }

    pub fn notes(&self) -> &NoteArena {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            notes: self.get_all(),
            next_id: self.next_id,
        }
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<BoardEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Creates an empty note at `position`.
    pub fn create(&mut self, position: Point) -> Note {
        self.create_with_text(position, String::new())
    }

    /// Creates a note with `text` at `position`, colored from the palette.
    pub fn create_with_text(&mut self, position: Point, text: String) -> Note {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);

        let order = self.notes.max_order().unwrap_or(0).saturating_add(1);
        let size = Size::new(
            self.config.default_width as f64,
            self.config.default_height as f64,
        );
        let mut note = Note::new(id, position, size, text, order, self.pick_color());
        note.created_at = Some(utc_now());

        debug!("Creating note {} at ({}, {})", id, position.x, position.y);
        self.record(Command::Create { note: note.clone() });
        note
    }

    /// Deletes a note; false if there is no note with `id`.
    pub fn delete(&mut self, id: u64) -> bool {
        let Some(note) = self.notes.get(id).cloned() else {
            return false;
        };
        debug!("Deleting note {}", id);
        self.record(Command::Delete { note });
        true
    }

    /// Records the end of a drag.
    pub fn move_note(&mut self, id: u64, x: f64, y: f64) -> bool {
        let Some(note) = self.notes.get(id) else {
            return false;
        };
        let target = Point::new(x, y);
        if note.position() == target {
            return false;
        }
        let command = Command::Move {
            id,
            position: Transition::new(note.position(), target),
            adjusted_at: Transition::new(note.adjusted_at, Some(utc_now())),
        };
        self.record(command);
        true
    }

    /// Records the end of a resize; the size is clamped to the minimum first.
    pub fn resize(&mut self, id: u64, width: f64, height: f64) -> bool {
        let Some(note) = self.notes.get(id) else {
            return false;
        };
        let target = clamp_size(Size::new(width, height));
        if note.size() == target {
            return false;
        }
        let command = Command::Resize {
            id,
            size: Transition::new(note.size(), target),
            adjusted_at: Transition::new(note.adjusted_at, Some(utc_now())),
        };
        self.record(command);
        true
    }

    /// Commits edited text.
    pub fn set_text(&mut self, id: u64, text: &str) -> bool {
        let Some(note) = self.notes.get(id) else {
            return false;
        };
        if note.text == text {
            return false;
        }
        let command = Command::EditText {
            id,
            text: Transition::new(note.text.clone(), text.to_string()),
            edited_at: Transition::new(note.edited_at, Some(utc_now())),
        };
        self.record(command);
        true
    }

    pub fn set_color(&mut self, id: u64, color: Rgba) -> bool {
        let Some(note) = self.notes.get(id) else {
            return false;
        };
        if note.color == color {
            return false;
        }
        let command = Command::ChangeColor {
            id,
            color: Transition::new(note.color, color),
            adjusted_at: Transition::new(note.adjusted_at, Some(utc_now())),
        };
        self.record(command);
        true
    }

    /// Puts the note above every other note.
    pub fn bring_to_front(&mut self, id: u64) -> bool {
        let Some(note) = self.notes.get(id) else {
            return false;
        };
        let others_max = self
            .notes
            .iter()
            .filter(|other| other.id != id)
            .map(|other| other.order)
            .max();
        match others_max {
            Some(max) if note.order <= max => match max.checked_add(1) {
                Some(order) => self.change_order(id, order),
                None => {
                    warn!("Note order is at its upper limit, cannot raise note {}", id);
                    false
                }
            },
            _ => false,
        }
    }

    /// Puts the note below every other note.
    pub fn send_to_back(&mut self, id: u64) -> bool {
        let Some(note) = self.notes.get(id) else {
            return false;
        };
        let others_min = self
            .notes
            .iter()
            .filter(|other| other.id != id)
            .map(|other| other.order)
            .min();
        match others_min {
            Some(min) if note.order >= min => match min.checked_sub(1) {
                Some(order) => self.change_order(id, order),
                None => {
                    warn!("Note order is at its lower limit, cannot lower note {}", id);
                    false
                }
            },
            _ => false,
        }
    }

    fn change_order(&mut self, id: u64, order: i64) -> bool {
        let Some(note) = self.notes.get(id) else {
            return false;
        };
        let command = Command::ChangeOrder {
            id,
            order: Transition::new(note.order, order),
            adjusted_at: Transition::new(note.adjusted_at, Some(utc_now())),
        };
        self.record(command);
        true
    }

    /// Where a newly inserted note goes.
    ///
    /// Next to `anchor` if it names a note on the board, otherwise next to the
    /// most recently created note, otherwise at the padding offset.
    pub fn position_for_new_note(&self, anchor: Option<u64>, placement: Placement) -> Point {
        let padding = self.config.padding as f64;
        let anchor = anchor
            .and_then(|id| self.notes.get(id))
            .or_else(|| self.notes.iter().max_by_key(|note| note.id));

        match (anchor, placement) {
            (None, _) => Point::new(padding, padding),
            (Some(note), Placement::Right) => Point::new(note.x + note.width + padding, note.y),
            (Some(note), Placement::Below) => Point::new(note.x, note.y + note.height + padding),
        }
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.notes);
        if undone {
            self.notify();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.notes);
        if redone {
            self.notify();
        }
        redone
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Bounding rectangle of all notes.
    pub fn bounds(&self) -> Option<Rect> {
        self.notes
            .iter()
            .map(Note::rect)
            .reduce(|acc, rect| acc.union(&rect))
    }

    fn pick_color(&self) -> Rgba {
        self.config
            .palette
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or_default()
    }

    fn record(&mut self, command: Command) {
        command.apply(&mut self.notes);
        self.history.push(command);
        self.notify();
    }

    fn notify(&mut self) {
        trace!("Notifying {} subscribers", self.subscribers.len());
        self.subscribers
            .retain(|subscriber| subscriber.send(BoardEvent::NotesChanged).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(Config::default())
    }

    #[test]
    fn first_note_lands_at_padding_offset() {
        let mut board = board();
        let position = board.position_for_new_note(None, Placement::Right);
        let note = board.create(position);

        assert_eq!(note.id, 1);
        assert_eq!(note.order, 1);
        assert_eq!((note.x, note.y), (20.0, 20.0));
        assert_eq!((note.width, note.height), (180.0, 120.0));
        assert_eq!(note.text, "");
        assert!(note.created_at.is_some());
        assert!(Config::default().palette.contains(&note.color));
    }

    #[test]
    fn placement_follows_anchor_then_latest_note() {
        let mut board = board();
        let first = board.create(Point::new(20.0, 20.0));
        let second = board.create(board.position_for_new_note(None, Placement::Right));
        assert_eq!(second.id, 2);
        assert_eq!((second.x, second.y), (220.0, 20.0));

        let below_first = board.position_for_new_note(Some(first.id), Placement::Below);
        assert_eq!(below_first, Point::new(20.0, 160.0));

        // Unknown anchor falls back to the latest note
        let fallback = board.position_for_new_note(Some(99), Placement::Below);
        assert_eq!(fallback, Point::new(220.0, 160.0));
    }

    #[test]
    fn unchanged_values_are_no_ops() {
        let mut board = board();
        let note = board.create(Point::new(0.0, 0.0));
        let undo_before = board.history().undo_count();

        assert!(!board.move_note(note.id, 0.0, 0.0));
        assert!(!board.resize(note.id, 180.0, 120.0));
        assert!(!board.set_text(note.id, ""));
        assert!(!board.set_color(note.id, note.color));
        assert!(!board.bring_to_front(note.id));
        assert!(!board.send_to_back(note.id));
        assert_eq!(board.history().undo_count(), undo_before);
    }

    #[test]
    fn missing_ids_are_ignored() {
        let mut board = board();
        assert!(!board.delete(7));
        assert!(!board.move_note(7, 1.0, 1.0));
        assert!(!board.resize(7, 200.0, 200.0));
        assert!(!board.set_text(7, "x"));
        assert!(!board.set_color(7, Rgba::new(0, 0, 0, 255)));
        assert!(!board.bring_to_front(7));
        assert!(!board.can_undo());
    }

    #[test]
    fn resize_is_clamped_to_minimum() {
        let mut board = board();
        let note = board.create(Point::new(0.0, 0.0));
        assert!(board.resize(note.id, 10.0, 10.0));
        let resized = board.get(note.id).unwrap();
        assert_eq!((resized.width, resized.height), (100.0, 60.0));
        assert!(resized.adjusted_at.is_some());
        assert!(!board.resize(note.id, 50.0, 20.0));
    }

    #[test]
    fn ordering_moves_to_extremes() {
        let mut board = board();
        let a = board.create(Point::new(0.0, 0.0));
        let b = board.create(Point::new(0.0, 0.0));
        let c = board.create(Point::new(0.0, 0.0));

        assert!(board.bring_to_front(a.id));
        assert_eq!(board.get(a.id).unwrap().order, 4);
        assert!(!board.bring_to_front(a.id));

        assert!(board.send_to_back(c.id));
        assert_eq!(board.get(c.id).unwrap().order, 1);
        let stack: Vec<u64> = board.notes().stacking_order().iter().map(|n| n.id).collect();
        assert_eq!(stack, vec![c.id, b.id, a.id]);

        assert!(board.undo());
        assert!(board.undo());
        let stack: Vec<u64> = board.notes().stacking_order().iter().map(|n| n.id).collect();
        assert_eq!(stack, vec![a.id, b.id, c.id]);
    }

    #[test]
    fn load_clears_history_and_repairs_counter() {
        let mut board = board();
        board.create(Point::new(0.0, 0.0));
        assert!(board.can_undo());

        let mut small = Note::new(
            5,
            Point::new(1.0, 2.0),
            Size::new(180.0, 120.0),
            "a".to_string(),
            3,
            Rgba::default(),
        );
        small.width = 10.0;
        board.load(vec![small], 2);

        assert!(!board.can_undo());
        assert_eq!(board.next_id(), 6);
        assert_eq!(board.get(5).unwrap().width, 100.0);
        assert_eq!(board.create(Point::default()).id, 6);
    }

    #[test]
    fn mutations_notify_subscribers() {
        let mut board = board();
        let mut events = board.subscribe();
        let dropped = board.subscribe();
        drop(dropped);

        let note = board.create(Point::new(0.0, 0.0));
        board.move_note(note.id, 5.0, 5.0);
        board.undo();

        let mut count = 0;
        while let Ok(event) = events.try_recv() {
            assert_eq!(event, BoardEvent::NotesChanged);
            count += 1;
        }
        assert_eq!(count, 3);
        assert_eq!(board.subscribers.len(), 1);
    }

    #[test]
    fn bounds_cover_all_notes() {
        let mut board = board();
        assert_eq!(board.bounds(), None);
        board.create(Point::new(-10.0, 5.0));
        board.create(Point::new(300.0, 400.0));
        let bounds = board.bounds().unwrap();
        assert_eq!(bounds.min_x, -10.0);
        assert_eq!(bounds.min_y, 5.0);
        assert_eq!(bounds.max_x, 480.0);
        assert_eq!(bounds.max_y, 520.0);
    }

    fn loaded_note(id: u64, order: i64) -> Note {
        Note::new(
            id,
            Point::new(0.0, 0.0),
            Size::new(180.0, 120.0),
            String::new(),
            order,
            Rgba::default(),
        )
    }

    fn stacking_ids(board: &Board) -> Vec<u64> {
        board
            .notes()
            .stacking_order()
            .iter()
            .map(|note| note.id)
            .collect()
    }

    #[test]
    fn undo_of_delete_keeps_tie_order() {
        let mut board = board();
        board.load(vec![loaded_note(1, 5), loaded_note(2, 5)], 3);
        assert_eq!(stacking_ids(&board), vec![1, 2]);

        board.delete(1);
        board.undo();
        assert_eq!(stacking_ids(&board), vec![1, 2]);

        board.redo();
        assert_eq!(stacking_ids(&board), vec![2]);
        board.undo();
        assert_eq!(stacking_ids(&board), vec![1, 2]);
    }

    #[test]
    fn extreme_file_values_do_not_overflow() {
        let mut board = board();
        board.load(vec![loaded_note(u64::MAX, 1)], 1);
        assert_eq!(board.next_id(), u64::MAX);

        board.load(vec![loaded_note(1, i64::MAX), loaded_note(2, i64::MIN)], 3);
        let created = board.create(Point::default());
        assert_eq!(created.order, i64::MAX);
        assert!(!board.bring_to_front(2));
        assert!(!board.send_to_back(1));
        assert_eq!(board.get(2).unwrap().order, i64::MIN);
    }
}
