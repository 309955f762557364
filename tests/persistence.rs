use std::sync::Arc;

use pinboard::{
    Board, Config, MemoryStore, NoteStore, Placement, Point, SaveScheduler, YamlStorage,
};
use tempfile::tempdir;
use tokio::time::{self, Duration};

#[tokio::test(start_paused = true)]
async fn drag_burst_is_written_once() {
    let store = Arc::new(MemoryStore::new());
    let mut scheduler = SaveScheduler::new(store.clone());
    scheduler.start();

    let mut board = Board::new(Config::default());
    let mut changes = board.subscribe();
    let note = board.create(Point::new(0.0, 0.0));

    for step in 1..=20 {
        board.move_note(note.id, step as f64 * 10.0, 0.0);
        while changes.try_recv().is_ok() {}
        scheduler.schedule(board.snapshot());
        time::sleep(Duration::from_millis(25)).await;
    }
    assert_eq!(store.save_count(), 0);

    time::sleep(Duration::from_millis(500)).await;
    assert_eq!(store.save_count(), 1);
    let (notes, next_id) = store.saved();
    assert_eq!(notes[0].x, 200.0);
    assert_eq!(next_id, 2);

    scheduler.stop().await.unwrap();
}

#[test]
fn yaml_file_round_trips_a_board() {
    let dir = tempdir().unwrap();
    let storage = YamlStorage::new(dir.path().join("board.yaml"));

    let mut board = Board::new(Config::default());
    for text in ["one", "two\nlines", ""] {
        let position = board.position_for_new_note(None, Placement::Below);
        board.create_with_text(position, text.to_string());
    }
    board.set_text(2, "edited");
    board.delete(3);
    storage.save(&board.get_all(), board.next_id()).unwrap();

    let (notes, next_id) = storage.load().unwrap();
    assert_eq!(notes, board.get_all());
    assert_eq!(next_id, 4);

    let mut reloaded = Board::new(Config::default());
    reloaded.load(notes, next_id);
    assert!(!reloaded.can_undo());
    assert_eq!(reloaded.create(Point::new(0.0, 0.0)).id, 4);
}

#[test]
fn stale_next_id_is_repaired_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("board.yaml");
    std::fs::write(
        &path,
        "notes:\n- id: 7\n  x: 0\n  y: 0\n  width: 10\n  height: 10\n  text: ''\n  order: 1\nnext_id: 2\n",
    )
    .unwrap();

    let (notes, next_id) = YamlStorage::new(&path).load().unwrap();
    let mut board = Board::new(Config::default());
    board.load(notes, next_id);
    assert_eq!(board.next_id(), 8);
    let note = board.get(7).unwrap();
    assert_eq!((note.width, note.height), (100.0, 60.0));
}

#[test]
fn preloaded_store_reopens_with_history_cleared() {
    let mut board = Board::new(Config::default());
    board.create(Point::new(0.0, 0.0));
    board.create(Point::new(300.0, 0.0));
    board.delete(1);
    let store = MemoryStore::with_notes(board.get_all(), board.next_id());

    let (notes, next_id) = store.load().unwrap();
    let mut reopened = Board::new(Config::default());
    reopened.load(notes, next_id);
    assert_eq!(reopened.get_all(), board.get_all());
    assert!(!reopened.can_undo());
    assert_eq!(reopened.create(Point::default()).id, 3);
    assert_eq!(store.save_count(), 0);
}
