// src/save_scheduler.rs - Debounced saving of the board
use std::sync::{Arc, Mutex};

use log::{debug, error, info, trace};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};

use crate::{utc_now, BoardSnapshot, NoteStore, PinError, Result, Timestamp};

/// Quiet period after the last change before the board is written.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default)]
pub struct SaveSchedulerStatus {
    /// Whether the scheduler is running
    pub is_running: bool,
    /// Number of debounced saves written
    pub saves: usize,
    /// The time the last debounced save completed
    pub last_save_time: Option<Timestamp>,
}

#[derive(Debug)]
enum SaveCommand {
    /// Replace the pending snapshot and restart the timer
    Schedule(BoardSnapshot),
    /// Stop the scheduler, dropping any pending snapshot
    Stop,
}

/// Coalesces bursts of board changes into one write.
pub struct SaveScheduler {
    store: Arc<dyn NoteStore>,
    delay: Duration,
    command_tx: Option<mpsc::UnboundedSender<SaveCommand>>,
    scheduler_task: Option<JoinHandle<()>>,
    status: Arc<Mutex<SaveSchedulerStatus>>,
}

impl SaveScheduler {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self::with_delay(store, SAVE_DEBOUNCE)
    }

    pub fn with_delay(store: Arc<dyn NoteStore>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            command_tx: None,
            scheduler_task: None,
            status: Arc::new(Mutex::new(SaveSchedulerStatus::default())),
        }
    }

    /// Spawns the scheduler task. Must be called inside a tokio runtime.
    pub fn start(&mut self) {
        if self.scheduler_task.is_some() {
            debug!("Save scheduler already running");
            return;
        }
        info!("Starting save scheduler with {:?} debounce", self.delay);

        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        self.command_tx = Some(command_tx);

        let store = Arc::clone(&self.store);
        let status = Arc::clone(&self.status);
        let delay = self.delay;

        let task = tokio::spawn(async move {
            let mut pending: Option<BoardSnapshot> = None;
            let timer = time::sleep(delay);
            tokio::pin!(timer);

            loop {
                tokio::select! {
                    () = &mut timer, if pending.is_some() => {
                        if let Some(snapshot) = pending.take() {
                            match store.save(&snapshot.notes, snapshot.next_id) {
                                Ok(()) => {
                                    debug!("Debounced save of {} notes", snapshot.notes.len());
                                    update_status(&status, |s| {
                                        s.saves += 1;
                                        s.last_save_time = Some(utc_now());
                                    });
                                }
                                Err(e) => error!("Debounced save failed: {}", e),
                            }
                        }
                    }
                    command = command_rx.recv() => match command {
                        Some(SaveCommand::Schedule(snapshot)) => {
                            trace!("Save scheduled, restarting timer");
                            pending = Some(snapshot);
                            timer.as_mut().reset(Instant::now() + delay);
                        }
                        Some(SaveCommand::Stop) | None => {
                            info!("Save scheduler stopping...");
                            break;
                        }
                    }
                }
            }
        });

        self.scheduler_task = Some(task);
        update_status(&self.status, |s| s.is_running = true);
    }

    /// (Re)starts the debounce timer with the latest board state.
    ///
    /// Returns false if the scheduler is not running.
    pub fn schedule(&self, snapshot: BoardSnapshot) -> bool {
        match &self.command_tx {
            Some(tx) => tx.send(SaveCommand::Schedule(snapshot)).is_ok(),
            None => false,
        }
    }

    /// Cancels the timer and waits for the task to finish.
    ///
    /// A pending snapshot is dropped; callers flush the board themselves.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.scheduler_task.take() {
            if let Some(tx) = self.command_tx.take() {
                if let Err(e) = tx.send(SaveCommand::Stop) {
                    error!("Failed to send stop command to save scheduler: {}", e);
                }
            }

            if let Err(e) = task.await {
                let error_msg = format!("Failed to stop save scheduler: {}", e);
                error!("{}", error_msg);
                return Err(PinError::ApplicationError { message: error_msg });
            }

            update_status(&self.status, |s| s.is_running = false);
            info!("Save scheduler stopped");
        } else {
            debug!("Save scheduler is not running");
        }

        Ok(())
    }

    /// Get the current status of the save scheduler
    pub fn get_status(&self) -> SaveSchedulerStatus {
        match self.status.lock() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn update_status(status: &Mutex<SaveSchedulerStatus>, f: impl FnOnce(&mut SaveSchedulerStatus)) {
    match status.lock() {
        Ok(mut status) => f(&mut *status),
        Err(poisoned) => f(&mut *poisoned.into_inner()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, Note, Point, Rgba, Size};

    fn snapshot(x: f64) -> BoardSnapshot {
        BoardSnapshot {
            notes: vec![Note::new(
                1,
                Point::new(x, 0.0),
                Size::new(180.0, 120.0),
                String::new(),
                1,
                Rgba::default(),
            )],
            next_id: 2,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_is_saved_once_with_final_state() {
        let store = Arc::new(MemoryStore::new());
        let mut scheduler = SaveScheduler::new(store.clone());
        scheduler.start();

        for step in 0..10 {
            assert!(scheduler.schedule(snapshot(step as f64)));
            time::sleep(Duration::from_millis(40)).await;
        }
        assert_eq!(store.save_count(), 0);

        time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.saved().0[0].x, 9.0);
        assert_eq!(scheduler.get_status().saves, 1);

        scheduler.stop().await.unwrap();
        assert!(!scheduler.get_status().is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_save_separately() {
        let store = Arc::new(MemoryStore::new());
        let mut scheduler = SaveScheduler::new(store.clone());
        scheduler.start();

        scheduler.schedule(snapshot(1.0));
        time::sleep(Duration::from_secs(1)).await;
        scheduler.schedule(snapshot(2.0));
        time::sleep(Duration::from_secs(1)).await;

        assert_eq!(store.save_count(), 2);
        scheduler.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_save() {
        let store = Arc::new(MemoryStore::new());
        let mut scheduler = SaveScheduler::new(store.clone());
        assert!(!scheduler.schedule(snapshot(1.0)));

        scheduler.start();
        scheduler.schedule(snapshot(1.0));
        scheduler.stop().await.unwrap();
        time::sleep(Duration::from_secs(1)).await;

        assert_eq!(store.save_count(), 0);
        assert!(!scheduler.schedule(snapshot(2.0)));
    }
}
