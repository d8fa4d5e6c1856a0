//! Serialized save queue
//!
//! A single background task performs every save, so two writes never run
//! at the same time. Queued saves are coalesced: only the newest
//! collection in a batch is written.

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::persistence::TaskPersistence;
use crate::task::Task;

enum SaveCommand {
    Save(Vec<Task>),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Commands drained from the queue in one pass
#[derive(Default)]
struct Batch {
    latest: Option<Vec<Task>>,
    superseded: usize,
    acks: Vec<oneshot::Sender<()>>,
    shutdown: bool,
}

impl Batch {
    fn absorb(&mut self, command: SaveCommand) {
        match command {
            SaveCommand::Save(tasks) => {
                if self.latest.replace(tasks).is_some() {
                    self.superseded += 1;
                }
            }
            SaveCommand::Flush(ack) => self.acks.push(ack),
            SaveCommand::Shutdown(ack) => {
                self.acks.push(ack);
                self.shutdown = true;
            }
        }
    }
}

pub(crate) struct SaveQueue {
    tx: mpsc::UnboundedSender<SaveCommand>,
    /// Held until the writer starts
    rx: Mutex<Option<mpsc::UnboundedReceiver<SaveCommand>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SaveQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the writer task; saves queued earlier are written once it runs
    pub(crate) async fn start(&self, persistence: TaskPersistence) -> bool {
        let Some(rx) = self.rx.lock().await.take() else {
            return false;
        };
        let handle = tokio::spawn(run_writer(persistence, rx));
        *self.handle.lock().await = Some(handle);
        true
    }

    pub(crate) fn enqueue(&self, tasks: Vec<Task>) {
        if self.tx.send(SaveCommand::Save(tasks)).is_err() {
            warn!("Task writer is stopped; change will not be persisted");
        }
    }

    /// Wait for every save queued before this call
    pub(crate) async fn flush(&self) {
        if self.rx.lock().await.is_some() {
            debug!("Task writer not started; nothing to flush");
            return;
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SaveCommand::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }

    /// Flush pending saves and stop the writer
    pub(crate) async fn shutdown(&self) {
        if self.rx.lock().await.is_some() {
            debug!("Task writer not started; nothing to shut down");
            return;
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SaveCommand::Shutdown(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }

        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("Task writer ended abnormally: {}", e);
            }
        }
    }
}

async fn run_writer(persistence: TaskPersistence, mut rx: mpsc::UnboundedReceiver<SaveCommand>) {
    debug!("Task writer started for {}", persistence.key());

    while let Some(command) = rx.recv().await {
        let mut batch = Batch::default();
        batch.absorb(command);
        while let Ok(command) = rx.try_recv() {
            batch.absorb(command);
        }

        if batch.superseded > 0 {
            debug!("Coalesced {} queued saves", batch.superseded);
        }

        if let Some(tasks) = batch.latest.take() {
            if let Err(e) = persistence.save(&tasks).await {
                warn!("Failed to save tasks to {}: {}", persistence.key(), e);
            }
        }

        for ack in batch.acks {
            let _ = ack.send(());
        }

        if batch.shutdown {
            info!("Task writer stopped");
            return;
        }
    }

    debug!("Task writer queue closed");
}
