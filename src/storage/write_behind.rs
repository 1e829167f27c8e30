//! Write-behind decorator for any [`ProgressStorage`].
//!
//! Saves are handed to a dedicated worker thread so that an event handler never
//! waits on durable I/O. Only the most recent payload matters for a snapshot
//! record, so pending writes are coalesced into a single slot: the worker always
//! persists the latest state it has been given.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::ConfigError;
use crate::storage::traits::{ProgressStorage, StorageError};

/// Configuration for [`WriteBehindStorage`].
#[derive(Debug, Clone)]
pub struct WriteBehindConfig {
    /// Max queued control messages before wake-ups are skipped.
    pub queue_capacity: usize,
}

impl Default for WriteBehindConfig {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}

impl WriteBehindConfig {
    /// Check the configuration, returning it unchanged when valid.
    ///
    /// # Errors
    /// - `ConfigError::BelowMinimum` if `queue_capacity` is zero
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "queue_capacity".to_string(),
                min: 1,
                actual: 0,
            });
        }
        Ok(self)
    }
}

#[derive(Debug)]
enum WriterMsg {
    /// A new payload was placed in the pending slot.
    Wake,
    /// Write whatever is pending, then reply.
    Flush(Sender<()>),
}

#[derive(Debug, Default)]
struct Shared {
    /// Latest payload not yet handed to the inner backend.
    pending: Mutex<Option<String>>,
    failed_writes: AtomicU64,
    completed_writes: AtomicU64,
}

impl Shared {
    fn put(&self, payload: String) -> Result<(), StorageError> {
        let mut slot = self
            .pending
            .lock()
            .map_err(|_| StorageError::Backend("poisoned lock: write_behind.pending".to_string()))?;
        *slot = Some(payload);
        Ok(())
    }

    fn take(&self) -> Option<String> {
        self.pending.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Storage decorator that performs writes on a background thread.
///
/// `save` returns as soon as the payload is parked in the pending
/// slot. `load` is served directly by the inner backend after pending writes
/// have been flushed.
pub struct WriteBehindStorage {
    inner: Arc<dyn ProgressStorage>,
    shared: Arc<Shared>,
    tx: Option<Sender<WriterMsg>>,
    join: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for WriteBehindStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteBehindStorage")
            .field("failed_writes", &self.failed_writes())
            .field("completed_writes", &self.completed_writes())
            .finish_non_exhaustive()
    }
}

impl WriteBehindStorage {
    /// Wrap `inner`, spawning the writer thread.
    ///
    /// # Errors
    /// - If the configuration is invalid
    /// - If the worker thread cannot be spawned
    pub fn new(inner: Arc<dyn ProgressStorage>, config: WriteBehindConfig) -> Result<Self, StorageError> {
        let config = config
            .validate()
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let (tx, rx) = bounded::<WriterMsg>(config.queue_capacity);
        let shared = Arc::new(Shared::default());

        let thread_inner = Arc::clone(&inner);
        let thread_shared = Arc::clone(&shared);
        let join = thread::Builder::new()
            .name("operator-xp-writer".to_string())
            .spawn(move || worker_loop(thread_inner, thread_shared, rx))?;

        Ok(Self {
            inner,
            shared,
            tx: Some(tx),
            join: Some(join),
        })
    }

    /// Block until every payload handed over so far has been written.
    pub fn flush(&self) {
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        let (reply_tx, reply_rx) = bounded::<()>(1);
        if tx.send(WriterMsg::Flush(reply_tx)).is_ok() {
            let _ = reply_rx.recv();
        }
    }

    /// Number of background writes that failed.
    #[must_use]
    pub fn failed_writes(&self) -> u64 {
        self.shared.failed_writes.load(Ordering::Relaxed)
    }

    /// Number of background writes that succeeded.
    #[must_use]
    pub fn completed_writes(&self) -> u64 {
        self.shared.completed_writes.load(Ordering::Relaxed)
    }

    fn post(&self, payload: String) -> Result<(), StorageError> {
        self.shared.put(payload)?;
        let Some(tx) = self.tx.as_ref() else {
            return Err(StorageError::Unavailable("writer is shut down".to_string()));
        };
        match tx.try_send(WriterMsg::Wake) {
            // A full queue already holds a wake-up that will pick up the slot.
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Disconnected(_)) => {
                Err(StorageError::Unavailable("writer thread exited".to_string()))
            }
        }
    }
}

impl ProgressStorage for WriteBehindStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        self.flush();
        self.inner.load()
    }

    fn save(&self, payload: &str) -> Result<(), StorageError> {
        self.post(payload.to_string())
    }
}

impl Drop for WriteBehindStorage {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain the slot and exit.
        drop(self.tx.take());
        if let Some(handle) = self.join.take() {
            if handle.join().is_err() {
                tracing::warn!("write-behind worker panicked during shutdown");
            }
        }
    }
}

fn write_pending(inner: &dyn ProgressStorage, shared: &Shared) {
    let Some(payload) = shared.take() else {
        return;
    };

    match inner.save(&payload) {
        Ok(()) => {
            shared.completed_writes.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            shared.failed_writes.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, "background progress write failed");
        }
    }
}

fn worker_loop(inner: Arc<dyn ProgressStorage>, shared: Arc<Shared>, rx: Receiver<WriterMsg>) {
    while let Ok(msg) = rx.recv() {
        match msg {
            WriterMsg::Wake => write_pending(inner.as_ref(), &shared),
            WriterMsg::Flush(reply) => {
                write_pending(inner.as_ref(), &shared);
                let _ = reply.send(());
            }
        }
    }

    // Channel closed: persist whatever is still parked before exiting.
    write_pending(inner.as_ref(), &shared);
}
