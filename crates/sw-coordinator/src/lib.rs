//! Polling data coordinator
//!
//! The UpdateCoordinator owns the latest snapshot of polled data and a list of
//! listeners to notify when a new snapshot lands. The snapshot is replaced
//! wholesale on every successful refresh and handed out as an `Arc`, so entity
//! reads are synchronous, lock-free after the clone, and never observe a
//! half-written poll. Scheduling of refreshes belongs to the caller.

use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Error type for coordinator refreshes
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpdateError {
    #[error("update failed: {0}")]
    UpdateFailed(String),
}

/// A unique identifier for a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback invoked when a new snapshot is available
///
/// Listeners must not add or remove listeners synchronously from inside the
/// callback; spawn a task for anything beyond reading the new snapshot.
pub type Listener = Box<dyn Fn() + Send + Sync>;

/// Shared snapshot handle with observer registration
///
/// `T` is the snapshot type, replaced wholesale on each poll. Entities hold an
/// `Arc<UpdateCoordinator<T>>` and derive their state from `data()` at read
/// time; they register a refresh callback on attach and deregister on detach.
pub struct UpdateCoordinator<T> {
    /// Latest snapshot; the lock is held only for the swap and the Arc clone
    data: RwLock<Arc<T>>,
    /// Registered listeners keyed by their id
    listeners: DashMap<ListenerId, Listener>,
    /// Counter for generating unique listener ids
    next_listener_id: AtomicU64,
    /// Whether the most recent refresh attempt succeeded
    last_update_success: AtomicBool,
}

impl<T> UpdateCoordinator<T> {
    /// Create a coordinator holding an initial snapshot
    pub fn new(initial: T) -> Self {
        Self {
            data: RwLock::new(Arc::new(initial)),
            listeners: DashMap::new(),
            next_listener_id: AtomicU64::new(1),
            last_update_success: AtomicBool::new(true),
        }
    }

    /// Get the current snapshot
    pub fn data(&self) -> Arc<T> {
        // Lock poisoning cannot happen: no code path panics while holding it
        self.data.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the snapshot wholesale and notify all listeners
    pub fn set_data(&self, data: T) {
        {
            let mut guard = self.data.write().unwrap_or_else(|e| e.into_inner());
            *guard = Arc::new(data);
        }
        self.last_update_success.store(true, Ordering::SeqCst);
        self.notify_listeners();
    }

    /// Run one refresh cycle with a caller-supplied fetch future
    ///
    /// On success the snapshot is replaced and listeners fire. On failure the
    /// previous snapshot is kept, `last_update_success` flips off, and
    /// listeners still fire so entities can report unavailability.
    pub async fn refresh_with<F, Fut, E>(&self, fetch: F) -> Result<(), UpdateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match fetch().await {
            Ok(data) => {
                debug!("Refresh succeeded, replacing snapshot");
                self.set_data(data);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Refresh failed, keeping previous snapshot");
                self.last_update_success.store(false, Ordering::SeqCst);
                self.notify_listeners();
                Err(UpdateError::UpdateFailed(err.to_string()))
            }
        }
    }

    /// Whether the most recent refresh attempt succeeded
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::SeqCst)
    }

    /// Register a listener; returns the id needed to deregister it
    pub fn add_listener(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.insert(id, listener);
        trace!(listener_id = id.0, "Listener registered");
        id
    }

    /// Deregister a listener; unknown ids are ignored
    pub fn remove_listener(&self, id: ListenerId) {
        if self.listeners.remove(&id).is_some() {
            trace!(listener_id = id.0, "Listener removed");
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify_listeners(&self) {
        for entry in self.listeners.iter() {
            (entry.value())();
        }
    }
}
