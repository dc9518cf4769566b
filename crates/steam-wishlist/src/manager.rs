//! Entity lifecycle management
//!
//! The manager owns the aggregate sensor and one binary sensor per wishlist
//! game. On every coordinator notification it diffs the snapshot against the
//! entities it tracks: games that appeared get a new attached entity, games
//! that vanished get theirs detached and their store state removed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use sw_coordinator::ListenerId;
use sw_core::EntityIdError;
use sw_states::SharedStateStore;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::binary_sensor::SteamGameEntity;
use crate::sensor::SteamWishlistEntity;
use crate::types::{GameId, SharedCoordinator};

/// Creates and retires wishlist entities as the snapshot changes
pub struct SteamWishlistManager {
    coordinator: SharedCoordinator,
    states: SharedStateStore,
    wishlist: Arc<SteamWishlistEntity>,
    games: Mutex<HashMap<GameId, Arc<SteamGameEntity>>>,
    listener: Mutex<Option<ListenerId>>,
    /// Set by `stop()`; syncs queued behind a late notification become no-ops
    stopped: AtomicBool,
}

impl SteamWishlistManager {
    pub fn new(
        coordinator: SharedCoordinator,
        states: SharedStateStore,
    ) -> Result<Arc<Self>, EntityIdError> {
        let wishlist = SteamWishlistEntity::new(coordinator.clone(), states.clone())?;
        Ok(Arc::new(Self {
            coordinator,
            states,
            wishlist,
            games: Mutex::new(HashMap::new()),
            listener: Mutex::new(None),
            stopped: AtomicBool::new(false),
        }))
    }

    /// Attach the aggregate sensor, subscribe for snapshot diffs, and sync once
    pub async fn start(self: &Arc<Self>) {
        self.wishlist.attach().await;

        // Listener callbacks run synchronously inside the coordinator's
        // notify loop; the diff adds and removes listeners, so it is spawned.
        // set_data is a sync API callable from any thread, so the runtime
        // handle is looked up per notification: without one the diff is
        // skipped until the next in-runtime poll.
        let manager = Arc::clone(self);
        let id = self.coordinator.add_listener(Box::new(move || {
            let manager = Arc::clone(&manager);
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        manager.sync_entities().await;
                    });
                }
                Err(_) => {
                    warn!("Snapshot update outside a tokio runtime, skipping entity sync");
                }
            }
        }));
        *self.listener.lock().await = Some(id);

        self.sync_entities().await;
    }

    /// Diff the current snapshot against tracked entities
    ///
    /// Idempotent; keyed by the immutable game id, so retitled games keep
    /// their entity and slug collisions cannot alias two games.
    pub async fn sync_entities(&self) {
        let snapshot = self.coordinator.data();
        let mut games = self.games.lock().await;

        // A notification can land just before stop(); its spawned sync must
        // not resurrect entities after teardown. The flag is checked under the
        // games lock, which stop() holds while draining.
        if self.stopped.load(Ordering::SeqCst) {
            debug!("Manager stopped, skipping entity sync");
            return;
        }

        for (game_id, record) in snapshot.iter() {
            if games.contains_key(game_id) {
                continue;
            }
            match SteamGameEntity::new(
                self.coordinator.clone(),
                self.states.clone(),
                game_id.clone(),
                record.title.clone(),
            ) {
                Ok(entity) => {
                    entity.attach().await;
                    info!(game_id = %game_id, title = %record.title, "Tracking wishlist game");
                    games.insert(game_id.clone(), entity);
                }
                Err(err) => {
                    warn!(game_id = %game_id, error = %err, "Skipping game with invalid entity id");
                }
            }
        }

        let vanished: Vec<GameId> = games
            .keys()
            .filter(|game_id| !snapshot.contains_key(*game_id))
            .cloned()
            .collect();
        for game_id in vanished {
            if let Some(entity) = games.remove(&game_id) {
                entity.detach().await;
                self.states.remove(entity.entity_id());
                info!(game_id = %game_id, "Wishlist game removed, retiring entity");
            }
        }

        debug!(tracked = games.len(), "Wishlist entities in sync");
    }

    /// Detach everything and drop owned store state
    ///
    /// Syncs already queued behind a late notification run afterwards as
    /// no-ops.
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);

        if let Some(id) = self.listener.lock().await.take() {
            self.coordinator.remove_listener(id);
        }

        let mut games = self.games.lock().await;
        for (_, entity) in games.drain() {
            entity.detach().await;
            self.states.remove(entity.entity_id());
        }

        self.wishlist.detach().await;
        self.states.remove(self.wishlist.entity_id());
        info!("Steam wishlist integration stopped");
    }

    /// The aggregate wishlist sensor
    pub fn wishlist(&self) -> &Arc<SteamWishlistEntity> {
        &self.wishlist
    }

    /// The tracked entity for a game, if any
    pub async fn game(&self, game_id: &GameId) -> Option<Arc<SteamGameEntity>> {
        self.games.lock().await.get(game_id).cloned()
    }

    /// Number of per-game entities currently tracked
    pub async fn tracked_count(&self) -> usize {
        self.games.lock().await.len()
    }
}
