//! Entity state storage for the wishlist platform surface
//!
//! The StateStore tracks the current state of every entity and broadcasts a
//! StateChanged notification on each write or removal. Entities write into it
//! when the coordinator notifies them of fresh data; tests and any frontend
//! layer read from it or subscribe to the change stream.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use sw_core::{Context, EntityId, State};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default capacity of the state-changed broadcast channel
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Notification sent on every state write or removal
///
/// `old_state` is None for a brand-new entity; `new_state` is None when the
/// entity was removed.
#[derive(Debug, Clone)]
pub struct StateChanged {
    pub entity_id: EntityId,
    pub old_state: Option<State>,
    pub new_state: Option<State>,
}

/// Tracks the current state of all entities
pub struct StateStore {
    /// All entity states keyed by entity_id string
    states: DashMap<String, State>,
    /// Broadcast sender for state-changed notifications
    tx: broadcast::Sender<StateChanged>,
}

impl StateStore {
    /// Create a new state store
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new state store with the given broadcast capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            states: DashMap::new(),
            tx,
        }
    }

    /// Subscribe to state-changed notifications
    pub fn subscribe(&self) -> broadcast::Receiver<StateChanged> {
        self.tx.subscribe()
    }

    /// Set the state of an entity
    ///
    /// `last_changed` is only bumped when the state value actually changed.
    /// Broadcasts a StateChanged carrying the old and new state.
    pub fn set(
        &self,
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, serde_json::Value>,
        context: Context,
    ) -> State {
        let key = entity_id.to_string();
        let old_state = self.states.get(&key).map(|s| s.clone());

        let new_state = match &old_state {
            Some(existing) => existing.with_update(state, attributes, context),
            None => State::new(entity_id.clone(), state, attributes, context),
        };

        debug!(
            entity_id = %entity_id,
            state = %new_state.state,
            changed = old_state.as_ref().map(|s| s.state != new_state.state).unwrap_or(true),
            "Setting entity state"
        );

        self.states.insert(key, new_state.clone());

        // Send errors only mean nobody is subscribed
        let _ = self.tx.send(StateChanged {
            entity_id,
            old_state,
            new_state: Some(new_state.clone()),
        });

        new_state
    }

    /// Get the current state of an entity
    pub fn get(&self, entity_id: &EntityId) -> Option<State> {
        self.states.get(&entity_id.to_string()).map(|s| s.clone())
    }

    /// Get the state value as a string, or None if the entity doesn't exist
    pub fn get_state(&self, entity_id: &EntityId) -> Option<String> {
        self.get(entity_id).map(|s| s.state)
    }

    /// Check if an entity is in a specific state
    pub fn is_state(&self, entity_id: &EntityId, state: &str) -> bool {
        self.get_state(entity_id).as_deref() == Some(state)
    }

    /// Get all current states for a domain
    pub fn domain_states(&self, domain: &str) -> Vec<State> {
        self.states
            .iter()
            .filter(|r| r.value().entity_id.domain() == domain)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Remove an entity's state
    ///
    /// Broadcasts a StateChanged with None for new_state.
    pub fn remove(&self, entity_id: &EntityId) -> Option<State> {
        let old_state = self.states.remove(&entity_id.to_string()).map(|(_, s)| s);

        if let Some(ref state) = old_state {
            trace!(entity_id = %entity_id, "Removing entity state");
            let _ = self.tx.send(StateChanged {
                entity_id: entity_id.clone(),
                old_state: Some(state.clone()),
                new_state: None,
            });
        }

        old_state
    }

    /// Total number of entities with a state
    pub fn entity_count(&self) -> usize {
        self.states.len()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for StateStore
pub type SharedStateStore = Arc<StateStore>;
