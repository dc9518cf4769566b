//! Per-game sale sensor
//!
//! `binary_sensor.steam_wishlist_<slug>`: on iff the game is currently
//! discounted. The game id is captured at construction and is the entity's
//! unique id; the slugified title only shapes the display entity_id.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use sw_coordinator::ListenerId;
use sw_core::{Context, EntityId, EntityIdError, STATE_OFF, STATE_ON, STATE_UNAVAILABLE};
use sw_states::SharedStateStore;
use tokio::sync::Mutex;

use crate::types::{GameId, SharedCoordinator};
use crate::util::{slugify, steam_game};
use crate::{DOMAIN, ICON, UNIT_OF_MEASUREMENT};

/// Binary sensor for one wishlist game
pub struct SteamGameEntity {
    coordinator: SharedCoordinator,
    states: SharedStateStore,
    steam_id: GameId,
    title: String,
    entity_id: EntityId,
    listener: Mutex<Option<ListenerId>>,
}

impl SteamGameEntity {
    /// Create an entity for one game
    ///
    /// The entity_id is derived from the slugified title; a title with no
    /// alphanumeric characters falls back to the numeric game id.
    pub fn new(
        coordinator: SharedCoordinator,
        states: SharedStateStore,
        steam_id: GameId,
        title: impl Into<String>,
    ) -> Result<Arc<Self>, EntityIdError> {
        let title = title.into();
        let slug = slugify(&title);
        let object_id = if slug.is_empty() {
            format!("{DOMAIN}_{steam_id}")
        } else {
            format!("{DOMAIN}_{slug}")
        };

        Ok(Arc::new(Self {
            coordinator,
            states,
            steam_id,
            title,
            entity_id: EntityId::binary_sensor(object_id)?,
            listener: Mutex::new(None),
        }))
    }

    /// Whether the game is currently discounted
    ///
    /// A game that has dropped off the wishlist snapshot reads as off; the
    /// manager retires its entity separately. Empty `subs` means no pricing
    /// yet, which also reads as off.
    pub fn is_on(&self) -> bool {
        self.coordinator
            .data()
            .get(&self.steam_id)
            .map(|record| record.is_on_sale())
            .unwrap_or(false)
    }

    pub fn state(&self) -> &'static str {
        if self.is_on() {
            STATE_ON
        } else {
            STATE_OFF
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// The immutable game id; collision-proof unlike the title slug
    pub fn unique_id(&self) -> &GameId {
        &self.steam_id
    }

    pub fn name(&self) -> &str {
        &self.title
    }

    /// Whether the backing coordinator's last refresh succeeded
    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    /// State attributes: the full normalized record, re-fetched each read
    ///
    /// Empty (bar presentation fields) when the game is absent from the
    /// current snapshot.
    pub fn attributes(&self) -> HashMap<String, Value> {
        let mut attrs: HashMap<String, Value> = self
            .coordinator
            .data()
            .get(&self.steam_id)
            .map(|record| {
                match serde_json::to_value(steam_game(&self.steam_id, record)) {
                    Ok(Value::Object(map)) => map.into_iter().collect(),
                    _ => HashMap::new(),
                }
            })
            .unwrap_or_default();

        attrs.insert("friendly_name".to_string(), json!(self.name()));
        attrs.insert("icon".to_string(), json!(ICON));
        attrs.insert(
            "unit_of_measurement".to_string(),
            json!(UNIT_OF_MEASUREMENT),
        );
        attrs
    }

    /// Derive the current state from the snapshot and write it to the store
    pub fn write_state(&self, context: Context) {
        if !self.available() {
            self.states.set(
                self.entity_id.clone(),
                STATE_UNAVAILABLE,
                HashMap::new(),
                context,
            );
            return;
        }

        self.states
            .set(self.entity_id.clone(), self.state(), self.attributes(), context);
    }

    /// Register with the coordinator and write the initial state
    pub async fn attach(self: &Arc<Self>) {
        let entity = Arc::clone(self);
        let id = self
            .coordinator
            .add_listener(Box::new(move || entity.write_state(Context::new())));
        *self.listener.lock().await = Some(id);
        self.write_state(Context::new());
    }

    /// Deregister from the coordinator; a no-op when never attached
    pub async fn detach(&self) {
        if let Some(id) = self.listener.lock().await.take() {
            self.coordinator.remove_listener(id);
        }
    }
}
