//! Aggregate wishlist sensor
//!
//! `sensor.steam_wishlist`: state is the number of wishlist games currently on
//! sale, with the full list of on-sale games as an attribute.

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use sw_coordinator::ListenerId;
use sw_core::{Context, EntityId, EntityIdError, STATE_UNAVAILABLE};
use sw_states::SharedStateStore;
use tokio::sync::Mutex;

use crate::types::{SharedCoordinator, SteamGame};
use crate::util::steam_game;
use crate::{ICON, UNIT_OF_MEASUREMENT};

/// Sensor over the whole wishlist
///
/// Stateless beyond its coordinator reference: every read derives from the
/// coordinator's current snapshot.
pub struct SteamWishlistEntity {
    coordinator: SharedCoordinator,
    states: SharedStateStore,
    entity_id: EntityId,
    listener: Mutex<Option<ListenerId>>,
}

impl SteamWishlistEntity {
    pub fn new(
        coordinator: SharedCoordinator,
        states: SharedStateStore,
    ) -> Result<Arc<Self>, EntityIdError> {
        Ok(Arc::new(Self {
            coordinator,
            states,
            entity_id: EntityId::sensor(crate::DOMAIN)?,
            listener: Mutex::new(None),
        }))
    }

    /// All games in the current snapshot, normalized, in snapshot order
    pub fn games(&self) -> Vec<SteamGame> {
        self.coordinator
            .data()
            .iter()
            .map(|(game_id, record)| steam_game(game_id, record))
            .collect()
    }

    /// The subset of games with a non-empty sale price
    pub fn on_sale(&self) -> Vec<SteamGame> {
        self.games()
            .into_iter()
            .filter(|game| game.sale_price.is_some())
            .collect()
    }

    /// Number of games currently on sale
    pub fn state(&self) -> usize {
        self.on_sale().len()
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn name(&self) -> &str {
        "STEAM Wishlist"
    }

    /// Whether the backing coordinator's last refresh succeeded
    pub fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    /// State attributes: the on-sale list plus presentation fields
    pub fn attributes(&self) -> HashMap<String, serde_json::Value> {
        let mut attrs = HashMap::new();
        attrs.insert("on_sale".to_string(), json!(self.on_sale()));
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

        self.states.set(
            self.entity_id.clone(),
            self.state().to_string(),
            self.attributes(),
            context,
        );
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SteamWishlistCoordinator, WishlistSnapshot};
    use serde_json::json;
    use sw_states::StateStore;

    fn snapshot(value: serde_json::Value) -> WishlistSnapshot {
        serde_json::from_value(value).unwrap()
    }

    fn entity_for(value: serde_json::Value) -> Arc<SteamWishlistEntity> {
        let coordinator = Arc::new(SteamWishlistCoordinator::new(snapshot(value)));
        SteamWishlistEntity::new(coordinator, Arc::new(StateStore::new())).unwrap()
    }

    #[test]
    fn test_state_counts_on_sale_games() {
        let entity = entity_for(json!({
            "620": {"title": "Portal 2", "subs": [{"discount_pct": 85, "price": 148}]},
            "10": {"title": "Counter-Strike", "subs": [{"discount_pct": 0, "price": 819}]},
            "400": {"title": "Portal", "subs": [{"discount_pct": 50, "price": 499}]}
        }));

        assert_eq!(entity.games().len(), 3);
        assert_eq!(entity.state(), 2);
        let on_sale = entity.on_sale();
        assert_eq!(on_sale.len(), 2);
        assert!(on_sale.iter().all(|g| g.sale_price.is_some()));
    }

    #[test]
    fn test_games_follow_snapshot_order() {
        let entity = entity_for(json!({
            "620": {"title": "Portal 2"},
            "10": {"title": "Counter-Strike"}
        }));

        let titles: Vec<String> = entity.games().into_iter().map(|g| g.title).collect();
        assert_eq!(titles, vec!["Portal 2", "Counter-Strike"]);
    }

    #[test]
    fn test_empty_wishlist() {
        let entity = entity_for(json!({}));
        assert_eq!(entity.state(), 0);
        assert!(entity.games().is_empty());
    }

    #[tokio::test]
    async fn test_attach_writes_state_and_tracks_updates() {
        let coordinator = Arc::new(SteamWishlistCoordinator::new(snapshot(json!({}))));
        let states = Arc::new(StateStore::new());
        let entity =
            SteamWishlistEntity::new(coordinator.clone(), states.clone()).unwrap();

        entity.attach().await;
        assert_eq!(coordinator.listener_count(), 1);
        assert!(states.is_state(entity.entity_id(), "0"));

        coordinator.set_data(snapshot(json!({
            "400": {"title": "Portal", "subs": [{"discount_pct": 50, "price": 499}]}
        })));
        assert!(states.is_state(entity.entity_id(), "1"));

        let stored = states.get(entity.entity_id()).unwrap();
        let on_sale: Vec<SteamGame> = stored.attribute("on_sale").unwrap();
        assert_eq!(on_sale.len(), 1);
        assert_eq!(on_sale[0].title, "Portal");

        entity.detach().await;
        assert_eq!(coordinator.listener_count(), 0);
        // Detaching again is a no-op
        entity.detach().await;
    }

    #[tokio::test]
    async fn test_unavailable_after_failed_refresh() {
        let coordinator = Arc::new(SteamWishlistCoordinator::new(snapshot(json!({}))));
        let states = Arc::new(StateStore::new());
        let entity =
            SteamWishlistEntity::new(coordinator.clone(), states.clone()).unwrap();
        entity.attach().await;

        let result = coordinator
            .refresh_with(|| async { Err::<WishlistSnapshot, _>("store down") })
            .await;
        assert!(result.is_err());
        assert!(states.is_state(entity.entity_id(), "unavailable"));

        // A later successful poll recovers
        coordinator.set_data(snapshot(json!({})));
        assert!(states.is_state(entity.entity_id(), "0"));
    }
}
