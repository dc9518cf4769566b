//! Steam wishlist integration
//!
//! Exposes a user's Steam wishlist as platform entities: one aggregate sensor
//! (`sensor.steam_wishlist`, state = number of wishlist games currently on
//! sale) and one binary sensor per game (on iff the game is discounted).
//!
//! The integration is a thin adapter over an [`UpdateCoordinator`] holding the
//! latest polled wishlist snapshot. Entities never cache anything themselves:
//! every state read is derived from the coordinator's current snapshot, and the
//! coordinator's listener list drives state writes into the [`StateStore`].
//! Fetching and scheduling of polls belong to the caller.
//!
//! [`UpdateCoordinator`]: sw_coordinator::UpdateCoordinator
//! [`StateStore`]: sw_states::StateStore

mod binary_sensor;
mod manager;
mod sensor;
pub mod types;
pub mod util;

pub use binary_sensor::SteamGameEntity;
pub use manager::SteamWishlistManager;
pub use sensor::SteamWishlistEntity;
pub use types::{GameId, RawGameRecord, SteamGame, SteamWishlistCoordinator, WishlistSnapshot};

use std::sync::Arc;
use sw_core::EntityIdError;
use sw_states::SharedStateStore;

/// Integration domain
pub const DOMAIN: &str = "steam_wishlist";

/// Icon shared by all wishlist entities
pub const ICON: &str = "mdi:steam";

/// Unit of measurement reported by wishlist entities
pub const UNIT_OF_MEASUREMENT: &str = "on sale";

/// Set up the integration against an existing coordinator and state store
///
/// Attaches the aggregate sensor, subscribes the entity manager to the
/// coordinator, and runs one initial sync so per-game entities exist for
/// everything already in the snapshot.
pub async fn setup(
    coordinator: Arc<SteamWishlistCoordinator>,
    states: SharedStateStore,
) -> Result<Arc<SteamWishlistManager>, EntityIdError> {
    let manager = SteamWishlistManager::new(coordinator, states)?;
    manager.start().await;
    Ok(manager)
}
