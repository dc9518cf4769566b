//! Core types for the wishlist platform surface
//!
//! This crate provides the fundamental types the integration writes through:
//! EntityId, State, and Context. They are deliberately small; everything
//! Steam-specific lives in the `steam-wishlist` crate.

mod context;
mod entity_id;
mod state;

pub use context::Context;
pub use entity_id::{EntityId, EntityIdError};
pub use state::State;

/// State value written for an entity whose backing data source is down
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// State values for binary sensors
pub const STATE_ON: &str = "on";
pub const STATE_OFF: &str = "off";

/// Entity domain for the aggregate wishlist sensor
pub const DOMAIN_SENSOR: &str = "sensor";

/// Entity domain for per-game sale sensors
pub const DOMAIN_BINARY_SENSOR: &str = "binary_sensor";
