//! State type representing an entity's current state

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Context, EntityId, STATE_UNAVAILABLE};

/// The state of an entity at a point in time
///
/// Carries the state value (always a string, e.g. "on" or "3"), the attribute
/// map, and timestamps for when the value last changed and was last written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    /// The entity this state belongs to
    pub entity_id: EntityId,

    /// The state value (e.g., "on", "off", "3", "unavailable")
    pub state: String,

    /// Additional attributes associated with the state
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,

    /// When the state value last changed
    pub last_changed: DateTime<Utc>,

    /// When the state was last written, even if the value did not change
    pub last_updated: DateTime<Utc>,

    /// Context of the write that produced this state
    pub context: Context,
}

impl State {
    /// Create a new state stamped with the current time
    pub fn new(
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: HashMap<String, serde_json::Value>,
        context: Context,
    ) -> Self {
        let now = Utc::now();
        Self {
            entity_id,
            state: state.into(),
            attributes,
            last_changed: now,
            last_updated: now,
            context,
        }
    }

    /// Create an updated state, preserving last_changed when the value is the same
    pub fn with_update(
        &self,
        new_state: impl Into<String>,
        new_attributes: HashMap<String, serde_json::Value>,
        context: Context,
    ) -> Self {
        let now = Utc::now();
        let new_state = new_state.into();
        let changed = self.state != new_state;

        Self {
            entity_id: self.entity_id.clone(),
            state: new_state,
            attributes: new_attributes,
            last_changed: if changed { now } else { self.last_changed },
            last_updated: now,
            context,
        }
    }

    /// Whether the state value marks the entity as unavailable
    pub fn is_unavailable(&self) -> bool {
        self.state == STATE_UNAVAILABLE
    }

    /// Get an attribute value by key, deserialized into T
    pub fn attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        // Timestamps and context are not compared
        self.entity_id == other.entity_id
            && self.state == other.state
            && self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sensor_state(value: &str) -> State {
        State::new(
            EntityId::sensor("steam_wishlist").unwrap(),
            value,
            HashMap::new(),
            Context::new(),
        )
    }

    #[test]
    fn test_with_update_preserves_last_changed_on_same_value() {
        let first = sensor_state("2");
        let second = first.with_update("2", HashMap::new(), Context::new());
        assert_eq!(second.last_changed, first.last_changed);
        assert!(second.last_updated >= first.last_updated);
    }

    #[test]
    fn test_with_update_bumps_last_changed_on_new_value() {
        let first = sensor_state("2");
        let second = first.with_update("3", HashMap::new(), Context::new());
        assert!(second.last_changed >= first.last_changed);
        assert_eq!(second.state, "3");
    }

    #[test]
    fn test_attribute_lookup() {
        let mut attrs = HashMap::new();
        attrs.insert("unit_of_measurement".to_string(), json!("on sale"));
        let state = State::new(
            EntityId::sensor("steam_wishlist").unwrap(),
            "0",
            attrs,
            Context::new(),
        );
        assert_eq!(
            state.attribute::<String>("unit_of_measurement").as_deref(),
            Some("on sale")
        );
        assert_eq!(state.attribute::<String>("missing"), None);
    }

    #[test]
    fn test_unavailable() {
        assert!(sensor_state(STATE_UNAVAILABLE).is_unavailable());
        assert!(!sensor_state("0").is_unavailable());
    }
}
