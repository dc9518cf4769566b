//! Entity ID type representing a domain.object_id pair

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for invalid entity IDs
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("entity_id must contain exactly one '.' separator")]
    InvalidFormat,

    #[error("invalid domain {0:?} (lowercase alphanumeric and single underscores only)")]
    InvalidDomain(String),

    #[error("invalid object_id {0:?} (lowercase alphanumeric and underscores only)")]
    InvalidObjectId(String),
}

/// An entity ID such as `sensor.steam_wishlist`
///
/// A domain and an object_id separated by a period. Both parts are lowercase
/// alphanumeric with underscores; neither may start or end with an underscore,
/// and the domain additionally may not contain a double underscore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    domain: String,
    object_id: String,
}

impl EntityId {
    /// Create a new EntityId from domain and object_id parts
    pub fn new(
        domain: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Result<Self, EntityIdError> {
        let domain = domain.into();
        let object_id = object_id.into();

        // Domains reject double underscores, object ids allow them
        if !is_valid_part(&domain) || domain.contains("__") {
            return Err(EntityIdError::InvalidDomain(domain));
        }
        if !is_valid_part(&object_id) {
            return Err(EntityIdError::InvalidObjectId(object_id));
        }

        Ok(Self { domain, object_id })
    }

    /// Shorthand for an id in the `sensor` domain
    pub fn sensor(object_id: impl Into<String>) -> Result<Self, EntityIdError> {
        Self::new(crate::DOMAIN_SENSOR, object_id)
    }

    /// Shorthand for an id in the `binary_sensor` domain
    pub fn binary_sensor(object_id: impl Into<String>) -> Result<Self, EntityIdError> {
        Self::new(crate::DOMAIN_BINARY_SENSOR, object_id)
    }

    /// Get the domain part of the entity ID
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Get the object_id part of the entity ID
    pub fn object_id(&self) -> &str {
        &self.object_id
    }
}

/// Lowercase alphanumeric plus underscore, no leading or trailing underscore
fn is_valid_part(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl FromStr for EntityId {
    type Err = EntityIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((domain, object_id)) if !object_id.contains('.') => {
                Self::new(domain, object_id)
            }
            _ => Err(EntityIdError::InvalidFormat),
        }
    }
}

impl TryFrom<String> for EntityId {
    type Error = EntityIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> String {
        id.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}
