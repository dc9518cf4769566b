//! Wire and normalized types for wishlist data

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use sw_coordinator::UpdateCoordinator;

/// Immutable Steam app id, the uniqueness key for per-game entities
///
/// The wishlist API keys games by a numeric string ("10", "620"). Display
/// titles can change and collide once slugified; this id cannot, so it is what
/// per-game entities report as their unique id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A pricing sub-record inside a raw game record
///
/// The first sub's discount percentage is the authoritative sale signal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubRecord {
    /// Discount percentage, 0 when not on sale
    #[serde(default)]
    pub discount_pct: u8,

    /// Discounted price in cents, when the API supplies one
    #[serde(default, rename = "price", skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<u64>,
}

/// One game as delivered by the wishlist poll, untouched by the adapter
///
/// Every field except the title is optional on the wire; deserialization must
/// tolerate whatever the API leaves out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGameRecord {
    /// Display title
    #[serde(default)]
    pub title: String,

    /// Capsule/box art image URL
    #[serde(default, alias = "capsule", skip_serializing_if = "Option::is_none")]
    pub box_art_url: Option<String>,

    /// Advertised sale price as a display string, e.g. "5.00"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,

    /// Review summary, e.g. "Overwhelmingly Positive"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_desc: Option<String>,

    /// Percentage of positive reviews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_percent: Option<u32>,

    /// Total review count as delivered (a string on the wire)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews_total: Option<String>,

    /// Pricing sub-records; may be empty for unreleased games
    #[serde(default)]
    pub subs: Vec<SubRecord>,
}

impl RawGameRecord {
    /// Discount percentage from the first sub; 0 when there are no subs
    pub fn discount_pct(&self) -> u8 {
        self.subs.first().map(|sub| sub.discount_pct).unwrap_or(0)
    }

    /// Whether the game is currently discounted
    pub fn is_on_sale(&self) -> bool {
        self.discount_pct() > 0
    }
}

/// The flattened projection of a game exposed as entity attributes
///
/// Produced by [`util::steam_game`](crate::util::steam_game) on every read;
/// never cached. `sale_price` is Some iff the game is discounted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteamGame {
    pub steam_id: GameId,
    pub title: String,
    pub box_art_url: Option<String>,
    pub normal_price: Option<String>,
    pub sale_price: Option<String>,
    pub percent_off: u8,
    pub review_desc: Option<String>,
    pub reviews_percent: Option<u32>,
    pub reviews_total: Option<String>,
}

/// One poll's worth of wishlist data, keyed by game id in insertion order
///
/// Replaced wholesale each poll cycle; iteration order follows the poll, not
/// any ordering stable across polls.
pub type WishlistSnapshot = IndexMap<GameId, RawGameRecord>;

/// The coordinator type the wishlist entities subscribe to
pub type SteamWishlistCoordinator = UpdateCoordinator<WishlistSnapshot>;

/// Shared handle to the wishlist coordinator
pub type SharedCoordinator = Arc<SteamWishlistCoordinator>;
