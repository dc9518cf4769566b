//! Normalization helpers: slugify, price formatting, record flattening

use crate::types::{GameId, RawGameRecord, SteamGame};

/// Slugify a display title for use in an entity object id
///
/// Lowercases, maps every run of non-alphanumeric characters to a single
/// underscore, and trims leading/trailing underscores. "Game A" -> "game_a".
/// May return an empty string for titles with no alphanumeric characters;
/// callers fall back to the game id in that case.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Format a price in cents as a display string, e.g. 500 -> "5.00"
pub fn format_price(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Flatten a raw wishlist record into the normalized projection
///
/// Pure; recomputed on every entity read. Tolerates empty `subs` and any
/// missing optional field. The sale price prefers the first sub's discounted
/// price and falls back to the record's advertised display price; the normal
/// price is back-computed from the discounted price and percentage.
pub fn steam_game(steam_id: &GameId, record: &RawGameRecord) -> SteamGame {
    let percent_off = record.discount_pct();
    let price_cents = record.subs.first().and_then(|sub| sub.price_cents);

    let sale_price = if percent_off > 0 {
        price_cents
            .map(format_price)
            .or_else(|| record.sale_price.clone())
    } else {
        None
    };

    let normal_price = price_cents.and_then(|cents| {
        if percent_off > 0 && percent_off < 100 {
            // Extreme wire prices would overflow the scale-up; drop the
            // derived field rather than panic
            cents
                .checked_mul(100)
                .map(|scaled| format_price(scaled / (100 - u64::from(percent_off))))
        } else {
            Some(format_price(cents))
        }
    });

    SteamGame {
        steam_id: steam_id.clone(),
        title: record.title.clone(),
        box_art_url: record.box_art_url.clone(),
        normal_price,
        sale_price,
        percent_off,
        review_desc: record.review_desc.clone(),
        reviews_percent: record.reviews_percent,
        reviews_total: record.reviews_total.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawGameRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Game A"), "game_a");
        assert_eq!(slugify("Portal 2"), "portal_2");
        assert_eq!(slugify("  S.T.A.L.K.E.R.: Call of Pripyat "), "s_t_a_l_k_e_r_call_of_pripyat");
        assert_eq!(slugify("DOOM (1993)"), "doom_1993");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(500), "5.00");
        assert_eq!(format_price(989), "9.89");
        assert_eq!(format_price(5), "0.05");
        assert_eq!(format_price(10000), "100.00");
    }

    #[test]
    fn test_steam_game_discounted() {
        let id = GameId::from("620");
        let game = steam_game(
            &id,
            &record(json!({
                "title": "Portal 2",
                "subs": [{"discount_pct": 85, "price": 148}]
            })),
        );

        assert_eq!(game.steam_id, id);
        assert_eq!(game.percent_off, 85);
        assert_eq!(game.sale_price.as_deref(), Some("1.48"));
        // 148 / 0.15 rounds down to 986 cents
        assert_eq!(game.normal_price.as_deref(), Some("9.86"));
    }

    #[test]
    fn test_steam_game_full_price() {
        let game = steam_game(
            &GameId::from("620"),
            &record(json!({
                "title": "Portal 2",
                "subs": [{"discount_pct": 0, "price": 989}]
            })),
        );

        assert_eq!(game.percent_off, 0);
        assert_eq!(game.sale_price, None);
        assert_eq!(game.normal_price.as_deref(), Some("9.89"));
    }

    #[test]
    fn test_steam_game_sale_price_fallback_to_advertised() {
        // Sub carries the percentage but no price; the record-level display
        // price is all we have
        let game = steam_game(
            &GameId::from("10"),
            &record(json!({
                "title": "Game A",
                "sale_price": "5.00",
                "subs": [{"discount_pct": 20}]
            })),
        );

        assert_eq!(game.sale_price.as_deref(), Some("5.00"));
        assert_eq!(game.normal_price, None);
    }

    #[test]
    fn test_steam_game_extreme_price_does_not_overflow() {
        let game = steam_game(
            &GameId::from("10"),
            &record(json!({
                "title": "Game A",
                "subs": [{"discount_pct": 50, "price": u64::MAX}]
            })),
        );

        // The back-computed normal price is dropped, the rest survives
        assert_eq!(game.normal_price, None);
        assert_eq!(game.percent_off, 50);
        assert_eq!(game.sale_price.as_deref(), Some(format_price(u64::MAX).as_str()));
    }

    #[test]
    fn test_steam_game_empty_subs() {
        let game = steam_game(
            &GameId::from("10"),
            &record(json!({"title": "Unreleased"})),
        );

        assert_eq!(game.percent_off, 0);
        assert_eq!(game.sale_price, None);
        assert_eq!(game.normal_price, None);
    }
}
