//! Effective price resolution for products with optional offers.
//!
//! Every price shown anywhere (cards, detail pages, cart lines, admin
//! tables) goes through [`resolve_price`] so the offer rules apply exactly
//! once, in one place.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::catalog::Offer;
use crate::types::Money;

/// Resolved display pricing for one product at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    /// Price actually charged per unit.
    pub effective_price: Money,
    /// True when a currently-active offer determined `effective_price`.
    pub has_offer: bool,
    /// Advertised discount, rounded to the nearest whole percent.
    pub discount_percent: Option<u8>,
    /// Amount saved per unit versus the list price.
    pub savings: Option<Money>,
}

impl PriceQuote {
    /// Quote at the plain list price.
    const fn list(price: Money) -> Self {
        Self {
            effective_price: price,
            has_offer: false,
            discount_percent: None,
            savings: None,
        }
    }
}

/// Resolve the price one unit sells for at `now`.
///
/// The offer applies only while its lifecycle classifies as active;
/// scheduled, expired and deactivated offers fall back to the list price.
/// An offer whose price is not strictly below the list price is malformed
/// (the Data API rejects those at creation) and is ignored with a warning
/// rather than trusted.
#[must_use]
pub fn resolve_price(price: Money, offer: Option<&Offer>, now: DateTime<Utc>) -> PriceQuote {
    let Some(offer) = offer else {
        return PriceQuote::list(price);
    };
    if !offer.status_at(now).is_current() {
        return PriceQuote::list(price);
    }
    if offer.offer_price >= price {
        tracing::warn!(
            offer_id = %offer.id,
            product_id = %offer.product_id,
            "offer price is not below the list price, ignoring offer"
        );
        return PriceQuote::list(price);
    }

    let discount = offer
        .percentage_discount
        .or_else(|| discount_percent(price, offer.offer_price));

    PriceQuote {
        effective_price: offer.offer_price,
        has_offer: true,
        discount_percent: discount,
        savings: Some(price.saturating_sub(offer.offer_price)),
    }
}

/// `round((1 - offer / list) * 100)` to the nearest whole percent.
///
/// `None` when the offer price is not strictly below the list price.
/// Listings use this for scheduled and expired offers too, where
/// [`resolve_price`] would fall back to the plain list price.
#[must_use]
pub fn discount_percent(price: Money, offer_price: Money) -> Option<u8> {
    if price.is_zero() || offer_price >= price {
        return None;
    }
    let ratio = offer_price.amount() / price.amount();
    let percent = (Decimal::ONE - ratio) * Decimal::from(100);
    percent
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u8()
}
