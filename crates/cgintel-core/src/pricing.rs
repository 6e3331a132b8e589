use rust_decimal::{Decimal, RoundingStrategy};

use crate::catalog::PriceTier;

/// Fallback retail price in EUR used by the enrichment sweep.
#[must_use]
pub fn tier_default_price(tier: PriceTier) -> Decimal {
    match tier {
        PriceTier::Budget => Decimal::new(999, 2),
        PriceTier::Mid => Decimal::new(1999, 2),
        PriceTier::Premium => Decimal::new(3499, 2),
        PriceTier::Luxury => Decimal::new(5999, 2),
    }
}

/// Wholesale -> retail multiplier per tier.
#[must_use]
pub fn tier_multiplier(tier: PriceTier) -> Decimal {
    match tier {
        PriceTier::Budget => Decimal::new(25, 1),
        PriceTier::Mid => Decimal::new(30, 1),
        PriceTier::Premium => Decimal::new(35, 1),
        PriceTier::Luxury => Decimal::new(40, 1),
    }
}

/// Estimated gross margin in percent, rounded to one decimal place.
///
/// Retail is derived as `wholesale * tier_multiplier(tier)`. Returns `None`
/// for a non-positive wholesale price.
#[must_use]
pub fn estimated_margin_pct(wholesale: Decimal, tier: PriceTier) -> Option<Decimal> {
    if wholesale <= Decimal::ZERO {
        return None;
    }
    let retail = wholesale * tier_multiplier(tier);
    let margin = (retail - wholesale) / retail * Decimal::ONE_HUNDRED;
    Some(margin.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

/// Convert a price to EUR at fixed rates, rounded to cents.
///
/// Unknown currencies pass through unchanged. Non-positive prices yield
/// `None`.
#[must_use]
pub fn convert_to_eur(price: Decimal, currency: Option<&str>) -> Option<Decimal> {
    if price <= Decimal::ZERO {
        return None;
    }
    let currency = currency
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "EUR".to_string());
    let rate = match currency.as_str() {
        "USD" => Decimal::new(92, 2),
        "GBP" => Decimal::new(117, 2),
        _ => Decimal::ONE,
    };
    Some((price * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
