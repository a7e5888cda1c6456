//! Cashback offers advertised at checkout.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A percentage cashback with a cap and a minimum order value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashbackOffer {
    pub code: String,
    #[serde(default)]
    pub title: String,
    /// Percent of the order total, e.g. `5` for 5%.
    pub percent: Decimal,
    /// Upper bound on the cashback amount, if any.
    #[serde(default)]
    pub max_cashback: Option<Decimal>,
    #[serde(default)]
    pub min_order_value: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl CashbackOffer {
    /// Whether the offer applies to an order of `total`.
    #[must_use]
    pub fn applies_to(&self, total: Decimal) -> bool {
        self.active && total > Decimal::ZERO && total >= self.min_order_value
    }
}

/// Cashback earned on `total`, rounded to paise.
///
/// Zero when the offer is inactive or `total` is below the minimum order
/// value; never more than `max_cashback`.
#[must_use]
pub fn cashback_for(offer: &CashbackOffer, total: Decimal) -> Decimal {
    if !offer.applies_to(total) || offer.percent <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let raw = (total * offer.percent / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    offer.max_cashback.map_or(raw, |cap| raw.min(cap.max(Decimal::ZERO)))
}

/// The applicable offer worth the most on `total`, with its cashback.
///
/// Ties go to the offer listed first.
#[must_use]
pub fn best_offer(offers: &[CashbackOffer], total: Decimal) -> Option<(&CashbackOffer, Decimal)> {
    offers
        .iter()
        .map(|offer| (offer, cashback_for(offer, total)))
        .filter(|(_, amount)| *amount > Decimal::ZERO)
        .fold(None, |best, candidate| match best {
            Some((_, best_amount)) if best_amount >= candidate.1 => best,
            _ => Some(candidate),
        })
}
