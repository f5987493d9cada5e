//! Derived comparative views over a result's retailer-offer list.
//!
//! Offer order as produced by the source carries no meaning; everything
//! here is recomputed from scratch.

use chrono::{Datelike, Utc};

use crate::models::{HistoryPoint, RetailerPrice};
use crate::traits::Jitter;

/// Default span of the synthetic value-history series.
pub const DEFAULT_YEARS_BACK: usize = 15;

/// Fallback current price when the source text yields no number.
const UNPARSEABLE_PRICE_FALLBACK: f64 = 50.0;

/// Parse the numeric value out of a free-form price string.
///
/// Strips every character that is not a digit or a decimal point
/// ("£1,299.99" → 1299.99) and parses the rest. Returns `None` when
/// nothing parseable remains.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Keep only offers admissible for ranking: a URL longer than five
/// characters. Relative order is preserved; nothing else is inspected.
pub fn valid_offers(offers: &[RetailerPrice]) -> Vec<RetailerPrice> {
    offers.iter().filter(|o| o.url.len() > 5).cloned().collect()
}

/// Index of the cheapest offer among `offers`, or `None` when no price
/// parses.
///
/// Offers whose price fails to parse are excluded from consideration; they
/// never win by default. Ties keep the first occurrence (stable
/// left-to-right scan).
pub fn cheapest_offer(offers: &[RetailerPrice]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, offer) in offers.iter().enumerate() {
        let Some(price) = parse_price(&offer.price) else {
            continue;
        };
        match best {
            Some((_, min)) if price >= min => {}
            _ => best = Some((idx, price)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Synthesize a long-run value-history series from the current price text,
/// oldest year first.
///
/// Each historical point is `current × (1 − 0.02·years_ago) × factor`,
/// with `factor` drawn from the injected jitter; the most recent point is
/// forced to the parsed current price with no randomness. An unparseable
/// current price falls back to 50.
///
/// This is a display affordance, not a real historical record: only the
/// distribution is reproducible, never individual values (outside tests
/// with a deterministic jitter).
pub fn synthesize_value_history(
    current_price: &str,
    years_back: usize,
    jitter: &mut impl Jitter,
) -> Vec<HistoryPoint> {
    let current = parse_price(current_price).unwrap_or(UNPARSEABLE_PRICE_FALLBACK);
    let current_year = Utc::now().year();

    let mut history = Vec::with_capacity(years_back);
    for years_ago in (0..years_back).rev() {
        let price = if years_ago == 0 {
            current
        } else {
            let decay = 1.0 - 0.02 * years_ago as f64;
            current * decay * jitter.factor()
        };
        history.push(HistoryPoint {
            year: current_year - years_ago as i32,
            price: round2(price),
        });
    }
    history
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
