use chrono::{DateTime, Utc};

use crate::error::ScoringError;
use crate::item::FeedItem;
use crate::scoring::breakdown::compute_breakdown;
use crate::settings::{Scoring, TimeDecay};

/// Gravity decay denominator: `(age_hours + base_hours) ^ gravity`.
/// `base_hours > 0` is enforced at config load, so the base of the power is
/// always positive and the denominator never reaches zero.
pub fn time_denominator(age_hours: f64, decay: &TimeDecay) -> f64 {
    (age_hours + decay.base_hours).powf(decay.gravity)
}

/// Final integer score from the engagement score and decay denominator.
/// The x100 scaling preserves fractional precision before rounding.
pub fn final_score(engagement_score: f64, time_denominator: f64) -> i64 {
    let raw = engagement_score / time_denominator;
    let scaled = raw * 100.0;
    (scaled.round() as i64).max(0)
}

/// Production entry point: the current (v2) hot score for a feed entry.
pub fn calculate_hot_score(
    item: &FeedItem,
    scoring: &Scoring,
    now: DateTime<Utc>,
) -> Result<i64, ScoringError> {
    let breakdown = compute_breakdown(item, scoring, now, None)?;
    Ok(breakdown.final_score())
}
