//! The retired v1 ranking formula, kept only so operators can compare old
//! and new scores during the migration window. Frozen: quirks of the
//! original are reproduced as-is, including the purchase boost term that is
//! computed but never added into the final sum.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use crate::error::ScoringError;
use crate::item::FeedItem;

const ALGO_START_UNIX: i64 = 1_546_329_600;
const TIME_DIV: f64 = 3_600_000.0;
const HOUR_SECONDS: f64 = 86_400.0;
const DATE_BOOST: f64 = 10.0;

/// Identity below 1, shifted natural log above. Keeps small inputs linear
/// so a handful of votes still separates two otherwise-identical entries.
fn piecewise_log(x: f64) -> f64 {
    if x <= 1.0 {
        x
    } else {
        1.0 + x.ln()
    }
}

fn midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

/// v1 hot score. Deprecated, comparison-only; do not use for ranking new
/// entries. The final float is truncated toward zero, not rounded, exactly
/// as the original stored it.
pub fn calculate_hot_score_legacy(
    item: &FeedItem,
    now: DateTime<Utc>,
) -> Result<i64, ScoringError> {
    let content = item
        .content
        .as_ref()
        .ok_or(ScoringError::MissingItem(item.id))?;

    let created = content.created_date();
    let timeframe = midnight(now) - chrono::Duration::days(2);

    // Entries newer than the two-day window get their upload date pinned to
    // the window edge, keeping only the time of day.
    let uploaded = if created > timeframe {
        Utc.from_utc_datetime(&timeframe.date_naive().and_time(created.time()))
    } else {
        created
    };

    // Only aggregate vote counts survive in the feed store, so the net vote
    // total stands in for the per-vote count and the upload date stands in
    // for the average vote timestamp.
    let net_votes = item.metrics.votes;
    let num_votes = net_votes.max(0);
    let vote_avg_epoch = if num_votes > 0 {
        created.timestamp() as f64
    } else {
        timeframe.timestamp() as f64
    };
    let vote_avg = (vote_avg_epoch - ALGO_START_UNIX as f64).max(0.0) / TIME_DIV;

    let base_score = piecewise_log(net_votes as f64 + 1.0);
    let mut uploaded_date_score = uploaded.timestamp() as f64 / TIME_DIV;
    let vote_score = piecewise_log(num_votes as f64 + 1.0);
    let discussion_score = piecewise_log(item.metrics.replies as f64 + 1.0);

    if created > timeframe {
        let delta = created - timeframe;
        uploaded_date_score +=
            piecewise_log(delta.num_seconds() as f64 / HOUR_SECONDS) * DATE_BOOST;
    } else {
        let delta = timeframe - created;
        uploaded_date_score -=
            piecewise_log(delta.num_seconds() as f64 / HOUR_SECONDS + 1.0) * DATE_BOOST;
    }

    // v1 shipped with this boost term computed and then never summed. Parity
    // with historical rankings means leaving it out here too.
    let boost_amount: f64 = content.purchases().iter().map(|p| p.amount).sum();
    let _boost_score = piecewise_log(boost_amount + 1.0);

    let hot_score =
        (base_score + uploaded_date_score + vote_avg + vote_score + discussion_score) * 1000.0;

    Ok(hot_score as i64)
}
