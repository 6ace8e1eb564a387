use crate::scoring::signals::SignalSet;
use crate::settings::{Scoring, SignalWeight};

/// Boost applied to the engagement score while an item is inside the
/// freshness window; 1.0 once it ages out. The curve never returns zero or a
/// negative value (validated at config load), so it can only amplify, never
/// erase, engagement.
pub fn get_freshness_multiplier(age_hours: f64, scoring: &Scoring) -> f64 {
    if age_hours < scoring.freshness.window_hours {
        scoring.freshness.multiplier
    } else {
        1.0
    }
}

/// Weighted log contribution of one raw signal. The `+ 1` keeps a zero
/// signal at exactly zero contribution and keeps the log defined.
pub fn signal_component(raw: f64, weight: &SignalWeight) -> f64 {
    (raw + 1.0).log(weight.log_base) * weight.weight
}

/// Bounty contribution, with the urgency multiplier applied when any open
/// bounty is flagged urgent.
pub fn bounty_component(raw: f64, urgent: bool, weight: &SignalWeight) -> f64 {
    let multiplier = if urgent { weight.urgency_multiplier } else { 1.0 };
    signal_component(raw, weight) * multiplier
}

/// Per-signal weighted contributions. This is the single place where signal
/// weights combine; tuning the algorithm means editing the config, not this
/// module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Components {
    pub altmetric: f64,
    pub bounty: f64,
    pub tip: f64,
    pub peer_review: f64,
    pub upvote: f64,
    pub comment: f64,
}

impl Components {
    pub fn sum(&self) -> f64 {
        self.altmetric + self.bounty + self.tip + self.peer_review + self.upvote + self.comment
    }
}

pub fn calculate_components(signals: &SignalSet, scoring: &Scoring) -> Components {
    let weights = &scoring.signals;

    Components {
        altmetric: signal_component(signals.altmetric_score, &weights.altmetric),
        bounty: bounty_component(
            signals.bounty_amount,
            signals.has_urgent_bounty,
            &weights.bounty,
        ),
        tip: signal_component(signals.tip_amount, &weights.tip),
        peer_review: signal_component(signals.peer_review_count as f64, &weights.peer_review),
        upvote: signal_component(signals.upvotes as f64, &weights.upvote),
        comment: signal_component(signals.comments as f64, &weights.comment),
    }
}

/// Freshness-weighted sum of all signal contributions.
pub fn engagement_score(components: &Components, freshness_multiplier: f64) -> f64 {
    components.sum() * freshness_multiplier
}
