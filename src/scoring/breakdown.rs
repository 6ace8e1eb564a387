use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::item::FeedItem;
use crate::scoring::engagement::{calculate_components, engagement_score, get_freshness_multiplier};
use crate::scoring::hot_score::{final_score, time_denominator};
use crate::scoring::signals::{extract_signals, SignalSet};
use crate::settings::Scoring;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBreakdown {
    pub raw: f64,
    pub component: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BountyBreakdown {
    pub raw: f64,
    pub component: f64,
    pub urgent: bool,
}

/// Every intermediate quantity of one hot-score computation. Serialized as
/// the stored `breakdown_v2` snapshot and rendered by the inspection CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    pub altmetric: SignalBreakdown,
    pub bounty: BountyBreakdown,
    pub tip: SignalBreakdown,
    pub peer_review: SignalBreakdown,
    pub upvote: SignalBreakdown,
    pub comment: SignalBreakdown,
    pub age_hours: f64,
    pub freshness_multiplier: f64,
    pub engagement_score: f64,
    pub time_denominator: f64,
}

impl ComponentBreakdown {
    pub fn raw_score(&self) -> f64 {
        self.engagement_score / self.time_denominator
    }

    pub fn scaled_score(&self) -> f64 {
        self.raw_score() * 100.0
    }

    pub fn final_score(&self) -> i64 {
        final_score(self.engagement_score, self.time_denominator)
    }
}

/// What-if replacements for raw signal values. `None` means "use the
/// extracted value"; overridden values flow through the exact same math as
/// real ones, so simulated and actual scores are always comparable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationOverrides {
    pub upvotes: Option<i64>,
    pub comments: Option<i64>,
    pub tip_amount: Option<f64>,
    pub bounty_amount: Option<f64>,
    pub urgent_bounty: Option<bool>,
    pub peer_review_count: Option<i64>,
    pub altmetric_score: Option<f64>,
    pub age_hours: Option<f64>,
}

impl SimulationOverrides {
    pub fn is_empty(&self) -> bool {
        *self == SimulationOverrides::default()
    }

    /// Apply the overrides to an extracted signal set. This runs before the
    /// freshness multiplier, so a simulated age also changes the multiplier.
    pub fn apply(&self, signals: &SignalSet) -> SignalSet {
        SignalSet {
            upvotes: self.upvotes.unwrap_or(signals.upvotes),
            comments: self.comments.unwrap_or(signals.comments),
            tip_amount: self.tip_amount.unwrap_or(signals.tip_amount),
            bounty_amount: self.bounty_amount.unwrap_or(signals.bounty_amount),
            has_urgent_bounty: self.urgent_bounty.unwrap_or(signals.has_urgent_bounty),
            peer_review_count: self.peer_review_count.unwrap_or(signals.peer_review_count),
            altmetric_score: self.altmetric_score.unwrap_or(signals.altmetric_score),
            age_hours: self.age_hours.unwrap_or(signals.age_hours),
        }
    }
}

/// Full decomposition of the v2 computation for one entry, optionally with
/// simulated signal values. Read-only; never writes anything back.
pub fn compute_breakdown(
    item: &FeedItem,
    scoring: &Scoring,
    now: DateTime<Utc>,
    overrides: Option<&SimulationOverrides>,
) -> Result<ComponentBreakdown, ScoringError> {
    let mut signals = extract_signals(item, scoring, now)?;
    if let Some(overrides) = overrides {
        signals = overrides.apply(&signals);
    }

    Ok(breakdown_from_signals(&signals, scoring))
}

/// Breakdown math over an already-assembled signal set.
pub fn breakdown_from_signals(signals: &SignalSet, scoring: &Scoring) -> ComponentBreakdown {
    let components = calculate_components(signals, scoring);
    let freshness_multiplier = get_freshness_multiplier(signals.age_hours, scoring);
    let engagement = engagement_score(&components, freshness_multiplier);
    let denominator = time_denominator(signals.age_hours, &scoring.time_decay);

    ComponentBreakdown {
        altmetric: SignalBreakdown {
            raw: signals.altmetric_score,
            component: components.altmetric,
        },
        bounty: BountyBreakdown {
            raw: signals.bounty_amount,
            component: components.bounty,
            urgent: signals.has_urgent_bounty,
        },
        tip: SignalBreakdown {
            raw: signals.tip_amount,
            component: components.tip,
        },
        peer_review: SignalBreakdown {
            raw: signals.peer_review_count as f64,
            component: components.peer_review,
        },
        upvote: SignalBreakdown {
            raw: signals.upvotes as f64,
            component: components.upvote,
        },
        comment: SignalBreakdown {
            raw: signals.comments as f64,
            component: components.comment,
        },
        age_hours: signals.age_hours,
        freshness_multiplier,
        engagement_score: engagement,
        time_denominator: denominator,
    }
}

/// Breakdown for historical inspection: reuse the stored snapshot when one
/// exists and only recompute when absent. Callers that need current numbers
/// (or any simulation) should call `compute_breakdown` directly.
pub fn stored_or_computed(
    item: &FeedItem,
    scoring: &Scoring,
    now: DateTime<Utc>,
) -> Result<ComponentBreakdown, ScoringError> {
    if let Some(stored) = &item.stored_breakdown {
        return Ok(stored.clone());
    }
    compute_breakdown(item, scoring, now, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ContentItem, Metrics, Post};
    use crate::settings::Settings;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn sample_item() -> FeedItem {
        let created = fixed_now() - Duration::hours(30);
        FeedItem {
            id: 11,
            content: Some(ContentItem::Post(Post {
                title: "Inspection target".into(),
                created_date: created,
                bounties: vec![],
                purchases: vec![],
            })),
            metrics: Metrics {
                votes: 25,
                replies: 6,
                altmetric_score: 1.75,
                ..Default::default()
            },
            created_at: created,
            hot_score: 0,
            hot_score_v2: 0,
            stored_breakdown: None,
        }
    }

    #[test]
    fn test_no_overrides_matches_identity_overrides() {
        let scoring = Settings::default().scoring;
        let item = sample_item();
        let now = fixed_now();

        let plain = compute_breakdown(&item, &scoring, now, None).unwrap();

        let identity = SimulationOverrides {
            upvotes: Some(plain.upvote.raw as i64),
            comments: Some(plain.comment.raw as i64),
            tip_amount: Some(plain.tip.raw),
            bounty_amount: Some(plain.bounty.raw),
            urgent_bounty: Some(plain.bounty.urgent),
            peer_review_count: Some(plain.peer_review.raw as i64),
            altmetric_score: Some(plain.altmetric.raw),
            age_hours: Some(plain.age_hours),
        };
        let simulated = compute_breakdown(&item, &scoring, now, Some(&identity)).unwrap();

        assert_eq!(plain, simulated);
    }

    #[test]
    fn test_simulated_age_changes_freshness() {
        let scoring = Settings::default().scoring;
        let item = sample_item();
        let now = fixed_now();

        let actual = compute_breakdown(&item, &scoring, now, None).unwrap();
        assert!((actual.freshness_multiplier - 4.5).abs() < 1e-12);

        let aged = SimulationOverrides {
            age_hours: Some(100.0),
            ..Default::default()
        };
        let simulated = compute_breakdown(&item, &scoring, now, Some(&aged)).unwrap();
        assert!((simulated.freshness_multiplier - 1.0).abs() < 1e-12);
        assert!(simulated.time_denominator > actual.time_denominator);
    }

    #[test]
    fn test_simulated_upvotes_raise_score() {
        let scoring = Settings::default().scoring;
        let item = sample_item();
        let now = fixed_now();

        let actual = compute_breakdown(&item, &scoring, now, None).unwrap();
        let boosted = SimulationOverrides {
            upvotes: Some(500),
            ..Default::default()
        };
        let simulated = compute_breakdown(&item, &scoring, now, Some(&boosted)).unwrap();

        assert!(simulated.final_score() > actual.final_score());
    }

    #[test]
    fn test_missing_item_propagates() {
        let scoring = Settings::default().scoring;
        let mut item = sample_item();
        item.content = None;

        assert!(matches!(
            compute_breakdown(&item, &scoring, fixed_now(), None),
            Err(ScoringError::MissingItem(11))
        ));
    }

    #[test]
    fn test_stored_breakdown_preferred() {
        let scoring = Settings::default().scoring;
        let mut item = sample_item();
        let now = fixed_now();

        let computed = compute_breakdown(&item, &scoring, now, None).unwrap();

        // Stored snapshot is deliberately different from a fresh computation.
        let mut snapshot = computed.clone();
        snapshot.engagement_score += 42.0;
        item.stored_breakdown = Some(snapshot.clone());

        let preferred = stored_or_computed(&item, &scoring, now).unwrap();
        assert_eq!(preferred, snapshot);

        item.stored_breakdown = None;
        let recomputed = stored_or_computed(&item, &scoring, now).unwrap();
        assert_eq!(recomputed, computed);
    }

    #[test]
    fn test_breakdown_json_round_trip() {
        let scoring = Settings::default().scoring;
        let breakdown = compute_breakdown(&sample_item(), &scoring, fixed_now(), None).unwrap();

        let json = serde_json::to_string(&breakdown).unwrap();
        let restored: ComponentBreakdown = serde_json::from_str(&json).unwrap();
        assert_eq!(breakdown, restored);
    }

    #[test]
    fn test_final_score_matches_formula() {
        let scoring = Settings::default().scoring;
        let breakdown = compute_breakdown(&sample_item(), &scoring, fixed_now(), None).unwrap();

        let expected = (breakdown.engagement_score / breakdown.time_denominator * 100.0).round()
            as i64;
        assert_eq!(breakdown.final_score(), expected.max(0));
    }
}
