use chrono::{DateTime, Duration, Utc};

use crate::error::ScoringError;
use crate::item::{BountyStatus, ContentItem, FeedItem};
use crate::settings::Scoring;

/// Raw signal values extracted from one feed entry. Computed fresh on every
/// scoring call; never cached here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSet {
    pub upvotes: i64,
    pub comments: i64,
    pub tip_amount: f64,
    pub bounty_amount: f64,
    pub has_urgent_bounty: bool,
    pub peer_review_count: i64,
    pub altmetric_score: f64,
    pub age_hours: f64,
}

/// Extract every raw signal for an entry. Fails only when the entry has no
/// resolvable content snapshot; missing related data inside a valid snapshot
/// degrades to that signal's zero value.
pub fn extract_signals(
    item: &FeedItem,
    scoring: &Scoring,
    now: DateTime<Utc>,
) -> Result<SignalSet, ScoringError> {
    let content = item
        .content
        .as_ref()
        .ok_or(ScoringError::MissingItem(item.id))?;

    let (bounty_amount, has_urgent_bounty) = total_bounty_amount(item, content, scoring, now);

    Ok(SignalSet {
        upvotes: total_upvotes(item),
        comments: comment_count(item),
        tip_amount: total_tip_amount(item, content),
        bounty_amount,
        has_urgent_bounty,
        peer_review_count: peer_review_count(item),
        altmetric_score: altmetric_score(item),
        age_hours: age_hours(content, scoring, now),
    })
}

/// Net document votes plus rolled-up comment votes. Negative net totals are
/// clamped to zero so the log transform downstream stays defined; a heavily
/// downvoted item scores like an unvoted one.
pub fn total_upvotes(item: &FeedItem) -> i64 {
    (item.metrics.votes + item.metrics.comment_votes).max(0)
}

/// Replies minus peer reviews: reviews arrive threaded as replies and are
/// counted separately, so they must not be double counted here.
pub fn comment_count(item: &FeedItem) -> i64 {
    (item.metrics.replies - item.metrics.review_metrics.count).max(0)
}

/// Tips/boosts on the document, rolled-up comment tips, and any positive
/// fundraise total (additive, not exclusive).
pub fn total_tip_amount(item: &FeedItem, content: &ContentItem) -> f64 {
    let purchases: f64 = content.purchases().iter().map(|p| p.amount.max(0.0)).sum();
    let mut total = purchases + item.metrics.comment_tips.max(0.0);

    if let Some(fundraise) = content.fundraise() {
        let raised = fundraise.amount();
        if raised > 0.0 {
            total += raised;
        }
    }

    total
}

/// Sum of OPEN bounty amounts, plus whether any of them is urgent: created
/// within the urgency window, or expiring within it. The expiration check
/// only applies when an expiration date is present.
pub fn total_bounty_amount(
    item: &FeedItem,
    content: &ContentItem,
    scoring: &Scoring,
    now: DateTime<Utc>,
) -> (f64, bool) {
    let window = Duration::hours(scoring.urgency.bounty_hours);

    let mut total = 0.0;
    let mut urgent = false;

    for bounty in content.bounties() {
        if bounty.status != BountyStatus::Open {
            continue;
        }
        total += bounty.amount.max(0.0);

        let created = bounty.created_date.unwrap_or(item.created_at);
        if now - created < window {
            urgent = true;
        }
        if let Some(expiration) = bounty.expiration_date {
            if expiration - now < window {
                urgent = true;
            }
        }
    }

    (total, urgent)
}

pub fn peer_review_count(item: &FeedItem) -> i64 {
    item.metrics.review_metrics.count.max(0)
}

pub fn altmetric_score(item: &FeedItem) -> f64 {
    item.metrics.altmetric_score.max(0.0)
}

/// Hours since the content's creation date, clamped at zero against clock
/// skew. Grants and proposals whose deadline falls inside the configured
/// urgency window are re-aged relative to that deadline so they surface
/// while it approaches.
pub fn age_hours(content: &ContentItem, scoring: &Scoring, now: DateTime<Utc>) -> f64 {
    if let Some(deadline) = content.deadline() {
        let window_days = match content {
            ContentItem::Grant(_) => scoring.urgency.grant_deadline_days,
            _ => scoring.urgency.fundraise_deadline_days,
        };
        let window = Duration::days(window_days);
        let to_deadline = deadline - now;

        if to_deadline > Duration::zero() && to_deadline < window {
            let adjusted = now - deadline + window;
            return hours(adjusted);
        }
    }

    hours(now - content.created_date())
}

fn hours(delta: Duration) -> f64 {
    (delta.num_seconds() as f64 / 3600.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Bounty, Grant, Metrics, Post, ReviewMetrics};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn post_item(metrics: Metrics, age_hours: i64) -> FeedItem {
        let created = fixed_now() - Duration::hours(age_hours);
        FeedItem {
            id: 1,
            content: Some(ContentItem::Post(Post {
                title: "Test post".into(),
                created_date: created,
                bounties: vec![],
                purchases: vec![],
            })),
            metrics,
            created_at: created,
            hot_score: 0,
            hot_score_v2: 0,
            stored_breakdown: None,
        }
    }

    #[test]
    fn test_missing_content_is_an_error() {
        let mut item = post_item(Metrics::default(), 1);
        item.content = None;
        let scoring = crate::settings::Settings::default().scoring;

        assert!(matches!(
            extract_signals(&item, &scoring, fixed_now()),
            Err(ScoringError::MissingItem(1))
        ));
    }

    #[test]
    fn test_zero_metrics_extract_to_zero_signals() {
        let item = post_item(Metrics::default(), 0);
        let scoring = crate::settings::Settings::default().scoring;

        let signals = extract_signals(&item, &scoring, fixed_now()).unwrap();
        assert_eq!(signals.upvotes, 0);
        assert_eq!(signals.comments, 0);
        assert!(signals.tip_amount.abs() < f64::EPSILON);
        assert!(signals.bounty_amount.abs() < f64::EPSILON);
        assert!(!signals.has_urgent_bounty);
        assert_eq!(signals.peer_review_count, 0);
        assert!(signals.altmetric_score.abs() < f64::EPSILON);
        assert!(signals.age_hours.abs() < 1e-9);
    }

    #[test]
    fn test_negative_net_votes_clamped() {
        let item = post_item(
            Metrics {
                votes: -12,
                ..Default::default()
            },
            1,
        );
        assert_eq!(total_upvotes(&item), 0);
    }

    #[test]
    fn test_comment_votes_rolled_up() {
        let item = post_item(
            Metrics {
                votes: 5,
                comment_votes: 3,
                ..Default::default()
            },
            1,
        );
        assert_eq!(total_upvotes(&item), 8);
    }

    #[test]
    fn test_reviews_not_double_counted_as_comments() {
        let item = post_item(
            Metrics {
                replies: 5,
                review_metrics: ReviewMetrics { count: 2, avg: 4.5 },
                ..Default::default()
            },
            1,
        );
        assert_eq!(comment_count(&item), 3);
        assert_eq!(peer_review_count(&item), 2);
    }

    #[test]
    fn test_more_reviews_than_replies_clamps_comments() {
        let item = post_item(
            Metrics {
                replies: 1,
                review_metrics: ReviewMetrics { count: 4, avg: 4.0 },
                ..Default::default()
            },
            1,
        );
        assert_eq!(comment_count(&item), 0);
    }

    #[test]
    fn test_only_open_bounties_counted() {
        let now = fixed_now();
        let mut item = post_item(Metrics::default(), 240);
        if let Some(ContentItem::Post(post)) = item.content.as_mut() {
            post.bounties = vec![
                Bounty {
                    amount: 429.0,
                    status: BountyStatus::Open,
                    created_date: Some(now - Duration::days(10)),
                    expiration_date: Some(now + Duration::days(10)),
                },
                Bounty {
                    amount: 1000.0,
                    status: BountyStatus::Closed,
                    created_date: None,
                    expiration_date: None,
                },
            ];
        }
        let scoring = crate::settings::Settings::default().scoring;
        let content = item.content.clone().unwrap();

        let (total, urgent) = total_bounty_amount(&item, &content, &scoring, now);
        assert!((total - 429.0).abs() < 1e-9);
        assert!(!urgent);
    }

    #[test]
    fn test_bounty_expiring_soon_is_urgent() {
        let now = fixed_now();
        let mut item = post_item(Metrics::default(), 240);
        if let Some(ContentItem::Post(post)) = item.content.as_mut() {
            post.bounties = vec![Bounty {
                amount: 500.0,
                status: BountyStatus::Open,
                created_date: Some(now - Duration::days(10)),
                expiration_date: Some(now + Duration::hours(24)),
            }];
        }
        let scoring = crate::settings::Settings::default().scoring;
        let content = item.content.clone().unwrap();

        let (_, urgent) = total_bounty_amount(&item, &content, &scoring, now);
        assert!(urgent);
    }

    #[test]
    fn test_freshly_created_bounty_is_urgent() {
        let now = fixed_now();
        let mut item = post_item(Metrics::default(), 240);
        if let Some(ContentItem::Post(post)) = item.content.as_mut() {
            post.bounties = vec![Bounty {
                amount: 500.0,
                status: BountyStatus::Open,
                created_date: Some(now - Duration::hours(2)),
                expiration_date: Some(now + Duration::days(30)),
            }];
        }
        let scoring = crate::settings::Settings::default().scoring;
        let content = item.content.clone().unwrap();

        let (_, urgent) = total_bounty_amount(&item, &content, &scoring, now);
        assert!(urgent);
    }

    #[test]
    fn test_recent_bounty_without_expiration_is_urgent() {
        let now = fixed_now();
        let mut item = post_item(Metrics::default(), 240);
        if let Some(ContentItem::Post(post)) = item.content.as_mut() {
            post.bounties = vec![Bounty {
                amount: 500.0,
                status: BountyStatus::Open,
                created_date: Some(now - Duration::hours(2)),
                expiration_date: None,
            }];
        }
        let scoring = crate::settings::Settings::default().scoring;
        let content = item.content.clone().unwrap();

        let (_, urgent) = total_bounty_amount(&item, &content, &scoring, now);
        assert!(urgent);
    }

    #[test]
    fn test_tip_amount_includes_fundraise() {
        use crate::item::{AmountRaised, Fundraise, Proposal, Purchase};

        let now = fixed_now();
        let item = FeedItem {
            id: 2,
            content: Some(ContentItem::Proposal(Proposal {
                title: "Replication".into(),
                created_date: now - Duration::hours(5),
                bounties: vec![],
                purchases: vec![Purchase { amount: 50.0 }],
                fundraise: Some(Fundraise {
                    amount_raised: AmountRaised {
                        rsc: Some(150.5),
                        usd: None,
                    },
                    end_date: None,
                }),
            })),
            metrics: Metrics {
                comment_tips: 10.0,
                ..Default::default()
            },
            created_at: now - Duration::hours(5),
            hot_score: 0,
            hot_score_v2: 0,
            stored_breakdown: None,
        };

        let content = item.content.clone().unwrap();
        assert!((total_tip_amount(&item, &content) - 210.5).abs() < 1e-9);
    }

    #[test]
    fn test_age_clamped_against_clock_skew() {
        // Created "in the future" relative to now.
        let item = post_item(Metrics::default(), -3);
        let scoring = crate::settings::Settings::default().scoring;
        let content = item.content.clone().unwrap();

        assert!(age_hours(&content, &scoring, fixed_now()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_grant_near_deadline_ages_as_fresh() {
        let now = fixed_now();
        let scoring = crate::settings::Settings::default().scoring;

        let grant = |end_date| {
            ContentItem::Grant(Grant {
                title: "Methods grant".into(),
                created_date: now - Duration::days(60),
                bounties: vec![],
                purchases: vec![],
                end_date: Some(end_date),
            })
        };

        // Deadline in 3 days, 7-day window: re-aged to 4 days = 96h.
        let near = age_hours(&grant(now + Duration::days(3)), &scoring, now);
        assert!((near - 96.0).abs() < 1e-6);

        // Deadline in 30 days: normal ageing applies.
        let far = age_hours(&grant(now + Duration::days(30)), &scoring, now);
        assert!((far - 60.0 * 24.0).abs() < 1e-6);
    }
}
