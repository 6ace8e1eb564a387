use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::scoring::ComponentBreakdown;

/// A feed entry as the scorer sees it: the content snapshot, the rolled-up
/// engagement metrics, and the stored scores from the last refresh. The
/// scorer only reads this; persistence is the store's concern.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub id: i64,
    /// `None` when the entry's content snapshot is missing or unparseable.
    /// Scoring such an entry is an error, not a zero score.
    pub content: Option<ContentItem>,
    pub metrics: Metrics,
    pub created_at: DateTime<Utc>,
    pub hot_score: i64,
    pub hot_score_v2: i64,
    pub stored_breakdown: Option<ComponentBreakdown>,
}

/// Content snapshot, tagged by document kind. Each variant exposes the same
/// capability surface through the accessors below, so callers never probe
/// for fields that may not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentItem {
    #[serde(rename = "PAPER")]
    Paper(Paper),
    #[serde(rename = "POST")]
    Post(Post),
    #[serde(rename = "PREREGISTRATION")]
    Proposal(Proposal),
    #[serde(rename = "GRANT")]
    Grant(Grant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ContentKind {
    #[strum(serialize = "PAPER")]
    Paper,
    #[strum(serialize = "POST")]
    Post,
    #[strum(serialize = "PREREGISTRATION")]
    Proposal,
    #[strum(serialize = "GRANT")]
    Grant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub bounties: Vec<Bounty>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub bounties: Vec<Bounty>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub title: String,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub bounties: Vec<Bounty>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    #[serde(default)]
    pub fundraise: Option<Fundraise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    pub title: String,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub bounties: Vec<Bounty>,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    /// Application deadline. Grants close to it get a freshness bump.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bounty {
    pub amount: f64,
    pub status: BountyStatus,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum BountyStatus {
    #[serde(rename = "OPEN")]
    #[strum(serialize = "OPEN")]
    Open,
    #[serde(rename = "CLOSED")]
    #[strum(serialize = "CLOSED")]
    Closed,
    #[serde(rename = "EXPIRED")]
    #[strum(serialize = "EXPIRED")]
    Expired,
}

/// A paid tip/boost on the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fundraise {
    #[serde(default)]
    pub amount_raised: AmountRaised,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// Raised total in both denominations; RSC is preferred when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmountRaised {
    #[serde(default)]
    pub rsc: Option<f64>,
    #[serde(default)]
    pub usd: Option<f64>,
}

/// Rolled-up engagement counters for a feed entry. The production pipeline
/// denormalizes comment-tree aggregates (`comment_votes`, `comment_tips`)
/// into this snapshot so extraction never walks the tree. Every field
/// defaults to zero, and a snapshot that fails to parse degrades to all
/// zeros rather than failing the entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default)]
    pub votes: i64,
    #[serde(default)]
    pub replies: i64,
    #[serde(default)]
    pub review_metrics: ReviewMetrics,
    #[serde(default)]
    pub altmetric_score: f64,
    #[serde(default)]
    pub comment_votes: i64,
    #[serde(default)]
    pub comment_tips: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewMetrics {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub avg: f64,
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentItem::Paper(_) => ContentKind::Paper,
            ContentItem::Post(_) => ContentKind::Post,
            ContentItem::Proposal(_) => ContentKind::Proposal,
            ContentItem::Grant(_) => ContentKind::Grant,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentItem::Paper(p) => &p.title,
            ContentItem::Post(p) => &p.title,
            ContentItem::Proposal(p) => &p.title,
            ContentItem::Grant(g) => &g.title,
        }
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        match self {
            ContentItem::Paper(p) => p.created_date,
            ContentItem::Post(p) => p.created_date,
            ContentItem::Proposal(p) => p.created_date,
            ContentItem::Grant(g) => g.created_date,
        }
    }

    pub fn bounties(&self) -> &[Bounty] {
        match self {
            ContentItem::Paper(p) => &p.bounties,
            ContentItem::Post(p) => &p.bounties,
            ContentItem::Proposal(p) => &p.bounties,
            ContentItem::Grant(g) => &g.bounties,
        }
    }

    pub fn purchases(&self) -> &[Purchase] {
        match self {
            ContentItem::Paper(p) => &p.purchases,
            ContentItem::Post(p) => &p.purchases,
            ContentItem::Proposal(p) => &p.purchases,
            ContentItem::Grant(g) => &g.purchases,
        }
    }

    pub fn fundraise(&self) -> Option<&Fundraise> {
        match self {
            ContentItem::Proposal(p) => p.fundraise.as_ref(),
            _ => None,
        }
    }

    /// Deadline that should pull the item forward in the feed when it is
    /// about to pass: a grant's application deadline or a proposal's
    /// fundraise close date.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            ContentItem::Grant(g) => g.end_date,
            ContentItem::Proposal(p) => p.fundraise.as_ref().and_then(|f| f.end_date),
            _ => None,
        }
    }
}

impl Fundraise {
    /// Raised amount, preferring RSC over USD. Zero when neither is set.
    pub fn amount(&self) -> f64 {
        self.amount_raised
            .rsc
            .or(self.amount_raised.usd)
            .unwrap_or(0.0)
    }
}

impl FeedItem {
    pub fn title(&self) -> &str {
        self.content
            .as_ref()
            .map(|c| c.title())
            .unwrap_or("<missing item>")
    }
}
