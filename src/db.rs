use chrono::{DateTime, TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::warn;

use crate::item::{ContentItem, FeedItem, Metrics};
use crate::schema::feed_entries;
use crate::scoring::ComponentBreakdown;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

pub fn establish_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(5)
        .build(manager)
        .expect("Failed to create pool")
}

pub fn configure_connection(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute("PRAGMA busy_timeout = 2000;")?;
    conn.batch_execute("PRAGMA journal_mode = WAL;")?;
    conn.batch_execute("PRAGMA synchronous = NORMAL;")?;
    conn.batch_execute("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

pub fn run_migrations(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("migrations failed: {e}"))?;
    Ok(())
}

/// Raw row shape. Content and metrics are JSON snapshots written by the
/// ingestion pipeline; this crate only reads them.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = feed_entries)]
pub struct FeedEntryRow {
    pub id: i64,
    pub content: Option<String>,
    pub metrics: String,
    pub created_at: i64,
    pub hot_score: i64,
    pub hot_score_v2: i64,
    pub breakdown_v2: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = feed_entries)]
pub struct NewFeedEntry {
    pub id: i64,
    pub content: Option<String>,
    pub metrics: String,
    pub created_at: i64,
    pub hot_score: i64,
    pub hot_score_v2: i64,
    pub breakdown_v2: Option<String>,
}

impl From<FeedEntryRow> for FeedItem {
    fn from(row: FeedEntryRow) -> Self {
        // An unparseable content snapshot is indistinguishable from a
        // missing one; scoring turns both into a MissingItem error.
        let content: Option<ContentItem> = row.content.as_deref().and_then(|json| {
            serde_json::from_str(json)
                .map_err(|e| warn!("entry {}: bad content snapshot: {e}", row.id))
                .ok()
        });

        // Metrics degrade to all-zero counters instead.
        let metrics: Metrics = serde_json::from_str(&row.metrics)
            .map_err(|e| warn!("entry {}: bad metrics snapshot: {e}", row.id))
            .unwrap_or_default();

        let stored_breakdown: Option<ComponentBreakdown> = row
            .breakdown_v2
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok());

        FeedItem {
            id: row.id,
            content,
            metrics,
            created_at: Utc
                .timestamp_opt(row.created_at, 0)
                .single()
                .unwrap_or_default(),
            hot_score: row.hot_score,
            hot_score_v2: row.hot_score_v2,
            stored_breakdown,
        }
    }
}

pub fn get_entry(conn: &mut SqliteConnection, entry_id: i64) -> QueryResult<Option<FeedItem>> {
    use crate::schema::feed_entries::dsl::*;

    let row = feed_entries
        .filter(id.eq(entry_id))
        .first::<FeedEntryRow>(conn)
        .optional()?;
    Ok(row.map(FeedItem::from))
}

/// Entries created after the cutoff, the refresh working set.
pub fn get_entries_since(
    conn: &mut SqliteConnection,
    cutoff: DateTime<Utc>,
) -> QueryResult<Vec<FeedItem>> {
    use crate::schema::feed_entries::dsl::*;

    let rows = feed_entries
        .filter(created_at.gt(cutoff.timestamp()))
        .order(created_at.desc())
        .load::<FeedEntryRow>(conn)?;
    Ok(rows.into_iter().map(FeedItem::from).collect())
}

pub fn get_ranked(conn: &mut SqliteConnection, limit: i64) -> QueryResult<Vec<FeedItem>> {
    use crate::schema::feed_entries::dsl::*;

    let rows = feed_entries
        .order(hot_score_v2.desc())
        .limit(limit)
        .load::<FeedEntryRow>(conn)?;
    Ok(rows.into_iter().map(FeedItem::from).collect())
}

/// Write back both score snapshots and the v2 breakdown for one entry.
pub fn update_scores(
    conn: &mut SqliteConnection,
    entry_id: i64,
    v1: i64,
    v2: i64,
    breakdown: &ComponentBreakdown,
) -> QueryResult<usize> {
    use crate::schema::feed_entries::dsl::*;

    let breakdown_json = serde_json::to_string(breakdown).ok();
    diesel::update(feed_entries.filter(id.eq(entry_id)))
        .set((
            hot_score.eq(v1),
            hot_score_v2.eq(v2),
            breakdown_v2.eq(breakdown_json),
        ))
        .execute(conn)
}

pub fn insert_entries(
    conn: &mut SqliteConnection,
    new_entries: Vec<NewFeedEntry>,
) -> QueryResult<usize> {
    use crate::schema::feed_entries::dsl::*;

    diesel::insert_or_ignore_into(feed_entries)
        .values(&new_entries)
        .execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ContentKind;

    fn test_conn() -> SqliteConnection {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    fn sample_entry(entry_id: i64, content: Option<String>, metrics: &str) -> NewFeedEntry {
        NewFeedEntry {
            id: entry_id,
            content,
            metrics: metrics.to_string(),
            created_at: 1_774_000_000,
            hot_score: 0,
            hot_score_v2: 0,
            breakdown_v2: None,
        }
    }

    const POST_JSON: &str = r#"{
        "type": "POST",
        "title": "Stored entry",
        "created_date": "2026-02-20T10:00:00Z"
    }"#;

    #[test]
    fn test_round_trip_entry() {
        let mut conn = test_conn();
        let entry = sample_entry(1, Some(POST_JSON.into()), r#"{"votes": 12, "replies": 3}"#);
        insert_entries(&mut conn, vec![entry]).unwrap();

        let item = get_entry(&mut conn, 1).unwrap().unwrap();
        assert_eq!(item.id, 1);
        assert_eq!(item.metrics.votes, 12);
        assert_eq!(item.content.as_ref().unwrap().kind(), ContentKind::Post);
        assert!(item.stored_breakdown.is_none());
    }

    #[test]
    fn test_missing_entry_is_none() {
        let mut conn = test_conn();
        assert!(get_entry(&mut conn, 99).unwrap().is_none());
    }

    #[test]
    fn test_bad_content_becomes_none() {
        let mut conn = test_conn();
        let entry = sample_entry(2, Some("{not json".into()), "{}");
        insert_entries(&mut conn, vec![entry]).unwrap();

        let item = get_entry(&mut conn, 2).unwrap().unwrap();
        assert!(item.content.is_none());
    }

    #[test]
    fn test_bad_metrics_degrade_to_zero() {
        let mut conn = test_conn();
        let entry = sample_entry(3, Some(POST_JSON.into()), "{broken");
        insert_entries(&mut conn, vec![entry]).unwrap();

        let item = get_entry(&mut conn, 3).unwrap().unwrap();
        assert_eq!(item.metrics.votes, 0);
        assert_eq!(item.metrics.replies, 0);
    }

    #[test]
    fn test_update_scores_persists_breakdown() {
        use crate::scoring::compute_breakdown;
        use crate::settings::Settings;

        let mut conn = test_conn();
        let entry = sample_entry(4, Some(POST_JSON.into()), r#"{"votes": 40}"#);
        insert_entries(&mut conn, vec![entry]).unwrap();

        let scoring = Settings::default().scoring;
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let item = get_entry(&mut conn, 4).unwrap().unwrap();
        let breakdown = compute_breakdown(&item, &scoring, now, None).unwrap();

        update_scores(&mut conn, 4, 1234, breakdown.final_score(), &breakdown).unwrap();

        let reloaded = get_entry(&mut conn, 4).unwrap().unwrap();
        assert_eq!(reloaded.hot_score, 1234);
        assert_eq!(reloaded.hot_score_v2, breakdown.final_score());
        assert_eq!(reloaded.stored_breakdown.unwrap(), breakdown);
    }

    #[test]
    fn test_ranked_orders_by_v2() {
        let mut conn = test_conn();
        for (entry_id, score) in [(1, 50), (2, 200), (3, 120)] {
            let mut entry = sample_entry(entry_id, Some(POST_JSON.into()), "{}");
            entry.hot_score_v2 = score;
            insert_entries(&mut conn, vec![entry]).unwrap();
        }

        let ranked = get_ranked(&mut conn, 2).unwrap();
        let ids: Vec<i64> = ranked.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
