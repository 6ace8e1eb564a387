use chrono::{Duration, Utc};
use std::time::Instant;

use crate::db::{self, DbPool};
use crate::item::FeedItem;
use crate::scoring::{calculate_hot_score_legacy, compute_breakdown};
use crate::settings::Settings;
use crate::utils::{log_refresh_done, log_refresh_entry_failed, log_refresh_start};

#[derive(Debug, Default, Clone, Copy)]
pub struct RefreshStats {
    pub updated: usize,
    pub skipped: usize,
}

/// Recompute both score snapshots for every entry in the working set and
/// write them back. Entries that cannot be scored are logged and skipped;
/// one bad entry never fails the batch.
pub async fn run_refresh(pool: DbPool, settings: &Settings) -> anyhow::Result<RefreshStats> {
    let started = Instant::now();
    let now = Utc::now();
    let cutoff = now - Duration::days(settings.batch.days_back);

    let entries = {
        let mut conn = pool.get()?;
        db::get_entries_since(&mut conn, cutoff)?
    };
    log_refresh_start(entries.len());

    let workers = settings.batch.workers.max(1);
    let chunk_size = entries.len().div_ceil(workers).max(1);

    let mut handles = Vec::new();
    for chunk in entries.chunks(chunk_size) {
        let chunk: Vec<FeedItem> = chunk.to_vec();
        let pool = pool.clone();
        let scoring = settings.scoring.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let mut stats = RefreshStats::default();
            let mut conn = match pool.get() {
                Ok(c) => c,
                Err(e) => {
                    log_refresh_entry_failed(0, &format!("no connection: {e}"));
                    stats.skipped = chunk.len();
                    return stats;
                }
            };

            for item in &chunk {
                let breakdown = match compute_breakdown(item, &scoring, now, None) {
                    Ok(b) => b,
                    Err(e) => {
                        log_refresh_entry_failed(item.id, &e.to_string());
                        stats.skipped += 1;
                        continue;
                    }
                };
                // Content resolved above, so v1 cannot fail here; keep the
                // stored value if it somehow does.
                let v1 = calculate_hot_score_legacy(item, now).unwrap_or(item.hot_score);

                match db::update_scores(&mut conn, item.id, v1, breakdown.final_score(), &breakdown)
                {
                    Ok(_) => stats.updated += 1,
                    Err(e) => {
                        log_refresh_entry_failed(item.id, &e.to_string());
                        stats.skipped += 1;
                    }
                }
            }
            stats
        }));
    }

    let mut stats = RefreshStats::default();
    for handle in handles {
        let worker_stats = handle.await?;
        stats.updated += worker_stats.updated;
        stats.skipped += worker_stats.skipped;
    }

    log_refresh_done(stats.updated, stats.skipped, started.elapsed().as_millis());
    Ok(stats)
}
