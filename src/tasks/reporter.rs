//! Stats Reporter Task
//!
//! Background task that periodically logs cache counters.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::ModelDb;
use crate::cache::StatsSnapshot;

/// Spawns a background task that logs cache statistics at a fixed interval.
///
/// Reports at `info` level when the counters moved since the previous report
/// and at `debug` level otherwise. Each report takes the read lock briefly,
/// so a resized cache is picked up on the next tick.
///
/// # Arguments
/// * `db` - shared reference to the cached store
/// * `interval_secs` - Interval in seconds between reports
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let reporter = spawn_stats_reporter(state.db.clone(), 30);
/// // Later, during shutdown:
/// reporter.abort();
/// ```
pub fn spawn_stats_reporter(db: Arc<RwLock<ModelDb>>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting stats reporter with interval of {} seconds",
            interval.as_secs()
        );

        let mut previous: Option<StatsSnapshot> = None;
        loop {
            tokio::time::sleep(interval).await;

            let stats = db.read().await.stats();

            if previous.as_ref().map_or(true, |p| has_activity(p, &stats)) {
                info!(
                    "Cache stats: entries={}, size={}/{}, hits={}, misses={}, puts={}, deletes={}, evictions={}, hit_rate={:.3}",
                    stats.entry_count,
                    stats.size,
                    stats.max_size,
                    stats.hits,
                    stats.misses,
                    stats.puts,
                    stats.deletes,
                    stats.evictions,
                    stats.hit_rate
                );
            } else {
                debug!("Cache stats: no activity since last report");
            }
            previous = Some(stats);
        }
    })
}

/// True when anything changed between two snapshots.
fn has_activity(previous: &StatsSnapshot, current: &StatsSnapshot) -> bool {
    previous != current
}
