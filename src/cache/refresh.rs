//! Snapshot refresh from the live inventory.

use super::{ResourceCache, ResourceKind};
use crate::Result;
use crate::inventory::{InventoryBackend, ListQuery};
use chrono::{DateTime, Duration, Utc};
use std::time::Instant;
use tracing::info_span;

/// Outcome of one refresh run.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Record count per refreshed kind.
    pub refreshed: Vec<(ResourceKind, usize)>,
    /// Failure message per kind that could not be refreshed.
    pub failed: Vec<(ResourceKind, String)>,
    /// Whether the run was skipped because the cache was fresh.
    pub skipped: bool,
}

impl RefreshReport {
    /// Returns `true` if no kind failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Rewrites snapshot files from the inventory when they are stale.
#[derive(Debug, Clone)]
pub struct ResourceRefresher {
    cache: ResourceCache,
    interval: Duration,
}

impl ResourceRefresher {
    /// Creates a refresher that treats snapshots older than
    /// `interval_hours` as stale.
    #[must_use]
    pub fn new(cache: ResourceCache, interval_hours: u64) -> Self {
        let hours = i64::try_from(interval_hours).unwrap_or(i64::MAX / 3600);
        Self {
            cache,
            interval: Duration::hours(hours),
        }
    }

    /// Returns the cache being refreshed.
    #[must_use]
    pub const fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Returns `true` if the snapshots should be rebuilt at `now`.
    ///
    /// Stale when no snapshot carries a valid timestamp, or the newest one is
    /// at least the refresh interval old.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.cache
            .last_updated()
            .is_none_or(|newest| now.signed_duration_since(newest) >= self.interval)
    }

    /// Rebuilds every snapshot.
    ///
    /// Each kind is fetched and written independently; one failure does not
    /// stop the others.
    pub fn refresh_all(&self, inventory: &dyn InventoryBackend) -> RefreshReport {
        let _span = info_span!("netbox_mcp.resources.refresh", backend = inventory.name()).entered();
        let start = Instant::now();
        let mut report = RefreshReport::default();

        for kind in ResourceKind::ALL {
            match self.refresh_one(inventory, kind) {
                Ok(count) => {
                    tracing::info!(resource = %kind, count, "Refreshed resource snapshot");
                    report.refreshed.push((kind, count));
                },
                Err(e) => {
                    tracing::warn!(resource = %kind, error = %e, "Failed to refresh resource snapshot");
                    metrics::counter!("resource_refresh_failures_total", "resource" => kind.as_str())
                        .increment(1);
                    report.failed.push((kind, e.to_string()));
                },
            }
        }

        metrics::histogram!("resource_refresh_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        report
    }

    /// Rebuilds the snapshots if stale, or unconditionally when `force` is set.
    pub fn refresh_if_needed(&self, inventory: &dyn InventoryBackend, force: bool) -> RefreshReport {
        if !force && !self.needs_refresh(Utc::now()) {
            tracing::debug!(dir = %self.cache.dir().display(), "Resource snapshots are fresh");
            return RefreshReport {
                skipped: true,
                ..RefreshReport::default()
            };
        }
        self.refresh_all(inventory)
    }

    fn refresh_one(&self, inventory: &dyn InventoryBackend, kind: ResourceKind) -> Result<usize> {
        let records = inventory.list(&ListQuery::new(kind.endpoint()))?;
        let mut data = Vec::with_capacity(records.len());
        for record in records {
            match kind.project(record) {
                Ok(projected) => data.push(projected),
                Err(e) => tracing::warn!(resource = %kind, error = %e, "Skipping malformed record"),
            }
        }
        let snapshot = self.cache.write(kind, data, Utc::now())?;
        Ok(snapshot.metadata.count)
    }
}
