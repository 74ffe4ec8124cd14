//! Statistics Module
//!
//! Process-wide request and cache-hit counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Counters ==
/// Monotonic counters shared by every worker for the lifetime of the
/// process.
///
/// Each counter is an independent atomic: increments are never lost, but no
/// cross-field consistency is guaranteed — a snapshot taken while requests
/// are in flight may momentarily show `cache_hits + cache_misses` different
/// from `total_requests`. Counters are never reset or decremented.
#[derive(Debug, Default)]
pub struct StatsCounters {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl StatsCounters {
    // == Constructor ==
    /// Creates a new set of counters, all at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Request ==
    /// Counts one GET/PUT/DELETE operation.
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Hit ==
    /// Counts one cache hit.
    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    /// Counts one cache miss.
    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Accessors ==
    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    // == Snapshot ==
    /// Returns a point-in-time copy of the counters with the derived hit
    /// rate (`cache_hits / total_requests`, 0 when no requests were made).
    pub fn snapshot(&self) -> StatsSnapshot {
        let total_requests = self.total_requests();
        let cache_hits = self.cache_hits();
        let cache_misses = self.cache_misses();
        let hit_rate = if total_requests > 0 {
            cache_hits as f64 / total_requests as f64
        } else {
            0.0
        };

        StatsSnapshot {
            total_requests,
            cache_hits,
            cache_misses,
            hit_rate,
        }
    }
}

// == Stats Snapshot ==
/// Read-only view of the counters, as exposed by the statistics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Operations handled since startup
    pub total_requests: u64,
    /// Reads served from the cache
    pub cache_hits: u64,
    /// Reads that fell through to the store
    pub cache_misses: u64,
    /// cache_hits / total_requests
    pub hit_rate: f64,
}
