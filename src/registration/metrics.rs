//! Counters describing what happened to pending registrations

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct StoreMetrics {
    issued: AtomicU64,
    consumed: AtomicU64,
    expired: AtomicU64,
    unknown: AtomicU64,
    evicted: AtomicU64,
    capacity_rejections: AtomicU64,
    reclaim_scans: AtomicU64,
}

/// Point-in-time copy of the store counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreMetricsSnapshot {
    pub issued: u64,
    pub consumed: u64,
    /// Consumed too late
    pub expired: u64,
    /// Consume of an id that was not there
    pub unknown: u64,
    /// Removed by an expiry sweep
    pub evicted: u64,
    pub capacity_rejections: u64,
    /// Expiry scans run by `begin` on a full store
    pub reclaim_scans: u64,
}

impl StoreMetrics {
    pub(crate) fn record_issued(&self) {
        self.issued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_consumed(&self) {
        self.consumed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unknown(&self) {
        self.unknown.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evicted(&self, count: usize) {
        self.evicted
            .fetch_add(u64::try_from(count).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub(crate) fn record_capacity_rejection(&self) {
        self.capacity_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reclaim_scan(&self) {
        self.reclaim_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            issued: self.issued.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            capacity_rejections: self.capacity_rejections.load(Ordering::Relaxed),
            reclaim_scans: self.reclaim_scans.load(Ordering::Relaxed),
        }
    }
}
