//! Filter metrics
//!
//! Atomic counters for workers and the supervisor. All operations use
//! relaxed ordering; values are eventually consistent, not real-time.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for one filter worker
///
/// Shared between the worker task and its handle via `Arc`, so counters
/// remain readable after the worker is consumed by its run loop.
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// Events received through the mailbox
    events_received: AtomicU64,

    /// Events that matched at least one subscription
    events_matched: AtomicU64,

    /// Successful deliveries to subscriber endpoints
    deliveries: AtomicU64,

    /// Deliveries dropped (endpoint dead or saturated)
    delivery_drops: AtomicU64,

    /// Per-event extraction failures (treated as field-absent)
    extraction_errors: AtomicU64,

    /// Subscriptions rejected at refresh for referencing unknown fields
    subscriptions_rejected: AtomicU64,

    /// Refresh operations applied
    refreshes: AtomicU64,

    /// Subscribers purged after their endpoint died
    subscribers_purged: AtomicU64,
}

impl WorkerMetrics {
    /// Create new metrics with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            events_received: AtomicU64::new(0),
            events_matched: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            delivery_drops: AtomicU64::new(0),
            extraction_errors: AtomicU64::new(0),
            subscriptions_rejected: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            subscribers_purged: AtomicU64::new(0),
        }
    }

    /// Record an event received from ingress
    #[inline]
    pub fn record_event(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event that matched at least one subscription
    #[inline]
    pub fn record_matched(&self) {
        self.events_matched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful delivery
    #[inline]
    pub fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped delivery
    #[inline]
    pub fn record_delivery_drop(&self) {
        self.delivery_drops.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a per-event extraction failure
    #[inline]
    pub fn record_extraction_error(&self) {
        self.extraction_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a subscription rejected at refresh
    #[inline]
    pub fn record_subscription_rejected(&self) {
        self.subscriptions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an applied refresh
    #[inline]
    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a purged subscriber
    #[inline]
    pub fn record_subscriber_purged(&self) {
        self.subscribers_purged.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> WorkerMetricsSnapshot {
        WorkerMetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_matched: self.events_matched.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_drops: self.delivery_drops.load(Ordering::Relaxed),
            extraction_errors: self.extraction_errors.load(Ordering::Relaxed),
            subscriptions_rejected: self.subscriptions_rejected.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            subscribers_purged: self.subscribers_purged.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of worker metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerMetricsSnapshot {
    /// Events received through the mailbox
    pub events_received: u64,
    /// Events that matched at least one subscription
    pub events_matched: u64,
    /// Successful deliveries
    pub deliveries: u64,
    /// Dropped deliveries
    pub delivery_drops: u64,
    /// Extraction failures
    pub extraction_errors: u64,
    /// Subscriptions rejected at refresh
    pub subscriptions_rejected: u64,
    /// Applied refreshes
    pub refreshes: u64,
    /// Purged subscribers
    pub subscribers_purged: u64,
}

/// Metrics for the supervisor
#[derive(Debug, Default)]
pub struct SupervisorMetrics {
    /// Refresh requests processed
    refreshes: AtomicU64,

    /// Workers started on demand
    workers_started: AtomicU64,

    /// Worker exit notices observed
    workers_exited: AtomicU64,

    /// Successful config reloads
    reloads_success: AtomicU64,

    /// Failed config reloads (previous map preserved)
    reloads_failed: AtomicU64,
}

impl SupervisorMetrics {
    /// Create new metrics with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            refreshes: AtomicU64::new(0),
            workers_started: AtomicU64::new(0),
            workers_exited: AtomicU64::new(0),
            reloads_success: AtomicU64::new(0),
            reloads_failed: AtomicU64::new(0),
        }
    }

    /// Record a processed refresh request
    #[inline]
    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a worker start
    #[inline]
    pub fn record_worker_started(&self) {
        self.workers_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an observed worker exit
    #[inline]
    pub fn record_worker_exited(&self) {
        self.workers_exited.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful reload
    #[inline]
    pub fn record_reload_success(&self) {
        self.reloads_success.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed reload
    #[inline]
    pub fn record_reload_failure(&self) {
        self.reloads_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> SupervisorMetricsSnapshot {
        SupervisorMetricsSnapshot {
            refreshes: self.refreshes.load(Ordering::Relaxed),
            workers_started: self.workers_started.load(Ordering::Relaxed),
            workers_exited: self.workers_exited.load(Ordering::Relaxed),
            reloads_success: self.reloads_success.load(Ordering::Relaxed),
            reloads_failed: self.reloads_failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of supervisor metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorMetricsSnapshot {
    /// Refresh requests processed
    pub refreshes: u64,
    /// Workers started on demand
    pub workers_started: u64,
    /// Worker exit notices observed
    pub workers_exited: u64,
    /// Successful reloads
    pub reloads_success: u64,
    /// Failed reloads
    pub reloads_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_metrics_counts() {
        let metrics = WorkerMetrics::new();

        metrics.record_event();
        metrics.record_event();
        metrics.record_matched();
        metrics.record_delivery();
        metrics.record_delivery_drop();
        metrics.record_extraction_error();

        let s = metrics.snapshot();
        assert_eq!(s.events_received, 2);
        assert_eq!(s.events_matched, 1);
        assert_eq!(s.deliveries, 1);
        assert_eq!(s.delivery_drops, 1);
        assert_eq!(s.extraction_errors, 1);
    }

    #[test]
    fn test_supervisor_metrics_counts() {
        let metrics = SupervisorMetrics::new();

        metrics.record_refresh();
        metrics.record_worker_started();
        metrics.record_reload_success();
        metrics.record_reload_failure();

        let s = metrics.snapshot();
        assert_eq!(s.refreshes, 1);
        assert_eq!(s.workers_started, 1);
        assert_eq!(s.workers_exited, 0);
        assert_eq!(s.reloads_success, 1);
        assert_eq!(s.reloads_failed, 1);
    }

    #[test]
    fn test_snapshots_default_to_zero() {
        assert_eq!(
            WorkerMetrics::new().snapshot(),
            WorkerMetricsSnapshot::default()
        );
        assert_eq!(
            SupervisorMetrics::new().snapshot(),
            SupervisorMetricsSnapshot::default()
        );
    }
}
