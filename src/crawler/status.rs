//! Progress snapshots for the periodic status line

use std::fmt;

/// Queue depths and progress counters at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    /// Accounts in the result sink
    pub discovered: usize,

    /// Size of the inspection dedup set
    pub inspected: usize,

    /// Pending (not yet dispatched) jobs per kind
    pub pending_inspect: usize,
    pub pending_history: usize,
    pub pending_report: usize,

    /// Jobs currently being handled across both worker pools
    pub in_flight: usize,

    /// Jobs dropped after a handler error
    pub failed_jobs: u64,

    pub cache_hits: u64,
    pub network_fetches: u64,
}

impl StatusSnapshot {
    /// Accounts whose inspection has been dispatched
    ///
    /// Seeds sit in the queue without being in the inspection set, so this
    /// can be negative early in a run.
    pub fn accounts_checked(&self) -> i64 {
        self.inspected as i64 - self.pending_inspect as i64
    }

    pub fn pending_total(&self) -> usize {
        self.pending_inspect + self.pending_history + self.pending_report
    }

    /// No pending and no running jobs
    pub fn is_idle(&self) -> bool {
        self.pending_total() == 0 && self.in_flight == 0
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found {} accounts with the collectible, checked {} accounts. Jobs: INSPECT: {}, FETCH_HISTORY: {}, FETCH_REPORT: {} (failed: {}, cache hits: {}, fetched: {})",
            self.discovered,
            self.accounts_checked(),
            self.pending_inspect,
            self.pending_history,
            self.pending_report,
            self.failed_jobs,
            self.cache_hits,
            self.network_fetches
        )
    }
}
