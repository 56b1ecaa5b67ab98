//! Job types and the frontier queues
//!
//! This module handles:
//! - The three job kinds and their priority classes
//! - An introspectable queue with priority ordering and FIFO tie-breaks
//! - Waking idle workers when new jobs arrive
//!
//! Queues never block on push and grow without bound.

use crate::model::{AccountRef, ProfileSnapshot};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Priority of inspection jobs (dispatched first)
pub const INSPECT_PRIORITY: u32 = 1;

/// Priority of history-fetch jobs
pub const HISTORY_PRIORITY: u32 = 2;

/// A unit of crawl work
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// Check whether an account owns the collectible
    Inspect {
        account: AccountRef,
        snapshot: Option<Box<ProfileSnapshot>>,
    },

    /// Fetch match history for every character of an account
    FetchHistory {
        account: AccountRef,
        snapshot: Option<Box<ProfileSnapshot>>,
    },

    /// Fetch the full report of a match
    FetchReport { match_id: String },
}

/// Discriminant of [`Job`], used for counting pending work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Inspect,
    FetchHistory,
    FetchReport,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inspect => "INSPECT",
            Self::FetchHistory => "FETCH_HISTORY",
            Self::FetchReport => "FETCH_REPORT",
        }
    }
}

impl Job {
    /// A bare inspection job, as created from a seed or a match report
    pub fn inspect(account: AccountRef) -> Self {
        Self::Inspect {
            account,
            snapshot: None,
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Self::Inspect { .. } => JobKind::Inspect,
            Self::FetchHistory { .. } => JobKind::FetchHistory,
            Self::FetchReport { .. } => JobKind::FetchReport,
        }
    }

    /// Priority class on the priority queue; `None` for FIFO-queue jobs
    pub fn priority(&self) -> Option<u32> {
        match self {
            Self::Inspect { .. } => Some(INSPECT_PRIORITY),
            Self::FetchHistory { .. } => Some(HISTORY_PRIORITY),
            Self::FetchReport { .. } => None,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inspect { account, .. } => write!(f, "{} {}", self.kind().as_str(), account),
            Self::FetchHistory { account, .. } => {
                write!(f, "{} {}", self.kind().as_str(), account)
            }
            Self::FetchReport { match_id } => write!(f, "{} {}", self.kind().as_str(), match_id),
        }
    }
}

/// A job waiting in a queue
#[derive(Debug)]
struct QueuedJob<J> {
    /// Priority value (lower is dispatched first)
    priority: u32,

    /// Insertion sequence, breaks ties between equal priorities
    seq: u64,

    job: J,
}

// BinaryHeap pops the greatest element, so both keys compare in reverse:
// lower priority values first, then earlier insertions first
impl<J> Ord for QueuedJob<J> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<J> PartialOrd for QueuedJob<J> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<J> PartialEq for QueuedJob<J> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<J> Eq for QueuedJob<J> {}

#[derive(Debug)]
struct QueueInner<J> {
    heap: BinaryHeap<QueuedJob<J>>,
    next_seq: u64,
    active: usize,
}

/// A work queue drained by a fixed pool of workers
///
/// Pending jobs stay enumerable until dispatched so the status reporter can
/// count them by kind. A queue with a single priority class behaves as FIFO.
#[derive(Debug)]
pub struct JobQueue<J> {
    name: &'static str,
    inner: Mutex<QueueInner<J>>,
    notify: Notify,
}

impl<J> JobQueue<J> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Mutex::new(QueueInner {
                heap: BinaryHeap::new(),
                next_seq: 0,
                active: 0,
            }),
            notify: Notify::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner<J>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a job and wakes one idle worker
    pub fn push(&self, job: J, priority: u32) {
        {
            let mut inner = self.lock();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.heap.push(QueuedJob { priority, seq, job });
        }
        self.notify.notify_one();
    }

    /// Removes the next job without waiting
    ///
    /// A job handed out here counts as active until [`JobQueue::complete`] is called.
    pub fn try_pop(&self) -> Option<J> {
        let mut inner = self.lock();
        let queued = inner.heap.pop()?;
        inner.active += 1;
        Some(queued.job)
    }

    /// Waits until a job is available and removes it
    pub async fn pop(&self) -> J {
        loop {
            let notified = self.notify.notified();
            if let Some(job) = self.try_pop() {
                return job;
            }
            notified.await;
        }
    }

    /// Marks one previously popped job as finished
    pub fn complete(&self) {
        let mut inner = self.lock();
        inner.active = inner.active.saturating_sub(1);
    }

    /// Number of pending (not yet dispatched) jobs
    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }

    /// Number of dispatched jobs whose handlers have not finished
    pub fn active(&self) -> usize {
        self.lock().active
    }

    /// Counts pending jobs grouped by `key`
    pub fn count_by<K, F>(&self, key: F) -> HashMap<K, usize>
    where
        K: Eq + Hash,
        F: Fn(&J) -> K,
    {
        let inner = self.lock();
        let mut counts = HashMap::new();
        for queued in inner.heap.iter() {
            *counts.entry(key(&queued.job)).or_insert(0) += 1;
        }
        counts
    }

    /// Clones the pending jobs in dispatch order
    pub fn pending(&self) -> Vec<J>
    where
        J: Clone,
    {
        let inner = self.lock();
        let mut queued: Vec<&QueuedJob<J>> = inner.heap.iter().collect();
        queued.sort_by(|a, b| b.cmp(a));
        queued.into_iter().map(|q| q.job.clone()).collect()
    }
}
