//! Crawl engine - owns all crawl state and runs the job handlers
//!
//! This module contains the self-feeding job chain:
//! - `Inspect` fetches an account snapshot, records the account if it owns the
//!   collectible, and schedules a history fetch for it
//! - `FetchHistory` fetches every character's match history and schedules a
//!   report fetch per unseen match
//! - `FetchReport` fetches a match report and schedules an inspection per
//!   unseen participant
//!
//! All bookkeeping (dedup sets, result sink) lives behind one mutex and is
//! only touched by the synchronous `apply_*` methods, so each
//! check-then-mark step is atomic with respect to every other job.

use crate::config::Config;
use crate::crawler::dedup::DedupRegistry;
use crate::crawler::scheduler::{Job, JobKind, JobQueue};
use crate::crawler::sink::ResultSink;
use crate::crawler::status::StatusSnapshot;
use crate::model::{AccountRef, CollectibleState, DiscoveredAccount, MatchReport, ProfileSnapshot};
use crate::provider::ProviderClient;
use crate::storage::{load_results, open_cache, save_results, CacheStore};
use crate::CrawlError;
use futures::future::try_join_all;
use futures::FutureExt;
use rand::seq::SliceRandom;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

/// The two frontier queues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// Priority queue: inspections and history fetches
    Main,

    /// FIFO queue: match-report fetches
    Reports,
}

/// Mutable crawl bookkeeping, guarded as one unit
#[derive(Debug, Default)]
struct CrawlState {
    dedup: DedupRegistry,
    sink: ResultSink,
}

/// Main crawl engine
///
/// One instance per process, shared between workers as `Arc<Engine>`.
pub struct Engine {
    config: Config,
    client: ProviderClient,
    main_queue: JobQueue<Job>,
    report_queue: JobQueue<Job>,
    state: Mutex<CrawlState>,
    failed_jobs: AtomicU64,
}

impl Engine {
    /// Creates a new engine instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `cache` - Response cache consulted before every provider request
    pub fn new(config: Config, cache: Arc<dyn CacheStore>) -> Result<Self, CrawlError> {
        let client = ProviderClient::new(&config.provider, cache)?;

        Ok(Self {
            config,
            client,
            main_queue: JobQueue::new("main"),
            report_queue: JobQueue::new("reports"),
            state: Mutex::new(CrawlState::default()),
            failed_jobs: AtomicU64::new(0),
        })
    }

    pub fn client(&self) -> &ProviderClient {
        &self.client
    }

    pub fn queue(&self, lane: Lane) -> &JobQueue<Job> {
        match lane {
            Lane::Main => &self.main_queue,
            Lane::Reports => &self.report_queue,
        }
    }

    /// Clones the pending jobs of one queue, in dispatch order
    pub fn pending(&self, lane: Lane) -> Vec<Job> {
        self.queue(lane).pending()
    }

    /// Accounts discovered so far, in discovery order
    pub fn discovered(&self) -> Vec<DiscoveredAccount> {
        self.lock_state().sink.records().to_vec()
    }

    fn lock_state(&self) -> MutexGuard<'_, CrawlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Routes a job to its queue: prioritized jobs to the main queue,
    /// report fetches to the FIFO queue
    pub fn enqueue(&self, job: Job) {
        match job.priority() {
            Some(priority) => self.main_queue.push(job, priority),
            None => self.report_queue.push(job, 0),
        }
    }

    /// Seeds the crawl with accounts already known to own the collectible
    ///
    /// Seeds are shuffled and queued for inspection. They are not checked
    /// against or added to the inspection set, so a seed reached again
    /// through a match report is inspected a second time. The records are
    /// also preloaded into the result sink, which therefore never shrinks
    /// below the seed file.
    ///
    /// # Returns
    ///
    /// The number of inspection jobs queued
    pub fn seed(&self, mut records: Vec<DiscoveredAccount>) -> usize {
        records.shuffle(&mut rand::thread_rng());

        self.lock_state().sink.preload(records.iter().cloned());

        for record in &records {
            tracing::debug!("Seeding {}", record.account_ref());
            self.enqueue(Job::inspect(record.account_ref()));
        }

        records.len()
    }

    /// Spawns both worker pools and the status reporter
    pub fn start(self: &Arc<Self>) -> CrawlHandle {
        let mut tasks = JoinSet::new();

        for worker_id in 0..self.config.queues.inspect_concurrency {
            tasks.spawn(run_worker(Arc::clone(self), Lane::Main, worker_id));
        }

        for worker_id in 0..self.config.queues.report_concurrency {
            tasks.spawn(run_worker(Arc::clone(self), Lane::Reports, worker_id));
        }

        tasks.spawn(run_status_reporter(Arc::clone(self)));

        tracing::info!(
            "Started {} main workers and {} report workers",
            self.config.queues.inspect_concurrency,
            self.config.queues.report_concurrency
        );

        CrawlHandle { tasks }
    }

    /// Runs one job's handler to completion
    pub async fn run_job(&self, job: Job) -> Result<(), CrawlError> {
        match job {
            Job::Inspect { account, snapshot } => self.handle_inspect(&account, snapshot).await,
            Job::FetchHistory { account, snapshot } => {
                self.handle_history(&account, snapshot).await.map(|_| ())
            }
            Job::FetchReport { match_id } => self.handle_report(&match_id).await.map(|_| ()),
        }
    }

    async fn handle_inspect(
        &self,
        account: &AccountRef,
        snapshot: Option<Box<ProfileSnapshot>>,
    ) -> Result<(), CrawlError> {
        let snapshot = match snapshot {
            Some(snapshot) => *snapshot,
            None => self.client.get_profile(account).await?,
        };

        self.apply_profile(account, snapshot)
    }

    async fn handle_history(
        &self,
        account: &AccountRef,
        snapshot: Option<Box<ProfileSnapshot>>,
    ) -> Result<usize, CrawlError> {
        let snapshot = match snapshot {
            Some(snapshot) => *snapshot,
            None => self.client.get_profile(account).await?,
        };

        let character_ids = snapshot.character_ids(account)?;

        let pages = try_join_all(
            character_ids
                .iter()
                .map(|character_id| self.client.get_activity_history(account, character_id)),
        )
        .await?;

        // Pages are applied in character order; a page without activities
        // fails the job but keeps the matches already scheduled
        let mut scheduled = 0;
        for (character_id, page) in character_ids.iter().zip(&pages) {
            let context = format!("account {} character {}", account, character_id);
            scheduled += self.apply_history(page.match_ids(&context)?);
        }

        Ok(scheduled)
    }

    async fn handle_report(&self, match_id: &str) -> Result<usize, CrawlError> {
        let report = self.client.get_match_report(match_id).await?;
        Ok(self.apply_report(&report))
    }

    /// Inspection step once the snapshot is in hand
    ///
    /// A snapshot without a collectibles table ends the job quietly. A table
    /// that lacks the tracked collectible is an error.
    pub fn apply_profile(
        &self,
        account: &AccountRef,
        snapshot: ProfileSnapshot,
    ) -> Result<(), CrawlError> {
        let collectible_id = &self.config.provider.collectible_id;

        let Some(raw_state) = snapshot.collectible_state(account, collectible_id)? else {
            tracing::debug!("No collectibles visible for {}, skipping", account);
            return Ok(());
        };

        let possessed = CollectibleState::decode(raw_state).is_possessed();

        let schedule_history = {
            let mut state = self.lock_state();

            if possessed {
                if state.sink.record(DiscoveredAccount::new(account, raw_state)) {
                    tracing::info!(
                        "*** Found account with the collectible - {} (state {} {:?}) ***",
                        account,
                        raw_state,
                        CollectibleState::flag_names(raw_state)
                    );
                } else {
                    tracing::debug!(
                        "Found account with the collectible again - {} (state {})",
                        account,
                        raw_state
                    );
                }
            }

            state.dedup.mark_history(&account.account_id)
        };

        if schedule_history {
            self.enqueue(Job::FetchHistory {
                account: account.clone(),
                snapshot: Some(Box::new(snapshot)),
            });
        }

        Ok(())
    }

    /// Schedules a report fetch for every match not seen before
    ///
    /// # Returns
    ///
    /// The number of report jobs queued
    pub fn apply_history(&self, match_ids: impl IntoIterator<Item = String>) -> usize {
        let fresh: Vec<String> = {
            let mut state = self.lock_state();
            match_ids
                .into_iter()
                .filter(|match_id| state.dedup.mark_report(match_id))
                .collect()
        };

        let count = fresh.len();
        for match_id in fresh {
            self.enqueue(Job::FetchReport { match_id });
        }
        count
    }

    /// Schedules an inspection for every real, unseen participant of a match
    ///
    /// # Returns
    ///
    /// The number of inspection jobs queued
    pub fn apply_report(&self, report: &MatchReport) -> usize {
        let fresh: Vec<AccountRef> = {
            let mut state = self.lock_state();
            report
                .participants()
                .filter(|account| !account.is_placeholder())
                .filter(|account| state.dedup.mark_inspected(&account.account_id))
                .cloned()
                .collect()
        };

        let count = fresh.len();
        for account in fresh {
            self.enqueue(Job::inspect(account));
        }
        count
    }

    /// Error sink for both queues: the job is logged and dropped, never retried
    fn record_failure(&self, lane: Lane, job: &str, error: &CrawlError) {
        self.failed_jobs.fetch_add(1, Ordering::Relaxed);
        tracing::error!("ERROR on {:?} job {}: {}", lane, job, error);
    }

    /// Snapshots queue depths and progress counters
    pub fn status(&self) -> StatusSnapshot {
        let counts = self.main_queue.count_by(Job::kind);
        let pending_report = self.report_queue.len();
        let in_flight = self.main_queue.active() + self.report_queue.active();

        let (discovered, inspected) = {
            let state = self.lock_state();
            (state.sink.len(), state.dedup.inspected_count())
        };

        StatusSnapshot {
            discovered,
            inspected,
            pending_inspect: counts.get(&JobKind::Inspect).copied().unwrap_or(0),
            pending_history: counts.get(&JobKind::FetchHistory).copied().unwrap_or(0),
            pending_report,
            in_flight,
            failed_jobs: self.failed_jobs.load(Ordering::Relaxed),
            cache_hits: self.client.cache_hits(),
            network_fetches: self.client.network_fetches(),
        }
    }

    /// One status tick: prints the status line and persists the result sink
    /// if it grew since the last write
    ///
    /// # Returns
    ///
    /// Whether the results file was written
    pub fn report_status(&self) -> Result<bool, CrawlError> {
        println!("{}", self.status());
        self.persist_results()
    }

    /// Overwrites the results file when the sink grew since the last write
    pub fn persist_results(&self) -> Result<bool, CrawlError> {
        let Some(records) = self.lock_state().sink.unpersisted() else {
            return Ok(false);
        };

        let path = Path::new(&self.config.output.results_path);
        save_results(path, &records)?;
        self.lock_state().sink.mark_persisted(records.len());

        tracing::info!(
            "Saved {} discovered accounts to {}",
            records.len(),
            path.display()
        );
        Ok(true)
    }
}

/// Handle to the spawned worker pools and status reporter
pub struct CrawlHandle {
    tasks: JoinSet<()>,
}

impl CrawlHandle {
    /// Waits for the crawl tasks
    ///
    /// Workers and the status reporter loop forever, so this only returns if
    /// every task has exited abnormally.
    pub async fn join(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    tracing::error!("Crawl task panicked: {}", e);
                }
            }
        }
    }

    /// Stops every worker and the status reporter
    pub async fn abort(mut self) {
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
    }
}

async fn run_worker(engine: Arc<Engine>, lane: Lane, worker_id: usize) {
    let queue = engine.queue(lane);

    loop {
        let job = queue.pop().await;
        let label = job.to_string();
        tracing::trace!("[{} #{}] {}", queue.name(), worker_id, label);

        if let Err(error) = run_guarded(engine.run_job(job)).await {
            engine.record_failure(lane, &label, &error);
        }

        queue.complete();
    }
}

/// Awaits a job, turning a panic into an error so the worker keeps its slot
async fn run_guarded<F>(job: F) -> Result<(), CrawlError>
where
    F: Future<Output = Result<(), CrawlError>>,
{
    match AssertUnwindSafe(job).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(CrawlError::JobPanicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

async fn run_status_reporter(engine: Arc<Engine>) {
    let period = Duration::from_millis(engine.config.status.report_interval);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = engine.report_status() {
            tracing::error!("Failed to persist results: {}", e);
        }
    }
}

/// Runs the crawl until interrupted
///
/// This function orchestrates the entire crawl process:
///
/// 1. Open the response cache
/// 2. Load the results file as the seed list
/// 3. Seed the main queue and start the worker pools
/// 4. Wait for Ctrl-C (or for every task to die), then stop the workers and
///    write the results one last time
///
/// # Example
///
/// ```no_run
/// use emblem_crawl::config::load_config;
/// use emblem_crawl::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawl.toml"))?;
/// run_crawl(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<(), CrawlError> {
    let cache = Arc::new(open_cache(Path::new(&config.output.cache_path))?);
    tracing::info!(
        "Opened response cache {} ({} entries)",
        config.output.cache_path,
        cache.len()?
    );

    let results_path = Path::new(&config.output.results_path);
    let seeds = load_results(results_path)?;
    if seeds.is_empty() {
        tracing::warn!(
            "No seed accounts in {}, nothing to explore",
            results_path.display()
        );
    }

    let engine = Arc::new(Engine::new(config, cache)?);
    let seeded = engine.seed(seeds);
    tracing::info!("Queued {} seed accounts for inspection", seeded);

    let mut handle = engine.start();

    tokio::select! {
        interrupted = tokio::signal::ctrl_c() => {
            interrupted?;
            tracing::info!("Interrupt received, stopping workers");
        }
        _ = handle.join() => {
            tracing::error!("All crawl tasks exited, stopping");
        }
    }
    handle.abort().await;

    engine.report_status()?;
    Ok(())
}
