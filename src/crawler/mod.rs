//! Crawler module for walking the match-history graph
//!
//! This module contains the core crawling logic, including:
//! - Job types and the two frontier queues
//! - Dedup sets guarding each job type
//! - The result sink and its persistence
//! - Worker pools and the periodic status reporter

mod coordinator;
mod dedup;
mod scheduler;
mod sink;
mod status;

pub use coordinator::{run_crawl, CrawlHandle, Engine, Lane};
pub use dedup::DedupRegistry;
pub use scheduler::{Job, JobKind, JobQueue, HISTORY_PRIORITY, INSPECT_PRIORITY};
pub use sink::ResultSink;
pub use status::StatusSnapshot;

use crate::config::Config;
use crate::CrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the response cache
/// 2. Load the seed accounts from the results file
/// 3. Start the worker pools and the status reporter
/// 4. Persist discoveries until interrupted
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(())` - Crawl stopped cleanly after an interrupt
/// * `Err(CrawlError)` - Crawl could not start or the final write failed
pub async fn crawl(config: Config) -> Result<(), CrawlError> {
    run_crawl(config).await
}
