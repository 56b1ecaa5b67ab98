//! Output module for reporting on a crawl's results
//!
//! This module handles:
//! - Summarizing the results file and the response cache
//! - Printing those statistics for the `--stats` mode

pub mod stats;

pub use stats::{load_statistics, platform_name, print_statistics, CrawlStatistics};
