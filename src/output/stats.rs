//! Statistics generation from the results file and response cache
//!
//! This module provides functionality for summarizing what a crawl has
//! found so far without starting one.

use crate::model::{CollectibleState, DiscoveredAccount};
use crate::storage::{load_results, CacheStore, SqliteCache};
use crate::CrawlError;
use std::collections::BTreeMap;
use std::path::Path;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlStatistics {
    /// Accounts in the results file
    pub discovered: usize,

    /// Discovered accounts per platform (`membershipType`)
    pub by_platform: BTreeMap<i32, usize>,

    /// Discovered accounts per set collectible flag
    pub by_flag: BTreeMap<&'static str, usize>,

    /// Responses held in the permanent cache
    pub cached_responses: u64,
}

impl CrawlStatistics {
    /// Builds statistics from a list of discovered accounts
    pub fn from_records(records: &[DiscoveredAccount], cached_responses: u64) -> Self {
        let mut by_platform = BTreeMap::new();
        let mut by_flag = BTreeMap::new();

        for record in records {
            *by_platform.entry(record.account_kind).or_insert(0) += 1;
            for flag in CollectibleState::flag_names(record.collectible_state) {
                *by_flag.entry(flag).or_insert(0) += 1;
            }
        }

        Self {
            discovered: records.len(),
            by_platform,
            by_flag,
            cached_responses,
        }
    }
}

/// Display name of a platform code
pub fn platform_name(kind: i32) -> &'static str {
    match kind {
        0 => "None",
        1 => "Xbox",
        2 => "PlayStation",
        3 => "Steam",
        4 => "Blizzard",
        5 => "Stadia",
        6 => "Epic",
        10 => "Demon",
        254 => "BungieNext",
        _ => "Unknown",
    }
}

/// Loads statistics from the results file and the response cache
///
/// A missing cache file counts as empty and is not created.
///
/// # Arguments
///
/// * `results_path` - The JSON results file
/// * `cache_path` - The SQLite response cache
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - Failed to read either file
pub fn load_statistics(
    results_path: &Path,
    cache_path: &Path,
) -> Result<CrawlStatistics, CrawlError> {
    let records = load_results(results_path)?;

    let cached_responses = if cache_path.exists() {
        SqliteCache::new(cache_path)?.len()?
    } else {
        0
    };

    Ok(CrawlStatistics::from_records(&records, cached_responses))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Accounts with the collectible: {}", stats.discovered);
    println!("  Cached responses: {}", stats.cached_responses);
    println!();

    if !stats.by_platform.is_empty() {
        println!("Accounts by Platform:");
        let mut platforms: Vec<_> = stats.by_platform.iter().collect();
        platforms.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in platforms {
            let percentage = (*count as f64 / stats.discovered as f64) * 100.0;
            println!(
                "  {} ({}): {} ({:.1}%)",
                platform_name(*kind),
                kind,
                count,
                percentage
            );
        }
        println!();
    }

    if !stats.by_flag.is_empty() {
        println!("Collectible Flags:");
        for (flag, count) in &stats.by_flag {
            println!("  {}: {}", flag, count);
        }
        println!();
    }
}
