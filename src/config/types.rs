use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Emblem-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub queues: QueueConfig,
    #[serde(default)]
    pub status: StatusConfig,
    pub output: OutputConfig,
}

/// Remote data provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL every request path is joined onto
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Static API credential, sent as `x-api-key` even when empty
    #[serde(rename = "api-key", default)]
    pub api_key: String,

    /// Title path segment (e.g. "Destiny2")
    pub title: String,

    /// Hash of the collectible being hunted
    #[serde(rename = "collectible-id")]
    pub collectible_id: String,

    /// Per-request timeout in milliseconds (0 disables it)
    #[serde(rename = "request-timeout", default)]
    pub request_timeout: u64,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.request_timeout > 0).then(|| Duration::from_millis(self.request_timeout))
    }
}

/// Worker pool sizes for the two frontier queues
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Workers draining the priority queue (inspections and history fetches)
    #[serde(rename = "inspect-concurrency", default = "default_inspect_concurrency")]
    pub inspect_concurrency: usize,

    /// Workers draining the FIFO match-report queue
    #[serde(rename = "report-concurrency", default = "default_report_concurrency")]
    pub report_concurrency: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            inspect_concurrency: default_inspect_concurrency(),
            report_concurrency: default_report_concurrency(),
        }
    }
}

fn default_inspect_concurrency() -> usize {
    5
}

fn default_report_concurrency() -> usize {
    10
}

/// Status reporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    /// Time between status ticks (milliseconds)
    #[serde(rename = "report-interval", default = "default_report_interval")]
    pub report_interval: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            report_interval: default_report_interval(),
        }
    }
}

fn default_report_interval() -> u64 {
    1000
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite response cache
    #[serde(rename = "cache-path")]
    pub cache_path: String,

    /// Path to the JSON results file (also read as the seed list)
    #[serde(rename = "results-path")]
    pub results_path: String,
}
