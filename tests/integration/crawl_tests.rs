//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the provider and run the
//! worker pools end-to-end against it.

use emblem_crawl::config::{Config, OutputConfig, ProviderConfig, QueueConfig, StatusConfig};
use emblem_crawl::crawler::Engine;
use emblem_crawl::model::{AccountRef, DiscoveredAccount, MatchReport};
use emblem_crawl::provider::{Endpoints, ProviderClient};
use emblem_crawl::storage::{load_results, CacheStore, MemoryCache, SqliteCache};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COLLECTIBLE: &str = "1111";

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    Config {
        provider: ProviderConfig {
            base_url: format!("{}/Platform", base_url),
            api_key: "test-key".to_string(),
            title: "Destiny2".to_string(),
            collectible_id: COLLECTIBLE.to_string(),
            request_timeout: 5000,
        },
        queues: QueueConfig {
            inspect_concurrency: 2,
            report_concurrency: 3,
        },
        status: StatusConfig {
            report_interval: 50, // Very short for testing
        },
        output: OutputConfig {
            cache_path: dir.join("cache.db").display().to_string(),
            results_path: dir.join("results.json").display().to_string(),
        },
    }
}

fn envelope(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "Response": data,
        "ErrorCode": 1,
        "Message": "Ok"
    }))
}

fn profile(state: u32, characters: &[&str]) -> Value {
    let characters: serde_json::Map<String, Value> = characters
        .iter()
        .map(|c| (c.to_string(), json!({ "characterId": c })))
        .collect();
    json!({
        "characters": { "data": characters, "privacy": 1 },
        "profileCollectibles": {
            "data": { "collectibles": { COLLECTIBLE: { "state": state } } },
            "privacy": 1
        }
    })
}

fn history(match_ids: &[&str]) -> Value {
    let activities: Vec<Value> = match_ids
        .iter()
        .map(|id| json!({ "activityDetails": { "instanceId": id, "mode": 5 } }))
        .collect();
    json!({ "activities": activities })
}

fn report(participants: &[(&str, i32)]) -> Value {
    let entries: Vec<Value> = participants
        .iter()
        .map(|(id, kind)| {
            json!({
                "player": {
                    "destinyUserInfo": { "membershipId": id, "membershipType": kind }
                }
            })
        })
        .collect();
    json!({ "entries": entries })
}

fn seed(id: &str, kind: i32) -> DiscoveredAccount {
    DiscoveredAccount::new(&AccountRef::new(id, kind), 0)
}

/// Polls until the engine has been idle for several consecutive checks
async fn wait_for_idle(engine: &Engine) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let mut idle_checks = 0;

    while idle_checks < 5 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "crawl did not settle: {}",
            engine.status()
        );
        tokio::time::sleep(Duration::from_millis(20)).await;

        if engine.status().is_idle() {
            idle_checks += 1;
        } else {
            idle_checks = 0;
        }
    }
}

#[tokio::test]
async fn test_full_crawl_discovers_co_player() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Seed A owns the collectible and has one character
    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/2/Profile/A/"))
        .and(query_param("components", "Characters,Collectibles"))
        .and(header("x-api-key", "test-key"))
        .respond_with(envelope(profile(0, &["c1"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/2/Account/A/Character/c1/Stats/Activities/"))
        .respond_with(envelope(history(&["M1", "M1"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    // A played with a placeholder account B and with C
    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/Stats/PostGameCarnageReport/M1"))
        .respond_with(envelope(report(&[("A", 2), ("B", 0), ("C", 3)])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/0/Profile/B/"))
        .respond_with(envelope(profile(0, &[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    // C owns the collectible too (obscured), and has no characters
    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/3/Profile/C/"))
        .respond_with(envelope(profile(2, &[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let engine = Arc::new(Engine::new(config, Arc::new(MemoryCache::new())).unwrap());
    engine.seed(vec![seed("A", 2)]);

    let handle = engine.start();
    wait_for_idle(&engine).await;

    // Let the status reporter persist the new discovery
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.abort().await;

    let status = engine.status();
    assert_eq!(status.failed_jobs, 0);
    assert_eq!(status.discovered, 2);
    assert_eq!(status.network_fetches, 4);
    // A is reached again through M1 and re-inspected from the cache
    assert_eq!(status.cache_hits, 1);

    let saved = load_results(&dir.path().join("results.json")).unwrap();
    let ids: Vec<&str> = saved.iter().map(|r| r.account_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "C"]);
    assert_eq!(saved[1].account_kind, 3);
    assert_eq!(saved[1].collectible_state, 2);

    assert!(!engine.persist_results().unwrap());
}

#[tokio::test]
async fn test_failed_job_is_dropped_without_retry() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/1/Profile/A/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let engine = Arc::new(Engine::new(config, Arc::new(MemoryCache::new())).unwrap());
    engine.seed(vec![seed("A", 1)]);

    let handle = engine.start();
    wait_for_idle(&engine).await;
    handle.abort().await;

    let status = engine.status();
    assert_eq!(status.failed_jobs, 1);
    assert_eq!(status.network_fetches, 1);
    assert_eq!(status.pending_total(), 0);
}

#[tokio::test]
async fn test_private_collectibles_stop_the_chain() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/2/Profile/A/"))
        .respond_with(envelope(json!({
            "characters": { "data": { "c1": {} } },
            "profileCollectibles": { "privacy": 2 }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/2/Account/A/Character/c1/Stats/Activities/"))
        .respond_with(envelope(history(&["M1"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let engine = Arc::new(Engine::new(config, Arc::new(MemoryCache::new())).unwrap());
    engine.seed(vec![seed("A", 2)]);

    let handle = engine.start();
    wait_for_idle(&engine).await;
    handle.abort().await;

    assert_eq!(engine.status().failed_jobs, 0);
}

#[tokio::test]
async fn test_history_page_without_activities_keeps_earlier_matches() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/2/Profile/A/"))
        .respond_with(envelope(profile(1, &["c1", "c2"])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/2/Account/A/Character/c1/Stats/Activities/"))
        .respond_with(envelope(history(&["M1"])))
        .mount(&mock_server)
        .await;

    // A character with no activities returns an empty object
    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/2/Account/A/Character/c2/Stats/Activities/"))
        .respond_with(envelope(json!({})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/Stats/PostGameCarnageReport/M1"))
        .respond_with(envelope(report(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let engine = Arc::new(Engine::new(config, Arc::new(MemoryCache::new())).unwrap());
    engine.seed(vec![seed("A", 2)]);

    let handle = engine.start();
    wait_for_idle(&engine).await;
    handle.abort().await;

    // The history job fails on c2, but M1 from c1 was already scheduled
    let status = engine.status();
    assert_eq!(status.failed_jobs, 1);
    assert_eq!(status.network_fetches, 4);
    // Seed A does not own the collectible per the provider, but stays in the sink
    assert_eq!(status.discovered, 1);
}

#[tokio::test]
async fn test_sqlite_cache_survives_restart() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/Stats/PostGameCarnageReport/M9"))
        .respond_with(envelope(report(&[("Z", 3)])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), dir.path());
    let cache_path = dir.path().join("cache.db");
    let url = Endpoints::new(&config.provider.base_url, &config.provider.title)
        .unwrap()
        .match_report("M9")
        .unwrap();

    let first = {
        let cache = Arc::new(SqliteCache::new(&cache_path).unwrap());
        let client = ProviderClient::new(&config.provider, cache).unwrap();
        let payload = client.fetch(&url).await.unwrap();
        assert_eq!(client.network_fetches(), 1);
        payload
    };

    let cache = Arc::new(SqliteCache::new(&cache_path).unwrap());
    assert_eq!(cache.len().unwrap(), 1);

    let client = ProviderClient::new(&config.provider, cache).unwrap();
    let second = client.fetch(&url).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(client.cache_hits(), 1);
    assert_eq!(client.network_fetches(), 0);

    let report: MatchReport = serde_json::from_slice(&second).unwrap();
    let ids: Vec<&str> = report.participants().map(|a| a.account_id.as_str()).collect();
    assert_eq!(ids, vec!["Z"]);
}

#[tokio::test]
async fn test_empty_api_key_header_is_still_sent() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/Platform/Destiny2/Stats/PostGameCarnageReport/M2"))
        .and(header_exists("x-api-key"))
        .respond_with(envelope(report(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.provider.api_key = String::new();

    let client = ProviderClient::new(&config.provider, Arc::new(MemoryCache::new())).unwrap();
    let report = client.get_match_report("M2").await.unwrap();

    assert_eq!(report.participants().count(), 0);
}
