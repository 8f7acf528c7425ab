//! Common test utilities for cutout-dl integration tests

use cutout_dl::{Config, EndpointConfig, FetchConfig, RetryConfig};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A config pointing every endpoint at the mock server, with fast retries
/// and a tempdir output location
#[allow(dead_code)]
pub fn test_config(server_uri: &str, out_dir: &Path) -> Config {
    Config {
        fetch: FetchConfig {
            output_dir: out_dir.to_path_buf(),
            cutout_size: 2,
            sector: cutout_dl::Sector::new(55),
            item_timeout: Duration::from_secs(5),
        },
        endpoints: EndpointConfig {
            lookup_base_url: server_uri.to_string(),
            cutout_api_base_url: server_uri.to_string(),
            cube_store_base_url: server_uri.to_string(),
        },
        retry: RetryConfig {
            max_attempts: 0,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        workers: Some(2),
    }
}

/// Lookup response body listing one record per (sector, camera, ccd) triple
#[allow(dead_code)]
pub fn lookup_body(records: &[(&str, &str, &str)]) -> serde_json::Value {
    json!({
        "results": records
            .iter()
            .map(|(sector, camera, ccd)| {
                json!({ "sector": sector, "camera": camera, "ccd": ccd })
            })
            .collect::<Vec<_>>(),
    })
}

/// Mount a lookup service answering every `/sector` query with `records`
#[allow(dead_code)]
pub async fn mount_lookup(server: &MockServer, records: &[(&str, &str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/sector"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_body(records)))
        .mount(server)
        .await;
}

/// Mount a cutout API answering every `/astrocut` query with `body`
#[allow(dead_code)]
pub async fn mount_cutout_api(server: &MockServer, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path("/astrocut"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}
