//! Shared test helpers for av.by API integration tests
//!
//! Provides wiremock-based mock server setup for the two av.by endpoints
//! the adapter talks to. Each helper mounts one endpoint and leaves the
//! assertions to the individual tests.

use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use avsync_avby::client::AvbyClient;

/// Starts a mock server and returns it together with a client pointing at it.
pub async fn setup_avby_mock() -> (MockServer, AvbyClient) {
    let server = MockServer::start().await;
    let client = AvbyClient::with_base_url(Duration::from_secs(5), server.uri())
        .expect("build av.by client");
    (server, client)
}

/// Mounts the generations endpoint for one (brand, model) pair.
pub async fn mount_generations(
    server: &MockServer,
    brand: u32,
    model: u32,
    body: serde_json::Value,
) {
    let endpoint =
        format!("/offer-types/cars/catalog/brand-items/{brand}/models/{model}/generations");
    Mock::given(method("GET"))
        .and(path(&endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts the price-statistics endpoint for one exact query combination.
pub async fn mount_price_statistics(
    server: &MockServer,
    brand: u32,
    model: u32,
    generation: u32,
    year: i32,
    adverts: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path("/offer-types/cars/price-statistics"))
        .and(query_param("brand", brand.to_string()))
        .and(query_param("generation", generation.to_string()))
        .and(query_param("model", model.to_string()))
        .and(query_param("year", year.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "lastSoldAdverts": adverts
        })))
        .mount(server)
        .await;
}
