//! Integration tests for generation catalog lookups
//!
//! Verifies end-to-end behavior of the generations endpoint against a
//! wiremock-based av.by mock server:
//! - Successful lookup with bounded and open-ended generations
//! - 404 treated as "no generations"
//! - Server errors surfaced as errors
//! - Invalid items skipped by the provider

use avsync_avby::provider::AvbyMarketplaceProvider;
use avsync_core::domain::newtypes::{ExternalBrandId, ExternalModelId};
use avsync_core::ports::marketplace_provider::IMarketplaceProvider;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_generations_returns_catalog_items() {
    let (server, client) = common::setup_avby_mock().await;

    common::mount_generations(
        &server,
        8,
        5,
        serde_json::json!([
            { "id": 4985, "name": "III (B8)", "yearFrom": 2007, "yearTo": 2015 },
            { "id": 4986, "name": "IV (B9)", "yearFrom": 2015 }
        ]),
    )
    .await;

    let brand = ExternalBrandId::new(8).unwrap();
    let model = ExternalModelId::new(5).unwrap();

    let generations = client
        .generations(brand, model)
        .await
        .expect("generations request failed");

    assert_eq!(generations.len(), 2);

    assert_eq!(generations[0].id, 4985);
    assert_eq!(generations[0].name, "III (B8)");
    assert_eq!(generations[0].year_from, Some(2007));
    assert_eq!(generations[0].year_to, Some(2015));

    assert_eq!(generations[1].id, 4986);
    assert_eq!(generations[1].year_from, Some(2015));
    assert!(generations[1].year_to.is_none());
}

#[tokio::test]
async fn test_generations_not_found_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/offer-types/cars/catalog/brand-items/99/models/77/generations",
        ))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = avsync_avby::client::AvbyClient::with_base_url(
        std::time::Duration::from_secs(5),
        server.uri(),
    )
    .unwrap();

    let generations = client
        .generations(
            ExternalBrandId::new(99).unwrap(),
            ExternalModelId::new(77).unwrap(),
        )
        .await
        .expect("404 should not be an error");

    assert!(generations.is_empty());
}

#[tokio::test]
async fn test_generations_server_error_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/offer-types/cars/catalog/brand-items/8/models/5/generations",
        ))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = avsync_avby::client::AvbyClient::with_base_url(
        std::time::Duration::from_secs(5),
        server.uri(),
    )
    .unwrap();

    let result = client
        .generations(
            ExternalBrandId::new(8).unwrap(),
            ExternalModelId::new(5).unwrap(),
        )
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_provider_skips_invalid_generations() {
    let (server, client) = common::setup_avby_mock().await;

    // The second item has a zero id and must not survive mapping.
    common::mount_generations(
        &server,
        8,
        5,
        serde_json::json!([
            { "id": 4986, "name": "IV (B9)", "yearFrom": 2015, "yearTo": 2019 },
            { "id": 0, "name": "corrupt", "yearFrom": 2010, "yearTo": 2012 }
        ]),
    )
    .await;

    let provider = AvbyMarketplaceProvider::new(client);

    let generations = provider
        .list_generations(
            ExternalBrandId::new(8).unwrap(),
            ExternalModelId::new(5).unwrap(),
        )
        .await
        .expect("provider lookup failed");

    assert_eq!(generations.len(), 1);
    assert_eq!(generations[0].id.get(), 4986);
}

#[tokio::test]
async fn test_provider_maps_generations_to_domain() {
    let (server, client) = common::setup_avby_mock().await;

    common::mount_generations(
        &server,
        8,
        5,
        serde_json::json!([
            { "id": 4986, "name": "IV (B9)", "yearFrom": 2015 }
        ]),
    )
    .await;

    let provider = AvbyMarketplaceProvider::new(client);

    let generations = provider
        .list_generations(
            ExternalBrandId::new(8).unwrap(),
            ExternalModelId::new(5).unwrap(),
        )
        .await
        .expect("provider lookup failed");

    assert_eq!(generations.len(), 1);
    // Open-ended range is capped at the supplied current year
    let years: Vec<i32> = generations[0].model_years(2017).unwrap().collect();
    assert_eq!(years, vec![2015, 2016, 2017]);
}
