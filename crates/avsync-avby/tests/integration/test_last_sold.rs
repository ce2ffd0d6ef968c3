//! Integration tests for last-sold listing queries
//!
//! Verifies end-to-end behavior of the price-statistics endpoint through
//! the marketplace provider: advert mapping, photo URL selection, "no
//! data" answers, and malformed advert handling.

use avsync_avby::provider::AvbyMarketplaceProvider;
use avsync_core::domain::newtypes::{ExternalBrandId, ExternalGenerationId, ExternalModelId};
use avsync_core::ports::marketplace_provider::IMarketplaceProvider;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

fn ids(brand: u32, model: u32, generation: u32) -> (ExternalBrandId, ExternalModelId, ExternalGenerationId) {
    (
        ExternalBrandId::new(brand).unwrap(),
        ExternalModelId::new(model).unwrap(),
        ExternalGenerationId::new(generation).unwrap(),
    )
}

#[tokio::test]
async fn test_last_sold_maps_adverts_to_listings() {
    let (server, client) = common::setup_avby_mock().await;

    common::mount_price_statistics(
        &server,
        8,
        5,
        4986,
        2021,
        serde_json::json!([
            {
                "id": 105534885,
                "properties": [
                    { "name": "brand", "value": "Audi" },
                    { "name": "model", "value": "A4" },
                    { "name": "mileage_km", "value": 215000 },
                    { "name": "vin_checked", "value": null }
                ],
                "photos": [
                    {
                        "big": { "url": "https://cdn.av.by/big/1.jpg" },
                        "medium": { "url": "https://cdn.av.by/medium/1.jpg" }
                    },
                    {
                        "medium": { "url": "https://cdn.av.by/medium/2.jpg" },
                        "small": { "url": "https://cdn.av.by/small/2.jpg" }
                    }
                ]
            }
        ]),
    )
    .await;

    let provider = AvbyMarketplaceProvider::new(client);
    let (brand, model, generation) = ids(8, 5, 4986);

    let listings = provider
        .list_last_sold(brand, model, generation, 2021)
        .await
        .expect("last-sold query failed");

    assert_eq!(listings.len(), 1);

    let listing = &listings[0];
    assert_eq!(listing.external_id.as_str(), "105534885");
    assert_eq!(listing.brand_name(), Some("Audi"));
    assert_eq!(listing.model_name(), Some("A4"));
    assert_eq!(listing.property("mileage_km"), Some("215000"));
    // Null-valued property dropped
    assert_eq!(listing.property("vin_checked"), None);
    // Largest variant wins per photo
    assert_eq!(
        listing.photo_urls,
        vec!["https://cdn.av.by/big/1.jpg", "https://cdn.av.by/medium/2.jpg"]
    );
}

#[tokio::test]
async fn test_last_sold_not_found_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offer-types/cars/price-statistics"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = avsync_avby::client::AvbyClient::with_base_url(
        std::time::Duration::from_secs(5),
        server.uri(),
    )
    .unwrap();
    let provider = AvbyMarketplaceProvider::new(client);
    let (brand, model, generation) = ids(8, 5, 4986);

    let listings = provider
        .list_last_sold(brand, model, generation, 1999)
        .await
        .expect("404 should not be an error");

    assert!(listings.is_empty());
}

#[tokio::test]
async fn test_last_sold_without_adverts_is_empty() {
    let (server, client) = common::setup_avby_mock().await;

    common::mount_price_statistics(&server, 8, 5, 4986, 2021, serde_json::json!([])).await;

    let provider = AvbyMarketplaceProvider::new(client);
    let (brand, model, generation) = ids(8, 5, 4986);

    let listings = provider
        .list_last_sold(brand, model, generation, 2021)
        .await
        .expect("empty last-sold query failed");

    assert!(listings.is_empty());
}

#[tokio::test]
async fn test_last_sold_tolerates_string_ids() {
    let (server, client) = common::setup_avby_mock().await;

    common::mount_price_statistics(
        &server,
        10,
        20,
        1,
        2021,
        serde_json::json!([
            { "id": "X1", "properties": [], "photos": [] }
        ]),
    )
    .await;

    let provider = AvbyMarketplaceProvider::new(client);
    let (brand, model, generation) = ids(10, 20, 1);

    let listings = provider
        .list_last_sold(brand, model, generation, 2021)
        .await
        .expect("string-id query failed");

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].external_id.as_str(), "X1");
}

#[tokio::test]
async fn test_last_sold_skips_adverts_with_blank_ids() {
    let (server, client) = common::setup_avby_mock().await;

    common::mount_price_statistics(
        &server,
        8,
        5,
        4986,
        2021,
        serde_json::json!([
            { "id": "  ", "properties": [], "photos": [] },
            { "id": 42, "properties": [], "photos": [] }
        ]),
    )
    .await;

    let provider = AvbyMarketplaceProvider::new(client);
    let (brand, model, generation) = ids(8, 5, 4986);

    let listings = provider
        .list_last_sold(brand, model, generation, 2021)
        .await
        .expect("query with blank-id advert failed");

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].external_id.as_str(), "42");
}

#[tokio::test]
async fn test_last_sold_server_error_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/offer-types/cars/price-statistics"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = avsync_avby::client::AvbyClient::with_base_url(
        std::time::Duration::from_secs(5),
        server.uri(),
    )
    .unwrap();
    let provider = AvbyMarketplaceProvider::new(client);
    let (brand, model, generation) = ids(8, 5, 4986);

    let result = provider.list_last_sold(brand, model, generation, 2021).await;

    assert!(result.is_err());
}
