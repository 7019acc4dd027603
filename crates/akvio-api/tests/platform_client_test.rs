#![allow(clippy::unwrap_used)]
// Integration tests for `PlatformClient` using wiremock.

use akvio_core::{DeviceFilter, OptionProvider};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use akvio_api::{Error, PlatformClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PlatformClient) {
    let server = MockServer::start().await;
    let secret: secrecy::SecretString = "test-key".to_string().into();
    let client = PlatformClient::from_api_key(&server.uri(), &secret).unwrap();
    (server, client)
}

fn device_json(id: &str, name: &str, domain: &str) -> serde_json::Value {
    json!({ "id": id, "name": name, "domain": { "id": domain } })
}

fn device_page(devices: Vec<serde_json::Value>) -> serde_json::Value {
    json!({
        "offset": 0,
        "limit": 50,
        "total": devices.len(),
        "data": devices,
    })
}

// ── Auth & URL handling ─────────────────────────────────────────────

#[tokio::test]
async fn test_api_key_header_is_sent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/devices"))
        .and(header("X-API-KEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_page(vec![])))
        .expect(1)
        .mount(&server)
        .await;

    client.list_devices(None, None, None).await.unwrap();
}

#[tokio::test]
async fn test_base_url_keeps_existing_v3_suffix() {
    let server = MockServer::start().await;
    let secret: secrecy::SecretString = "test-key".to_string().into();
    let base = format!("{}/v3/", server.uri());
    let client = PlatformClient::from_api_key(&base, &secret).unwrap();

    Mock::given(method("GET"))
        .and(path("/v3/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_page(vec![])))
        .expect(1)
        .mount(&server)
        .await;

    client.list_devices(None, None, None).await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_api_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/devices"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let result = client.list_devices(None, None, None).await;
    assert!(matches!(result, Err(Error::InvalidApiKey)));
}

#[tokio::test]
async fn test_error_body_message_is_surfaced() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/devices"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": "Unprocessable Entity",
            "message": "invalid filter expression",
            "status": 422,
        })))
        .mount(&server)
        .await;

    let result = client.list_devices(None, Some("{broken"), None).await;
    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "invalid filter expression");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Device listings ─────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices_passes_all_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/devices"))
        .and(query_param("fields", "id,name,domain"))
        .and(query_param("search", "valve"))
        .and(query_param("filter", r#"{"domain.id":"dom-1"}"#))
        .and(query_param("parentId", "m1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(device_page(vec![device_json("d1", "Valve 7", "dom-1")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let devices = client
        .list_devices(Some("valve"), Some(r#"{"domain.id":"dom-1"}"#), Some("m1"))
        .await
        .unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, "d1");
    assert_eq!(devices[0].name, "Valve 7");
    assert_eq!(devices[0].domain.id, "dom-1");
}

#[tokio::test]
async fn test_master_device_type_is_cached() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/device-types/master"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "dt-1", "name": "Master Device" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let first = client.master_device_type().await.unwrap().id.clone();
    let second = client.master_device_type().await.unwrap().id.clone();
    assert_eq!(first, "dt-1");
    assert_eq!(second, "dt-1");
}

// ── Topics & data keys ──────────────────────────────────────────────

#[tokio::test]
async fn test_list_topics() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/devices/d1/query/topics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["uplink", "downlink"])))
        .mount(&server)
        .await;

    let topics = client.list_topics("d1").await.unwrap();
    assert_eq!(topics, vec!["uplink".to_owned(), "downlink".to_owned()]);
}

#[tokio::test]
async fn test_list_data_keys() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/devices/d1/query/keys"))
        .and(query_param("topic", "uplink"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["temperature", "humidity"])))
        .mount(&server)
        .await;

    let keys = client.list_data_keys("d1", "uplink").await.unwrap();
    assert_eq!(keys, vec!["temperature".to_owned(), "humidity".to_owned()]);
}

// ── OptionProvider composition ──────────────────────────────────────

#[tokio::test]
async fn test_master_candidates_filter_by_master_device_type() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/device-types/master"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "dt-1", "name": "Master Device" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/devices"))
        .and(query_param("filter", r#"{"deviceType.id":"dt-1"}"#))
        .and(query_param("search", "gateway"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(device_page(vec![device_json("m1", "Gateway A", "dom-1")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let masters = client
        .list_master_candidates(Some("gateway".into()))
        .await
        .unwrap();
    assert_eq!(masters.len(), 1);
    assert_eq!(masters[0].id, "m1");
}

#[tokio::test]
async fn test_device_candidates_scoped_to_domain_and_master() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/devices"))
        .and(query_param("filter", r#"{"domain.id":"dom-1"}"#))
        .and(query_param("parentId", "m1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(device_page(vec![device_json("d1", "Valve 7", "dom-1")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let filter = DeviceFilter {
        domain_id: Some("dom-1".into()),
        master_device_id: Some("m1".into()),
    };
    let devices = client.list_device_candidates(None, filter).await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, "d1");
}

#[tokio::test]
async fn test_provider_failures_carry_the_api_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v3/devices/d1/query/topics"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "query engine unavailable",
        })))
        .mount(&server)
        .await;

    let result = OptionProvider::list_topics(&client, "d1".into()).await;
    let error = result.unwrap_err();
    assert!(error.to_string().contains("query engine unavailable"));
}
