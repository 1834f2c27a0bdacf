// Integration tests for `GatewayClient` using wiremock.
#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use convergent_api::types::{KeyPartValue, MutationBody};
use convergent_api::{Error, GatewayClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, GatewayClient) {
    let server = MockServer::start().await;
    let client = GatewayClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn activate_body() -> MutationBody {
    MutationBody {
        kind: "ACTIVATE".into(),
        target: None,
        payload: json!({ "configId": 43253, "version": 7, "network": "STAGING" }),
    }
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_submit_mutation() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/scopes/appsec/43253/mutations"))
        .and(body_json(json!({
            "kind": "ACTIVATE",
            "payload": { "configId": 43253, "version": 7, "network": "STAGING" }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "9107",
            "status": "RECEIVED"
        })))
        .mount(&server)
        .await;

    let op = client
        .submit_mutation("appsec/43253", &activate_body())
        .await
        .unwrap();

    assert_eq!(op.id, "9107");
    assert_eq!(op.status, "RECEIVED");
    assert!(op.message.is_none());
}

#[tokio::test]
async fn test_get_operation() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/operations/9107"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "9107",
            "status": "ACTIVATED",
            "resourceId": "cfg_43253"
        })))
        .mount(&server)
        .await;

    let op = client.get_operation("9107").await.unwrap();
    assert_eq!(op.status, "ACTIVATED");
    assert_eq!(op.resource_id.as_deref(), Some("cfg_43253"));
}

#[tokio::test]
async fn test_list_items_preserves_order() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/scopes/gtm/example.akadns.net/asmaps/map1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "key": [3133], "attributes": { "nickname": "west" } },
                { "key": [3131], "attributes": { "nickname": "east" } }
            ]
        })))
        .mount(&server)
        .await;

    let items = client
        .list_items("gtm/example.akadns.net/asmaps/map1")
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].key, vec![KeyPartValue::Int(3133)]);
    assert_eq!(items[1].attributes["nickname"], "east");
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    let token = secrecy::SecretString::from("s3cret".to_owned());
    let client = GatewayClient::new(
        server.uri().parse().unwrap(),
        Some(&token),
        &TransportConfig::default(),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/operations/1"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1",
            "status": "PENDING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = client.get_operation("1").await.unwrap();
    assert_eq!(op.status, "PENDING");
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_validation_rejection_keeps_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/scopes/appsec/43253/mutations"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "title": "Invalid input",
            "detail": "Version 7 of configuration 43253 is already active"
        })))
        .mount(&server)
        .await;

    let err = client
        .submit_mutation("appsec/43253", &activate_body())
        .await
        .unwrap_err();

    match err {
        Error::Rejected { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Version 7 of configuration 43253 is already active");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_collection_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/scopes/missing/items"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.list_items("missing").await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got {err:?}");
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/operations/5"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client.get_operation("5").await.unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(err, Error::Server { status: 503, ref message } if message == "upstream unavailable"));
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/operations/5"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "token expired" })))
        .mount(&server)
        .await;

    let err = client.get_operation("5").await.unwrap_err();
    assert!(matches!(err, Error::Authentication { ref message } if message == "token expired"));
}

#[tokio::test]
async fn test_operation_handle_is_one_path_segment() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/operations/p%2F7%3Fx%23y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p/7?x#y",
            "status": "COMPLETE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = client.get_operation("p/7?x#y").await.unwrap();
    assert_eq!(op.status, "COMPLETE");
}

#[tokio::test]
async fn test_garbage_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/operations/5"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client.get_operation("5").await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { ref body, .. } if body == "<html>"));
}
