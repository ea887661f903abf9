// Integration tests for `RestClient` using wiremock.
#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use folio_api::{Error, RestClient, TransportConfig};

#[derive(Debug, Deserialize, PartialEq)]
struct Row {
    id: i64,
    name: String,
}

#[derive(Serialize)]
struct NewRow<'a> {
    name: &'a str,
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let client = RestClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_bare_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "A" },
            { "id": 2, "name": "B" },
        ])))
        .mount(&server)
        .await;

    let rows: Vec<Row> = client.list("projects").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].name, "B");
}

#[tokio::test]
async fn test_list_data_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/tech_stack"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "id": 9, "name": "Rust" }] })),
        )
        .mount(&server)
        .await;

    let rows: Vec<Row> = client.list("tech_stack").await.unwrap();
    assert_eq!(rows, vec![Row { id: 9, name: "Rust".into() }]);
}

#[tokio::test]
async fn test_create_sends_bearer_token_and_body() {
    let server = MockServer::start().await;
    let transport =
        TransportConfig::default().with_bearer_token(SecretString::from("s3cret".to_owned()));
    let client = RestClient::new(&server.uri(), &transport).unwrap();

    Mock::given(method("POST"))
        .and(path("/work_experience"))
        .and(header("authorization", "Bearer s3cret"))
        .and(body_json(json!({ "name": "Dev" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 42, "name": "Dev" })))
        .expect(1)
        .mount(&server)
        .await;

    let row: Row = client
        .create("work_experience", &NewRow { name: "Dev" })
        .await
        .unwrap();
    assert_eq!(row.id, 42);
}

#[tokio::test]
async fn test_update_uses_patch() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/social_links/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5, "name": "GitHub" })))
        .expect(1)
        .mount(&server)
        .await;

    let row: Row = client
        .update("social_links", "5", &json!({ "name": "GitHub" }))
        .await
        .unwrap();
    assert_eq!(row.name, "GitHub");
}

#[tokio::test]
async fn test_delete_no_content() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/projects/3"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete("projects", "3").await.unwrap();
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_401_and_403() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "missing token" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/projects/1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "error": "not admin" })))
        .mount(&server)
        .await;

    let err = client
        .create::<Row, _>("projects", &NewRow { name: "x" })
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Unauthorized { status: 401, ref message } if message == "missing token")
    );

    let err = client.delete("projects", "1").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_validation_not_found_conflict() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/projects"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": { "message": "title required" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/projects/8"))
        .respond_with(ResponseTemplate::new(409).set_body_string("row changed"))
        .mount(&server)
        .await;

    let err = client
        .create::<Row, _>("projects", &NewRow { name: "" })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { ref message } if message == "title required"));

    let err = client.get::<Row>("projects", "404").await.unwrap_err();
    assert!(err.is_not_found());

    let err = client
        .update::<Row, _>("projects", "8", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { ref message } if message == "row changed"));
}

#[tokio::test]
async fn test_success_status_with_error_field() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "relation missing" })))
        .mount(&server)
        .await;

    let err = client.list::<Row>("projects").await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 200, ref message } if message == "relation missing"));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/projects/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\": \"not-a-number\"}"))
        .mount(&server)
        .await;

    let err = client.get::<Row>("projects", "1").await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }));
}
