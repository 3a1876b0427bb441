//! HTTP-level behaviour of the API client against a mock server.

use std::time::Duration;

use restaurant_backoffice::api::ApiClient;
use restaurant_backoffice::error::{ApiError, GENERIC_FAILURE};
use restaurant_backoffice::resources::restaurants::{self, Restaurant};
use restaurant_backoffice::resources::ResourceApi;
use restaurant_backoffice::resources::{branches, fetch_record};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeroize::Zeroizing;

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn list_unwraps_envelope_and_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/branches"))
        .and(query_param("restaurantId", "r1"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "ok",
            "data": [
                {"_id": "b1", "name": "Harbor", "restaurantId": "r1"},
                {"id": "b2", "name": "Old Town", "restaurantId": "r1", "isActive": false}
            ],
            "statusCode": 200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client.set_token(Zeroizing::new("tok-123".to_string()));
    let list = branches::for_restaurant(client, "r1").list().await.expect("list");

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, "b1");
    assert!(list[0].is_active, "missing isActive defaults to active");
    assert!(!list[1].is_active);
}

#[tokio::test]
async fn missing_data_is_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/restaurants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let list = restaurants::api(client(&server)).list().await.expect("list");
    assert!(list.is_empty());
}

#[tokio::test]
async fn unsuccessful_envelope_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restaurants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Restaurant name already exists",
            "statusCode": 409
        })))
        .mount(&server)
        .await;

    let input = restaurants::RestaurantInput {
        name: "Harbor Grill".into(),
        business_type: String::new(),
        address: Default::default(),
        phone: String::new(),
        email: String::new(),
        is_active: true,
    };
    let err = restaurants::api(client(&server))
        .create(&input)
        .await
        .expect_err("rejected");
    assert_eq!(
        err,
        ApiError::Rejected {
            message: "Restaurant name already exists".into(),
            status_code: Some(409),
        }
    );
    assert_eq!(err.user_message(), "Restaurant name already exists");
}

#[tokio::test]
async fn status_codes_map_to_the_error_taxonomy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/restaurants/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/restaurants/broken"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "Database unavailable"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/restaurants/opaque"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/restaurants/secret"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client(&server);
    let fetch = |id: &'static str| {
        let client = client.clone();
        async move { fetch_record::<Restaurant>(&client, restaurants::PATH, id).await }
    };

    assert!(fetch("gone").await.expect_err("404").is_not_found());
    assert_eq!(
        fetch("broken").await.expect_err("500").user_message(),
        "Database unavailable"
    );
    assert_eq!(
        fetch("opaque").await.expect_err("502").user_message(),
        GENERIC_FAILURE
    );
    assert!(fetch("secret").await.expect_err("401").is_unauthorized());
}

#[tokio::test]
async fn empty_single_record_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/restaurants/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": null})))
        .mount(&server)
        .await;

    let err = fetch_record::<Restaurant>(&client(&server), restaurants::PATH, "r1")
        .await
        .expect_err("empty");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn update_puts_only_accepted_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/restaurants/r1"))
        .and(body_json(json!({
            "name": "Harbor Grill",
            "businessType": "casual",
            "address": {"street": "", "city": "Porto", "state": "", "postalCode": "", "country": ""},
            "phone": "",
            "email": "",
            "isActive": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"_id": "r1", "name": "Harbor Grill"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let input = restaurants::RestaurantInput {
        name: "Harbor Grill".into(),
        business_type: "casual".into(),
        address: restaurant_backoffice::resources::Address {
            city: "Porto".into(),
            ..Default::default()
        },
        phone: String::new(),
        email: String::new(),
        is_active: true,
    };
    let saved = restaurants::api(client(&server))
        .update("r1", &input)
        .await
        .expect("update");
    assert_eq!(saved.map(|r| r.id), Some("r1".to_string()));
}

#[tokio::test]
async fn unsafe_ids_never_reach_the_network() {
    let server = MockServer::start().await;
    let err = restaurants::api(client(&server))
        .remove("../admin")
        .await
        .expect_err("rejected locally");
    assert!(matches!(err, ApiError::InvalidUrl(_)));
    assert!(server
        .received_requests()
        .await
        .unwrap_or_default()
        .is_empty());
}

#[tokio::test]
async fn unreachable_server_is_a_connectivity_error() {
    let client = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(500)).expect("client");
    let err = restaurants::api(client).list().await.expect_err("offline");
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn truncated_body_is_an_error_not_an_empty_list() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await;
        let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 200\r\n\r\n";
        socket.write_all(head.as_bytes()).await.expect("head");
        socket
            .write_all(br#"{"success":true,"data":[{"_id":"r1","#)
            .await
            .expect("partial body");
        socket.shutdown().await.expect("close");
    });

    let client =
        ApiClient::new(&format!("http://{addr}"), Duration::from_secs(5)).expect("client");
    let err = restaurants::api(client)
        .list()
        .await
        .expect_err("cut-off body");
    assert!(
        matches!(err, ApiError::Decode(_) | ApiError::Network { .. }),
        "unexpected error: {err:?}"
    );
    server.await.expect("server task");
}

#[tokio::test]
async fn rows_with_both_id_spellings_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/branches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"_id": "b1", "id": "b1", "name": "Harbor", "restaurantId": "r1"},
                {"_id": "b2", "name": "Old Town", "restaurant": {"_id": "r1", "name": "Harbor Grill"}}
            ]
        })))
        .mount(&server)
        .await;

    let list = branches::api(client(&server)).list().await.expect("list");
    let ids: Vec<_> = list
        .iter()
        .map(|b| (b.id.as_str(), b.restaurant_id.as_str()))
        .collect();
    assert_eq!(ids, vec![("b1", "r1"), ("b2", "r1")]);
}
