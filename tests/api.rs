use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use nyayasetu_api::app;
use nyayasetu_api::auth::SessionStore;
use nyayasetu_api::config::{
    PaymentConfig, ServerConfig, SessionConfig, Settings, StorageBackend, StorageConfig,
};
use nyayasetu_api::payments::RazorpayClient;
use nyayasetu_api::storage::{seed, DynStorage, MemoryStorage};

fn test_settings() -> Settings {
    Settings {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            production: false,
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            mongodb_uri: "mongodb://localhost:27017".into(),
            database: "nyayasetu_test".into(),
            seed_demo_data: true,
        },
        session: SessionConfig {
            secret: "integration-test-secret".into(),
            ttl_hours: 24,
        },
        payment: PaymentConfig {
            key_id: "rzp_test_key".into(),
            key_secret: "rzp_test_secret".into(),
            base_url: "https://api.razorpay.com".into(),
            connection_fee: 49900,
            currency: "INR".into(),
        },
    }
}

async fn test_app(seeded: bool) -> Router {
    let settings = test_settings();
    let storage: DynStorage = Arc::new(MemoryStorage::new());
    if seeded {
        seed::populate(storage.as_ref()).await.unwrap();
    }
    let sessions = Arc::new(SessionStore::new(
        &settings.session,
        settings.server.production,
    ));
    let gateway = Arc::new(RazorpayClient::new(&settings.payment));
    app::router(storage, sessions, gateway, settings)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn register_body(username: &str, email: &str) -> Value {
    json!({
        "username": username,
        "password": "secret123",
        "email": email,
        "fullName": "Test User",
        "role": "client",
    })
}

#[tokio::test]
async fn status_endpoint_responds() {
    let app = test_app(false).await;
    let response = app.oneshot(get_request("/api/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn register_then_duplicate_username_is_rejected() {
    let app = test_app(false).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            register_body("rahul", "rahul@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "rahul");
    assert!(body["user"].get("password").is_none());

    // Same username, different email and case.
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            register_body("RAHUL", "other@example.com"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn register_validation_reports_field_errors() {
    let app = test_app(false).await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "username": "ab",
                "password": "short",
                "email": "not-an-email",
                "fullName": "",
                "role": "client",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Validation error");
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.len() >= 3);
}

#[tokio::test]
async fn advocate_registration_creates_placeholder_profile() {
    let app = test_app(true).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "username": "newadv",
                "password": "secret123",
                "email": "newadv@example.com",
                "fullName": "New Advocate",
                "role": "advocate",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get_request("/api/advocates")).await.unwrap();
    let body = body_json(response).await;
    let advocates = body["data"].as_array().unwrap();
    assert_eq!(advocates.len(), 13);
    let new_profile = advocates
        .iter()
        .find(|a| a["user"]["fullName"] == "New Advocate")
        .unwrap();
    assert_eq!(new_profile["bio"], "Advocate profile for New Advocate");
    assert_eq!(new_profile["experience"], 0);
    assert_eq!(new_profile["barCouncilNumber"], "Not verified");
    assert_eq!(new_profile["verified"], false);
}

#[tokio::test]
async fn login_sets_cookie_and_user_endpoint_resolves_it() {
    let app = test_app(true).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "username": "adv1", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "adv1");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/user")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "adv1");
}

#[tokio::test]
async fn bad_credentials_get_a_uniform_401() {
    let app = test_app(true).await;

    for body in [
        json!({ "username": "adv1", "password": "wrong" }),
        json!({ "username": "nobody", "password": "password123" }),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/auth/login", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Incorrect username or password");
    }
}

#[tokio::test]
async fn user_endpoint_requires_a_session() {
    let app = test_app(false).await;
    let response = app.oneshot(get_request("/api/auth/user")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn practice_area_filter_returns_family_law_advocates() {
    let app = test_app(true).await;
    let response = app
        .oneshot(get_request("/api/advocates?practiceArea=Family%20Law"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let advocates = body["data"].as_array().unwrap();
    assert_eq!(advocates.len(), 2);
    for advocate in advocates {
        let names: Vec<&str> = advocate["specialties"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"Family Law"));
    }
}

#[tokio::test]
async fn unfiltered_advocate_list_returns_everyone() {
    let app = test_app(true).await;
    let response = app.oneshot(get_request("/api/advocates")).await.unwrap();
    let body = body_json(response).await;
    let advocates = body["data"].as_array().unwrap();
    assert_eq!(advocates.len(), 12);
    // Demo profiles ship verified.
    assert!(advocates.iter().all(|a| a["verified"] == true));
}

#[tokio::test]
async fn unknown_advocate_is_404() {
    let app = test_app(true).await;
    let response = app
        .oneshot(get_request("/api/advocates/999999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Advocate not found");
}

#[tokio::test]
async fn practice_areas_list_is_seeded() {
    let app = test_app(true).await;
    let response = app
        .oneshot(get_request("/api/practice-areas"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 17);
}

#[tokio::test]
async fn guest_chat_round_trip_lands_in_guest_history() {
    let app = test_app(false).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/chat",
            json!({ "message": "What does Section 420 of IPC deal with?" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["response"].as_str().unwrap().contains("cheating"));

    let response = app
        .oneshot(get_request("/api/chat/history/guest"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let messages = body["data"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["isUserMessage"], true);
    assert_eq!(messages[1]["isUserMessage"], false);
}

#[tokio::test]
async fn empty_chat_message_is_rejected() {
    let app = test_app(false).await;
    let response = app
        .oneshot(json_request("POST", "/api/chat", json!({ "message": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn suggested_questions_endpoint() {
    let app = test_app(false).await;
    let response = app
        .oneshot(get_request("/api/chat/suggested-questions"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
}

async fn login_cookie(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "username": username, "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn review_updates_advocate_rating() {
    let app = test_app(true).await;
    let cookie = login_cookie(&app, "client1").await;

    // First advocate in the seeded list.
    let response = app
        .clone()
        .oneshot(get_request("/api/advocates"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let advocate_id = body["data"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/advocates/{}/reviews", advocate_id))
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &cookie)
                .body(Body::from(
                    json!({ "rating": 4, "content": "Helpful" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(get_request(&format!("/api/advocates/{}", advocate_id)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["rating"], 4.0);
    assert_eq!(body["data"]["reviewCount"], 1);
}

#[tokio::test]
async fn review_requires_authentication() {
    let app = test_app(true).await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/advocates/1/reviews",
            json!({ "rating": 5 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let app = test_app(true).await;
    let cookie = login_cookie(&app, "client1").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/advocates/1/reviews")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &cookie)
                .body(Body::from(json!({ "rating": 6 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payment_verify_rejects_bad_signature() {
    let app = test_app(true).await;
    let cookie = login_cookie(&app, "client1").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/payments/verify")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &cookie)
                .body(Body::from(
                    json!({
                        "connectionId": "1",
                        "orderId": "order_x",
                        "paymentId": "pay_x",
                        "signature": "deadbeef",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    // No connection was ever created, so the lookup fails first.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn connections_list_requires_auth_and_starts_empty() {
    let app = test_app(true).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/connections"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = login_cookie(&app, "client1").await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/connections")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = test_app(true).await;
    let cookie = login_cookie(&app, "adv1").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/user")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
