//! API integration tests
//!
//! Expect a server on localhost:8080 configured with `JWT_SECRET=integration-secret`
//! and the default open loan policy.

use chrono::{Duration, Utc};
use equiploan_server::models::user::UserClaims;
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const SECRET: &str = "integration-secret";

fn token(user_id: i32, is_staff: bool) -> String {
    let now = Utc::now();
    let claims = UserClaims {
        sub: format!("user{}", user_id),
        user_id,
        is_staff,
        is_superuser: false,
        groups: Vec::new(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    };
    format!("Bearer {}", claims.create_token(SECRET).expect("Failed to sign token"))
}

/// Register a drill for `user_id` and return the loan ID
async fn register_drill(client: &Client, user_id: i32) -> i64 {
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", token(user_id, false))
        .json(&json!({
            "part_id": 7,
            "part_name": "Drill",
            "quantity": 1,
            "date_due": (Utc::now() + Duration::days(7)).to_rfc3339()
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No loan ID")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_register_loan() {
    let client = Client::new();

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", token(501, false))
        .json(&json!({ "part_id": 7, "part_name": "Drill" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "active");
    assert_eq!(body["borrower_id"], 501);
    assert!(body["date_returned"].is_null());
    assert_eq!(body["history"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["history"][0]["event_type"], "created");
}

#[tokio::test]
#[ignore]
async fn test_register_zero_quantity() {
    let client = Client::new();

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", token(501, false))
        .json(&json!({ "part_id": 7, "part_name": "Drill", "quantity": 0 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_return_twice() {
    let client = Client::new();
    let loan_id = register_drill(&client, 502).await;

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", token(502, false))
        .json(&json!({ "return_notes": "good condition" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");
    assert_eq!(body["return_notes"], "good condition");
    assert!(body["date_returned"].is_string());
    assert_eq!(body["history"][0]["event_type"], "returned");

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", token(502, false))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_manage_other_users_loan() {
    let client = Client::new();
    let loan_id = register_drill(&client, 503).await;

    let response = client
        .post(format!("{}/loans/{}/extend", BASE_URL, loan_id))
        .header("Authorization", token(504, false))
        .json(&json!({ "date_due": (Utc::now() + Duration::days(30)).to_rfc3339() }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);

    // staff may extend anyone's loan
    let response = client
        .post(format!("{}/loans/{}/extend", BASE_URL, loan_id))
        .header("Authorization", token(1, true))
        .json(&json!({ "date_due": (Utc::now() + Duration::days(30)).to_rfc3339() }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["history"][0]["event_type"], "extended");
}

#[tokio::test]
#[ignore]
async fn test_mark_lost_staff_only() {
    let client = Client::new();
    let loan_id = register_drill(&client, 505).await;

    let response = client
        .post(format!("{}/loans/{}/mark-lost", BASE_URL, loan_id))
        .header("Authorization", token(505, false))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);

    let response = client
        .post(format!("{}/loans/{}/mark-lost", BASE_URL, loan_id))
        .header("Authorization", token(1, true))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "lost");
    assert!(body["date_returned"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_list_and_statistics() {
    let client = Client::new();
    register_drill(&client, 506).await;

    let response = client
        .get(format!("{}/loans?status=active", BASE_URL))
        .header("Authorization", token(506, false))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let results = body["results"].as_array().expect("No results");
    assert_eq!(body["count"].as_u64(), Some(results.len() as u64));
    assert!(results.iter().all(|l| l["borrower_id"] == 506));

    let response = client
        .get(format!("{}/loans/statistics", BASE_URL))
        .header("Authorization", token(506, false))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["active_loans"].as_i64().unwrap_or(0) >= 1);
}

#[tokio::test]
#[ignore]
async fn test_unknown_loan() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/999999999", BASE_URL))
        .header("Authorization", token(1, true))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
