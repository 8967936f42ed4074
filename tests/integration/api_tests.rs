//! API integration tests
//!
//! These run against a live server with a seeded admin account
//! (admin@jubilee-library.local / admin-password).

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

const ADMIN_EMAIL: &str = "admin@jubilee-library.local";
const ADMIN_PASSWORD: &str = "admin-password";

/// Helper to get a token for the seeded admin account
async fn admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": ADMIN_EMAIL,
            "password": ADMIN_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Helper to register a fresh user, returning their token and email
async fn register_user(client: &Client) -> (String, String) {
    let email = format!("user-{}@example.com", Uuid::new_v4().simple());

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Test User",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse register response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    (token, email)
}

/// Helper to create a book with the given number of copies
async fn create_book(client: &Client, token: &str, copies: i64) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": format!("Test Book {}", Uuid::new_v4().simple()),
            "author": "Test Author",
            "total_copies": copies
        }))
        .send()
        .await
        .expect("Failed to send create book request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse book response")
}

async fn get_book(client: &Client, token: &str, book_id: &str) -> Value {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send get book request");

    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse book response")
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
async fn test_register_and_login() {
    let client = Client::new();
    let (_, email) = register_user(&client).await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["email"], email.to_lowercase());
    assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (_, email) = register_user(&client).await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "wrong-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_register_rejects_short_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Test User",
            "email": format!("user-{}@example.com", Uuid::new_v4().simple()),
            "password": "short"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let (token, email) = register_user(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], email.to_lowercase());
    assert!(body["password_hash"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = admin_token(&client).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_create_book_requires_admin() {
    let client = Client::new();
    let (token, _) = register_user(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Unauthorized Book",
            "author": "Nobody",
            "total_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

/// Full lifecycle: request, duplicate rejected, approve decrements the
/// counter, exhausted availability rejected, return restores the counter,
/// double return rejected.
#[tokio::test]
#[ignore]
async fn test_request_lifecycle() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (user, _) = register_user(&client).await;

    let book = create_book(&client, &admin, 1).await;
    let book_id = book["id"].as_str().expect("No book ID").to_string();
    assert_eq!(book["available_copies"], 1);

    // File a request
    let response = client
        .post(format!("{}/requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let request: Value = response.json().await.expect("Failed to parse response");
    let request_id = request["id"].as_str().expect("No request ID").to_string();
    assert_eq!(request["status"], "pending");

    // A second request for the same book is a duplicate
    let response = client
        .post(format!("{}/requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Approve: request closes, borrow opens, counter drops
    let response = client
        .post(format!("{}/requests/{}/approve", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["request"]["status"], "approved");
    assert_eq!(body["borrow"]["status"], "active");
    assert!(body["borrow"]["due_at"].is_string());
    let borrow_id = body["borrow"]["id"].as_str().expect("No borrow ID").to_string();

    let book = get_book(&client, &admin, &book_id).await;
    assert_eq!(book["available_copies"], 0);

    // No copies left: a fresh user's request is rejected
    let (other, _) = register_user(&client).await;
    let response = client
        .post(format!("{}/requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", other))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Return: record closes, counter restored
    let response = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "returned");
    assert!(body["borrow"]["returned_at"].is_string());

    let book = get_book(&client, &admin, &book_id).await;
    assert_eq!(book["available_copies"], 1);

    // A second return of the same record is refused
    let response = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Cleanup
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_cancel_only_acts_on_pending() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (user, _) = register_user(&client).await;

    let book = create_book(&client, &admin, 1).await;
    let book_id = book["id"].as_str().expect("No book ID").to_string();

    let response = client
        .post(format!("{}/requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let request: Value = response.json().await.expect("Failed to parse response");
    let request_id = request["id"].as_str().expect("No request ID").to_string();

    // Someone else cannot cancel it
    let (other, _) = register_user(&client).await;
    let response = client
        .post(format!("{}/requests/{}/cancel", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", other))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    // The owner can
    let response = client
        .post(format!("{}/requests/{}/cancel", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "cancelled");

    // But only once
    let response = client
        .post(format!("{}/requests/{}/cancel", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // A closed request cannot be approved either
    let response = client
        .post(format!("{}/requests/{}/approve", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Cleanup
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_approve_rejects_out_of_range_due_days() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (user, _) = register_user(&client).await;

    let book = create_book(&client, &admin, 1).await;
    let book_id = book["id"].as_str().expect("No book ID").to_string();

    let response = client
        .post(format!("{}/requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let request: Value = response.json().await.expect("Failed to parse response");
    let request_id = request["id"].as_str().expect("No request ID").to_string();

    let response = client
        .post(format!("{}/requests/{}/approve", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "due_days": 365 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Still pending, so it can be cancelled and cleaned up
    let response = client
        .post(format!("{}/requests/{}/cancel", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_reject_closes_request() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (user, _) = register_user(&client).await;

    let book = create_book(&client, &admin, 1).await;
    let book_id = book["id"].as_str().expect("No book ID").to_string();

    let response = client
        .post(format!("{}/requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let request: Value = response.json().await.expect("Failed to parse response");
    let request_id = request["id"].as_str().expect("No request ID").to_string();

    let response = client
        .post(format!("{}/requests/{}/reject", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "reason": "Reserved for course work" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejection_reason"], "Reserved for course work");

    // Rejection does not touch the counter
    let book = get_book(&client, &admin, &book_id).await;
    assert_eq!(book["available_copies"], 1);

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_copy_count_cannot_drop_below_outstanding() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (user, _) = register_user(&client).await;

    let book = create_book(&client, &admin, 2).await;
    let book_id = book["id"].as_str().expect("No book ID").to_string();

    // Borrow both copies through sequential request/approve rounds
    let mut borrow_ids = Vec::new();
    for _ in 0..2 {
        let response = client
            .post(format!("{}/requests", BASE_URL))
            .header("Authorization", format!("Bearer {}", user))
            .json(&json!({ "book_id": book_id }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
        let request: Value = response.json().await.expect("Failed to parse response");
        let request_id = request["id"].as_str().expect("No request ID").to_string();

        let response = client
            .post(format!("{}/requests/{}/approve", BASE_URL, request_id))
            .header("Authorization", format!("Bearer {}", admin))
            .json(&json!({}))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        let body: Value = response.json().await.expect("Failed to parse response");
        borrow_ids.push(body["borrow"]["id"].as_str().expect("No borrow ID").to_string());
    }

    // Two copies out: shrinking to one is refused
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({ "total_copies": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Deleting is refused too while copies are out
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Cleanup: return both, then delete
    for borrow_id in &borrow_ids {
        let response = client
            .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
            .header("Authorization", format!("Bearer {}", user))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
    }

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_notifications_record_lifecycle_events() {
    let client = Client::new();
    let admin = admin_token(&client).await;
    let (user, _) = register_user(&client).await;

    let book = create_book(&client, &admin, 1).await;
    let book_id = book["id"].as_str().expect("No book ID").to_string();

    let response = client
        .post(format!("{}/requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let request: Value = response.json().await.expect("Failed to parse response");
    let request_id = request["id"].as_str().expect("No request ID").to_string();

    let response = client
        .post(format!("{}/requests/{}/approve", BASE_URL, request_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let approved: Value = response.json().await.expect("Failed to parse response");
    let borrow_id = approved["borrow"]["id"].as_str().expect("No borrow ID").to_string();

    let response = client
        .get(format!("{}/notifications", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let notifications: Value = response.json().await.expect("Failed to parse response");
    let kinds: Vec<&str> = notifications
        .as_array()
        .expect("Expected an array")
        .iter()
        .filter_map(|n| n["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"request_created"));
    assert!(kinds.contains(&"request_approved"));

    // Mark the newest one read
    let first_id = notifications[0]["id"].as_str().expect("No notification ID");
    let response = client
        .post(format!("{}/notifications/{}/read", BASE_URL, first_id))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["read"], true);

    // Cleanup
    let _ = client
        .post(format!("{}/borrows/{}/return", BASE_URL, borrow_id))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await;
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_admin_request_flow() {
    let client = Client::new();
    let (user, _) = register_user(&client).await;

    let response = client
        .post(format!("{}/admin-requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let request_id = body["id"].as_str().expect("No request ID").to_string();
    assert_eq!(body["status"], "pending");

    // A repeat request surfaces the same row
    let response = client
        .post(format!("{}/admin-requests", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"], request_id);

    let response = client
        .get(format!("{}/admin-requests/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"], request_id);
}

#[tokio::test]
#[ignore]
async fn test_sweep_is_idempotent() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    let response = client
        .post(format!("{}/borrows/sweep", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let first: Value = response.json().await.expect("Failed to parse response");
    assert!(first["marked_overdue"].is_number());

    // Nothing new can lapse between back-to-back sweeps
    let response = client
        .post(format!("{}/borrows/sweep", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let second: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(second["marked_overdue"], 0);
}

#[tokio::test]
#[ignore]
async fn test_get_stats() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["books"]["total"].is_number());
    assert!(body["requests"]["pending"].is_number());
    assert!(body["borrows"]["out"].is_number());
    assert!(body["users"]["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_stats_require_admin() {
    let client = Client::new();
    let (user, _) = register_user(&client).await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", user))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_reconcile_reports_zero_when_clean() {
    let client = Client::new();
    let admin = admin_token(&client).await;

    let response = client
        .post(format!("{}/books/reconcile", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["corrected"].is_number());
}
