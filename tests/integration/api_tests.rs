//! API integration tests
//!
//! Need a running server with a bootstrap administrator `admin`/`admin-password`,
//! an officer account `officer`/`officer-password` and email delivery disabled.
//! The officer credentials can be overridden with `LOSTFOUND_TEST_OFFICER` and
//! `LOSTFOUND_TEST_OFFICER_PASSWORD`.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn login(client: &Client, login: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "login": login, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a fresh citizen and log in
async fn citizen(client: &Client) -> String {
    let username = unique("citizen");
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.org", username),
            "password": "correct-horse"
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(response.status(), 201);

    login(client, &username, "correct-horse").await
}

async fn officer(client: &Client) -> String {
    let username = std::env::var("LOSTFOUND_TEST_OFFICER").unwrap_or_else(|_| "officer".to_string());
    let password = std::env::var("LOSTFOUND_TEST_OFFICER_PASSWORD")
        .unwrap_or_else(|_| "officer-password".to_string());
    login(client, &username, &password).await
}

/// A lost wallet declared by Alice and reported found by Bob
struct Wallet {
    alice: String,
    bob: String,
    declaration_id: i64,
    item_id: i64,
}

async fn wallet_reported_found(client: &Client) -> Wallet {
    let alice = citizen(client).await;
    let bob = citizen(client).await;

    let declaration: Value = client
        .post(format!("{}/declarations", BASE_URL))
        .bearer_auth(&alice)
        .json(&json!({ "kind": "lost", "item_name": "Wallet", "location": "Central park" }))
        .send()
        .await
        .expect("Failed to declare")
        .json()
        .await
        .expect("Failed to parse declaration");

    let response = client
        .post(format!("{}/declarations/{}/found", BASE_URL, declaration["id"]))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("Failed to report found");
    assert_eq!(response.status(), 200);

    Wallet {
        alice,
        bob,
        declaration_id: declaration["id"].as_i64().expect("declaration id"),
        item_id: declaration["item_id"].as_i64().expect("item id"),
    }
}

async fn create_station(client: &Client) -> i64 {
    let admin = login(client, "admin", "admin-password").await;
    let station: Value = client
        .post(format!("{}/stations", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "name": unique("Station "), "address": "1 Main street" }))
        .send()
        .await
        .expect("Failed to create station")
        .json()
        .await
        .expect("Failed to parse station");
    station["id"].as_i64().expect("station id")
}

/// Schedule tomorrow at 10:00, returns the restitution id
async fn schedule(client: &Client, officer: &str, declaration_id: i64, station_id: i64) -> i64 {
    let tomorrow = chrono::Utc::now().date_naive() + chrono::Duration::days(1);
    let response = client
        .post(format!("{}/declarations/{}/restitution", BASE_URL, declaration_id))
        .bearer_auth(officer)
        .json(&json!({
            "station_id": station_id,
            "scheduled_date": tomorrow.to_string(),
            "scheduled_time": "10:00:00"
        }))
        .send()
        .await
        .expect("Failed to schedule");
    assert_eq!(response.status(), 201);

    let change: Value = response.json().await.expect("Failed to parse state change");
    assert_eq!(change["from"], "claimed");
    assert_eq!(change["to"], "pending_return");
    change["restitution_id"].as_i64().expect("restitution id")
}

async fn item_state(client: &Client, item_id: i64) -> Value {
    let item: Value = client
        .get(format!("{}/items/{}", BASE_URL, item_id))
        .send()
        .await
        .expect("Failed to get item")
        .json()
        .await
        .expect("Failed to parse item");
    item["state"].clone()
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
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "login": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_public_recent_items() {
    let client = Client::new();

    let response = client
        .get(format!("{}/public/recent", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["lost"].is_array());
    assert!(body["found"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_lost_wallet_reported_found() {
    let client = Client::new();
    let alice = citizen(&client).await;
    let bob = citizen(&client).await;

    // Alice declares her wallet lost, Bob reports finding it
    let declaration: Value = client
        .post(format!("{}/declarations", BASE_URL))
        .bearer_auth(&alice)
        .json(&json!({
            "kind": "lost",
            "item_name": "Wallet",
            "location": "Central park"
        }))
        .send()
        .await
        .expect("Failed to declare")
        .json()
        .await
        .expect("Failed to parse declaration");
    let declaration_id = declaration["id"].as_i64().expect("declaration id");

    let change: Value = client
        .post(format!("{}/declarations/{}/found", BASE_URL, declaration_id))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("Failed to report found")
        .json()
        .await
        .expect("Failed to parse state change");
    assert_eq!(change["from"], "lost");
    assert_eq!(change["to"], "claimed");

    // Reporting twice is refused
    let response = client
        .post(format!("{}/declarations/{}/found", BASE_URL, declaration_id))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Alice cannot report her own item
    let response = client
        .post(format!("{}/declarations/{}/found", BASE_URL, declaration_id))
        .bearer_auth(&alice)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    // A claimed declaration cannot be withdrawn by a non-owner
    let response = client
        .delete(format!("{}/declarations/{}", BASE_URL, declaration_id))
        .bearer_auth(&bob)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_admin_manages_stations() {
    let client = Client::new();
    let admin = login(&client, "admin", "admin-password").await;

    let station: Value = client
        .post(format!("{}/stations", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "name": unique("Station "), "address": "1 Main street" }))
        .send()
        .await
        .expect("Failed to create station")
        .json()
        .await
        .expect("Failed to parse station");
    let station_id = station["id"].as_i64().expect("station id");

    let response = client
        .delete(format!("{}/stations/{}", BASE_URL, station_id))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to delete station");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_citizen_cannot_list_users() {
    let client = Client::new();
    let token = citizen(&client).await;

    let response = client
        .get(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_restitution_completed_and_verified() {
    let client = Client::new();
    let wallet = wallet_reported_found(&client).await;
    let officer = officer(&client).await;
    let station_id = create_station(&client).await;

    let restitution_id = schedule(&client, &officer, wallet.declaration_id, station_id).await;
    assert_eq!(item_state(&client, wallet.item_id).await, "pending_return");

    // A second planned restitution is refused while the first one is pending
    let response = client
        .post(format!("{}/declarations/{}/restitution", BASE_URL, wallet.declaration_id))
        .bearer_auth(&officer)
        .json(&json!({
            "station_id": station_id,
            "scheduled_date": (chrono::Utc::now().date_naive() + chrono::Duration::days(2)).to_string(),
            "scheduled_time": "11:00:00"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    let change: Value = client
        .post(format!("{}/restitutions/{}/complete", BASE_URL, restitution_id))
        .bearer_auth(&officer)
        .send()
        .await
        .expect("Failed to complete")
        .json()
        .await
        .expect("Failed to parse state change");
    assert_eq!(change["to"], "returned");
    assert_eq!(item_state(&client, wallet.item_id).await, "returned");

    let done: Value = client
        .get(format!("{}/restitutions?status=done", BASE_URL))
        .bearer_auth(&officer)
        .send()
        .await
        .expect("Failed to list restitutions")
        .json()
        .await
        .expect("Failed to parse restitutions");
    let for_item: Vec<&Value> = done
        .as_array()
        .expect("restitution list")
        .iter()
        .filter(|r| r["item_id"].as_i64() == Some(wallet.item_id))
        .collect();
    assert_eq!(for_item.len(), 1);
    assert_eq!(for_item[0]["id"].as_i64(), Some(restitution_id));
    assert!(for_item[0]["performed_at"].is_string());

    // Public check behind the QR code
    let verification: Value = client
        .get(format!("{}/restitutions/{}/verify", BASE_URL, restitution_id))
        .send()
        .await
        .expect("Failed to verify")
        .json()
        .await
        .expect("Failed to parse verification");
    assert_eq!(verification["valid"], true);
    assert_eq!(verification["status"], "done");

    let proof = client
        .get(format!("{}/restitutions/{}/proof", BASE_URL, restitution_id))
        .bearer_auth(&officer)
        .send()
        .await
        .expect("Failed to download proof");
    assert_eq!(proof.status(), 200);
    assert_eq!(proof.headers()["content-type"], "application/pdf");
    let bytes = proof.bytes().await.expect("Failed to read proof");
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
#[ignore]
async fn test_cancelled_restitution_is_removed() {
    let client = Client::new();
    let wallet = wallet_reported_found(&client).await;
    let officer = officer(&client).await;
    let station_id = create_station(&client).await;

    let restitution_id = schedule(&client, &officer, wallet.declaration_id, station_id).await;

    let change: Value = client
        .post(format!("{}/restitutions/{}/cancel", BASE_URL, restitution_id))
        .bearer_auth(&officer)
        .send()
        .await
        .expect("Failed to cancel")
        .json()
        .await
        .expect("Failed to parse state change");
    assert_eq!(change["from"], "pending_return");
    assert_eq!(change["to"], "lost");
    assert_eq!(item_state(&client, wallet.item_id).await, "lost");

    let response = client
        .get(format!("{}/restitutions/{}", BASE_URL, restitution_id))
        .bearer_auth(&officer)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_disputed_restitution_is_rescheduled() {
    let client = Client::new();
    let wallet = wallet_reported_found(&client).await;
    let officer = officer(&client).await;
    let station_id = create_station(&client).await;

    let first = schedule(&client, &officer, wallet.declaration_id, station_id).await;
    let response = client
        .post(format!("{}/restitutions/{}/complete", BASE_URL, first))
        .bearer_auth(&officer)
        .send()
        .await
        .expect("Failed to complete");
    assert_eq!(response.status(), 200);

    // Only the claimant may dispute
    let response = client
        .post(format!("{}/restitutions/{}/reopen", BASE_URL, first))
        .bearer_auth(&wallet.bob)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let change: Value = client
        .post(format!("{}/restitutions/{}/reopen", BASE_URL, first))
        .bearer_auth(&wallet.alice)
        .send()
        .await
        .expect("Failed to reopen")
        .json()
        .await
        .expect("Failed to parse state change");
    assert_eq!(change["from"], "returned");
    assert_eq!(change["to"], "claimed");

    let disputed: Value = client
        .get(format!("{}/restitutions/{}", BASE_URL, first))
        .bearer_auth(&officer)
        .send()
        .await
        .expect("Failed to get restitution")
        .json()
        .await
        .expect("Failed to parse restitution");
    assert_eq!(disputed["status"], "disputed");

    let second = schedule(&client, &officer, wallet.declaration_id, station_id).await;
    assert_ne!(first, second);
    assert_eq!(item_state(&client, wallet.item_id).await, "pending_return");
}

#[tokio::test]
#[ignore]
async fn test_deleting_last_finder_reverts_claimed_item() {
    let client = Client::new();
    let wallet = wallet_reported_found(&client).await;
    let admin = login(&client, "admin", "admin-password").await;

    let bob: Value = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&wallet.bob)
        .send()
        .await
        .expect("Failed to get profile")
        .json()
        .await
        .expect("Failed to parse profile");

    let response = client
        .delete(format!("{}/users/{}", BASE_URL, bob["id"]))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to delete user");
    assert_eq!(response.status(), 204);

    assert_eq!(item_state(&client, wallet.item_id).await, "lost");
}
