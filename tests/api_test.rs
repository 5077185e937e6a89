//! End-to-end tests against a live server backed by an in-memory database

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use habit_tracker::api::{create_router, AppState};
use habit_tracker::auth::telegram::sign_init_data;
use habit_tracker::clock::Clock;
use habit_tracker::config::Config;
use habit_tracker::db::Database;

const BOT_TOKEN: &str = "123456:TEST-bot-token";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

/// Running server under test
struct TestApp {
    base: String,
    client: reqwest::Client,
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.telegram.bot_token = Some(BOT_TOKEN.to_string());
    config.auth.jwt_secret = Some("integration-test-secret-0123456789abcdef".to_string());
    config.auth.init_data_max_age_secs = 0;
    config
}

async fn app() -> TestApp {
    serve(test_config()).await
}

async fn serve(config: Config) -> TestApp {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let state = AppState::from_config(db, &config, Clock::fixed(today())).unwrap();
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        base: format!("http://{}", addr),
        client: reqwest::Client::new(),
    }
}

fn init_data(telegram_id: i64) -> String {
    let user = json!({ "id": telegram_id, "first_name": "Test", "username": "tester" }).to_string();
    sign_init_data(&[("user", &user), ("auth_date", "1700000000")], BOT_TOKEN).unwrap()
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = app.client.request(method, format!("{}{}", app.base, uri));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await.unwrap();
    let status = response.status();
    let bytes = response.bytes().await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn sign_in(app: &TestApp, telegram_id: i64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/telegram",
        None,
        Some(json!({ "initData": init_data(telegram_id) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "sign-in failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn create_habit(app: &TestApp, token: &str, title: &str) -> (i64, Value) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/habits",
        Some(token),
        Some(json!({ "title": title })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    (body["id"].as_i64().unwrap(), body)
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_sign_in_and_me() {
    let app = app().await;
    let token = sign_in(&app, 279_058_397).await;

    let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["telegram_id"], 279_058_397);
    assert_eq!(me["username"], "tester");
    assert_eq!(me["level"], 1);
    assert_eq!(me["experience"], 0);

    // Signing in again maps to the same user
    let again = sign_in(&app, 279_058_397).await;
    let (_, me_again) = send(&app, Method::GET, "/api/auth/me", Some(&again), None).await;
    assert_eq!(me_again["id"], me["id"]);
}

#[tokio::test]
async fn test_sign_in_rejections() {
    let app = app().await;

    let tampered = init_data(42).replace("Test", "Evil");
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/telegram",
        None,
        Some(json!({ "initData": tampered })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/telegram",
        None,
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["path"], "initData");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/habits", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::GET, "/api/habits", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Query token is accepted as well
    let token = sign_in(&app, 7).await;
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/habits?token={}", token),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_habit_crud() {
    let app = app().await;
    let token = sign_in(&app, 1).await;

    let (id, created) = create_habit(&app, &token, "Read").await;
    assert_eq!(created["emoji"], "📌");
    assert_eq!(created["goal_days"], 30);
    assert_eq!(created["newAchievements"], json!(["first_habit"]));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/habits",
        Some(&token),
        Some(json!({ "title": "", "goal_days": 400 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/habits/{}", id),
        Some(&token),
        Some(json!({ "emoji": "📚", "goal_days": 60 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Read");
    assert_eq!(updated["emoji"], "📚");
    assert_eq!(updated["goal_days"], 60);

    let (_, list) = send(&app, Method::GET, "/api/habits", Some(&token), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/habits/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/habits/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Habit not found");
}

#[tokio::test]
async fn test_habits_are_private() {
    let app = app().await;
    let alice = sign_in(&app, 1).await;
    let bob = sign_in(&app, 2).await;
    let (id, _) = create_habit(&app, &alice, "Alice only").await;

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/habits/{}", id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/tracking/{}/toggle", id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&app, Method::GET, "/api/habits", Some(&bob), None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_toggle_round_trip_restores_profile() {
    let app = app().await;
    let token = sign_in(&app, 1).await;
    let (id, _) = create_habit(&app, &token, "Run").await;
    let toggle = format!("/api/tracking/{}/toggle", id);

    let (status, body) = send(&app, Method::POST, &toggle, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], true);
    assert_eq!(body["date"], "2024-06-15");

    let (_, profile) = send(
        &app,
        Method::GET,
        "/api/gamification/profile",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(profile["experience"], 10);
    assert_eq!(profile["totalCompletions"], 1);
    assert_eq!(profile["progressPercent"], 10);

    let (_, body) = send(&app, Method::POST, &toggle, Some(&token), Some(json!({}))).await;
    assert_eq!(body["completed"], false);

    let (_, profile) = send(
        &app,
        Method::GET,
        "/api/gamification/profile",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(profile["experience"], 0);
    assert_eq!(profile["totalCompletions"], 0);
    assert_eq!(profile["level"], 1);
    // first_habit stays earned
    assert_eq!(profile["achievements"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_streak_and_stats() {
    let app = app().await;
    let token = sign_in(&app, 1).await;
    let (id, _) = create_habit(&app, &token, "Meditate").await;
    let toggle = format!("/api/tracking/{}/toggle", id);

    let mut last = Value::Null;
    for n in (0..7).rev() {
        let date = (today() - Duration::days(n)).format("%Y-%m-%d").to_string();
        let (status, body) = send(
            &app,
            Method::POST,
            &toggle,
            Some(&token),
            Some(json!({ "date": date })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        last = body;
    }
    assert_eq!(last["newAchievements"], json!(["streak_7"]));

    let (_, stats) = send(
        &app,
        Method::GET,
        &format!("/api/tracking/{}/stats", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(stats["streak"], 7);
    assert_eq!(stats["totalInPeriod"], 7);
    assert_eq!(stats["history"][0], "2024-06-15");

    let (_, habit) = send(
        &app,
        Method::GET,
        &format!("/api/habits/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(habit["current_streak"], 7);
    assert_eq!(habit["completions_count"], 7);
    assert_eq!(habit["last_completed"], "2024-06-15");

    let (_, calendar) = send(
        &app,
        Method::GET,
        &format!("/api/tracking/{}/calendar/2024/6", id),
        Some(&token),
        None,
    )
    .await;
    let days = calendar.as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0], "2024-06-09");

    let (_, may) = send(
        &app,
        Method::GET,
        &format!("/api/tracking/{}/calendar/2024/5", id),
        Some(&token),
        None,
    )
    .await;
    assert!(may.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_tracking_validation() {
    let app = app().await;
    let token = sign_in(&app, 1).await;
    let (id, _) = create_habit(&app, &token, "Water").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/tracking/{}/toggle", id),
        Some(&token),
        Some(json!({ "date": "15.06.2024" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["path"], "date");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/tracking/{}/calendar/2024/13", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/tracking/9999/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_achievement_catalog() {
    let app = app().await;
    let token = sign_in(&app, 1).await;

    let (_, catalog) = send(
        &app,
        Method::GET,
        "/api/gamification/achievements",
        Some(&token),
        None,
    )
    .await;
    let entries = catalog.as_array().unwrap();
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|e| e["earned"] == false));

    create_habit(&app, &token, "Stretch").await;
    let (_, catalog) = send(
        &app,
        Method::GET,
        "/api/gamification/achievements",
        Some(&token),
        None,
    )
    .await;
    let first = catalog
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["code"] == "first_habit")
        .cloned()
        .unwrap();
    assert_eq!(first["earned"], true);
}

#[tokio::test]
async fn test_notification_settings() {
    let app = app().await;
    let token = sign_in(&app, 1).await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/notifications/settings",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], true);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/notifications/settings",
        Some(&token),
        Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], false);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/notifications/settings",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["enabled"], false);
}

#[tokio::test]
async fn test_missing_bot_token_is_not_exposed() {
    let mut config = test_config();
    config.telegram.bot_token = None;
    let app = serve(config).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/telegram",
        None,
        Some(json!({ "initData": init_data(1) })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Server error" }));
}

#[tokio::test]
async fn test_malformed_path_segments_return_json() {
    let app = app().await;
    let token = sign_in(&app, 1).await;
    let (id, _) = create_habit(&app, &token, "Walk").await;

    let (status, body) = send(&app, Method::GET, "/api/habits/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/tracking/{}/calendar/2024/-1", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_description_can_be_cleared() {
    let app = app().await;
    let token = sign_in(&app, 1).await;
    let (id, _) = create_habit(&app, &token, "Journal").await;
    let uri = format!("/api/habits/{}", id);

    let (_, habit) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "description": "One page" })),
    )
    .await;
    assert_eq!(habit["description"], "One page");

    let (_, habit) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "goal_days": 10 })),
    )
    .await;
    assert_eq!(habit["description"], "One page");

    let (status, habit) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "description": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(habit["description"].is_null());
}
