// API integration tests that verify HTTP endpoints
// Tests the actual Axum router against an in-memory workbook

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{sample_workbook, MemoryFetcher, SAMPLE_LOADED, SAMPLE_SHEET};
use debut_tracker_service::api::{create_router, AppState};
use debut_tracker_service::config::Credentials;
use debut_tracker_service::importers::ExcelImporter;
use debut_tracker_service::services::{AuthService, DatasetKey, DatasetService, SessionStore};
use http_body_util::BodyExt; // For `.collect()`
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // For `oneshot`

mod api_test_fixtures {
    use super::*;

    pub const USERNAME: &str = "scout";
    pub const PASSWORD: &str = "s3cret";

    pub fn test_app_with(fetcher: &MemoryFetcher, credentials: Option<Credentials>) -> Router {
        test_app_with_sessions(fetcher, credentials, SessionStore::new())
    }

    pub fn test_app_with_sessions(
        fetcher: &MemoryFetcher,
        credentials: Option<Credentials>,
        sessions: SessionStore,
    ) -> Router {
        let state = AppState {
            dataset_service: DatasetService::new(Arc::new(fetcher.clone()), SAMPLE_SHEET),
            auth_service: AuthService::new(credentials),
            sessions,
            dataset_key: DatasetKey::new("https://example.com/debuts.xlsx", "v1"),
        };
        create_router(state)
    }

    pub fn test_app(fetcher: &MemoryFetcher) -> Router {
        test_app_with(
            fetcher,
            Some(Credentials {
                username: USERNAME.to_string(),
                password: PASSWORD.to_string(),
            }),
        )
    }

    pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    pub async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(app, request).await;
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub async fn login(app: &Router) -> String {
        let (status, body) = send_json(
            app,
            post_json(
                "/api/v1/sessions",
                json!({ "username": USERNAME, "password": PASSWORD }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }
}

use api_test_fixtures::*;

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));

    let (status, body) = send_json(&app, get("/api/v1/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_login_success() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/v1/sessions",
            json!({ "username": USERNAME, "password": PASSWORD }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Login successful!");
    assert!(body["session_id"].is_string());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/v1/sessions",
            json!({ "username": USERNAME, "password": "wrong" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_without_configured_credentials() {
    let app = test_app_with(&MemoryFetcher::serving(sample_workbook()), None);

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/v1/sessions",
            json!({ "username": USERNAME, "password": PASSWORD }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Credentials not found in configuration.");
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));

    let uri = format!("/api/v1/sessions/{}/dashboard", uuid::Uuid::new_v4());
    let (status, body) = send_json(&app, get(&uri)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("Session not found"));
}

#[tokio::test]
async fn test_dashboard_before_run_shows_prompt() {
    let fetcher = MemoryFetcher::serving(sample_workbook());
    let app = test_app(&fetcher);
    let session = login(&app).await;

    let (status, body) =
        send_json(&app, get(&format!("/api/v1/sessions/{session}/dashboard"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded_records"], SAMPLE_LOADED);
    assert_eq!(
        body["prompt"],
        "Please set your filters and click Run to see results."
    );
    assert!(body["results"].is_null());
    assert_eq!(body["options"]["months"], json!(["All", "Jan", "Feb", "Jun"]));
    assert_eq!(body["options"]["years"], json!(["All", "2019", "2020"]));
}

#[tokio::test]
async fn test_run_filters_returns_results() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));
    let session = login(&app).await;

    let (status, body) = send_json(
        &app,
        post_json(
            &format!("/api/v1/sessions/{session}/run"),
            json!({ "months": ["Jan"], "years": ["2020"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = &body["results"];
    assert_eq!(results["title"], "Debütanten");
    assert_eq!(results["count"], 1);
    assert_eq!(results["summary"], "1 Debütanten");
    assert_eq!(results["export_file_name"], "filtered_debutants.xlsx");
    assert_eq!(results["table"]["columns"][0], "Competition");
    assert_eq!(results["table"]["rows"][0][1]["text"], "Ethan Nwaneri");
    assert!(body["prompt"].is_null());
}

#[tokio::test]
async fn test_select_does_not_run() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));
    let session = login(&app).await;

    let (status, body) = send_json(
        &app,
        post_json(
            &format!("/api/v1/sessions/{session}/filters"),
            json!({ "months": ["Feb"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selection"]["months"], json!(["Feb"]));
    assert!(body["results"].is_null());
}

#[tokio::test]
async fn test_clear_resets_filters_and_keeps_login() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));
    let session = login(&app).await;

    send_json(
        &app,
        post_json(
            &format!("/api/v1/sessions/{session}/run"),
            json!({ "months": ["Jan"] }),
        ),
    )
    .await;

    let (status, body) = send_json(
        &app,
        post_json(&format!("/api/v1/sessions/{session}/clear"), json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notice"], "All filters cleared!");
    assert_eq!(body["selection"]["months"], json!([]));
    assert!(body["results"].is_null());

    // Still logged in
    let (status, _) =
        send_json(&app, get(&format!("/api/v1/sessions/{session}/dashboard"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_export_before_run_is_conflict() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));
    let session = login(&app).await;

    let (status, _) = send_json(&app, get(&format!("/api/v1/sessions/{session}/export"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_export_empty_result_is_rejected() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));
    let session = login(&app).await;

    send_json(
        &app,
        post_json(
            &format!("/api/v1/sessions/{session}/run"),
            json!({ "months": ["Dec"] }),
        ),
    )
    .await;

    let (status, _) = send_json(&app, get(&format!("/api/v1/sessions/{session}/export"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_export_downloads_displayed_rows() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));
    let session = login(&app).await;

    send_json(
        &app,
        post_json(
            &format!("/api/v1/sessions/{session}/run"),
            json!({ "competitions": ["1. Bundesliga (Germany)"] }),
        ),
    )
    .await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/sessions/{session}/export")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"filtered_debutants.xlsx\""
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let reread = ExcelImporter::new("Sheet1")
        .parse_bytes(bytes.to_vec())
        .unwrap();
    assert_eq!(reread.rows.len(), 2);
    assert_eq!(reread.headers[1], "Player Name");
}

#[tokio::test]
async fn test_load_failure_is_bad_gateway() {
    let fetcher = MemoryFetcher::failing();
    let app = test_app(&fetcher);
    let session = login(&app).await;

    let (status, body) =
        send_json(&app, get(&format!("/api/v1/sessions/{session}/dashboard"))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to load data. Error downloading file: "));
}

#[tokio::test]
async fn test_dataset_is_fetched_once_across_sessions() {
    let fetcher = MemoryFetcher::serving(sample_workbook());
    let app = test_app(&fetcher);

    for _ in 0..2 {
        let session = login(&app).await;
        let (status, _) =
            send_json(&app, get(&format!("/api/v1/sessions/{session}/dashboard"))).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_reload_refetches_dataset() {
    let fetcher = MemoryFetcher::serving(sample_workbook());
    let app = test_app(&fetcher);
    let session = login(&app).await;

    send_json(&app, get(&format!("/api/v1/sessions/{session}/dashboard"))).await;
    let (status, body) = send_json(
        &app,
        post_json(&format!("/api/v1/sessions/{session}/reload"), json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded_records"], SAMPLE_LOADED);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));
    let session = login(&app).await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/sessions/{session}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) =
        send_json(&app, get(&format!("/api/v1/sessions/{session}/dashboard"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_idle_session_expires() {
    let app = test_app_with_sessions(
        &MemoryFetcher::serving(sample_workbook()),
        Some(Credentials {
            username: USERNAME.to_string(),
            password: PASSWORD.to_string(),
        }),
        SessionStore::with_idle_timeout(Duration::from_millis(1)),
    );
    let session = login(&app).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let (status, _) =
        send_json(&app, get(&format!("/api/v1/sessions/{session}/dashboard"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_overlapping_requests_keep_both_updates() {
    let app = test_app(&MemoryFetcher::serving(sample_workbook()));
    let session = login(&app).await;

    let select = send_json(
        &app,
        post_json(
            &format!("/api/v1/sessions/{session}/filters"),
            json!({ "months": ["Jan"] }),
        ),
    );
    let show = send_json(&app, get(&format!("/api/v1/sessions/{session}/dashboard")));
    let ((select_status, _), (show_status, _)) = tokio::join!(select, show);
    assert_eq!(select_status, StatusCode::OK);
    assert_eq!(show_status, StatusCode::OK);

    // A plain re-render never overwrites the stored selection
    let (_, body) =
        send_json(&app, get(&format!("/api/v1/sessions/{session}/dashboard"))).await;
    assert_eq!(body["selection"]["months"], json!(["Jan"]));
}
