mod common;

use axum::http::{Method, StatusCode};

use common::app::spawn_test_app;
use common::http::{call, create_session, request};

#[tokio::test]
async fn it_health_live_and_ready() {
    let app = spawn_test_app();

    let live = request(&app.app, Method::GET, "/health/live", None).await;
    assert_eq!(live.status(), StatusCode::OK);

    let ready = request(&app.app, Method::GET, "/health/ready", None).await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn it_health_reports_sessions_and_detector() {
    let app = spawn_test_app();
    create_session(&app.app).await;

    let (status, body) = call(&app.app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["activeSessions"], 1);
    assert_eq!(body["detector"]["blinkRatio"], 0.4);
    assert_eq!(body["detector"]["windowSeconds"], 60);
    assert_eq!(body["detector"]["sessionSeconds"], 300);
}
