mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::app::{spawn_test_app, spawn_with_limits};
use common::http::{
    assert_json_error, assert_status_ok_json, call, create_session, post_sample,
};

#[tokio::test]
async fn it_new_session_starts_open_and_uncalibrated() {
    let app = spawn_test_app();
    let (status, body) = call(&app.app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let data = &body["data"];
    assert!(data["id"].is_string());
    assert_eq!(data["state"], "eyes_open");
    assert_eq!(data["windowCount"], 0);
    assert!(data["calibration"].is_null());
    assert_eq!(data["remainingSecs"], 300);
    assert_eq!(data["remainingDisplay"], "5:00");
    assert_eq!(data["status"], "running");
}

#[tokio::test]
async fn it_sample_stream_counts_blinks() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;

    let mut outcomes = Vec::new();
    for value in [0.10, 0.09, 0.03, 0.03, 0.095, 0.02] {
        app.clock.advance(Duration::from_millis(33));
        outcomes.push(post_sample(&app.app, &id, Some(value)).await);
    }

    let fired: Vec<bool> = outcomes
        .iter()
        .map(|o| o["blinkDetected"].as_bool().unwrap())
        .collect();
    assert_eq!(fired, vec![false, false, true, false, false, true]);
    assert_eq!(outcomes[3]["state"], "eyes_closed");
    assert_eq!(outcomes[4]["state"], "eyes_open");

    let (status, body) = call(&app.app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["windowCount"], 2);
    assert_eq!(body["data"]["sessionBlinks"], 2);
    assert_eq!(body["data"]["calibration"], 0.1);
}

#[tokio::test]
async fn it_missing_face_is_a_no_op() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;
    post_sample(&app.app, &id, Some(0.1)).await;

    let obs = post_sample(&app.app, &id, None).await;
    assert_eq!(obs["outcome"], "no_face");
    assert_eq!(obs["windowCount"], 0);

    // 缺省 value 字段同样视为无人脸
    let (status, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/samples"),
        Some(json!({})),
    )
    .await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["outcome"], "no_face");
}

#[tokio::test]
async fn it_zero_opening_is_uncalibrated() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;
    let obs = post_sample(&app.app, &id, Some(0.0)).await;
    assert_eq!(obs["outcome"], "uncalibrated");
}

#[tokio::test]
async fn it_rejects_invalid_samples() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;
    post_sample(&app.app, &id, Some(0.1)).await;

    let (status, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/samples"),
        Some(json!({ "value": -0.2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_SAMPLE");

    let (status, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/samples"),
        Some(json!({ "value": "wide open" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_REQUEST_BODY");

    let (_, body) = call(&app.app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(body["data"]["calibration"], 0.1);
}

#[tokio::test]
async fn it_landmarks_drive_the_detector() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;
    let path = format!("/api/sessions/{id}/landmarks");

    let mut mesh = vec![0.5_f64; 468 * 2];
    mesh[159 * 2 + 1] = 0.40;
    mesh[145 * 2 + 1] = 0.45;
    let (status, body) = call(&app.app, Method::POST, &path, Some(json!({ "landmarks": mesh }))).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["outcome"], "evaluated");

    mesh[145 * 2 + 1] = 0.401;
    let (_, body) = call(&app.app, Method::POST, &path, Some(json!({ "landmarks": mesh }))).await;
    assert_eq!(body["data"]["blinkDetected"], true);

    let (_, body) = call(&app.app, Method::POST, &path, Some(json!({ "landmarks": null }))).await;
    assert_eq!(body["data"]["outcome"], "no_face");
}

#[tokio::test]
async fn it_reset_clears_calibration_and_count() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;
    post_sample(&app.app, &id, Some(0.2)).await;
    post_sample(&app.app, &id, Some(0.01)).await;

    app.clock.advance(Duration::from_secs(42));
    let (status, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/reset"),
        None,
    )
    .await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["windowCount"], 0);
    assert!(body["data"]["calibration"].is_null());
    assert_eq!(body["data"]["state"], "eyes_open");
    assert_eq!(body["data"]["windowStart"], 42_000);
    assert_eq!(body["data"]["remainingSecs"], 300);

    // 重置后第一帧重新建立校准
    post_sample(&app.app, &id, Some(0.05)).await;
    let (_, body) = call(&app.app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(body["data"]["calibration"], 0.05);
}

#[tokio::test]
async fn it_tick_rolls_window_and_ends_session() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;
    post_sample(&app.app, &id, Some(0.1)).await;
    post_sample(&app.app, &id, Some(0.01)).await;
    let tick_path = format!("/api/sessions/{id}/tick");

    app.clock.advance(Duration::from_secs(59));
    let (_, body) = call(&app.app, Method::POST, &tick_path, None).await;
    assert!(body["data"]["rollover"].is_null());

    app.clock.advance(Duration::from_secs(1));
    let (status, body) = call(&app.app, Method::POST, &tick_path, None).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["rollover"]["count"], 1);
    assert_eq!(body["data"]["rollover"]["rate"], "low");
    assert_eq!(body["data"]["status"], "running");

    app.clock.advance(Duration::from_secs(240));
    let (_, body) = call(&app.app, Method::POST, &tick_path, None).await;
    assert_eq!(body["data"]["justCompleted"], true);
    assert_eq!(body["data"]["status"], "completed");

    let obs = post_sample(&app.app, &id, Some(0.01)).await;
    assert_eq!(obs["outcome"], "session_over");
    let obs = post_sample(&app.app, &id, None).await;
    assert_eq!(obs["outcome"], "session_over");

    let (_, body) = call(&app.app, Method::GET, &format!("/api/sessions/{id}/windows"), None).await;
    let windows = body["data"].as_array().expect("windows array");
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0]["count"], 1);
    assert_eq!(windows[1]["count"], 0);

    let (_, body) = call(&app.app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(body["data"]["remainingDisplay"], "0:00");
}

#[tokio::test]
async fn it_unknown_and_malformed_ids() {
    let app = spawn_test_app();

    let missing = uuid::Uuid::new_v4();
    let (status, body) = call(&app.app, Method::GET, &format!("/api/sessions/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");

    let (status, body) = call(&app.app, Method::GET, "/api/sessions/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_json_error(&body, "INVALID_SESSION_ID");
}

#[tokio::test]
async fn it_delete_and_list_sessions() {
    let app = spawn_test_app();
    let a = create_session(&app.app).await;
    let b = create_session(&app.app).await;

    let (status, body) = call(&app.app, Method::GET, "/api/sessions", None).await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, _) = call(&app.app, Method::DELETE, &format!("/api/sessions/{a}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app.app, Method::DELETE, &format!("/api/sessions/{a}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app.app, Method::GET, "/api/sessions", None).await;
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["id"].as_str())
        .collect();
    assert_eq!(ids, vec![b.as_str()]);
}

#[tokio::test]
async fn it_session_limit_returns_429() {
    let app = spawn_with_limits(1);
    create_session(&app.app).await;

    let (status, body) = call(&app.app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_json_error(&body, "TOO_MANY_SESSIONS");
}

#[tokio::test]
async fn it_sessions_are_independent() {
    let app = spawn_test_app();
    let a = create_session(&app.app).await;
    let b = create_session(&app.app).await;

    post_sample(&app.app, &a, Some(0.1)).await;
    post_sample(&app.app, &a, Some(0.01)).await;
    post_sample(&app.app, &b, Some(0.3)).await;

    let (_, body) = call(&app.app, Method::GET, &format!("/api/sessions/{b}"), None).await;
    assert_eq!(body["data"]["windowCount"], 0);
    assert_eq!(body["data"]["calibration"], 0.3);

    let state = app.state.monitor();
    let a_id = a.parse().unwrap();
    assert_eq!(state.snapshot(a_id).await.unwrap().snapshot.window_count, 1);
}

#[tokio::test]
async fn it_finished_session_reports_over_without_face_until_reset() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;
    post_sample(&app.app, &id, Some(0.1)).await;

    app.clock.advance(Duration::from_secs(300));
    call(&app.app, Method::POST, &format!("/api/sessions/{id}/tick"), None).await;

    let (status, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/samples"),
        Some(json!({ "value": null })),
    )
    .await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["outcome"], "session_over");

    let (status, body) = call(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/landmarks"),
        Some(json!({ "landmarks": null })),
    )
    .await;
    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["outcome"], "session_over");

    call(&app.app, Method::POST, &format!("/api/sessions/{id}/reset"), None).await;
    let obs = post_sample(&app.app, &id, None).await;
    assert_eq!(obs["outcome"], "no_face");
}
