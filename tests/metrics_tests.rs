//! Request metrics as seen through the admin exporter. The Prometheus recorder is
//! process-global, so this binary holds a single test.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use imgbot::config::Config;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;
use tower::ServiceExt;

async fn get(app: &Router, uri: &str, cookie: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

#[tokio::test]
async fn test_request_metrics_are_labelled_by_route_template() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install recorder");

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", dir.path().join("imgbot.db").display());
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = imgbot::api::create_app_state_from_config(config, Some(handle))
        .await
        .unwrap();
    let app = imgbot::api::router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "username": "admin", "password": "admin123" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string();

    for id in [5, 17] {
        let (status, _) = get(&app, &format!("/api/keywords/{id}"), &cookie).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, body) = get(&app, "/metrics", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body.contains(r#"path="/api/keywords/{id}",status="404"} 2"#),
        "{body}"
    );
    assert!(body.contains(r#"path="/api/auth/login""#), "{body}");
    assert!(!body.contains("/api/keywords/5"), "{body}");
    assert!(!body.contains("/api/keywords/17"), "{body}");
}
