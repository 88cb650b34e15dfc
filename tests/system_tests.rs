use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use imgbot::clients::line::{SIGNATURE_HEADER, SignatureVerifier};
use imgbot::config::Config;
use imgbot::services::ReplySender;
use imgbot::state::SharedState;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

const CHANNEL_SECRET: &str = "test-channel-secret";

#[derive(Default)]
struct RecordingSender {
    replies: Mutex<Vec<(String, String)>>,
    fail: bool,
}

#[async_trait]
impl ReplySender for RecordingSender {
    async fn reply_image(&self, reply_token: &str, image_url: &str) -> anyhow::Result<()> {
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), image_url.to_string()));
        if self.fail {
            anyhow::bail!("upstream unavailable");
        }
        Ok(())
    }
}

async fn spawn_app(
    sender: Arc<RecordingSender>,
) -> (TempDir, Arc<imgbot::api::AppState>, Router) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = dir.path().join("imgbot.db");

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.line.channel_secret = CHANNEL_SECRET.to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let shared = SharedState::with_reply_sender(config, sender)
        .await
        .expect("failed to create state");
    let state = imgbot::api::create_app_state(Arc::new(shared), None);
    let router = imgbot::api::router(state.clone());
    (dir, state, router)
}

fn text_event(reply_token: &str, text: &str) -> String {
    serde_json::json!({
        "destination": "Uxxxxxxxx",
        "events": [{
            "type": "message",
            "replyToken": reply_token,
            "timestamp": 1_700_000_000_000_i64,
            "source": { "type": "user", "userId": "U123" },
            "message": { "type": "text", "id": "1", "text": text }
        }]
    })
    .to_string()
}

async fn post_callback(app: &Router, body: &str, signature: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/callback")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).to_string())
}

fn sign(body: &str) -> String {
    SignatureVerifier::new(CHANNEL_SECRET).sign(body.as_bytes())
}

#[tokio::test]
async fn test_health() {
    let (_db, _, app) = spawn_app(Arc::default()).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json, serde_json::json!({ "status": "ok" }));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signatures() {
    let sender = Arc::new(RecordingSender::default());
    let (_db, _, app) = spawn_app(sender.clone()).await;
    let body = text_event("r1", "meme");

    let (status, _) = post_callback(&app, &body, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_callback(&app, &body, Some("bm90LXRoZS1zaWduYXR1cmU=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_callback(&app, &body, Some("%%% not base64")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Signature over a different body
    let (status, _) = post_callback(&app, &body, Some(&sign("{}"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(sender.replies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_replies_with_first_matching_image() {
    let sender = Arc::new(RecordingSender::default());
    let (_db, state, app) = spawn_app(sender.clone()).await;

    state
        .store()
        .insert_keyword_record(&["abc".to_string()], "https://x.io/u1.png")
        .await
        .unwrap();
    state
        .store()
        .insert_keyword_record(&["abcd".to_string()], "https://x.io/u2.png")
        .await
        .unwrap();
    state
        .store()
        .insert_keyword_record(&["Meme".to_string()], "https://x.io/meme.png")
        .await
        .unwrap();

    let body = text_event("token-1", "xabcdx");
    let (status, text) = post_callback(&app, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");

    let body = text_event("token-2", "send me a MEME now");
    let (status, _) = post_callback(&app, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);

    let body = text_event("token-3", "nothing relevant here");
    let (status, _) = post_callback(&app, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);

    let replies = sender.replies.lock().unwrap().clone();
    assert_eq!(
        replies,
        vec![
            ("token-1".to_string(), "https://x.io/u1.png".to_string()),
            ("token-2".to_string(), "https://x.io/meme.png".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_webhook_ignores_non_text_events() {
    let sender = Arc::new(RecordingSender::default());
    let (_db, state, app) = spawn_app(sender.clone()).await;
    state
        .store()
        .insert_keyword_record(&["cat".to_string()], "https://x.io/cat.png")
        .await
        .unwrap();

    let body = serde_json::json!({
        "events": [
            { "type": "follow", "replyToken": "r1" },
            { "type": "message", "replyToken": "r2",
              "message": { "type": "sticker", "id": "5" } }
        ]
    })
    .to_string();

    let (status, _) = post_callback(&app, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sender.replies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_delivery_failure_still_acknowledged() {
    let sender = Arc::new(RecordingSender {
        fail: true,
        ..RecordingSender::default()
    });
    let (_db, state, app) = spawn_app(sender.clone()).await;
    state
        .store()
        .insert_keyword_record(&["cat".to_string()], "https://x.io/cat.png")
        .await
        .unwrap();

    let body = text_event("r1", "CAT pictures please");
    let (status, text) = post_callback(&app, &body, Some(&sign(&body))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");

    // One attempt, no retries.
    assert_eq!(sender.replies.lock().unwrap().len(), 1);
}
