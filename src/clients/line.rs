//! LINE Messaging API: webhook payloads, signature checks and the reply endpoint.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;

use crate::config::LineConfig;
use crate::services::dispatcher::ReplySender;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,

    pub reply_token: Option<String>,

    pub message: Option<EventMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,

    pub text: Option<String>,
}

impl WebhookEvent {
    /// Returns `(reply_token, text)` for text message events; other events are ignored.
    #[must_use]
    pub fn text_message(&self) -> Option<(&str, &str)> {
        if self.kind != "message" {
            return None;
        }
        let message = self.message.as_ref()?;
        if message.kind != "text" {
            return None;
        }
        Some((self.reply_token.as_deref()?, message.text.as_deref()?))
    }
}

/// Verifies `X-Line-Signature`: base64 HMAC-SHA256 of the raw body keyed by the channel secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    #[must_use]
    pub fn new(channel_secret: &str) -> Self {
        Self {
            secret: channel_secret.as_bytes().to_vec(),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.secret.is_empty()
    }

    #[must_use]
    pub fn sign(&self, body: &[u8]) -> String {
        let mut mac = self.mac();
        mac.update(body);
        BASE64.encode(mac.finalize().into_bytes())
    }

    #[must_use]
    pub fn verify(&self, body: &[u8], signature: &str) -> bool {
        if !self.is_configured() {
            return false;
        }

        let Ok(expected) = BASE64.decode(signature.trim()) else {
            return false;
        };

        let mut mac = self.mac();
        mac.update(body);
        mac.verify_slice(&expected).is_ok()
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length, so this never fails.
        #[allow(clippy::expect_used)]
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyMessageRequest<'a> {
    reply_token: &'a str,
    messages: [ImageMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    original_content_url: &'a str,
    preview_image_url: &'a str,
}

pub struct LineClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl LineClient {
    pub fn new(config: &LineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("imgbot/1.0")
            .build()
            .context("Failed to build LINE HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_token: config.channel_access_token.clone(),
        })
    }
}

#[async_trait]
impl ReplySender for LineClient {
    async fn reply_image(&self, reply_token: &str, image_url: &str) -> Result<()> {
        let url = format!("{}/v2/bot/message/reply", self.base_url);

        let request = ReplyMessageRequest {
            reply_token,
            messages: [ImageMessage {
                kind: "image",
                original_content_url: image_url,
                preview_image_url: image_url,
            }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to LINE Messaging API")?;

        let status = response.status();
        if status.is_success() {
            debug!("Reply delivered");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            bail!("LINE reply failed: status={status}, body={body}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trip() {
        let verifier = SignatureVerifier::new("channel-secret");
        let body = br#"{"events":[]}"#;
        let signature = verifier.sign(body);

        assert!(verifier.verify(body, &signature));
        assert!(!verifier.verify(b"{\"events\":[1]}", &signature));
        assert!(!verifier.verify(body, "not base64!"));
        assert!(!SignatureVerifier::new("other-secret").verify(body, &signature));
    }

    #[test]
    fn unconfigured_secret_rejects_everything() {
        let verifier = SignatureVerifier::new("");
        let signature = verifier.sign(b"body");
        assert!(!verifier.verify(b"body", &signature));
    }

    #[test]
    fn extracts_text_messages_only() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{
                "destination": "U123",
                "events": [
                    {"type": "message", "replyToken": "r1",
                     "message": {"type": "text", "id": "1", "text": "Hello"}},
                    {"type": "message", "replyToken": "r2",
                     "message": {"type": "sticker", "id": "2"}},
                    {"type": "follow", "replyToken": "r3"}
                ]
            }"#,
        )
        .unwrap();

        let texts: Vec<_> = payload
            .events
            .iter()
            .filter_map(WebhookEvent::text_message)
            .collect();
        assert_eq!(texts, vec![("r1", "Hello")]);
    }

    #[test]
    fn reply_request_shape() {
        let request = ReplyMessageRequest {
            reply_token: "tok",
            messages: [ImageMessage {
                kind: "image",
                original_content_url: "https://i.imgur.com/a.png",
                preview_image_url: "https://i.imgur.com/a.png",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["replyToken"], "tok");
        assert_eq!(json["messages"][0]["type"], "image");
        assert_eq!(
            json["messages"][0]["previewImageUrl"],
            "https://i.imgur.com/a.png"
        );
    }
}
