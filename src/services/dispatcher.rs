//! Matches inbound chat text against the keyword table and sends the reply image.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::Store;
use crate::domain::RecordId;
use crate::models::keyword::KeywordRecord;

/// Delivers an image reply for a message. One attempt per call, no retries.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn reply_image(&self, reply_token: &str, image_url: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    NoMatch,
    Replied { record_id: RecordId },
    DeliveryFailed { record_id: RecordId },
}

/// Returns the first record, in table order, with a keyword contained in `text`.
///
/// Matching is case-insensitive. When several records match, the earliest one wins.
#[must_use]
pub fn find_match<'a>(text: &str, records: &'a [KeywordRecord]) -> Option<&'a KeywordRecord> {
    let text = text.to_lowercase();

    records.iter().find(|record| {
        record
            .keywords
            .iter()
            .any(|kw| !kw.is_empty() && text.contains(&kw.to_lowercase()))
    })
}

pub struct KeywordDispatcher {
    store: Store,
    sender: Arc<dyn ReplySender>,
}

impl KeywordDispatcher {
    #[must_use]
    pub fn new(store: Store, sender: Arc<dyn ReplySender>) -> Self {
        Self { store, sender }
    }

    /// Handles one text message against a single snapshot of the keyword table.
    pub async fn dispatch(&self, reply_token: &str, text: &str) -> anyhow::Result<DispatchOutcome> {
        let records = self.store.list_keyword_records().await?;

        let Some(record) = find_match(text, &records) else {
            debug!("No keyword matched");
            metrics::counter!("webhook_messages_total", "outcome" => "no_match").increment(1);
            return Ok(DispatchOutcome::NoMatch);
        };

        match self.sender.reply_image(reply_token, &record.image_url).await {
            Ok(()) => {
                info!(record_id = %record.id, "Replied with image");
                metrics::counter!("webhook_messages_total", "outcome" => "replied").increment(1);
                Ok(DispatchOutcome::Replied {
                    record_id: record.id,
                })
            }
            Err(e) => {
                warn!(record_id = %record.id, error = %e, "Failed to send reply");
                metrics::counter!("webhook_messages_total", "outcome" => "delivery_failed")
                    .increment(1);
                Ok(DispatchOutcome::DeliveryFailed {
                    record_id: record.id,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i32, keywords: &[&str], url: &str) -> KeywordRecord {
        KeywordRecord {
            id: RecordId::new(id),
            keywords: keywords.iter().map(ToString::to_string).collect(),
            image_url: url.to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn first_inserted_match_wins() {
        let records = vec![
            record(1, &["abc"], "https://x.io/u1.png"),
            record(2, &["abcd"], "https://x.io/u2.png"),
        ];

        let matched = find_match("xabcdx", &records).unwrap();
        assert_eq!(matched.image_url, "https://x.io/u1.png");
    }

    #[test]
    fn matching_ignores_case_on_both_sides() {
        let records = vec![record(1, &["Meme"], "https://x.io/meme.png")];
        assert!(find_match("send me a MEME now", &records).is_some());
    }

    #[test]
    fn any_keyword_in_a_record_can_match() {
        let records = vec![
            record(1, &["dog"], "https://x.io/dog.png"),
            record(2, &["cat", "kitten"], "https://x.io/cat.png"),
        ];
        let matched = find_match("look at this KITTEN", &records).unwrap();
        assert_eq!(matched.id, RecordId::new(2));
    }

    #[test]
    fn no_match_and_empty_keywords() {
        let records = vec![record(1, &["", "zebra"], "https://x.io/z.png")];
        assert!(find_match("hello there", &records).is_none());
        assert!(find_match("anything", &[]).is_none());
    }

    #[test]
    fn unicode_keywords_match() {
        let records = vec![record(1, &["早安"], "https://x.io/morning.png")];
        assert!(find_match("大家早安！", &records).is_some());
    }
}
