//! `SeaORM` implementation of the `KeywordService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::domain::RecordId;
use crate::models::keyword::{KeywordRecord, is_valid_image_url};
use crate::services::keyword_service::{KeywordError, KeywordRecordInput, KeywordService};

pub struct SeaOrmKeywordService {
    store: Store,
}

impl SeaOrmKeywordService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

/// Sanitized keywords and trimmed URL, or the reason the input cannot be stored.
fn validate(input: &KeywordRecordInput) -> Result<(Vec<String>, String), KeywordError> {
    let image_url = input.image_url.trim().to_string();
    if !is_valid_image_url(&image_url) {
        return Err(KeywordError::Validation(
            "Image URL must use HTTPS".to_string(),
        ));
    }

    let keywords = input.keywords.sanitized();
    if keywords.is_empty() {
        return Err(KeywordError::Validation(
            "At least one non-empty keyword is required".to_string(),
        ));
    }

    Ok((keywords, image_url))
}

#[async_trait]
impl KeywordService for SeaOrmKeywordService {
    async fn list(&self) -> Result<Vec<KeywordRecord>, KeywordError> {
        Ok(self.store.list_keyword_records().await?)
    }

    async fn get(&self, id: RecordId) -> Result<KeywordRecord, KeywordError> {
        self.store
            .get_keyword_record(id)
            .await?
            .ok_or(KeywordError::NotFound(id))
    }

    async fn create(&self, input: KeywordRecordInput) -> Result<KeywordRecord, KeywordError> {
        let (keywords, image_url) = validate(&input)?;
        Ok(self
            .store
            .insert_keyword_record(&keywords, &image_url)
            .await?)
    }

    async fn update(
        &self,
        id: RecordId,
        input: KeywordRecordInput,
    ) -> Result<KeywordRecord, KeywordError> {
        let (keywords, image_url) = validate(&input)?;
        let record = self
            .store
            .update_keyword_record(id, &keywords, &image_url)
            .await?
            .ok_or(KeywordError::NotFound(id))?;

        info!(record_id = %id, "Updated keyword record");
        Ok(record)
    }

    async fn delete(&self, id: RecordId) -> Result<(), KeywordError> {
        if !self.store.delete_keyword_record(id).await? {
            return Err(KeywordError::NotFound(id));
        }

        info!(record_id = %id, "Deleted keyword record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::keyword_service::KeywordsInput;

    fn input(keywords: KeywordsInput, url: &str) -> KeywordRecordInput {
        KeywordRecordInput {
            keywords,
            image_url: url.to_string(),
        }
    }

    #[test]
    fn validate_accepts_csv_and_list() {
        let (kw, url) = validate(&input(
            KeywordsInput::Csv("cat, <b>dog</b>".to_string()),
            " https://i.imgur.com/x.png ",
        ))
        .unwrap();
        assert_eq!(kw, vec!["cat", "dog"]);
        assert_eq!(url, "https://i.imgur.com/x.png");

        let (kw, _) = validate(&input(
            KeywordsInput::List(vec![" meme ".to_string(), String::new()]),
            "https://i.imgur.com/x.png",
        ))
        .unwrap();
        assert_eq!(kw, vec!["meme"]);
    }

    #[test]
    fn validate_rejects_insecure_url_and_empty_keywords() {
        assert!(matches!(
            validate(&input(
                KeywordsInput::Csv("cat".to_string()),
                "http://i.imgur.com/x.png"
            )),
            Err(KeywordError::Validation(_))
        ));
        assert!(matches!(
            validate(&input(
                KeywordsInput::Csv("<p></p>, ,".to_string()),
                "https://i.imgur.com/x.png"
            )),
            Err(KeywordError::Validation(_))
        ));
    }

    #[test]
    fn keywords_input_deserializes_both_shapes() {
        let csv: KeywordRecordInput =
            serde_json::from_str(r#"{"keywords":"a,b","image_url":"https://x.io/a.png"}"#)
                .unwrap();
        assert_eq!(csv.keywords.sanitized(), vec!["a", "b"]);

        let list: KeywordRecordInput =
            serde_json::from_str(r#"{"keywords":["a","b"],"image_url":"https://x.io/a.png"}"#)
                .unwrap();
        assert_eq!(list.keywords.sanitized(), vec!["a", "b"]);
    }
}
