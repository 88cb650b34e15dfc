//! Domain service for the keyword → image table.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::RecordId;
use crate::models::keyword::{KeywordRecord, parse_keyword_list, sanitize_keywords};

#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("Keyword record not found: {0}")]
    NotFound(RecordId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for KeywordError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for KeywordError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Keywords as submitted: a comma-separated string or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeywordsInput {
    Csv(String),
    List(Vec<String>),
}

impl KeywordsInput {
    #[must_use]
    pub fn sanitized(&self) -> Vec<String> {
        match self {
            Self::Csv(raw) => parse_keyword_list(raw),
            Self::List(items) => sanitize_keywords(items.iter().map(String::as_str)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordRecordInput {
    pub keywords: KeywordsInput,
    pub image_url: String,
}

#[async_trait::async_trait]
pub trait KeywordService: Send + Sync {
    /// All records in insertion order.
    async fn list(&self) -> Result<Vec<KeywordRecord>, KeywordError>;

    async fn get(&self, id: RecordId) -> Result<KeywordRecord, KeywordError>;

    /// # Errors
    ///
    /// Returns [`KeywordError::Validation`] if the URL is not `https` or no
    /// keyword survives sanitization; nothing is written in that case.
    async fn create(&self, input: KeywordRecordInput) -> Result<KeywordRecord, KeywordError>;

    /// Same validation as [`KeywordService::create`]; the stored record is untouched on error.
    async fn update(
        &self,
        id: RecordId,
        input: KeywordRecordInput,
    ) -> Result<KeywordRecord, KeywordError>;

    async fn delete(&self, id: RecordId) -> Result<(), KeywordError>;
}
