use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::info;

use crate::domain::RecordId;
use crate::entities::{keyword_records, prelude::*};
use crate::models::format_timestamp;
use crate::models::keyword::KeywordRecord;

/// Repository for keyword record operations
pub struct KeywordRepository {
    conn: DatabaseConnection,
}

impl KeywordRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// All records in insertion order, fetched with a single query.
    pub async fn list_all(&self) -> Result<Vec<KeywordRecord>> {
        let rows = KeywordRecords::find()
            .order_by_asc(keyword_records::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list keyword records")?;

        Ok(rows.into_iter().map(KeywordRecord::from).collect())
    }

    pub async fn get(&self, id: RecordId) -> Result<Option<KeywordRecord>> {
        let row = KeywordRecords::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query keyword record")?;

        Ok(row.map(KeywordRecord::from))
    }

    pub async fn insert(&self, keywords: &[String], image_url: &str) -> Result<KeywordRecord> {
        let now = format_timestamp(chrono::Utc::now());

        let active = keyword_records::ActiveModel {
            keywords: Set(serde_json::to_string(keywords)?),
            image_url: Set(image_url.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert keyword record")?;

        info!(record_id = model.id, "Added keyword record");
        Ok(KeywordRecord::from(model))
    }

    pub async fn update(
        &self,
        id: RecordId,
        keywords: &[String],
        image_url: &str,
    ) -> Result<Option<KeywordRecord>> {
        let Some(existing) = KeywordRecords::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query keyword record for update")?
        else {
            return Ok(None);
        };

        let mut active: keyword_records::ActiveModel = existing.into();
        active.keywords = Set(serde_json::to_string(keywords)?);
        active.image_url = Set(image_url.to_string());
        active.updated_at = Set(format_timestamp(chrono::Utc::now()));

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update keyword record")?;

        Ok(Some(KeywordRecord::from(model)))
    }

    pub async fn delete(&self, id: RecordId) -> Result<bool> {
        let result = KeywordRecords::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete keyword record")?;

        Ok(result.rows_affected > 0)
    }
}
