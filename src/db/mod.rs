use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::lockout::LockState;
use crate::domain::{AccountId, RecordId, Role};
use crate::models::account::Account;
use crate::models::keyword::KeywordRecord;

pub mod migrator;
pub mod repositories;

pub use repositories::account::InsertAccountError;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // Each pooled connection to `:memory:` would see its own empty database.
        let in_memory = db_url.contains(":memory:");
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn keyword_repo(&self) -> repositories::keyword::KeywordRepository {
        repositories::keyword::KeywordRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn count_accounts(&self) -> Result<u64> {
        self.account_repo().count().await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo().list().await
    }

    pub async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_username(username).await
    }

    pub async fn get_account_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(Account, String)>> {
        self.account_repo()
            .get_by_username_with_password(username)
            .await
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_with_password(
        &self,
        id: AccountId,
    ) -> Result<Option<(Account, String)>> {
        self.account_repo().get_by_id_with_password(id).await
    }

    pub async fn insert_account(
        &self,
        username: &str,
        password_hash: String,
        role: Role,
    ) -> Result<Account, InsertAccountError> {
        self.account_repo()
            .insert(username, password_hash, role)
            .await
    }

    pub async fn update_account_password(
        &self,
        id: AccountId,
        password_hash: String,
        clear_lock: bool,
    ) -> Result<bool> {
        self.account_repo()
            .update_password(id, password_hash, clear_lock)
            .await
    }

    pub async fn compare_and_set_lock(
        &self,
        id: AccountId,
        expected: &LockState,
        next: &LockState,
    ) -> Result<bool> {
        self.account_repo()
            .compare_and_set_lock(id, expected, next)
            .await
    }

    pub async fn reset_account_lock(&self, id: AccountId) -> Result<bool> {
        self.account_repo().reset_lock(id).await
    }

    pub async fn clear_expired_locks(&self, now: chrono::DateTime<chrono::Utc>) -> Result<u64> {
        self.account_repo().clear_expired_locks(now).await
    }

    pub async fn delete_account(&self, id: AccountId) -> Result<bool> {
        self.account_repo().delete(id).await
    }

    // ========================================================================
    // Keyword records
    // ========================================================================

    pub async fn list_keyword_records(&self) -> Result<Vec<KeywordRecord>> {
        self.keyword_repo().list_all().await
    }

    pub async fn get_keyword_record(&self, id: RecordId) -> Result<Option<KeywordRecord>> {
        self.keyword_repo().get(id).await
    }

    pub async fn insert_keyword_record(
        &self,
        keywords: &[String],
        image_url: &str,
    ) -> Result<KeywordRecord> {
        self.keyword_repo().insert(keywords, image_url).await
    }

    pub async fn update_keyword_record(
        &self,
        id: RecordId,
        keywords: &[String],
        image_url: &str,
    ) -> Result<Option<KeywordRecord>> {
        self.keyword_repo().update(id, keywords, image_url).await
    }

    pub async fn delete_keyword_record(&self, id: RecordId) -> Result<bool> {
        self.keyword_repo().delete(id).await
    }
}
