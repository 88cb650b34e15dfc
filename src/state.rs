use std::sync::Arc;

use crate::clients::line::{LineClient, SignatureVerifier};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, AuthService, KeywordDispatcher, KeywordService, ReplySender,
    SeaOrmAccountService, SeaOrmAuthService, SeaOrmKeywordService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub account_service: Arc<dyn AccountService>,

    pub keyword_service: Arc<dyn KeywordService>,

    pub dispatcher: Arc<KeywordDispatcher>,

    pub signature_verifier: SignatureVerifier,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let sender: Arc<dyn ReplySender> = Arc::new(LineClient::new(&config.line)?);
        Self::init_with_sender(config, sender).await
    }

    /// Builds state around a caller-supplied reply sender instead of the LINE client.
    pub async fn with_reply_sender(
        config: Config,
        sender: Arc<dyn ReplySender>,
    ) -> anyhow::Result<Self> {
        Self::init_with_sender(config, sender).await
    }

    async fn init_with_sender(
        config: Config,
        sender: Arc<dyn ReplySender>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        ));
        let account_service: Arc<dyn AccountService> = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            config.security.clone(),
        ));
        let keyword_service: Arc<dyn KeywordService> =
            Arc::new(SeaOrmKeywordService::new(store.clone()));

        account_service
            .ensure_bootstrap_admin()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to seed admin account: {e}"))?;

        let dispatcher = Arc::new(KeywordDispatcher::new(store.clone(), sender));

        if config.line.channel_secret.is_empty() {
            tracing::warn!("LINE channel secret is not set; webhook requests will be rejected");
        }
        let signature_verifier = SignatureVerifier::new(&config.line.channel_secret);

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
            account_service,
            keyword_service,
            dispatcher,
            signature_verifier,
        })
    }
}
