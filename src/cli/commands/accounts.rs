//! Offline account maintenance commands

use anyhow::Context;

use crate::config::Config;
use crate::db::Store;
use crate::models::account::Account;
use crate::services::{AccountService, SeaOrmAccountService};

async fn find_account(store: &Store, username: &str) -> anyhow::Result<Account> {
    store
        .get_account_by_username(username)
        .await?
        .with_context(|| format!("No account named '{username}'"))
}

pub async fn cmd_unlock(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let account = find_account(&store, username).await?;

    let service = SeaOrmAccountService::new(store, config.security.clone());
    service
        .unlock_account(account.id)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("✓ Account '{}' unlocked", account.username);
    Ok(())
}

pub async fn cmd_reset_password(
    config: &Config,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let account = find_account(&store, username).await?;

    let service = SeaOrmAccountService::new(store, config.security.clone());
    service
        .reset_password(account.id, password)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("✓ Password for '{}' reset, lockout cleared", account.username);
    Ok(())
}
