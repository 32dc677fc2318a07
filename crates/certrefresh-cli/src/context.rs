//! Per-invocation state shared by the commands

use anyhow::{bail, Context, Result};
use certrefresh_cdn::{Credentials, QiniuClient};
use certrefresh_config::{Config, ConfigLoader, ConfigSource};
use certrefresh_engine::{Account, ConcurrencyBudget, MatchMode, Refresher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Load configuration as selected by the `--config` and `--env-config` flags
pub async fn load_config(config_path: Option<PathBuf>, env_config: bool) -> Result<Config> {
    let source = ConfigSource::from_flags(config_path, env_config)?;
    ConfigLoader::new()
        .load(&source)
        .await
        .context("Failed to load configuration")
}

/// Accounts and the refresher every command works with
#[derive(Debug)]
pub struct AppContext {
    /// Accounts in configuration order
    pub accounts: Vec<Account>,
    /// Shared refresher; its budget bounds every fan-out of the process
    pub refresher: Refresher,
}

impl AppContext {
    /// Wrap already-built accounts
    pub fn new(accounts: Vec<Account>, refresher: Refresher) -> Self {
        AppContext {
            accounts,
            refresher,
        }
    }

    /// Build Qiniu-backed accounts from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.api.timeout_secs);
        let mut accounts = Vec::with_capacity(config.accounts.len());

        for account in &config.accounts {
            let client = QiniuClient::with_options(
                Credentials::new(account.ak.clone(), account.sk.clone()),
                &config.api.host,
                timeout,
            )
            .with_context(|| format!("Failed to create API client for {}", account.display_name))?;

            accounts.push(Account::new(
                account.display_name.clone(),
                account.managed_cert_name_prefix.clone(),
                Arc::new(client),
            ));
        }

        let match_mode: MatchMode = config.refresh.tracing_key_match.parse()?;
        let budget = ConcurrencyBudget::new(config.refresh.max_concurrency);
        debug!(
            accounts = accounts.len(),
            host = %config.api.host,
            max_concurrency = budget.limit(),
            match_mode = %match_mode,
            "context ready"
        );

        Ok(AppContext::new(accounts, Refresher::new(budget, match_mode)))
    }

    /// Look up an account by display name
    pub fn account(&self, display_name: &str) -> Result<&Account> {
        match self
            .accounts
            .iter()
            .find(|a| a.display_name == display_name)
        {
            Some(account) => Ok(account),
            None => bail!("No configured account named '{}'", display_name),
        }
    }
}

/// Reject an empty tracing key
pub fn require_tracing_key(key: &str) -> Result<&str> {
    if key.trim().is_empty() {
        bail!("A tracing key for the certificate must be specified");
    }
    Ok(key)
}
