use crate::certfile;
use crate::commands::refresh::{report_outcome, report_partial};
use crate::context::{require_tracing_key, AppContext};
use crate::output;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error};

/// Upload a new certificate and repoint every domain of the tracing key
#[derive(Parser, Debug)]
pub struct UploadCmd {
    /// Tracing key of the certificate
    #[arg(value_name = "TRACING-KEY")]
    pub key: String,

    /// Path to the certificate chain file
    #[arg(long, value_name = "PATH")]
    pub cert: PathBuf,

    /// Path to the private key file
    #[arg(long, value_name = "PATH")]
    pub pem: PathBuf,

    /// Let the latest-expiring valid certificate win instead of the new one
    #[arg(long)]
    pub no_activate: bool,
}

impl UploadCmd {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let key = require_tracing_key(&self.key)?;
        debug!(
            cert = %self.cert.display(),
            pem = %self.pem.display(),
            key,
            "invoked the upload command"
        );

        let bundle = certfile::load_bundle(&self.cert, &self.pem)
            .await
            .context("Failed to prepare the upload")?;

        for account in &ctx.accounts {
            let outcome = ctx
                .refresher
                .upload_and_refresh(account, key, &bundle, !self.no_activate)
                .await
                .map_err(|e| {
                    error!(account = %account.display_name, key, error = %e, "failed to upload and refresh");
                    if e.is_partial() {
                        report_partial(&e);
                        output::warning("The uploaded certificate was kept; run `certrefresh refresh` to finish");
                    }
                    e
                })
                .with_context(|| {
                    format!("Upload and refresh failed for account {}", account.display_name)
                })?;

            report_outcome(&outcome);
        }

        Ok(())
    }
}
