use crate::context::AppContext;
use crate::output;
use anyhow::{bail, Result};
use certrefresh_engine::Account;
use clap::Parser;
use tracing::{debug, info};

/// Delete a certificate from an account
///
/// The provider refuses to delete a certificate still bound to a domain.
#[derive(Parser, Debug)]
pub struct DeleteCmd {
    /// ID of the certificate to delete
    #[arg(value_name = "CERT-ID")]
    pub cert_id: String,

    /// Account holding the certificate; required when several are configured
    #[arg(long, value_name = "NAME")]
    pub account: Option<String>,
}

impl DeleteCmd {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let account = self.target_account(ctx)?;
        debug!(account = %account.display_name, cert_id = %self.cert_id, "invoked the delete command");

        if let Err(e) = account.directory.delete_certificate(&self.cert_id).await {
            let hint = e
                .api_error()
                .and_then(|api| api.known_kind())
                .map(|kind| format!(" ({})", kind.description()))
                .unwrap_or_default();
            bail!(
                "Failed to delete certificate {} from {}: {}{}",
                self.cert_id,
                account.display_name,
                e,
                hint
            );
        }

        info!(account = %account.display_name, cert_id = %self.cert_id, "certificate deleted");
        output::success(&format!(
            "Deleted certificate {} from {}",
            self.cert_id, account.display_name
        ));
        Ok(())
    }

    fn target_account<'a>(&self, ctx: &'a AppContext) -> Result<&'a Account> {
        match (&self.account, ctx.accounts.as_slice()) {
            (Some(name), _) => ctx.account(name),
            (None, [only]) => Ok(only),
            (None, []) => bail!("No accounts configured"),
            (None, _) => bail!("Several accounts are configured; choose one with --account"),
        }
    }
}
