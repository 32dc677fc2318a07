use crate::context::{require_tracing_key, AppContext};
use crate::output;
use anyhow::{Context, Result};
use certrefresh_engine::{RefreshError, RefreshOutcome};
use clap::Parser;
use tracing::{debug, error};

/// Repoint domains to a certificate of the tracing key without uploading
///
/// Safe to re-run after a partially failed upload or refresh.
#[derive(Parser, Debug)]
pub struct RefreshCmd {
    /// Tracing key of the certificate
    #[arg(value_name = "TRACING-KEY")]
    pub key: String,

    /// Certificate to move domains to; the latest-expiring valid one when omitted
    #[arg(long, value_name = "ID")]
    pub cert_id: Option<String>,
}

impl RefreshCmd {
    pub async fn execute(&self, ctx: &AppContext) -> Result<()> {
        let key = require_tracing_key(&self.key)?;
        debug!(key, cert_id = ?self.cert_id, "invoked the refresh command");

        for account in &ctx.accounts {
            let outcome = ctx
                .refresher
                .refresh(account, key, self.cert_id.as_deref())
                .await
                .map_err(|e| {
                    error!(account = %account.display_name, key, error = %e, "failed to refresh");
                    report_partial(&e);
                    e
                })
                .with_context(|| format!("Refresh failed for account {}", account.display_name))?;

            report_outcome(&outcome);
        }

        Ok(())
    }
}

/// Print what a refresh did to one account
pub fn report_outcome(outcome: &RefreshOutcome) {
    output::header(&format!("Account {}", outcome.account));
    if let Some(id) = &outcome.uploaded_cert_id {
        output::detail("Uploaded", id);
    }
    output::detail("Target", &outcome.target_id);

    if outcome.groups.is_empty() {
        output::info("No superseded certificates; nothing to repoint");
        return;
    }

    for group in &outcome.groups {
        output::detail(
            &format!("From {}", group.superseded_cert_id),
            &group.updated_domains.join(", "),
        );
    }
    output::success(&format!(
        "{} domain(s) now use {}",
        outcome.domain_count(),
        outcome.target_id
    ));
}

/// Print which domains a failed refresh did and did not repoint
pub fn report_partial(err: &RefreshError) {
    for (label, value) in partial_details(err) {
        output::detail(label, &value);
    }
}

fn partial_details(err: &RefreshError) -> Vec<(&'static str, String)> {
    let RefreshError::PartialRefresh {
        superseded_cert_id,
        failed_domain,
        completed,
        unconfirmed,
        ..
    } = err
    else {
        return Vec::new();
    };

    let list = |domains: &[String]| {
        if domains.is_empty() {
            "none".to_string()
        } else {
            domains.join(", ")
        }
    };
    vec![
        ("Superseded", superseded_cert_id.clone()),
        ("Failed at", failed_domain.clone()),
        ("Repointed", list(completed)),
        ("Unconfirmed", list(unconfirmed)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use certrefresh_cdn::ApiError;

    #[test]
    fn test_partial_details_list_domains() {
        let err = RefreshError::PartialRefresh {
            superseded_cert_id: "old".into(),
            failed_domain: "b.example.com".into(),
            completed: vec!["a.example.com".into(), "c.example.com".into()],
            unconfirmed: vec![],
            source: Box::new(RefreshError::Remote(ApiError::new(500, "boom").into())),
        };

        assert_eq!(
            partial_details(&err),
            vec![
                ("Superseded", "old".to_string()),
                ("Failed at", "b.example.com".to_string()),
                ("Repointed", "a.example.com, c.example.com".to_string()),
                ("Unconfirmed", "none".to_string()),
            ]
        );
    }

    #[test]
    fn test_other_errors_have_no_details() {
        let err = RefreshError::NoEligibleCertificate { key: "www".into() };
        assert!(partial_details(&err).is_empty());
    }
}
