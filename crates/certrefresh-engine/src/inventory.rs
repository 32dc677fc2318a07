//! Read-only snapshot of an account's certificates and their domains

use crate::account::Account;
use crate::error::{RefreshError, RefreshResult};
use crate::task_group::{ConcurrencyBudget, TaskError, TaskGroup};
use certrefresh_cdn::{Certificate, CdnError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A certificate with the domains bound to it
#[derive(Debug, Clone, Serialize)]
pub struct CertificateEntry {
    /// The certificate
    #[serde(flatten)]
    pub certificate: Certificate,
    /// Names of the bound domains
    pub domains: Vec<String>,
}

/// Everything an account holds
#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    /// Account display name
    pub account: String,
    /// Certificates in listing order
    pub certificates: Vec<CertificateEntry>,
}

/// List certificates and, concurrently, the domains bound to each
pub async fn collect(account: &Account, budget: &ConcurrencyBudget) -> RefreshResult<Inventory> {
    let certs = account.directory.list_certificates().await?;
    debug!(account = %account.display_name, count = certs.len(), "listed certificates");

    let mut group: TaskGroup<Vec<String>, CdnError> = TaskGroup::new(budget.clone());
    for cert in &certs {
        let directory = Arc::clone(&account.directory);
        let cert_id = cert.id.clone();
        group.spawn(cert.id.clone(), async move {
            let domains = directory.list_domains_by_certificate(&cert_id).await?;
            Ok(domains.into_iter().map(|d| d.name).collect())
        });
    }

    let mut bound: HashMap<String, Vec<String>> = match group.join().await {
        Ok(done) => done.into_iter().collect(),
        Err(failure) => {
            return Err(match failure.error {
                TaskError::Failed(e) => RefreshError::Remote(e),
                TaskError::Panicked => RefreshError::TaskPanicked {
                    domain: format!("(domains of {})", failure.failed),
                },
            })
        }
    };

    let certificates = certs
        .into_iter()
        .map(|certificate| CertificateEntry {
            domains: bound.remove(&certificate.id).unwrap_or_default(),
            certificate,
        })
        .collect();

    Ok(Inventory {
        account: account.display_name.clone(),
        certificates,
    })
}
