// certrefresh - CDN certificate rotation
// Copyright (C) 2025 certrefresh Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Repointing domains from superseded certificates to the target
//!
//! Superseded certificates are handled one at a time, in order. The domains
//! bound to one certificate form a group whose updates run concurrently on a
//! [`TaskGroup`]. A failed update aborts the whole swap; updates already in
//! flight are left to land on their own and are reported as unconfirmed.
//!
//! Updates are idempotent: running a swap again rewrites already repointed
//! domains to the same value.

use crate::account::Account;
use crate::error::{RefreshError, RefreshResult};
use crate::task_group::{ConcurrencyBudget, TaskError, TaskGroup};
use certrefresh_cdn::CdnDirectory;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Domains moved off one superseded certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// The superseded certificate
    pub superseded_cert_id: String,
    /// Domains now bound to the target, sorted by name
    pub updated_domains: Vec<String>,
}

/// Result of a successful swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapReport {
    /// Certificate the domains were moved to
    pub target_id: String,
    /// One entry per superseded certificate, in processing order
    pub groups: Vec<GroupReport>,
}

impl SwapReport {
    /// Every repointed domain
    pub fn updated_domains(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.updated_domains.iter().map(String::as_str))
    }

    /// Number of repointed domains
    pub fn domain_count(&self) -> usize {
        self.groups.iter().map(|g| g.updated_domains.len()).sum()
    }
}

/// Move every domain bound to a certificate in `supersede_ids` to `target_id`
pub async fn swap(
    account: &Account,
    budget: &ConcurrencyBudget,
    supersede_ids: &[String],
    target_id: &str,
) -> RefreshResult<SwapReport> {
    let mut groups = Vec::with_capacity(supersede_ids.len());

    for superseded in supersede_ids {
        let domains = account
            .directory
            .list_domains_by_certificate(superseded)
            .await?;
        debug!(
            account = %account.display_name,
            cert_id = %superseded,
            domains = domains.len(),
            "resolved domains of superseded certificate"
        );

        let mut group: TaskGroup<(), RefreshError> = TaskGroup::new(budget.clone());
        for domain in domains {
            let directory = Arc::clone(&account.directory);
            let target = target_id.to_string();
            let name = domain.name;
            group.spawn(name.clone(), repoint(directory, name, target));
        }

        match group.join().await {
            Ok(done) => {
                let mut updated: Vec<String> = done.into_iter().map(|(name, _)| name).collect();
                updated.sort();
                info!(
                    account = %account.display_name,
                    from = %superseded,
                    to = %target_id,
                    domains = updated.len(),
                    "superseded certificate released"
                );
                groups.push(GroupReport {
                    superseded_cert_id: superseded.clone(),
                    updated_domains: updated,
                });
            }
            Err(failure) => {
                let source = match failure.error {
                    TaskError::Failed(e) => e,
                    TaskError::Panicked => RefreshError::TaskPanicked {
                        domain: failure.failed.clone(),
                    },
                };
                let mut completed: Vec<String> = groups
                    .iter()
                    .flat_map(|g: &GroupReport| g.updated_domains.iter().cloned())
                    .collect();
                completed.extend(failure.completed);

                error!(
                    account = %account.display_name,
                    cert_id = %superseded,
                    domain = %failure.failed,
                    error = %source,
                    completed = ?completed,
                    unconfirmed = ?failure.outstanding,
                    "domain update failed, aborting refresh"
                );

                return Err(RefreshError::PartialRefresh {
                    superseded_cert_id: superseded.clone(),
                    failed_domain: failure.failed,
                    completed,
                    unconfirmed: failure.outstanding,
                    source: Box::new(source),
                });
            }
        }
    }

    Ok(SwapReport {
        target_id: target_id.to_string(),
        groups,
    })
}

async fn repoint(
    directory: Arc<dyn CdnDirectory>,
    name: String,
    target_id: String,
) -> RefreshResult<()> {
    let domain = directory.get_domain(&name).await?;
    let https = domain
        .https
        .ok_or_else(|| RefreshError::DomainNotHttps {
            domain: name.clone(),
        })?;

    debug!(domain = %name, from = %https.cert_id, to = %target_id, "updating HTTPS binding");
    directory
        .update_https_config(&name, &https.with_cert_id(target_id.as_str()))
        .await?;
    info!(domain = %name, cert_id = %target_id, "domain repointed");

    Ok(())
}
