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

//! Upload and refresh entry points
//!
//! [`Refresher`] ties the pieces together for one account at a time:
//!
//! 1. list the account's certificates and keep those carrying the tracing key
//! 2. plan the target and the superseded certificates
//! 3. swap the domains of every superseded certificate over to the target
//!
//! [`Refresher::upload_and_refresh`] uploads a new certificate first and, by
//! default, makes it the target. The uploaded certificate is left in place
//! when a later step fails.

use crate::account::Account;
use crate::error::RefreshResult;
use crate::matcher::{MatchMode, TracingKeyMatcher};
use crate::planner::plan;
use crate::swapper::{swap, GroupReport};
use crate::task_group::ConcurrencyBudget;
use certrefresh_cdn::{Certificate, UploadCertificate};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{info, instrument};

/// PEM material of a certificate to upload
#[derive(Clone)]
pub struct CertificateBundle {
    /// Subject common name of the leaf certificate
    pub common_name: String,
    /// Full chain, PEM encoded
    pub chain_pem: String,
    /// Private key, PEM encoded
    pub private_key_pem: String,
}

impl fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("common_name", &self.common_name)
            .field("chain_pem_len", &self.chain_pem.len())
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

/// What a refresh did to one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    /// Account display name
    pub account: String,
    /// Tracing key
    pub key: String,
    /// Certificate uploaded by this run, if any
    pub uploaded_cert_id: Option<String>,
    /// Certificate the domains now use
    pub target_id: String,
    /// Certificates whose domains were moved
    pub superseded: Vec<String>,
    /// Domains moved, per superseded certificate
    pub groups: Vec<GroupReport>,
}

impl RefreshOutcome {
    /// Number of repointed domains
    pub fn domain_count(&self) -> usize {
        self.groups.iter().map(|g| g.updated_domains.len()).sum()
    }
}

/// Name given to an uploaded certificate: `<prefix> <key> (<unix nanos>)`
pub fn managed_cert_name(prefix: &str, key: &str, at: DateTime<Utc>) -> String {
    let nanos = i128::from(at.timestamp()) * 1_000_000_000 + i128::from(at.timestamp_subsec_nanos());
    format!("{} {} ({})", prefix, key, nanos)
}

/// Runs refreshes with a shared concurrency budget
#[derive(Debug, Clone, Default)]
pub struct Refresher {
    budget: ConcurrencyBudget,
    match_mode: MatchMode,
}

impl Refresher {
    /// Create a refresher
    pub fn new(budget: ConcurrencyBudget, match_mode: MatchMode) -> Self {
        Refresher { budget, match_mode }
    }

    /// The shared budget
    pub fn budget(&self) -> &ConcurrencyBudget {
        &self.budget
    }

    /// How tracing keys are matched
    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Certificates of the account carrying `key`, in listing order
    pub async fn candidates(&self, account: &Account, key: &str) -> RefreshResult<Vec<Certificate>> {
        let matcher = TracingKeyMatcher::new(&account.cert_name_prefix, key, self.match_mode)?;
        let all = account.directory.list_certificates().await?;
        Ok(matcher.filter(all))
    }

    /// Move every domain of `key` to `explicit_target`, or to the latest
    /// valid certificate of the key when no target is given
    #[instrument(skip(self, account), fields(account = %account.display_name))]
    pub async fn refresh(
        &self,
        account: &Account,
        key: &str,
        explicit_target: Option<&str>,
    ) -> RefreshResult<RefreshOutcome> {
        self.run(account, key, explicit_target, None).await
    }

    /// Upload `bundle` under a managed name, then refresh `key`
    ///
    /// With `activate` the new certificate becomes the target; otherwise the
    /// latest valid certificate of the key is chosen.
    #[instrument(skip(self, account, bundle), fields(account = %account.display_name))]
    pub async fn upload_and_refresh(
        &self,
        account: &Account,
        key: &str,
        bundle: &CertificateBundle,
        activate: bool,
    ) -> RefreshResult<RefreshOutcome> {
        let upload = UploadCertificate {
            name: managed_cert_name(&account.cert_name_prefix, key, Utc::now()),
            common_name: bundle.common_name.clone(),
            private_key_pem: bundle.private_key_pem.clone(),
            ca_chain_pem: bundle.chain_pem.clone(),
        };

        let cert_id = account.directory.upload_certificate(&upload).await?;
        info!(cert_id = %cert_id, name = %upload.name, "certificate uploaded");

        let target = activate.then_some(cert_id.as_str());
        self.run(account, key, target, Some(cert_id.clone())).await
    }

    async fn run(
        &self,
        account: &Account,
        key: &str,
        explicit_target: Option<&str>,
        uploaded_cert_id: Option<String>,
    ) -> RefreshResult<RefreshOutcome> {
        let candidates = self.candidates(account, key).await?;
        let plan = plan(key, &candidates, explicit_target, Utc::now().timestamp())?;
        info!(
            target = %plan.target_id,
            superseded = plan.supersede.len(),
            candidates = candidates.len(),
            "refresh planned"
        );

        let report = swap(account, &self.budget, &plan.supersede, &plan.target_id).await?;

        Ok(RefreshOutcome {
            account: account.display_name.clone(),
            key: key.to_string(),
            uploaded_cert_id,
            target_id: report.target_id,
            superseded: plan.supersede,
            groups: report.groups,
        })
    }
}
