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

//! In-memory mock CDN directory for testing
//!
//! Provides a thread-safe, in-memory implementation of both
//! [`CertificateDirectory`] and [`DomainDirectory`] using `Arc<RwLock<_>>`.
//! Clones share state, so a test can hand one clone to the code under test and
//! inspect the inventory through another.
//!
//! Failures can be injected per operation (and per domain for lookups and
//! updates). Updates can be slowed down per domain, and the mock records how
//! many updates were in flight at once.
//!
//! # Examples
//!
//! ```rust,no_run
//! use certrefresh_cdn::mock::MockDirectory;
//! use certrefresh_cdn::{ApiError, DomainDirectory, HttpsConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cdn = MockDirectory::new();
//!     cdn.add_certificate("old", "[CertRefresh-Managed] www (1)", 0, 100).await;
//!     cdn.add_certificate("new", "[CertRefresh-Managed] www (2)", 0, 200).await;
//!     cdn.add_domain("www.example.com", Some(HttpsConfig::default().with_cert_id("old"))).await;
//!
//!     cdn.fail_update("www.example.com", ApiError::new(500, "boom")).await;
//!     let result = cdn
//!         .update_https_config("www.example.com", &HttpsConfig::default().with_cert_id("new"))
//!         .await;
//!     assert!(result.is_err());
//! }
//! ```

use crate::error::{ApiError, CdnResult, KnownErrorCode};
use crate::types::{Certificate, Domain, HttpsConfig, UploadCertificate};
use crate::{CertificateDirectory, DomainDirectory};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Error code reported for unknown domains
pub const NO_SUCH_DOMAIN: i64 = 404;

/// Validity given to uploaded certificates when none is configured
const DEFAULT_UPLOAD_VALIDITY: i64 = 90 * 24 * 3600;

#[derive(Default)]
struct Failures {
    upload: Option<ApiError>,
    list_certificates: Option<ApiError>,
    list_domains: HashMap<String, ApiError>,
    get_domain: HashMap<String, ApiError>,
    update: HashMap<String, ApiError>,
}

#[derive(Default)]
struct MockState {
    certs: Vec<Certificate>,
    domains: BTreeMap<String, Domain>,
    uploads: Vec<UploadCertificate>,
    next_id: u64,
    upload_validity: Option<(i64, i64)>,
    failures: Failures,
    default_update_delay: Option<Duration>,
    update_delays: HashMap<String, Duration>,
    update_counts: HashMap<String, usize>,
    updates_in_flight: usize,
    max_updates_in_flight: usize,
}

/// In-memory certificate and domain inventory
#[derive(Clone, Default)]
pub struct MockDirectory {
    state: Arc<RwLock<MockState>>,
}

impl MockDirectory {
    /// Create an empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a certificate with the given validity window (unix seconds)
    pub async fn add_certificate(
        &self,
        id: &str,
        name: &str,
        not_before: i64,
        not_after: i64,
    ) -> Certificate {
        let cert = Certificate {
            id: id.to_string(),
            name: name.to_string(),
            common_name: String::new(),
            dns_names: Vec::new(),
            not_before,
            not_after,
            create_time: not_before,
        };
        self.insert_certificate(cert.clone()).await;
        cert
    }

    /// Add a fully specified certificate
    pub async fn insert_certificate(&self, cert: Certificate) {
        self.state.write().await.certs.push(cert);
    }

    /// Add (or replace) a domain
    pub async fn add_domain(&self, name: &str, https: Option<HttpsConfig>) {
        self.insert_domain(Domain::new(name, https)).await;
    }

    /// Add (or replace) a fully specified domain record
    pub async fn insert_domain(&self, domain: Domain) {
        self.state
            .write()
            .await
            .domains
            .insert(domain.name.clone(), domain);
    }

    /// Fix the validity window of subsequently uploaded certificates
    pub async fn set_upload_validity(&self, not_before: i64, not_after: i64) {
        self.state.write().await.upload_validity = Some((not_before, not_after));
    }

    /// All certificates, in insertion order
    pub async fn certificates(&self) -> Vec<Certificate> {
        self.state.read().await.certs.clone()
    }

    /// Current record of a domain
    pub async fn domain(&self, name: &str) -> Option<Domain> {
        self.state.read().await.domains.get(name).cloned()
    }

    /// Certificate currently bound to a domain
    pub async fn bound_cert(&self, name: &str) -> Option<String> {
        self.domain(name)
            .await
            .and_then(|d| d.cert_id().map(str::to_string))
    }

    /// Every upload body received, in order
    pub async fn uploads(&self) -> Vec<UploadCertificate> {
        self.state.read().await.uploads.clone()
    }

    /// Number of HTTPS updates that reached a domain (failed ones included)
    pub async fn update_count(&self, name: &str) -> usize {
        self.state
            .read()
            .await
            .update_counts
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Highest number of HTTPS updates observed in flight at once
    pub async fn max_concurrent_updates(&self) -> usize {
        self.state.read().await.max_updates_in_flight
    }

    /// Make the next uploads fail
    pub async fn fail_upload(&self, err: ApiError) {
        self.state.write().await.failures.upload = Some(err);
    }

    /// Make certificate listings fail
    pub async fn fail_list_certificates(&self, err: ApiError) {
        self.state.write().await.failures.list_certificates = Some(err);
    }

    /// Make listing the domains bound to `cert_id` fail
    pub async fn fail_list_domains(&self, cert_id: &str, err: ApiError) {
        self.state
            .write()
            .await
            .failures
            .list_domains
            .insert(cert_id.to_string(), err);
    }

    /// Make lookups of a domain fail
    pub async fn fail_get_domain(&self, name: &str, err: ApiError) {
        self.state
            .write()
            .await
            .failures
            .get_domain
            .insert(name.to_string(), err);
    }

    /// Make HTTPS updates of a domain fail
    pub async fn fail_update(&self, name: &str, err: ApiError) {
        self.state
            .write()
            .await
            .failures
            .update
            .insert(name.to_string(), err);
    }

    /// Remove every injected failure
    pub async fn clear_failures(&self) {
        self.state.write().await.failures = Failures::default();
    }

    /// Delay every HTTPS update by `delay`
    pub async fn set_default_update_delay(&self, delay: Duration) {
        self.state.write().await.default_update_delay = Some(delay);
    }

    /// Delay HTTPS updates of one domain by `delay`
    pub async fn set_update_delay(&self, name: &str, delay: Duration) {
        self.state
            .write()
            .await
            .update_delays
            .insert(name.to_string(), delay);
    }
}

impl fmt::Debug for MockDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDirectory")
            .field("state", &"<RwLock<MockState>>")
            .finish()
    }
}

fn no_such_cert(cert_id: &str) -> ApiError {
    ApiError::new(
        KnownErrorCode::NO_SUCH_CERT,
        format!("no such certificate: {}", cert_id),
    )
}

fn no_such_domain(name: &str) -> ApiError {
    ApiError::new(NO_SUCH_DOMAIN, format!("no such domain: {}", name))
}

#[async_trait]
impl CertificateDirectory for MockDirectory {
    async fn list_certificates(&self) -> CdnResult<Vec<Certificate>> {
        let state = self.state.read().await;
        if let Some(err) = &state.failures.list_certificates {
            return Err(err.clone().into());
        }
        Ok(state.certs.clone())
    }

    async fn upload_certificate(&self, upload: &UploadCertificate) -> CdnResult<String> {
        let mut state = self.state.write().await;
        if let Some(err) = &state.failures.upload {
            return Err(err.clone().into());
        }

        let now = chrono::Utc::now().timestamp();
        let (not_before, not_after) = state
            .upload_validity
            .unwrap_or((now - 60, now + DEFAULT_UPLOAD_VALIDITY));

        state.next_id += 1;
        let id = format!("mock-cert-{}", state.next_id);
        state.certs.push(Certificate {
            id: id.clone(),
            name: upload.name.clone(),
            common_name: upload.common_name.clone(),
            dns_names: vec![upload.common_name.clone()],
            not_before,
            not_after,
            create_time: now,
        });
        state.uploads.push(upload.clone());

        Ok(id)
    }

    async fn delete_certificate(&self, cert_id: &str) -> CdnResult<()> {
        let mut state = self.state.write().await;
        let position = state
            .certs
            .iter()
            .position(|c| c.id == cert_id)
            .ok_or_else(|| no_such_cert(cert_id))?;

        if state.domains.values().any(|d| d.cert_id() == Some(cert_id)) {
            return Err(ApiError::new(
                KnownErrorCode::STILL_BOUND_TO_CDN_DOMAIN,
                format!("certificate {} is still bound to a CDN domain", cert_id),
            )
            .into());
        }

        state.certs.remove(position);
        Ok(())
    }
}

#[async_trait]
impl DomainDirectory for MockDirectory {
    async fn list_domains_by_certificate(&self, cert_id: &str) -> CdnResult<Vec<Domain>> {
        let state = self.state.read().await;
        if let Some(err) = state.failures.list_domains.get(cert_id) {
            return Err(err.clone().into());
        }
        Ok(state
            .domains
            .values()
            .filter(|d| d.cert_id() == Some(cert_id))
            .cloned()
            .collect())
    }

    async fn get_domain(&self, name: &str) -> CdnResult<Domain> {
        let state = self.state.read().await;
        if let Some(err) = state.failures.get_domain.get(name) {
            return Err(err.clone().into());
        }
        state
            .domains
            .get(name)
            .cloned()
            .ok_or_else(|| no_such_domain(name).into())
    }

    async fn update_https_config(&self, name: &str, config: &HttpsConfig) -> CdnResult<()> {
        let delay = {
            let mut state = self.state.write().await;
            state.updates_in_flight += 1;
            state.max_updates_in_flight = state.max_updates_in_flight.max(state.updates_in_flight);
            *state.update_counts.entry(name.to_string()).or_insert(0) += 1;
            state
                .update_delays
                .get(name)
                .copied()
                .or(state.default_update_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().await;
        state.updates_in_flight -= 1;

        if let Some(err) = state.failures.update.get(name) {
            return Err(err.clone().into());
        }
        if !state.certs.iter().any(|c| c.id == config.cert_id) {
            return Err(no_such_cert(&config.cert_id).into());
        }
        let domain = state
            .domains
            .get_mut(name)
            .ok_or_else(|| no_such_domain(name))?;
        domain.https = Some(config.clone());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(cert_id: &str) -> HttpsConfig {
        HttpsConfig {
            cert_id: cert_id.to_string(),
            force_https: true,
            http2_enabled: false,
        }
    }

    #[tokio::test]
    async fn test_new_is_empty() {
        let cdn = MockDirectory::new();
        assert!(cdn.list_certificates().await.unwrap().is_empty());
        assert!(cdn.list_domains_by_certificate("x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_domains_filters_by_cert() {
        let cdn = MockDirectory::new();
        cdn.add_certificate("c1", "a", 0, 10).await;
        cdn.add_certificate("c2", "b", 0, 10).await;
        cdn.add_domain("b.example.com", Some(binding("c1"))).await;
        cdn.add_domain("a.example.com", Some(binding("c1"))).await;
        cdn.add_domain("c.example.com", Some(binding("c2"))).await;
        cdn.add_domain("plain.example.com", None).await;

        let names: Vec<_> = cdn
            .list_domains_by_certificate("c1")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["a.example.com", "b.example.com"]);
    }

    #[tokio::test]
    async fn test_upload_assigns_ids() {
        let cdn = MockDirectory::new();
        cdn.set_upload_validity(5, 50).await;
        let upload = UploadCertificate {
            name: "n".into(),
            common_name: "www.example.com".into(),
            private_key_pem: "k".into(),
            ca_chain_pem: "c".into(),
        };

        let first = cdn.upload_certificate(&upload).await.unwrap();
        let second = cdn.upload_certificate(&upload).await.unwrap();
        assert_ne!(first, second);

        let certs = cdn.certificates().await;
        assert_eq!(certs.len(), 2);
        assert_eq!(certs[0].not_before, 5);
        assert_eq!(certs[0].not_after, 50);
        assert_eq!(certs[0].dns_names, vec!["www.example.com"]);
        assert_eq!(cdn.uploads().await.len(), 2);
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_cert() {
        let cdn = MockDirectory::new();
        cdn.add_domain("www.example.com", None).await;
        let err = cdn
            .update_https_config("www.example.com", &binding("ghost"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(KnownErrorCode::NO_SUCH_CERT));
    }

    #[tokio::test]
    async fn test_delete_refuses_bound_cert() {
        let cdn = MockDirectory::new();
        cdn.add_certificate("c1", "a", 0, 10).await;
        cdn.add_domain("www.example.com", Some(binding("c1"))).await;

        let err = cdn.delete_certificate("c1").await.unwrap_err();
        assert_eq!(err.code(), Some(KnownErrorCode::STILL_BOUND_TO_CDN_DOMAIN));

        cdn.add_domain("www.example.com", None).await;
        cdn.delete_certificate("c1").await.unwrap();
        assert!(cdn.certificates().await.is_empty());
    }

    #[tokio::test]
    async fn test_injected_update_failure_counts_attempt() {
        let cdn = MockDirectory::new();
        cdn.add_certificate("c1", "a", 0, 10).await;
        cdn.add_domain("www.example.com", None).await;
        cdn.fail_update("www.example.com", ApiError::new(500, "boom"))
            .await;

        let err = cdn
            .update_https_config("www.example.com", &binding("c1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(500));
        assert_eq!(cdn.update_count("www.example.com").await, 1);
        assert_eq!(cdn.bound_cert("www.example.com").await, None);

        cdn.clear_failures().await;
        cdn.update_https_config("www.example.com", &binding("c1"))
            .await
            .unwrap();
        assert_eq!(cdn.bound_cert("www.example.com").await.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let cdn = MockDirectory::new();
        let other = cdn.clone();
        cdn.add_certificate("c1", "a", 0, 10).await;
        assert_eq!(other.certificates().await.len(), 1);
    }

    #[tokio::test]
    async fn test_tracks_concurrent_updates() {
        let cdn = MockDirectory::new();
        cdn.add_certificate("c1", "a", 0, 10).await;
        cdn.set_default_update_delay(Duration::from_millis(50)).await;
        for i in 0..4 {
            cdn.add_domain(&format!("d{}.example.com", i), None).await;
        }

        let mut handles = Vec::new();
        for i in 0..4 {
            let cdn = cdn.clone();
            handles.push(tokio::spawn(async move {
                cdn.update_https_config(&format!("d{}.example.com", i), &binding("c1"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(cdn.max_concurrent_updates().await > 1);
    }

    #[test]
    fn test_debug_impl() {
        let cdn = MockDirectory::new();
        assert!(format!("{:?}", cdn).contains("MockDirectory"));
    }
}
