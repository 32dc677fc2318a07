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

//! CDN directory abstraction for certrefresh
//!
//! This crate exposes the provider's certificate and domain inventories as two
//! asynchronous traits, plus the implementations behind them:
//! - [`QiniuClient`]: signed HTTP client for the Qiniu Fusion CDN API
//! - [`mock::MockDirectory`]: in-memory inventory for tests
//!
//! # Architecture
//!
//! [`CertificateDirectory`] and [`DomainDirectory`] are the narrow contracts the
//! refresh engine depends on. An implementation is bound to one account's
//! credentials; callers never pass credentials per call.
//!
//! Listing operations return complete results: pagination (marker/limit
//! cursors) is handled inside the implementation.
//!
//! # Error Handling
//!
//! Every operation returns [`CdnResult`]. A provider-reported failure surfaces as
//! [`CdnError::Api`] carrying the provider's `{code, message}` unmodified.
//!
//! # Examples
//!
//! ```rust,no_run
//! use certrefresh_cdn::{mock::MockDirectory, CertificateDirectory, DomainDirectory, HttpsConfig};
//!
//! #[tokio::main]
//! async fn main() -> certrefresh_cdn::CdnResult<()> {
//!     let cdn = MockDirectory::new();
//!     cdn.add_certificate("c1", "[CertRefresh-Managed] www (1)", 0, i64::MAX).await;
//!     cdn.add_domain("www.example.com", Some(HttpsConfig { cert_id: "c1".into(), ..Default::default() })).await;
//!
//!     let bound = cdn.list_domains_by_certificate("c1").await?;
//!     assert_eq!(bound.len(), 1);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod mock;
pub mod qiniu;
pub mod types;

use async_trait::async_trait;
use std::fmt::Debug;

pub use auth::Credentials;
pub use error::{ApiError, CdnError, CdnResult, KnownErrorCode};
pub use qiniu::QiniuClient;
pub use types::{Certificate, Domain, HttpsConfig, UploadCertificate};

/// Certificate inventory of one account
#[async_trait]
pub trait CertificateDirectory: Send + Sync + Debug {
    /// List every certificate of the account (all pages)
    async fn list_certificates(&self) -> CdnResult<Vec<Certificate>>;

    /// Upload a certificate, returning the provider-assigned ID
    ///
    /// # Errors
    ///
    /// Provider rejections (expired, chain verification, quota, ...) are
    /// returned as [`CdnError::Api`] with the provider's code.
    async fn upload_certificate(&self, upload: &UploadCertificate) -> CdnResult<String>;

    /// Delete a certificate
    ///
    /// Fails with the provider's "still bound" code while any domain uses it.
    async fn delete_certificate(&self, cert_id: &str) -> CdnResult<()>;
}

/// Domain inventory of one account
#[async_trait]
pub trait DomainDirectory: Send + Sync + Debug {
    /// List every domain whose HTTPS binding points at `cert_id` (all pages)
    async fn list_domains_by_certificate(&self, cert_id: &str) -> CdnResult<Vec<Domain>>;

    /// Fetch the current record of a domain
    async fn get_domain(&self, name: &str) -> CdnResult<Domain>;

    /// Replace the HTTPS binding of a domain
    async fn update_https_config(&self, name: &str, config: &HttpsConfig) -> CdnResult<()>;
}

/// Both inventories of one account
pub trait CdnDirectory: CertificateDirectory + DomainDirectory {}

impl<T: CertificateDirectory + DomainDirectory> CdnDirectory for T {}
