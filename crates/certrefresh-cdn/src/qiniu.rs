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

//! Qiniu Fusion CDN HTTP client
//!
//! Every request is signed with the account's [`Credentials`]. Responses with
//! a status of 400 or above are decoded as the provider's error envelope and
//! returned as [`CdnError::Api`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use certrefresh_cdn::{CertificateDirectory, Credentials, QiniuClient};
//!
//! #[tokio::main]
//! async fn main() -> certrefresh_cdn::CdnResult<()> {
//!     let client = QiniuClient::new(Credentials::new("ak", "sk"))?;
//!     for cert in client.list_certificates().await? {
//!         println!("{} {}", cert.id, cert.name);
//!     }
//!     Ok(())
//! }
//! ```

use crate::auth::Credentials;
use crate::error::{ApiError, CdnError, CdnResult};
use crate::types::{
    Certificate, CertificatePage, Domain, DomainPage, HttpsConfig, UploadCertificate,
    UploadCertificateResponse,
};
use crate::{CertificateDirectory, DomainDirectory};
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, trace};

/// API endpoint used when none is configured
pub const DEFAULT_HOST: &str = "https://api.qiniu.com";

/// Page size of listing requests
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Signed client for one account
#[derive(Debug, Clone)]
pub struct QiniuClient {
    base_url: Url,
    credentials: Credentials,
    client: reqwest::Client,
    page_size: usize,
}

impl QiniuClient {
    /// Create a client against [`DEFAULT_HOST`]
    pub fn new(credentials: Credentials) -> CdnResult<Self> {
        Self::with_options(credentials, DEFAULT_HOST, DEFAULT_TIMEOUT)
    }

    /// Create a client against a specific API host
    ///
    /// # Arguments
    /// * `credentials` - Access key pair of the account
    /// * `base_url` - API root, e.g. `https://api.qiniu.com`
    /// * `timeout` - Per-request timeout
    pub fn with_options(
        credentials: Credentials,
        base_url: &str,
        timeout: Duration,
    ) -> CdnResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CdnError::invalid_request(format!("bad API host '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CdnError::invalid_request(format!(
                "API host '{}' cannot carry a path",
                base_url
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(QiniuClient {
            base_url,
            credentials,
            client,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the listing page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Access key of the account this client signs for
    pub fn access_key(&self) -> &str {
        self.credentials.access_key()
    }

    /// Fetch one page of the certificate listing
    pub async fn list_certificates_page(&self, marker: &str) -> CdnResult<CertificatePage> {
        let mut url = self.endpoint(&["sslcert"])?;
        self.append_paging(&mut url, marker, false);
        self.call(Method::GET, url, None::<&()>).await
    }

    /// Fetch one page of the domains bound to `cert_id`
    pub async fn list_domains_page(&self, cert_id: &str, marker: &str) -> CdnResult<DomainPage> {
        let mut url = self.endpoint(&["domain"])?;
        url.query_pairs_mut().append_pair("certId", cert_id);
        // /domain pages hold 10 entries unless told otherwise
        self.append_paging(&mut url, marker, true);
        self.call(Method::GET, url, None::<&()>).await
    }

    fn endpoint(&self, segments: &[&str]) -> CdnResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CdnError::invalid_request("API host cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Add `marker` and `limit`; the limit is left out when it equals
    /// [`DEFAULT_PAGE_SIZE`] unless `always_limit` is set
    fn append_paging(&self, url: &mut Url, marker: &str, always_limit: bool) {
        let send_limit = always_limit || self.page_size != DEFAULT_PAGE_SIZE;
        if marker.is_empty() && !send_limit {
            return;
        }
        let mut pairs = url.query_pairs_mut();
        if !marker.is_empty() {
            pairs.append_pair("marker", marker);
        }
        if send_limit {
            pairs.append_pair("limit", &self.page_size.to_string());
        }
    }

    async fn call<T, B>(&self, method: Method, url: Url, body: Option<&B>) -> CdnResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let endpoint = url.path().to_string();
        let raw = self.execute(method, url, body).await?;
        serde_json::from_slice(&raw).map_err(|source| CdnError::Decode { endpoint, source })
    }

    /// Like [`call`](Self::call) for requests whose success body carries nothing
    async fn call_unit<B>(&self, method: Method, url: Url, body: Option<&B>) -> CdnResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.execute(method, url, body).await.map(|_| ())
    }

    async fn execute<B>(&self, method: Method, url: Url, body: Option<&B>) -> CdnResult<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let authorization = self.credentials.authorization(url.path(), url.query())?;
        debug!(method = %method, url = %url, "sending CDN API request");

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(reqwest::header::AUTHORIZATION, authorization);
        if let Some(body) = body {
            let payload = serde_json::to_vec(body)
                .map_err(|e| CdnError::invalid_request(format!("unserializable body: {}", e)))?;
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        let raw = response.bytes().await?.to_vec();

        debug!(
            method = %method,
            path = url.path(),
            status = status.as_u16(),
            bytes = raw.len(),
            "received CDN API response"
        );
        trace!(body = %String::from_utf8_lossy(&raw), "response body");

        if status.as_u16() >= 400 {
            let err = serde_json::from_slice::<ApiError>(&raw).unwrap_or_else(|_| {
                ApiError::new(
                    i64::from(status.as_u16()),
                    String::from_utf8_lossy(&raw).into_owned(),
                )
            });
            return Err(err.into());
        }

        Ok(raw)
    }
}

#[async_trait]
impl CertificateDirectory for QiniuClient {
    async fn list_certificates(&self) -> CdnResult<Vec<Certificate>> {
        let mut all = Vec::new();
        let mut marker = String::new();

        loop {
            debug!(marker = %marker, "listing certificates");
            let page = self.list_certificates_page(&marker).await?;
            debug!(next_marker = %page.marker, count = page.certs.len(), "got certificate page");

            let exhausted =
                page.certs.is_empty() || page.marker.is_empty() || page.marker == marker;
            all.extend(page.certs);
            if exhausted {
                break;
            }
            marker = page.marker;
        }

        Ok(all)
    }

    async fn upload_certificate(&self, upload: &UploadCertificate) -> CdnResult<String> {
        let url = self.endpoint(&["sslcert"])?;
        let response: UploadCertificateResponse =
            self.call(Method::POST, url, Some(upload)).await?;
        debug!(cert_id = %response.id, name = %upload.name, "certificate uploaded");
        Ok(response.id)
    }

    async fn delete_certificate(&self, cert_id: &str) -> CdnResult<()> {
        let url = self.endpoint(&["sslcert", cert_id])?;
        self.call_unit(Method::DELETE, url, None::<&()>).await
    }
}

#[async_trait]
impl DomainDirectory for QiniuClient {
    async fn list_domains_by_certificate(&self, cert_id: &str) -> CdnResult<Vec<Domain>> {
        let mut all = Vec::new();
        let mut marker = String::new();

        loop {
            debug!(cert_id, marker = %marker, "listing domains");
            let page = self.list_domains_page(cert_id, &marker).await?;

            let exhausted =
                page.domains.is_empty() || page.marker.is_empty() || page.marker == marker;
            all.extend(page.domains);
            if exhausted {
                break;
            }
            marker = page.marker;
        }

        Ok(all)
    }

    async fn get_domain(&self, name: &str) -> CdnResult<Domain> {
        let url = self.endpoint(&["domain", name])?;
        self.call(Method::GET, url, None::<&()>).await
    }

    async fn update_https_config(&self, name: &str, config: &HttpsConfig) -> CdnResult<()> {
        let url = self.endpoint(&["domain", name, "httpsconf"])?;
        self.call_unit(Method::PUT, url, Some(config)).await
    }
}
