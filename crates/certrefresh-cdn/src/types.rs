//! Wire types for certificates and domains
//!
//! Field names follow the provider's JSON documents. Only the HTTPS binding of
//! a domain is typed; everything else a domain carries (origin, cache and
//! referer rules, ACLs, operation status...) is kept as an opaque document.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A certificate as stored by the provider
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Certificate {
    /// Provider-assigned identifier
    #[serde(rename = "certid")]
    pub id: String,
    /// Display name; carries the tracing key
    pub name: String,
    /// Subject common name
    pub common_name: String,
    /// DNS names covered by the certificate
    #[serde(rename = "dnsnames")]
    pub dns_names: Vec<String>,
    /// Start of the validity window (unix seconds, inclusive)
    pub not_before: i64,
    /// End of the validity window (unix seconds, inclusive)
    pub not_after: i64,
    /// Upload time (unix seconds)
    pub create_time: i64,
}

impl Certificate {
    /// Whether `epoch` (unix seconds) falls into the validity window
    pub fn is_valid_at(&self, epoch: i64) -> bool {
        self.not_before <= epoch && epoch <= self.not_after
    }

    /// Start of the validity window
    pub fn not_before_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.not_before, 0).single()
    }

    /// End of the validity window
    pub fn not_after_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.not_after, 0).single()
    }

    /// Upload time
    pub fn created_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.create_time, 0).single()
    }
}

/// Body of a certificate upload
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UploadCertificate {
    /// Display name
    pub name: String,
    /// Subject common name
    pub common_name: String,
    /// Private key, PEM encoded
    #[serde(rename = "pri")]
    pub private_key_pem: String,
    /// Certificate chain, PEM encoded
    #[serde(rename = "ca")]
    pub ca_chain_pem: String,
}

impl std::fmt::Debug for UploadCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadCertificate")
            .field("name", &self.name)
            .field("common_name", &self.common_name)
            .field("private_key_pem", &"<redacted>")
            .field("ca_chain_pem_len", &self.ca_chain_pem.len())
            .finish()
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct UploadCertificateResponse {
    #[serde(rename = "certID")]
    pub id: String,
}

/// HTTPS binding of a domain
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct HttpsConfig {
    /// Bound certificate
    #[serde(rename = "certId")]
    pub cert_id: String,
    /// Redirect plain HTTP to HTTPS
    #[serde(rename = "forceHttps")]
    pub force_https: bool,
    /// HTTP/2 enabled
    #[serde(rename = "http2Enable")]
    pub http2_enabled: bool,
}

impl HttpsConfig {
    /// Same binding pointed at another certificate
    pub fn with_cert_id(&self, cert_id: impl Into<String>) -> Self {
        HttpsConfig {
            cert_id: cert_id.into(),
            ..self.clone()
        }
    }
}

/// A CDN domain
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Domain {
    /// The DNS name (wildcards start with a dot)
    pub name: String,
    /// HTTPS binding, absent for plain HTTP domains
    #[serde(default)]
    pub https: Option<HttpsConfig>,
    /// Every other field, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Domain {
    /// New domain with the given binding and no other attributes
    pub fn new(name: impl Into<String>, https: Option<HttpsConfig>) -> Self {
        Domain {
            name: name.into(),
            https,
            extra: Map::new(),
        }
    }

    /// Certificate currently bound, if any
    pub fn cert_id(&self) -> Option<&str> {
        self.https.as_ref().map(|h| h.cert_id.as_str())
    }
}

/// One page of a certificate listing
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct CertificatePage {
    /// Cursor for the next page; empty when exhausted
    pub marker: String,
    /// Certificates on this page
    pub certs: Vec<Certificate>,
}

/// One page of a domain listing
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct DomainPage {
    /// Cursor for the next page; empty when exhausted
    pub marker: String,
    /// Domains on this page
    pub domains: Vec<Domain>,
}
