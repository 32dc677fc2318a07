//! Access-key credentials and QBox request signing
//!
//! The signature covers the request path, the raw query string and a
//! trailing newline. JSON bodies are not part of the signed data.

use crate::error::{CdnError, CdnResult};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// Access key / secret key pair of one account
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    /// Create credentials from an access key and secret key
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Credentials {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// The public half
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Sign `data`, returning `<AK>:<urlsafe-base64 HMAC-SHA1>`
    pub fn sign(&self, data: &[u8]) -> CdnResult<String> {
        let mut mac = <HmacSha1 as Mac>::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| CdnError::Signing(e.to_string()))?;
        mac.update(data);
        let digest = mac.finalize().into_bytes();
        Ok(format!("{}:{}", self.access_key, URL_SAFE.encode(digest)))
    }

    /// Value of the `Authorization` header for a request
    pub fn authorization(&self, path: &str, query: Option<&str>) -> CdnResult<String> {
        let mut data = String::with_capacity(path.len() + 2);
        data.push_str(path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            data.push('?');
            data.push_str(query);
        }
        data.push('\n');

        Ok(format!("QBox {}", self.sign(data.as_bytes())?))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .finish()
    }
}
