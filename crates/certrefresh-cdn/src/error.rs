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

//! CDN error types and provider error codes

use serde::Deserialize;
use thiserror::Error;

/// Result type alias for directory operations
pub type CdnResult<T> = Result<T, CdnError>;

/// Errors that can occur while talking to the CDN provider
#[derive(Error, Debug)]
pub enum CdnError {
    /// The provider answered with an error envelope
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        /// Request path that produced the body
        endpoint: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The request could not be built (bad base URL, bad path segment, ...)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Computing the request signature failed
    #[error("request signing failed: {0}")]
    Signing(String),
}

impl CdnError {
    /// Create an InvalidRequest error with context
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        CdnError::InvalidRequest(msg.into())
    }

    /// The provider error envelope, if this is one
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            CdnError::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Provider error code, if the provider reported one
    pub fn code(&self) -> Option<i64> {
        self.api_error().map(|e| e.code)
    }
}

/// Uniform provider error envelope: `{"code": ..., "error": "..."}`
#[derive(Error, Debug, Clone, PartialEq, Eq, Deserialize)]
#[error("Qiniu error {code}: {message}")]
pub struct ApiError {
    /// Provider error code (or the HTTP status when the envelope was unreadable)
    pub code: i64,
    /// Human readable message
    #[serde(rename = "error", default)]
    pub message: String,
}

impl ApiError {
    /// Create a new provider error
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Map the code onto one of the documented certificate errors
    pub fn known_kind(&self) -> Option<KnownErrorCode> {
        KnownErrorCode::from_code(self.code)
    }
}

/// Certificate-related error codes documented by the provider.
///
/// These are passed through untouched; the mapping only improves reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownErrorCode {
    /// Validity period of the certificate is too short
    ValidityPeriodTooShort,
    /// Certificate chain could not be verified
    ChainVerificationFailed,
    /// Certificate is already expired
    AlreadyExpired,
    /// No such certificate
    NoSuchCertificate,
    /// Certificate quota exceeded
    QuotaExceeded,
    /// Certificate is still bound to a CDN domain
    StillBoundToCdnDomain,
    /// Certificate is still bound to a storage domain
    StillBoundToStorageDomain,
    /// Certificate could not be parsed
    ParseFailed,
    /// Caller is not authorized for this certificate
    Unauthorized,
}

impl KnownErrorCode {
    /// Code for [`KnownErrorCode::ValidityPeriodTooShort`]
    pub const VALIDITY_PERIOD_TOO_SHORT: i64 = 400322;
    /// Code for [`KnownErrorCode::ChainVerificationFailed`]
    pub const FAILED_TO_VERIFY_CERT_CHAIN: i64 = 400323;
    /// Code for [`KnownErrorCode::AlreadyExpired`]
    pub const CERT_ALREADY_EXPIRED: i64 = 400329;
    /// Code for [`KnownErrorCode::NoSuchCertificate`]
    pub const NO_SUCH_CERT: i64 = 400401;
    /// Code for [`KnownErrorCode::QuotaExceeded`]
    pub const CERT_QUOTA_EXCEEDED: i64 = 400500;
    /// Code for [`KnownErrorCode::StillBoundToCdnDomain`]
    pub const STILL_BOUND_TO_CDN_DOMAIN: i64 = 400611;
    /// Code for [`KnownErrorCode::StillBoundToStorageDomain`]
    pub const STILL_BOUND_TO_STORAGE_DOMAIN: i64 = 400911;
    /// Code for [`KnownErrorCode::ParseFailed`]
    pub const FAILED_TO_PARSE_CERT: i64 = 404906;
    /// Code for [`KnownErrorCode::Unauthorized`]
    pub const UNAUTHORIZED_FOR_THIS_CERT: i64 = 404908;

    /// Look up a provider code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            Self::VALIDITY_PERIOD_TOO_SHORT => Some(Self::ValidityPeriodTooShort),
            Self::FAILED_TO_VERIFY_CERT_CHAIN => Some(Self::ChainVerificationFailed),
            Self::CERT_ALREADY_EXPIRED => Some(Self::AlreadyExpired),
            Self::NO_SUCH_CERT => Some(Self::NoSuchCertificate),
            Self::CERT_QUOTA_EXCEEDED => Some(Self::QuotaExceeded),
            Self::STILL_BOUND_TO_CDN_DOMAIN => Some(Self::StillBoundToCdnDomain),
            Self::STILL_BOUND_TO_STORAGE_DOMAIN => Some(Self::StillBoundToStorageDomain),
            Self::FAILED_TO_PARSE_CERT => Some(Self::ParseFailed),
            Self::UNAUTHORIZED_FOR_THIS_CERT => Some(Self::Unauthorized),
            _ => None,
        }
    }

    /// Short description for reports
    pub fn description(&self) -> &'static str {
        match self {
            Self::ValidityPeriodTooShort => "certificate validity period is too short",
            Self::ChainVerificationFailed => "failed to verify the certificate chain",
            Self::AlreadyExpired => "certificate has already expired",
            Self::NoSuchCertificate => "no such certificate",
            Self::QuotaExceeded => "certificate quota exceeded",
            Self::StillBoundToCdnDomain => "certificate is still bound to a CDN domain",
            Self::StillBoundToStorageDomain => "certificate is still bound to a storage domain",
            Self::ParseFailed => "failed to parse the certificate",
            Self::Unauthorized => "not authorized to operate on this certificate",
        }
    }
}
