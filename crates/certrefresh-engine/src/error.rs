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

//! Refresh error types

use certrefresh_cdn::CdnError;
use thiserror::Error;

/// Result type alias for refresh operations
pub type RefreshResult<T> = Result<T, RefreshError>;

/// Errors that can occur while planning or applying a refresh
#[derive(Error, Debug)]
pub enum RefreshError {
    /// Matcher inputs could not be compiled
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// No certificate of the tracing key is valid now
    #[error("no eligible certificate for tracing key '{key}'")]
    NoEligibleCertificate {
        /// Tracing key
        key: String,
    },

    /// The requested target does not carry the tracing key
    #[error("certificate {target_id} is not a candidate for tracing key '{key}'")]
    TargetNotInScope {
        /// Requested certificate ID
        target_id: String,
        /// Tracing key
        key: String,
    },

    /// A directory call failed
    #[error(transparent)]
    Remote(#[from] CdnError),

    /// Some domains of a superseded certificate were not repointed
    #[error(
        "refresh of domains bound to {superseded_cert_id} failed at {failed_domain} \
         ({} updated, {} unconfirmed)",
        .completed.len(),
        .unconfirmed.len()
    )]
    PartialRefresh {
        /// Superseded certificate whose domains were being repointed
        superseded_cert_id: String,
        /// Domain whose update failed first
        failed_domain: String,
        /// Domains confirmed repointed before the failure
        completed: Vec<String>,
        /// Domains still in flight or never started
        unconfirmed: Vec<String>,
        /// Error of the failed domain
        #[source]
        source: Box<RefreshError>,
    },

    /// A bound domain carries no HTTPS configuration
    #[error("domain {domain} has no HTTPS configuration")]
    DomainNotHttps {
        /// Domain name
        domain: String,
    },

    /// The update task of a domain panicked
    #[error("update task for domain {domain} panicked")]
    TaskPanicked {
        /// Domain name
        domain: String,
    },
}

impl RefreshError {
    /// Create a Configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        RefreshError::Configuration(msg.into())
    }

    /// Check if this is a partial refresh
    pub fn is_partial(&self) -> bool {
        matches!(self, RefreshError::PartialRefresh { .. })
    }

    /// Provider error code at the root of this error, if any
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            RefreshError::Remote(e) => e.code(),
            RefreshError::PartialRefresh { source, .. } => source.remote_code(),
            _ => None,
        }
    }
}
