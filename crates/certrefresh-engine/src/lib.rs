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

//! Certificate refresh reconciliation engine
//!
//! Given a tracing key, this crate finds every certificate of an account that
//! carries the key, decides which one should be served, and repoints every
//! domain bound to the others.
//!
//! # Components
//!
//! - [`matcher`]: tracing-key predicate over certificate names
//! - [`selector`]: latest-expiring valid certificate
//! - [`planner`]: target and supersede set
//! - [`swapper`]: concurrent domain repointing per superseded certificate
//! - [`orchestrator`]: upload, plan and swap for one account
//! - [`inventory`]: read-only listing of certificates and bound domains
//! - [`task_group`]: bounded fan-out used by the swapper and the inventory
//!
//! Components keep no state between calls; the only mutable state is the
//! remote inventory behind [`Account::directory`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use certrefresh_cdn::mock::MockDirectory;
//! use certrefresh_engine::{Account, ConcurrencyBudget, MatchMode, Refresher};
//!
//! #[tokio::main]
//! async fn main() -> certrefresh_engine::RefreshResult<()> {
//!     let account = Account::new("main", "[CertRefresh-Managed]", Arc::new(MockDirectory::new()));
//!     let refresher = Refresher::new(ConcurrencyBudget::new(8), MatchMode::Strict);
//!
//!     let outcome = refresher.refresh(&account, "www", None).await?;
//!     println!("{} domains now on {}", outcome.domain_count(), outcome.target_id);
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod error;
pub mod inventory;
pub mod matcher;
pub mod orchestrator;
pub mod planner;
pub mod selector;
pub mod swapper;
pub mod task_group;

pub use account::Account;
pub use error::{RefreshError, RefreshResult};
pub use inventory::{CertificateEntry, Inventory};
pub use matcher::{MatchMode, TracingKeyMatcher};
pub use orchestrator::{managed_cert_name, CertificateBundle, RefreshOutcome, Refresher};
pub use planner::{plan, RefreshPlan};
pub use selector::select_latest_valid;
pub use swapper::{swap, GroupReport, SwapReport};
pub use task_group::{
    ConcurrencyBudget, GroupFailure, TaskError, TaskGroup, DEFAULT_MAX_CONCURRENCY,
};
