// Copyright (C) 2025  certrefresh Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Configuration for certrefresh
//!
//! Accounts and settings come from a TOML, YAML or JSON file, or from
//! `CERTREFRESH_*` environment variables.
//!
//! # Features
//!
//! - Multi-format configuration files (TOML, YAML, JSON)
//! - Account lists from `CERTREFRESH_NUM_ACCOUNTS` and `CERTREFRESH_ACCOUNT_<i>_*`
//! - Setting overrides with the `CERTREFRESH_` prefix
//! - Validation with field-level error messages
//!
//! # Example
//!
//! ```no_run
//! use certrefresh_config::{ConfigLoader, ConfigSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().load(&ConfigSource::Auto).await?;
//!
//!     for account in &config.accounts {
//!         println!("account: {}", account.display_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

// Re-export commonly used items
pub use error::{ConfigError, ConfigResult};
pub use loader::{apply_env_overrides, from_env, ConfigFormat, ConfigLoader, ConfigSource, ENV_NUM_ACCOUNTS};
pub use schema::*;
pub use validation::Validator;
