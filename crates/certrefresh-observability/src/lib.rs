//! certrefresh observability
//!
//! Structured logging for the certrefresh tools, built on `tracing` and
//! `tracing-subscriber`.
//!
//! # Features
//!
//! - **Multiple Output Formats**: Pretty, compact and JSON output
//! - **Environment-based Filtering**: Falls back to `RUST_LOG` when no level is given
//! - **Source Locations**: Optional file/line annotations for deep debugging
//!
//! # Example
//!
//! ```ignore
//! use certrefresh_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Pretty, Some("debug"))?;
//! tracing::info!(account = "main", "refreshing certificates");
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};
