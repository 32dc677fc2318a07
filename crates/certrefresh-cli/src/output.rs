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

//! Shared output formatting for CLI commands.
//!
//! Status lines go through these helpers so every command prints the same
//! markers. Logs go to stderr through `tracing`; only results are printed
//! here.
//!
//! # Examples
//!
//! ```rust
//! use certrefresh_cli::output;
//!
//! output::header("Account production");
//! output::detail("Target", "cert-42");
//! output::success("2 domains repointed");
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use console::style;

/// Print a success message with a green check mark.
pub fn success(msg: &str) {
    println!("{} {}", style("✅").green().bold(), msg);
}

/// Print an error message to stderr with a red cross.
///
/// # Examples
///
/// ```rust
/// certrefresh_cli::output::error("Failed to reach the API");
/// // Output (stderr): ❌ Failed to reach the API
/// ```
pub fn error(msg: &str) {
    eprintln!("{} {}", style("❌").red().bold(), msg);
}

/// Print an informational message.
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ️").cyan(), msg);
}

/// Print a warning message.
pub fn warning(msg: &str) {
    println!("{} {}", style("⚠️").yellow(), msg);
}

/// Print a detail line with key-value formatting.
///
/// The value is highlighted in cyan.
pub fn detail(key: &str, value: &str) {
    println!("  {}: {}", key, style(value).cyan());
}

/// Print a section header.
pub fn header(msg: &str) {
    println!("{} {}", style("🔐").green().bold(), style(msg).bold());
}

/// Format a unix timestamp as RFC 3339 in UTC, or the raw number if out of range
pub fn timestamp(epoch: i64, utc: Option<DateTime<Utc>>) -> String {
    utc.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| epoch.to_string())
}
