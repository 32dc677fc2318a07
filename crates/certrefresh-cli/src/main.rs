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

use anyhow::{bail, Result};
use certrefresh_cli::commands::*;
use certrefresh_cli::context::{self, AppContext};
use certrefresh_cli::output;
use certrefresh_config::ObservabilityConfig;
use certrefresh_observability::{init_tracing_with_config, LogConfig, LogFormat};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "certrefresh")]
#[command(version, about = "Keeps Qiniu CDN in sync with locally renewed certificates")]
#[command(
    long_about = "certrefresh uploads renewed TLS certificates to Qiniu and moves every CDN domain
serving an older certificate of the same tracing key over to the new one."
)]
#[command(propagate_version = true)]
#[command(author = "certrefresh Contributors")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Force using configuration from this file (toml, yaml or json)
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Force using configuration from environment variables
    #[arg(short = 'e', long, global = true)]
    env_config: bool,

    /// Enable debug output; twice to include source locations
    #[arg(short = 'd', long, global = true, action = ArgAction::Count)]
    debug: u8,

    /// Produce log messages in JSON
    #[arg(short = 'j', long, global = true)]
    json_log: bool,

    /// Colored output (always|auto|never)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Query and show the current state of configured accounts
    #[command(visible_alias = "i")]
    Info(InfoCmd),

    /// Upload a new certificate, refreshing all associated domains
    #[command(visible_alias = "u")]
    Upload(UploadCmd),

    /// Repoint domains without uploading
    #[command(visible_alias = "r")]
    Refresh(RefreshCmd),

    /// Delete a certificate
    Delete(DeleteCmd),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        command,
        config,
        env_config,
        debug,
        json_log,
        color,
    } = cli;

    match color.as_str() {
        "never" => console::set_colors_enabled(false),
        "always" => console::set_colors_enabled(true),
        "auto" => {}
        other => bail!("Invalid color option: {}", other),
    }

    let command = match command {
        Commands::Version => {
            print_version();
            return Ok(());
        }
        Commands::Completions { shell } => return generate_completions(shell),
        other => other,
    };

    let config = match context::load_config(config, env_config).await {
        Ok(config) => config,
        Err(e) => {
            init_logging(debug, json_log, None);
            return Err(e);
        }
    };
    init_logging(debug, json_log, Some(&config.observability));

    let ctx = AppContext::from_config(&config)?;

    match command {
        Commands::Info(cmd) => cmd.execute(&ctx).await,
        Commands::Upload(cmd) => cmd.execute(&ctx).await,
        Commands::Refresh(cmd) => cmd.execute(&ctx).await,
        Commands::Delete(cmd) => cmd.execute(&ctx).await,
        Commands::Version | Commands::Completions { .. } => Ok(()),
    }
}

fn init_logging(debug: u8, json_log: bool, observability: Option<&ObservabilityConfig>) {
    // Ignore errors if already initialized
    init_tracing_with_config(log_config(debug, json_log, observability)).ok();
}

fn log_config(debug: u8, json_log: bool, observability: Option<&ObservabilityConfig>) -> LogConfig {
    let format = if json_log {
        LogFormat::Json
    } else {
        observability
            .and_then(|o| o.log_format.parse().ok())
            .unwrap_or(LogFormat::Pretty)
    };

    let mut config = LogConfig::new()
        .with_format(format)
        .with_color(console::colors_enabled_stderr())
        .with_locations(debug >= 2);

    if debug > 0 {
        config = config.with_level("debug");
    } else if let Some(level) = observability.and_then(|o| o.log_level.clone()) {
        config = config.with_level(level);
    }

    config
}

fn print_version() {
    println!("certrefresh {}", env!("CARGO_PKG_VERSION"));
    println!("rust-version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!("license: {}", env!("CARGO_PKG_LICENSE"));
}

fn generate_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "certrefresh", &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_log_level_leaves_room_for_rust_log() {
        let observability = ObservabilityConfig::default();
        let config = log_config(0, false, Some(&observability));
        assert_eq!(config.level, None);
    }

    #[test]
    fn test_configured_log_level_and_debug_flag() {
        let observability = ObservabilityConfig {
            log_level: Some("warn".to_string()),
            log_format: "json".to_string(),
        };
        let config = log_config(0, false, Some(&observability));
        assert_eq!(config.level.as_deref(), Some("warn"));
        assert_eq!(config.format, LogFormat::Json);

        let config = log_config(1, false, Some(&observability));
        assert_eq!(config.level.as_deref(), Some("debug"));
    }
}
