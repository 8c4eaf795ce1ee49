//! Terraform Provider for Chaos Mesh
//!
//! Manages Chaos Mesh `Workflow` custom resources through Kubernetes
//! server-side apply, speaking a JSON-RPC shim of the Terraform Plugin
//! Protocol over stdin/stdout.

mod client;
mod data_sources;
mod provider;
mod resources;
mod schema;

use clap::Parser;
use provider::ChaosMeshProvider;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Terraform Provider for Chaos Mesh
#[derive(Parser, Debug)]
#[command(name = "terraform-provider-chaosmesh")]
#[command(about = "Terraform provider for Chaos Mesh workflows")]
struct Args {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Log level, as Terraform passes it (TRACE, DEBUG, INFO, WARN, ERROR or JSON)
    #[arg(long, env = "TF_LOG")]
    log_level: Option<String>,
}

impl Args {
    /// Filter used when `RUST_LOG` is unset
    fn default_filter(&self) -> &'static str {
        if self.debug {
            return "debug";
        }
        match self.log_level.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("trace" | "json") => "trace",
            Some("debug") => "debug",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries the protocol, logs go to stderr
    let default_filter = args.default_filter();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    tracing::info!("Starting Terraform Provider for Chaos Mesh");

    let provider = ChaosMeshProvider::new()?;
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let input = match line {
            Ok(input) => input,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };
        if input.trim().is_empty() {
            continue;
        }

        let response = provider.handle_request(&input);
        if let Err(e) = writeln!(stdout, "{}", response).and_then(|_| stdout.flush()) {
            tracing::error!("Failed to write response: {}", e);
            break;
        }
    }

    tracing::info!("Terraform Provider shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_terraform() {
        // Terraform exports TF_LOG with upper case level names
        std::env::set_var("TF_LOG", "DEBUG");
        let args = Args::try_parse_from(["terraform-provider-chaosmesh"]).unwrap();
        std::env::remove_var("TF_LOG");

        assert_eq!(args.log_level.as_deref(), Some("DEBUG"));
        assert!(!args.debug);
        assert_eq!(args.default_filter(), "debug");
    }

    #[test]
    fn test_default_filter() {
        let parse = |argv: &[&str]| Args::try_parse_from(argv).unwrap();

        assert_eq!(parse(&["p", "--log-level", "TRACE"]).default_filter(), "trace");
        assert_eq!(parse(&["p", "--log-level", "JSON"]).default_filter(), "trace");
        assert_eq!(parse(&["p", "--log-level", "off"]).default_filter(), "info");
        assert_eq!(parse(&["p", "--debug", "--log-level", "ERROR"]).default_filter(), "debug");
    }
}
