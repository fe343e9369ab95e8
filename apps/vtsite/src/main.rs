//! # vtsite - VTuber Site Server
//!
//! The main binary for the vtsite promotional site.
//!
//! This application provides:
//! - Public pages (home, achievements, contact form) rendered server-side
//! - Admin JSON API for editing settings, achievements and videos
//! - CLI interface for the same edits without a running server
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      apps/vtsite (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │   HTTP      │    │  Mail / oEmbed   │    │
//! │  │  (clap)     │    │   (axum)    │    │  (spool,reqwest) │    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         │                  │                    │              │
//! │         └──────────────────┼────────────────────┘              │
//! │                            ▼                                   │
//! │                    ┌───────────────┐                           │
//! │                    │  vtsite-core  │                           │
//! │                    │ (THE LOGIC)   │                           │
//! │                    └───────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Create the database and vtsite.toml
//! vtsite init
//!
//! # Start the HTTP server
//! VTSITE_API_KEY=... VTSITE_NONCE_SECRET=... vtsite server --port 8080
//!
//! # Edit from the command line
//! vtsite settings set vtuber_name "Hoshimiya Rin"
//! vtsite achievements add personal
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vtsite::cli;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // VTSITE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("VTSITE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let cli = cli::Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli::default_log_filter(cli.verbose).into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗   ██╗████████╗███████╗██╗████████╗███████╗
  ██║   ██║╚══██╔══╝██╔════╝██║╚══██╔══╝██╔════╝
  ██║   ██║   ██║   ███████╗██║   ██║   █████╗
  ╚██╗ ██╔╝   ██║   ╚════██║██║   ██║   ██╔══╝
   ╚████╔╝    ██║   ███████║██║   ██║   ███████╗
    ╚═══╝     ╚═╝   ╚══════╝╚═╝   ╚═╝   ╚══════╝

  VTuber Site Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
