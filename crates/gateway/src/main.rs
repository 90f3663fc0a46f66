// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! jigated - the jigate gateway daemon.
//!
//! Terminates the orchestration engine's length-prefixed XML protocol on
//! a TCP socket and relays each request to a JIRA server over REST.
//! Credentials arrive with the engine's LOGIN request; this binary only
//! needs the listen address, the configuration file and tuning knobs.

use std::fs;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jigate::server::{self, ServerOptions};
use jigate::{Dispatcher, DispatcherOptions};

/// jigated: JIRA defect-tracking gateway
#[derive(Parser, Debug)]
#[command(name = "jigated")]
#[command(about = "Gateway between the defect-tracking engine protocol and JIRA")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1:7681")]
    bind: SocketAddr,

    /// Gateway configuration file (custom fields, workflows, handling)
    #[arg(short, long, default_value = "config/jigate.toml")]
    config: PathBuf,

    /// Search page size for defect listing queries
    #[arg(long, default_value = "100")]
    batch: u32,

    /// Seconds to wait for the engine to connect before exiting
    #[arg(long, default_value = "30")]
    accept_timeout: u64,

    /// Per-connection read timeout in seconds
    #[arg(long, default_value = "30")]
    read_timeout: u64,

    /// Log file; stderr when omitted
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    setup_logging(&args);

    tracing::info!("jigated starting, config={}", args.config.display());

    let listener = match TcpListener::bind(args.bind) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", args.bind, e);
            std::process::exit(1);
        }
    };

    let mut dispatcher = Dispatcher::with_http(DispatcherOptions {
        config_path: args.config.clone(),
        batch_size: args.batch.max(1),
    });

    let options = ServerOptions {
        accept_timeout: Duration::from_secs(args.accept_timeout.max(1)),
        read_timeout: Duration::from_secs(args.read_timeout.max(1)),
    };

    if let Err(e) = server::run(listener, &mut dispatcher, options) {
        tracing::error!("transport failure: {}", e);
        std::process::exit(1);
    }
    tracing::info!("jigated stopped");
}

fn setup_logging(args: &Args) {
    let default = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Try to open the log file, fall back to stderr.
    let file = args.log_file.as_ref().and_then(|path| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    if let Some(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
