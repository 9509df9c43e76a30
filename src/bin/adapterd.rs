// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Adapter front-end server (adapterd)

use adapterlib::bridge::ServiceConfig;
use adapterlib::http_server::HttpServer;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "adapterd")]
#[command(about = "Runs monitoring adapters as isolated subprocesses behind an HTTP API", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, default_value = "commands.toml")]
    config: PathBuf,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    print_sample_config: bool,
}

fn init_logging(config: &ServiceConfig) {
    // RUST_LOG wins over the configured level
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
    } else {
        env_logger::Builder::new()
            .filter_level(config.server.log_level.to_level_filter())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.print_sample_config {
        print!("{}", ServiceConfig::sample_toml());
        return Ok(());
    }

    let mut config = ServiceConfig::from_toml_file(&cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    init_logging(&config);
    log::info!(
        "Loaded {} ({} operations configured)",
        cli.config.display(),
        config.commands.len()
    );
    for operation in config.commands.keys() {
        log::debug!("Operation '{}' configured", operation);
    }

    HttpServer::new(Arc::new(config)).run().await?;
    Ok(())
}
