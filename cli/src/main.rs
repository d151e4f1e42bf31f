//! Garage service CLI
//!
//! ```sh
//! # Run with default config (~/.config/garage-service/config.toml)
//! garage-service
//!
//! # Custom config path and simulator
//! garage-service --config /etc/garage/config.toml --simulator-url http://simulator:3000
//!
//! # Validate config without starting
//! garage-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use garage_service::config::AppConfig;
use garage_service::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "garage-service",
    version,
    about = "Parking garage occupancy, pricing and revenue service",
    long_about = "REST API + webhook receiver tracking vehicles through a parking garage, \
                  with occupancy-tiered pricing and a reconciliation poller against the \
                  garage simulator.\n\n\
                  Default config: ~/.config/garage-service/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "GARAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the garage simulator base URL.
    #[arg(long)]
    simulator_url: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Do not start the reconciliation poller.
    #[arg(long)]
    no_poller: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(garage_service::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) if cli.check => {
            eprintln!("❌ Invalid configuration {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Log level must be known before tracing starts.
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if !cli.check {
        init_tracing(&config);
        match load_error {
            None => info!("Configuration loaded from {}", config_path.display()),
            Some(e) => {
                error!("Failed to load config from {}: {}", config_path.display(), e);
                error!("Using default configuration.");
            }
        }
    }

    if let Some(port) = cli.api_port {
        info!("CLI override: api_port = {}", port);
        config.server.api_port = port;
    }
    if let Some(ref url) = cli.simulator_url {
        info!("CLI override: poller.base_url = {}", url);
        config.poller.base_url = url.clone();
    }
    if cli.no_poller {
        info!("CLI override: poller disabled");
        config.poller.enabled = false;
    }

    if cli.check {
        config.validate()?;
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}:{}", config.server.api_host, config.server.api_port);
        println!("   Database    : {}", config.database.connection_url());
        println!(
            "   Poller      : {} ({})",
            if config.poller.enabled { "enabled" } else { "disabled" },
            config.poller.base_url
        );
        println!("   Currency    : {}", config.pricing.currency);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    handle.install_signal_handler();
    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
