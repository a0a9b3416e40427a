use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sf_parking_core::{probe, Config, ParkingClient};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sf_parking_mcp::{serve_lines, McpServer};

#[derive(Parser)]
#[command(name = "sf-parking-mcp")]
#[command(version)]
#[command(about = "San Francisco parking data over MCP")]
struct Cli {
    #[arg(short, long, env = "SF_PARKING_CONFIG", help = "JSON config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Serve,
    /// Check that the parking API answers
    Probe,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr);
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    };
    config.with_env().context("invalid environment override")
}

fn serve(config: &Config) -> Result<()> {
    let mut server = McpServer::from_config(config)?;
    tracing::info!(base_url = %config.base_url, "sf-parking mcp server ready on stdio");

    serve_lines(&mut server, io::stdin().lock(), io::stdout())?;

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

fn run_probe(config: &Config) -> Result<()> {
    let client = ParkingClient::from_config(config)?;
    eprintln!("Testing SF Parking API...");

    let report = probe::run(&client, &config.base_url).context("probe failed")?;
    match &report.sample {
        Some(sample) => {
            println!("Success! Found {} results", report.feature_count);
            println!("\nSample result:");
            println!("{}", serde_json::to_string_pretty(sample)?);
        }
        None => println!("No results found"),
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config),
        Commands::Probe => run_probe(&config),
    }
}
