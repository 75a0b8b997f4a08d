mod config;
mod handler;
mod io;
mod protocol;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use ftpgate_core::ftp::{FtpGateway, SuppaConnector};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AgentConfig;
use crate::handler::dispatch::Dispatcher;
use crate::session::store::CredentialStore;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage() {
    eprintln!("Usage: ftpgate-agent --stdio [--config <path>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --stdio          Run in stdio mode (NDJSON over stdin/stdout)");
    eprintln!("  --config <path>  Load agent settings from a JSON file");
    eprintln!("  --version        Print version and exit");
    eprintln!("  --help           Print this help message");
}

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct Args {
    stdio: bool,
    config: Option<PathBuf>,
}

/// Gateway over suppaftp, configured from the agent settings.
fn build_gateway(config: &AgentConfig) -> FtpGateway {
    if config.accept_invalid_certs {
        warn!("TLS certificate verification is disabled");
    }
    let connector = SuppaConnector::new().accept_invalid_certs(config.accept_invalid_certs);
    FtpGateway::new(Arc::new(connector), config.gateway_settings())
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--stdio" => parsed.stdio = true,
            "--config" => match iter.next() {
                Some(path) => parsed.config = Some(PathBuf::from(path)),
                None => return Err("--config requires a path".to_string()),
            },
            other => return Err(format!("Unknown option: {other}")),
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("--version") => {
            println!("ftpgate-agent {}", VERSION);
            return Ok(());
        }
        Some("--help") => {
            print_usage();
            return Ok(());
        }
        _ => {}
    }

    let args = match parse_args(&args) {
        Ok(args) if args.stdio => args,
        Ok(_) => {
            print_usage();
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            std::process::exit(1);
        }
    };

    // Configure tracing to stderr so it doesn't interfere with the protocol on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("ftpgate-agent {} starting in stdio mode", VERSION);

    let config = match &args.config {
        Some(path) => AgentConfig::load_from(path),
        None => AgentConfig::default(),
    };
    let files = Arc::new(build_gateway(&config));
    let max_line = config.max_request_bytes();
    let dispatcher = Dispatcher::new(files, Arc::new(CredentialStore::new()), config);

    io::stdio::run_stdio_loop(dispatcher, max_line).await
}
