//! Schoolshots HTTP server.
//!
//! Serves the public gallery API (`/api/photos`, `/api/schools`,
//! `/api/classes`, `/api/events`) over the configured catalog store.
//!
//! ## Usage
//!
//! ```bash
//! schoolshots-server                        # Bind to [server].bind from config
//! schoolshots-server --bind 0.0.0.0:8080    # Override the listen address
//! ```

use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};

use schoolshots::config::Config;
use schoolshots::logging;

#[derive(Default)]
struct ServerArgs {
    /// Config path override
    config_path: Option<PathBuf>,
    /// Listen address override
    bind: Option<String>,
}

fn parse_args() -> ServerArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = ServerArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < args.len() {
                    parsed.bind = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Error: --bind requires an address");
                    std::process::exit(1);
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"schoolshots-server - Public gallery API for Schoolshots

USAGE:
    schoolshots-server [OPTIONS]

OPTIONS:
    --bind, -b ADDR     Listen address (default: [server].bind, 127.0.0.1:3000)
    --config, -c PATH   Path to config file
    --help, -h          Show this help message

ENVIRONMENT:
    SCHOOLSHOTS_CONFIG  Path to config file (overrides default location)
    SCHOOLSHOTS_LOG     Log filter, e.g. info,tower_http=debug
"#
    );
}

fn load_config(args: &ServerArgs) -> Result<Config> {
    let path = args.config_path.clone().unwrap_or_else(Config::config_path);

    if path.exists() {
        Config::load_from(&path)
    } else {
        warn!("Config file not found at {:?}, using defaults", path);
        Ok(Config::default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    logging::init(None, logging::Fallback::Stderr)?;

    info!("Schoolshots server starting...");

    let config = load_config(&args)?;
    let bind = args.bind.clone().unwrap_or_else(|| config.server.bind.clone());

    schoolshots::server::serve(&config, &bind).await?;

    info!("Schoolshots server stopped");
    Ok(())
}
