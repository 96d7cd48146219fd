mod backend;
mod cli_messages;
mod commands;
mod config;
mod consts;
mod environment;
mod error_classifier;
mod events;
mod logging;
mod refresh;
mod runtime;
mod session;
mod snapshot;
mod snapshot_store;
mod version_checker;

use crate::backend::BackendClient;
use crate::commands::{resolve_base_url, resolve_refresh_interval};
use crate::config::{Config, get_config_path};
use crate::environment::Environment;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::Path;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Command-line arguments
struct Args {
    /// Command to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect to a backend and persist it in the config file
    Connect {
        /// Backend base URL to connect to
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },
    /// Run the refresh loop, printing events until Ctrl+C
    Start {
        /// Backend base URL override
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Seconds between refresh cycles
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Stop after this many completed refresh cycles
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        max_cycles: Option<u32>,
    },
    /// Fetch one snapshot and print a summary
    Status {
        /// Backend base URL override
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },
    /// Queue a backend sync for one source, then refresh
    Sync {
        /// Identifier of the source to sync
        #[arg(long, value_name = "SOURCE_ID")]
        source: String,

        /// Backend base URL override
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },
    /// Clear the stored connection and client id
    Disconnect,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let environment = Environment::from_env();
    let config_path = get_config_path()?;
    let args = Args::parse();

    match args.command {
        Command::Connect { base_url } => {
            // A malformed config is not fatal here: connect rewrites it.
            let config = Config::load_from_file(&config_path).ok();
            let url = resolve_base_url(base_url.as_deref(), config.as_ref(), &environment);
            let client = BackendClient::with_base_url(url.clone());
            commands::connect(url, &config_path, Box::new(client)).await
        }
        Command::Start {
            base_url,
            interval,
            max_cycles,
        } => {
            let config = load_optional_config(&config_path)?;
            let url = resolve_base_url(base_url.as_deref(), config.as_ref(), &environment);
            let refresh_interval = resolve_refresh_interval(interval, config.as_ref());
            let session = session::setup_session(url, refresh_interval, max_cycles).await?;
            session::run_headless_mode(session).await
        }
        Command::Status { base_url } => {
            let config = load_optional_config(&config_path)?;
            let url = resolve_base_url(base_url.as_deref(), config.as_ref(), &environment);
            let client = BackendClient::with_base_url(url);
            commands::status(Box::new(client)).await
        }
        Command::Sync { source, base_url } => {
            let config = load_optional_config(&config_path)?;
            let url = resolve_base_url(base_url.as_deref(), config.as_ref(), &environment);
            let client = BackendClient::with_base_url(url);
            commands::sync_source(&source, Box::new(client)).await
        }
        Command::Disconnect => {
            println!("Disconnecting and clearing the stored configuration...");
            Config::clear_config(&config_path).map_err(Into::into)
        }
    }
}

/// Load the config if one exists.
///
/// A missing file is fine (environment defaults apply); a malformed one is
/// a real error rather than something to silently recreate.
fn load_optional_config(path: &Path) -> Result<Option<Config>, Box<dyn Error>> {
    match Config::load_from_file(path) {
        Ok(config) => Ok(Some(config)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(format!("Failed to read config at {}: {}", path.display(), e).into()),
    }
}
