//! `ifs` - command-line access to the IFS REST API
//!
//! Reads its configuration from `IFS_*` environment variables or a TOML file
//! and prints every response envelope as JSON. Log level is controlled via
//! the `RUST_LOG` environment variable.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::info;

use ifs_client::IfsClient;
use ifs_common::Config;

mod commands;
mod display;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file (defaults to IFS_* environment variables)
    #[arg(long, short, env = "IFS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the API request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Acquire a bearer token and show when it expires
    Token,

    /// Send a GET request
    Get {
        /// Path relative to the base URI
        path: String,

        /// Query parameter as key=value (repeatable)
        #[arg(long = "query", short, value_parser = parse_key_value)]
        query: Vec<(String, String)>,
    },

    /// Send a POST request with a JSON body
    Post {
        /// Path relative to the base URI
        path: String,

        /// JSON request body
        #[arg(long)]
        body: String,
    },

    /// Send a DELETE request
    Delete {
        /// Path relative to the base URI
        path: String,
    },

    /// List customers
    Customers {
        /// Maximum number of customers to return
        #[arg(long, default_value_t = 20)]
        top: u32,

        /// OData $filter expression
        #[arg(long)]
        filter: Option<String>,
    },

    /// List the sales objects of a company
    SalesObjects {
        /// Company code
        company: String,

        /// Maximum number of sales objects to return
        #[arg(long, default_value_t = 50)]
        top: u32,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Config::load(path)?
        }
        None => Config::from_env().context(
            "IFS configuration must be provided via --config or IFS_* environment variables",
        )?,
    };
    if let Some(timeout) = args.timeout {
        config.timeout_seconds = timeout;
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("{} {e:#}", "Error:".bright_red());
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let client = IfsClient::new(config)?;

    match args.command {
        Command::Token => commands::token(&client).await,
        Command::Get { path, query } => commands::get(&client, &path, query).await,
        Command::Post { path, body } => commands::post(&client, &path, &body).await,
        Command::Delete { path } => commands::delete(&client, &path).await,
        Command::Customers { top, filter } => commands::customers(&client, top, filter).await,
        Command::SalesObjects { company, top } => {
            commands::sales_objects(&client, &company, top).await
        }
    }
}
