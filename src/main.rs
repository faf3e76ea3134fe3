mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use cli::Cli;
use sipni::{config, ClientConfig, SipniClient};

fn main() -> Result<()> {
    let dotenv_path = load_dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Some(path) = dotenv_path {
        debug!("Loaded environment from {}", path.display());
    }

    let credentials = config::credentials_from_env()?;
    let mut client_config = ClientConfig::from_env()?.with_auto_refresh(!cli.no_auto_refresh);
    if let Some(url) = &cli.base_url {
        client_config = client_config.with_base_url(url.as_str());
    }

    let mut client = SipniClient::with_config(&credentials, client_config)
        .context("Failed to authenticate with SI-PNI")?;

    for document in &cli.documents {
        let result = client
            .query(document)
            .with_context(|| format!("Lookup failed for {}", document))?;
        let output = if cli.compact {
            serde_json::to_string(&result)?
        } else {
            serde_json::to_string_pretty(&result)?
        };
        println!("{}", output);
    }

    Ok(())
}

/// Load `.env` from the working directory if present. Real environment variables win.
fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => {
            eprintln!("Warning: ignoring unreadable .env file: {}", e);
            None
        }
    }
}

/// Initialize logging based on the `--verbose` flag or `SIPNI_LOG` env var.
///
/// - `SIPNI_LOG` env var: full filter control (e.g. `SIPNI_LOG=sipni::api=trace`)
/// - `--verbose`: sets `sipni` crate to `Debug` level
/// - Otherwise: `Warn` level only
fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder.format_target(true);
    builder.format_module_path(false);

    if let Ok(filter) = std::env::var("SIPNI_LOG") {
        builder.parse_filters(&filter);
    } else if verbose {
        builder.filter_module("sipni", log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }

    builder.init();
}
