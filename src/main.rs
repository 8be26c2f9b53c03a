//! amp-optimizer - server-side optimizer for AMP pages.

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};

use amp_optimizer::{Configuration, OfflineFetcher, TransformationEngine, debug, logger};
use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = match cli.config_path() {
        Some(path) => {
            debug!("config"; "loading {}", path.display());
            Configuration::from_path(&path)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => Configuration::default(),
    };

    let engine = if cli.offline {
        TransformationEngine::with_fetcher(&config, Arc::new(OfflineFetcher))?
    } else {
        TransformationEngine::new(&config)?
    };
    debug!("optimize"; "transformers: {}", engine.transformer_names().join(", "));

    cli::optimize::run(&cli, &engine)
}
