//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "amp-optimizer.toml";

/// Server-side optimizer for AMP pages
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// HTML files or directories to optimize. Use `-` to read a document from stdin.
    #[arg(value_name = "PATH", required = true, value_hint = clap::ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// Write the optimized document to this file (single input only)
    #[arg(short, long, conflicts_with = "write", value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Rewrite input files in place
    #[arg(short, long)]
    pub write: bool,

    /// Config file path (default: amp-optimizer.toml if present)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Never touch the network; inline the bundled runtime CSS
    #[arg(long)]
    pub offline: bool,

    /// Print per-transformer progress
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}

impl Cli {
    /// Config file to load, if any.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                fallback.is_file().then_some(fallback)
            }
        }
    }

    /// Whether the single input is stdin.
    pub fn is_stdin(&self) -> bool {
        self.paths.len() == 1 && self.paths[0].as_os_str() == "-"
    }
}
