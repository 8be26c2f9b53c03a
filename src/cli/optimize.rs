//! Optimize command: collect inputs, run the engine, write results.
//!
//! ```text
//! paths ──► collect_html_files (jwalk) ──► par_iter (rayon) ──► FileReport
//!                                                  │
//!                                    stdout | --output | --write
//! ```
//!
//! Findings never fail a file. Only I/O errors do.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use jwalk::WalkDir;
use rayon::prelude::*;

use amp_optimizer::utils::plural::plural_count;
use amp_optimizer::{Error, ErrorCollection, TransformationEngine, log};

use super::args::Cli;

/// Extensions picked up when walking a directory.
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// Where optimized documents go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Stdout,
    File(PathBuf),
    InPlace,
}

/// Outcome of optimizing one file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub findings: Vec<Error>,
    pub result: Result<()>,
}

// =============================================================================
// Entry
// =============================================================================

/// Run the optimizer for parsed CLI arguments.
pub fn run(cli: &Cli, engine: &TransformationEngine) -> Result<()> {
    if cli.is_stdin() {
        return optimize_stdin(engine, cli.output.as_deref());
    }

    let files = collect_html_files(&cli.paths)?;
    if files.is_empty() {
        bail!("no html files found");
    }
    let target = resolve_target(cli, &files)?;

    let reports = optimize_files(engine, &files, &target);
    let failed = print_reports(&reports);
    if failed > 0 {
        bail!("failed to optimize {}", plural_count(failed, "file"));
    }
    Ok(())
}

fn resolve_target(cli: &Cli, files: &[PathBuf]) -> Result<Target> {
    match (&cli.output, cli.write) {
        (Some(output), _) if files.len() == 1 => Ok(Target::File(output.clone())),
        (Some(_), _) => bail!("--output needs exactly one input file, got {}", files.len()),
        (None, true) => Ok(Target::InPlace),
        (None, false) if files.len() == 1 => Ok(Target::Stdout),
        (None, false) => bail!("{} inputs: pass --write to optimize in place", files.len()),
    }
}

// =============================================================================
// Input Collection
// =============================================================================

/// Expand `paths` into a sorted, deduplicated list of files.
///
/// Files are taken as given; directories contribute every `*.html`/`*.htm`
/// below them.
pub fn collect_html_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|e| e.file_type().is_file())
                    .map(|e| e.path())
                    .filter(|p| is_html(p)),
            );
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("no such file or directory: {}", path.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| HTML_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

// =============================================================================
// Optimization
// =============================================================================

/// Optimize `files` in parallel. Reports come back in input order.
pub fn optimize_files(
    engine: &TransformationEngine,
    files: &[PathBuf],
    target: &Target,
) -> Vec<FileReport> {
    files
        .par_iter()
        .map(|path| {
            let mut errors = ErrorCollection::new();
            let result = optimize_file(engine, path, target, &mut errors);
            FileReport {
                path: path.clone(),
                findings: errors.into_iter().collect(),
                result,
            }
        })
        .collect()
}

fn optimize_file(
    engine: &TransformationEngine,
    path: &Path,
    target: &Target,
    errors: &mut ErrorCollection,
) -> Result<()> {
    let html =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let optimized = engine.optimize_html(&html, errors);
    match target {
        Target::Stdout => io::stdout().lock().write_all(optimized.as_bytes())?,
        Target::File(output) => write_file(output, &optimized)?,
        Target::InPlace => write_file(path, &optimized)?,
    }
    Ok(())
}

fn optimize_stdin(engine: &TransformationEngine, output: Option<&Path>) -> Result<()> {
    let mut html = String::new();
    io::stdin()
        .read_to_string(&mut html)
        .context("failed to read stdin")?;

    let mut errors = ErrorCollection::new();
    let optimized = engine.optimize_html(&html, &mut errors);
    for finding in &errors {
        log!("warn"; "<stdin>: {}", finding);
    }
    match output {
        Some(path) => write_file(path, &optimized),
        None => Ok(io::stdout().lock().write_all(optimized.as_bytes())?),
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

// =============================================================================
// Reporting
// =============================================================================

/// Print findings and failures. Returns the number of failed files.
fn print_reports(reports: &[FileReport]) -> usize {
    let mut failed = 0;
    let mut findings = 0;
    for report in reports {
        for finding in &report.findings {
            log!("warn"; "{}: {}", report.path.display(), finding);
        }
        findings += report.findings.len();
        if let Err(err) = &report.result {
            log!("error"; "{:#}", err);
            failed += 1;
        }
    }
    log!(
        "done";
        "optimized {} ({})",
        plural_count(reports.len() - failed, "file"),
        plural_count(findings, "finding")
    );
    failed
}
