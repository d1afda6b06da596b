//! phpsort CLI - sort PHP declarations in place
//!
//! Sorted groups:
//! - namespace imports (`use Foo\Bar;`, `use function`, `use const`)
//! - trait uses inside class-like bodies
//! - class constants, by visibility then text
//! - properties, by visibility then text

mod config;
mod output;
mod process;

use anyhow::Result;
use clap::Parser;
use colored::*;
use log::info;
use phpsort_core::SortConfig;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::Config;
use output::{ChangeInfo, OutputFormat, Reporter};
use process::{process_file, write_file};

#[derive(Parser)]
#[command(name = "phpsort")]
#[command(version)]
#[command(about = "Sort PHP imports, trait uses, constants and properties")]
struct Cli {
    /// Files or directories to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Report files that would change without writing them (default mode)
    #[arg(long, conflicts_with = "fix")]
    check: bool,

    /// Rewrite files in place
    #[arg(long, conflicts_with = "check")]
    fix: bool,

    /// Verbose output; repeat for debug logging
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Path to config file (default: auto-detect .phpsort.toml)
    #[arg(long, value_name = "PATH", conflicts_with = "no_config")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long)]
    no_config: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Debug);
        }
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load config file
    let (config, config_path) = if cli.no_config {
        (Config::default(), None)
    } else if let Some(path) = &cli.config {
        (Config::load_path(path)?, Some(path.clone()))
    } else {
        match Config::load()? {
            Some((cfg, path)) => (cfg, Some(path)),
            None => (Config::default(), None),
        }
    };

    // CLI flag wins over the config file
    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        let format = cli
            .format
            .as_deref()
            .or(config.output.format.as_deref())
            .unwrap_or("text");
        format.parse::<OutputFormat>()?
    };

    let sort_config = config.sort_config()?;
    let fix_mode = cli.fix;
    let check_mode = !fix_mode;
    let verbose = cli.verbose > 0;

    if let Some(path) = &config_path {
        info!("using config {}", path.display());
    }
    if verbose && output_format == OutputFormat::Text {
        println!("{}: {}", "Mode".bold(), if fix_mode { "fix" } else { "check" });
        println!();
    }

    // Collect all file paths first
    let mut file_paths: Vec<PathBuf> = Vec::new();
    let mut missing_paths: Vec<PathBuf> = Vec::new();

    for path in &cli.paths {
        if path.is_file() {
            file_paths.push(path.clone());
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "php"))
            {
                let file_path = entry.path();
                if !config.should_exclude(file_path) {
                    file_paths.push(file_path.to_path_buf());
                }
            }
        } else {
            missing_paths.push(path.clone());
        }
    }

    info!("processing {} file(s)", file_paths.len());

    // Process files in parallel
    let results: Vec<FileResult> = file_paths
        .par_iter()
        .map(|path| process_file_to_result(path, &sort_config))
        .collect();

    // Sort results by path for deterministic output
    let mut sorted_results: Vec<_> = results.into_iter().zip(file_paths.iter()).collect();
    sorted_results.sort_by(|a, b| a.1.cmp(b.1));

    let mut reporter = Reporter::new(output_format, verbose);

    for path in &missing_paths {
        if output_format == OutputFormat::Text {
            eprintln!("{}: Path does not exist: {}", "Warning".yellow(), path.display());
        }
    }

    for (result, path) in sorted_results {
        report_result(path, result, fix_mode, &mut reporter)?;
    }

    let totals = reporter.totals();
    let exit_code = if totals.errors > 0 {
        ExitCode::from(1)
    } else if check_mode && totals.changed_files > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish(check_mode)?;

    Ok(exit_code)
}

/// Result of processing a single file (for parallel processing)
enum FileResult {
    /// File had no changes
    NoChanges { warnings: Vec<String> },
    /// File has changes to report/apply
    HasChanges {
        changes: Vec<ChangeInfo>,
        warnings: Vec<String>,
        old_source: String,
        new_source: String,
    },
    /// Parse error occurred
    ParseError,
    /// Other error occurred
    Error(String),
}

/// Process a file and return a result (no I/O, suitable for parallel execution)
fn process_file_to_result(path: &Path, config: &SortConfig) -> FileResult {
    match process_file(path, config) {
        Ok(Some(result)) => match result.new_source {
            Some(new_source) => FileResult::HasChanges {
                changes: result.changes,
                warnings: result.failures,
                old_source: result.old_source,
                new_source,
            },
            None => FileResult::NoChanges {
                warnings: result.failures,
            },
        },
        Ok(None) => FileResult::ParseError,
        Err(e) => FileResult::Error(format!("{:#}", e)),
    }
}

/// Report a file result and optionally apply fixes
fn report_result(path: &Path, result: FileResult, fix_mode: bool, reporter: &mut Reporter) -> Result<()> {
    match result {
        FileResult::NoChanges { warnings } => {
            reporter.unchanged(path, warnings);
        }
        FileResult::HasChanges {
            changes,
            warnings,
            old_source,
            new_source,
        } => {
            if fix_mode {
                write_file(path, &new_source)?;
                reporter.changed(path, changes, warnings, None);
            } else {
                reporter.changed(path, changes, warnings, Some((&old_source, &new_source)));
            }
        }
        FileResult::ParseError => {
            reporter.failed(path, "Parse error, skipping");
        }
        FileResult::Error(msg) => {
            reporter.failed(path, &msg);
        }
    }
    Ok(())
}
