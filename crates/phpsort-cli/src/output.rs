//! Terminal, patch and JSON reporting of sort results

use anyhow::{bail, Result};
use colored::*;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    /// `diff -u` compatible patches, nothing else
    Diff,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "diff" => Ok(OutputFormat::Diff),
            other => bail!("Invalid output format '{}'. Valid options: text, json, diff", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Reorder,
    Prune,
    Spacing,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeInfo {
    pub kind: ChangeKind,
    pub count: usize,
    pub message: String,
}

impl ChangeInfo {
    pub fn new(kind: ChangeKind, count: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            count,
            message: message.into(),
        }
    }
}

/// One file's line in the JSON report
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<ChangeInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileEntry {
    fn new(path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
            changes: Vec::new(),
            warnings: Vec::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Totals {
    pub processed: usize,
    pub changed_files: usize,
    pub changes: usize,
    pub errors: usize,
}

#[derive(Debug, Serialize)]
struct JsonReport<'r> {
    version: &'static str,
    totals: &'r Totals,
    files: &'r [FileEntry],
}

/// Collects per-file outcomes; text and patch output is printed as files arrive
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    entries: Vec<FileEntry>,
    totals: Totals,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            entries: Vec::new(),
            totals: Totals::default(),
        }
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn unchanged(&mut self, path: &Path, warnings: Vec<String>) {
        self.totals.processed += 1;
        self.warn(path, &warnings);
        if self.verbose && self.format == OutputFormat::Text {
            println!("{}: already sorted", path.display());
        }
        self.entries.push(FileEntry {
            warnings,
            ..FileEntry::new(path)
        });
    }

    /// A file the sorter changed
    ///
    /// `sources` holds the old and new text when the change was not written.
    pub fn changed(
        &mut self,
        path: &Path,
        changes: Vec<ChangeInfo>,
        warnings: Vec<String>,
        sources: Option<(&str, &str)>,
    ) {
        let count: usize = changes.iter().map(|c| c.count).sum();
        self.totals.processed += 1;
        self.totals.changed_files += 1;
        self.totals.changes += count;
        self.warn(path, &warnings);

        match (self.format, sources) {
            (OutputFormat::Text, Some((old, new))) => {
                println!("{}", path.display().to_string().bold());
                print!("{}", line_diff(old, new));
                println!();
                for change in &changes {
                    println!("  {} {}", "->".green(), change.message);
                }
                println!();
            }
            (OutputFormat::Text, None) => {
                println!("{}", path.display().to_string().bold());
                println!("  {} Applied {} change(s)", "OK".green(), count);
                println!();
            }
            (OutputFormat::Diff, Some((old, new))) => print!("{}", unified_diff(path, old, new)),
            _ => {}
        }

        self.entries.push(FileEntry {
            changes,
            warnings,
            ..FileEntry::new(path)
        });
    }

    pub fn failed(&mut self, path: &Path, error: &str) {
        self.totals.processed += 1;
        self.totals.errors += 1;
        if self.format == OutputFormat::Text {
            eprintln!("{}: {} - {}", "Warning".yellow(), path.display(), error);
        }
        self.entries.push(FileEntry {
            error: Some(error.to_string()),
            ..FileEntry::new(path)
        });
    }

    fn warn(&self, path: &Path, warnings: &[String]) {
        if self.format == OutputFormat::Text {
            for warning in warnings {
                eprintln!("{}: {} - {}", "Warning".yellow(), path.display(), warning);
            }
        }
    }

    pub fn finish(self, check_mode: bool) -> Result<()> {
        match self.format {
            OutputFormat::Text => print!("{}", summary_text(&self.totals, check_mode)),
            OutputFormat::Json => {
                let report = JsonReport {
                    version: env!("CARGO_PKG_VERSION"),
                    totals: &self.totals,
                    files: &self.entries,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Diff => {}
        }
        Ok(())
    }
}

fn summary_text(totals: &Totals, check_mode: bool) -> String {
    let mut out = format!("\n{}\n", "Summary".bold().underline());
    let _ = writeln!(out, "  Files processed: {}", totals.processed);
    let _ = writeln!(out, "  Files with changes: {}", totals.changed_files);
    let _ = writeln!(out, "  Total changes: {}", totals.changes);
    if totals.errors > 0 {
        let _ = writeln!(out, "  Errors: {}", totals.errors);
    }
    if check_mode && totals.changed_files > 0 {
        let _ = writeln!(out, "\n{}", "Run with --fix to apply changes".yellow());
    }
    out
}

/// Removed and added lines only, colored
fn line_diff(old: &str, new: &str) -> String {
    let mut out = String::new();
    for line in diff::lines(old, new) {
        let _ = match line {
            diff::Result::Left(l) => writeln!(out, "  {}", format!("- {}", l).red()),
            diff::Result::Right(r) => writeln!(out, "  {}", format!("+ {}", r).green()),
            diff::Result::Both(..) => Ok(()),
        };
    }
    out
}

fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    use similar::{ChangeTag, TextDiff};

    let path = path.display();
    let mut out = format!("--- a/{path}\n+++ b/{path}\n");
    let diff = TextDiff::from_lines(old, new);
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        let _ = writeln!(out, "{}", hunk.header());
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => ' ',
            };
            let _ = write!(out, "{}{}", sign, change);
            if change.missing_newline() {
                out.push('\n');
            }
        }
    }
    out
}
