//! File processing logic for phpsort

use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

use phpsort_core::{MemoryBuffer, Report, SortConfig, SortError, Sorter};
use phpsort_php::{PhpSyntaxProvider, UnusedImportDiagnostics, LANGUAGE};

use crate::output::{ChangeInfo, ChangeKind};

/// Result of processing a single file
pub struct ProcessResult {
    /// What the sorter did
    pub changes: Vec<ChangeInfo>,
    /// Rewrites that failed; earlier changes were kept
    pub failures: Vec<String>,
    /// Original source code
    pub old_source: String,
    /// New source code (only if it differs)
    pub new_source: Option<String>,
}

/// Sort one PHP file in memory
///
/// Returns `None` when the file does not parse.
pub fn process_file(path: &Path, config: &SortConfig) -> Result<Option<ProcessResult>> {
    let source_code = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    process_source(&source_code, config)
        .with_context(|| format!("Failed to sort {}", path.display()))
}

pub fn process_source(source_code: &str, config: &SortConfig) -> Result<Option<ProcessResult>> {
    let provider = PhpSyntaxProvider;
    let diagnostics = UnusedImportDiagnostics;
    let mut buffer = MemoryBuffer::from_source(source_code).with_language(LANGUAGE);

    let report = match Sorter::new(*config)
        .with_provider(&provider)
        .with_diagnostics(&diagnostics)
        .run(&mut buffer)
    {
        Ok(report) => report,
        Err(SortError::Syntax(message)) => {
            debug!("parse error: {}", message);
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    let new_source = buffer.to_source();
    let changed = new_source != source_code;

    Ok(Some(ProcessResult {
        changes: if changed { change_infos(&report) } else { Vec::new() },
        failures: report.failures.iter().map(|f| f.to_string()).collect(),
        old_source: source_code.to_string(),
        new_source: changed.then_some(new_source),
    }))
}

/// Write the processed result to the file
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

fn change_infos(report: &Report) -> Vec<ChangeInfo> {
    let mut changes = Vec::new();
    if report.writes > 0 {
        changes.push(ChangeInfo::new(
            ChangeKind::Reorder,
            report.writes,
            format!("Reordered {} declaration group(s)", report.writes),
        ));
    }
    if report.pruned > 0 {
        changes.push(ChangeInfo::new(
            ChangeKind::Prune,
            report.pruned,
            format!("Removed {} unused import(s)", report.pruned),
        ));
    }
    let spacing = report.removed_blank_lines + report.inserted_separators;
    if spacing > 0 {
        changes.push(ChangeInfo::new(
            ChangeKind::Spacing,
            spacing,
            format!(
                "Normalized blank lines ({} removed, {} separator(s) added)",
                report.removed_blank_lines, report.inserted_separators
            ),
        ));
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_process_unsorted_source() {
        let source = "<?php\n\nuse B;\nuse A;\n\nclass X {}\n";
        let result = process_source(source, &SortConfig::default()).unwrap().unwrap();

        assert_eq!(
            result.new_source.as_deref(),
            Some("<?php\n\nuse A;\nuse B;\n\nclass X {}\n")
        );
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].kind, ChangeKind::Reorder);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_process_sorted_source() {
        let source = "<?php\n\nuse A;\nuse B;\n";
        let result = process_source(source, &SortConfig::default()).unwrap().unwrap();
        assert!(result.new_source.is_none());
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_process_parse_error() {
        let result = process_source("<?php\nclass {\n", &SortConfig::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_crlf_is_preserved() {
        let source = "<?php\r\nuse B;\r\nuse A;\r\n";
        let result = process_source(source, &SortConfig::default()).unwrap().unwrap();
        assert_eq!(result.new_source.as_deref(), Some("<?php\r\nuse A;\r\nuse B;\r\n"));
    }

    #[test]
    fn test_process_and_write_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.php");
        fs::write(&path, "<?php\nuse B;\nuse A;\n").unwrap();

        let result = process_file(&path, &SortConfig::default()).unwrap().unwrap();
        write_file(&path, result.new_source.as_deref().unwrap()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<?php\nuse A;\nuse B;\n");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(process_file(&temp.path().join("missing.php"), &SortConfig::default()).is_err());
    }
}
