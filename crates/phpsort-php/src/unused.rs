//! Unused import detection
//!
//! A heuristic diagnostics source: an import is unused when its short name
//! (or alias) never appears as an identifier in the rest of the file.
//! Docblock references count as uses. Grouped and comma-separated imports
//! are never reported.

use log::debug;
use regex::Regex;

use phpsort_core::{Diagnostic, DiagnosticSet, DiagnosticsProvider, NodeKind};

use crate::parser::build_tree;

/// Reports `Unused import '<path>'` on the first row of each unused import
#[derive(Debug, Default, Clone, Copy)]
pub struct UnusedImportDiagnostics;

struct ImportInfo {
    row: usize,
    start: usize,
    end: usize,
    name: String,
    full_path: String,
    case_sensitive: bool,
}

impl DiagnosticsProvider for UnusedImportDiagnostics {
    fn diagnose(&self, source: &str) -> DiagnosticSet {
        let tree = match build_tree(source) {
            Ok(tree) => tree,
            Err(err) => {
                debug!("no unused-import diagnostics: {}", err);
                return DiagnosticSet::default();
            }
        };

        let offsets = RowOffsets::new(source);
        let mut imports = Vec::new();
        for node in tree.nodes().iter().filter(|n| n.kind() == NodeKind::ImportUse) {
            let start = offsets.offset(node.start().row, node.start().column);
            let Some(info) = parse_import(node.text(), node.start().row, start) else {
                continue;
            };
            imports.push(info);
        }

        // imports must not count as their own uses
        let mut body = source.to_string();
        for import in &imports {
            let blank: String = source[import.start..import.end]
                .chars()
                .map(|c| if c == '\n' { '\n' } else { ' ' })
                .collect();
            body.replace_range(import.start..import.end, &blank);
        }

        DiagnosticSet::new(imports.iter().filter(|import| !is_import_used(import, &body)).map(|import| {
            Diagnostic::new(import.row, format!("Unused import '{}'", import.full_path))
        }))
    }
}

fn parse_import(text: &str, row: usize, start: usize) -> Option<ImportInfo> {
    let path = text.get(3..)?.trim().trim_end_matches(';').trim();
    if path.contains('{') || path.contains(',') {
        return None;
    }

    let (path, case_sensitive) = match path.split_once(char::is_whitespace) {
        Some((kind, rest)) if kind.eq_ignore_ascii_case("function") => (rest.trim(), false),
        Some((kind, rest)) if kind.eq_ignore_ascii_case("const") => (rest.trim(), true),
        _ => (path, false),
    };

    Some(ImportInfo {
        row,
        start,
        end: start + text.len(),
        name: extract_import_name(path),
        full_path: path.trim_start_matches('\\').to_string(),
        case_sensitive,
    })
}

fn extract_import_name(path: &str) -> String {
    // Foo\Bar as Baz -> Baz
    let lower = path.to_ascii_lowercase();
    if let Some(index) = lower.rfind(" as ") {
        return path[index + 4..].trim().to_string();
    }

    // Foo\Bar\Baz -> Baz
    path.rsplit('\\').next().unwrap_or(path).trim().to_string()
}

fn is_import_used(import: &ImportInfo, body: &str) -> bool {
    if import.name.is_empty() {
        return true;
    }

    // not a variable, not a fully-qualified or relative name
    let flags = if import.case_sensitive { "" } else { "(?i)" };
    let pattern = format!(r"{}(?:^|[^\w$\\]){}\b", flags, regex::escape(&import.name));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(body),
        Err(_) => true,
    }
}

/// Row/column to byte offset conversion
struct RowOffsets {
    starts: Vec<usize>,
}

impl RowOffsets {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn offset(&self, row: usize, column: usize) -> usize {
        self.starts.get(row).copied().unwrap_or(0) + column
    }
}
