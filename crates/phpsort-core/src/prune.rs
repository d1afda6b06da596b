//! Unused-element pruning
//!
//! Deleting lines shifts every row below the deletion, so pending deletions
//! are applied highest range first. Each element's recorded range is still
//! accurate at the moment it is deleted.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use crate::buffer::LineBuffer;
use crate::element::{Element, LineRange};
use crate::error::SortError;

/// A message attached to a buffer row by a diagnostics source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 0-indexed row
    pub row: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }

    /// Whether the message reports an unused declaration
    pub fn is_unused(&self) -> bool {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"(?i)\bunused\b|declared but (?:not|never) used|never used")
                .expect("valid unused-diagnostic pattern")
        });
        pattern.is_match(&self.message)
    }
}

/// Diagnostics for one buffer snapshot, indexed by row
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSet {
    by_row: BTreeMap<usize, Vec<Diagnostic>>,
}

impl DiagnosticSet {
    pub fn new(diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
        let mut by_row: BTreeMap<usize, Vec<Diagnostic>> = BTreeMap::new();
        for diagnostic in diagnostics {
            by_row.entry(diagnostic.row).or_default().push(diagnostic);
        }
        Self { by_row }
    }

    pub fn at(&self, row: usize) -> &[Diagnostic] {
        self.by_row.get(&row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Oracle answer: is the declaration starting on `row` unused
    pub fn is_unused(&self, row: usize) -> bool {
        self.at(row).iter().any(Diagnostic::is_unused)
    }

    pub fn len(&self) -> usize {
        self.by_row.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_row.is_empty()
    }
}

/// Source of diagnostics for buffer text
pub trait DiagnosticsProvider: Send + Sync {
    fn diagnose(&self, source: &str) -> DiagnosticSet;
}

/// Result of a pruning pass
#[derive(Debug, Default)]
pub struct PruneOutcome {
    /// Ranges deleted, highest first
    pub deleted: Vec<LineRange>,
    pub failures: Vec<SortError>,
}

/// Delete every element whose first row the oracle flags as unused
///
/// The element and its attached comment go in one deletion.
pub fn prune_unused(
    buffer: &mut dyn LineBuffer,
    elements: &[Element],
    is_unused: impl Fn(usize) -> bool,
) -> PruneOutcome {
    let mut pending: Vec<LineRange> = elements
        .iter()
        .filter(|element| is_unused(element.range.start - 1))
        .map(Element::full_range)
        .collect();
    pending.sort_by(|a, b| b.start.cmp(&a.start));

    let mut outcome = PruneOutcome::default();
    for range in pending {
        let (start, end) = range.rows();
        match buffer.set_lines(start, end, Vec::new()) {
            Ok(()) => {
                debug!("deleted unused element at lines {}..{}", range.start, range.end);
                outcome.deleted.push(range);
            }
            Err(source) => {
                warn!("failed to delete lines {}..{}: {}", range.start, range.end, source);
                outcome.failures.push(SortError::WriteFailure {
                    start: range.start,
                    end: range.end,
                    source,
                });
            }
        }
    }

    outcome
}
