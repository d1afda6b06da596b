//! Blank-line normalization after reordering
//!
//! Pass one removes every blank line inside each run of imports, including
//! the import spans as they stood before pruning. Pass two
//! walks each run bottom-up and puts exactly one blank line after the last
//! element of a group (import kind, or visibility for class members) when the
//! next element belongs to a different group. Imports, constants and
//! properties are normalized as independent sequences.

use std::collections::BTreeSet;
use std::ops::Range;

use log::{debug, warn};

use crate::buffer::{is_blank, LineBuffer};
use crate::config::SortConfig;
use crate::element::{Element, ElementGroup};
use crate::engine::parse_buffer;
use crate::error::SortError;
use crate::extract::{extract, extract_imports, runs_in, scopes};
use crate::syntax::SyntaxProvider;

/// Which declaration sequences to normalize
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeTargets {
    pub imports: bool,
    pub members: bool,
    /// Buffer rows that held import runs before pruning, shifted past the deletions
    pub pruned_import_spans: Vec<Range<usize>>,
}

#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub removed_blank_lines: usize,
    pub inserted_separators: usize,
    pub failures: Vec<SortError>,
}

impl NormalizeOutcome {
    pub fn changed(&self) -> bool {
        self.removed_blank_lines > 0 || self.inserted_separators > 0
    }
}

pub fn normalize(
    buffer: &mut dyn LineBuffer,
    provider: &dyn SyntaxProvider,
    config: &SortConfig,
    targets: NormalizeTargets,
) -> Result<NormalizeOutcome, SortError> {
    let mut outcome = NormalizeOutcome::default();

    if targets.imports {
        collapse_import_blank_lines(buffer, provider, &targets.pruned_import_spans, &mut outcome)?;
    }

    let tree = parse_buffer(provider, buffer)?;
    let mut sequences: Vec<ElementGroup> = Vec::new();

    if targets.imports {
        let imports = extract_imports(tree.as_ref(), buffer)?;
        sequences.extend(runs_in(buffer, &imports)?);
    }
    if targets.members && config.add_visibility_spacing {
        for region in scopes(tree.as_ref()) {
            let scope = extract(tree.as_ref(), buffer, region)?;
            sequences.extend(runs_in(buffer, &scope.constants)?);
            sequences.extend(runs_in(buffer, &scope.properties)?);
        }
    }

    let default = config.default_visibility;
    let mut boundaries: Vec<&Element> = Vec::new();
    for run in sequences.iter().filter(|run| !run.has_overlap()) {
        let mut next_key: Option<String> = None;
        for element in run.elements.iter().rev() {
            let key = element.group_key(default);
            if next_key.as_ref().is_some_and(|next| *next != key) {
                boundaries.push(element);
            }
            next_key = Some(key);
        }
    }
    boundaries.sort_by(|a, b| b.range.start.cmp(&a.range.start));

    for element in boundaries {
        let next_row = element.range.end;
        let next_blank = buffer
            .get_lines(next_row, next_row + 1)?
            .first()
            .map_or(true, |line| is_blank(line));
        if next_blank {
            continue;
        }

        let range = element.full_range();
        let (start, end) = range.rows();
        let mut lines = element.rendered_lines();
        lines.push(String::new());

        match buffer.set_lines(start, end, lines) {
            Ok(()) => outcome.inserted_separators += 1,
            Err(source) => {
                warn!("failed to separate group at lines {}..{}: {}", range.start, range.end, source);
                outcome.failures.push(SortError::WriteFailure {
                    start: range.start,
                    end: range.end,
                    source,
                });
            }
        }
    }

    debug!(
        "normalized blank lines: {} removed, {} separators inserted",
        outcome.removed_blank_lines, outcome.inserted_separators
    );
    Ok(outcome)
}

fn collapse_import_blank_lines(
    buffer: &mut dyn LineBuffer,
    provider: &dyn SyntaxProvider,
    pruned_spans: &[Range<usize>],
    outcome: &mut NormalizeOutcome,
) -> Result<(), SortError> {
    let tree = parse_buffer(provider, buffer)?;
    let imports = extract_imports(tree.as_ref(), buffer)?;

    let mut spans: Vec<Range<usize>> = runs_in(buffer, &imports)?
        .iter()
        .filter_map(ElementGroup::union_range)
        .map(|range| {
            let (start, end) = range.rows();
            start..end
        })
        .collect();
    spans.extend(pruned_spans.iter().cloned());

    let line_count = buffer.line_count();
    let row_blank = |buffer: &dyn LineBuffer, row: usize| -> Result<bool, SortError> {
        Ok(buffer.get_lines(row, row + 1)?.iter().all(|l| is_blank(l)))
    };

    let mut rows: BTreeSet<usize> = BTreeSet::new();
    for span in &spans {
        let end = span.end.min(line_count);
        let start = span.start.min(end);
        let mut emptied = true;
        for row in start..end {
            if row_blank(&*buffer, row)? {
                rows.insert(row);
            } else {
                emptied = false;
            }
        }
        // a span whose imports were all pruned leaves one blank line between its neighbours
        if emptied && start > 0 && end < line_count && row_blank(&*buffer, start - 1)? && row_blank(&*buffer, end)? {
            rows.insert(end);
        }
    }

    for row in rows.into_iter().rev() {
        match buffer.set_lines(row, row + 1, Vec::new()) {
            Ok(()) => outcome.removed_blank_lines += 1,
            Err(source) => outcome.failures.push(SortError::WriteFailure {
                start: row + 1,
                end: row + 1,
                source,
            }),
        }
    }

    Ok(())
}
