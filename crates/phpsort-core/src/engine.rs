//! The "sort elements" command
//!
//! One [`Sorter::run`] call is one invocation: class members of every scope,
//! then namespace imports, then unused-import pruning, then blank-line
//! normalization. Elements go stale after any write, so the buffer is
//! re-parsed after each one.

use std::ops::Range;

use log::{debug, info, warn};

use crate::buffer::LineBuffer;
use crate::config::SortConfig;
use crate::element::{Category, ElementGroup, LineRange};
use crate::error::SortError;
use crate::extract::{extract, extract_imports, runs_in, scopes};
use crate::normalize::{normalize, NormalizeTargets};
use crate::prune::{prune_unused, DiagnosticsProvider};
use crate::render::RenderSession;
use crate::syntax::{SyntaxProvider, SyntaxTree};

/// What one invocation did
#[derive(Debug, Default)]
pub struct Report {
    /// Successful group rewrites
    pub writes: usize,
    /// Imports deleted as unused
    pub pruned: usize,
    pub removed_blank_lines: usize,
    pub inserted_separators: usize,
    /// Localized write failures; earlier writes were kept
    pub failures: Vec<SortError>,
}

impl Report {
    pub fn changed(&self) -> bool {
        self.writes > 0 || self.pruned > 0 || self.removed_blank_lines > 0 || self.inserted_separators > 0
    }
}

/// Parse the buffer's current contents
pub fn parse_buffer(
    provider: &dyn SyntaxProvider,
    buffer: &dyn LineBuffer,
) -> Result<Box<dyn SyntaxTree>, SortError> {
    let source = buffer.text()?;
    let tree = provider.parse(&source)?;
    if tree.language() != provider.language() {
        return Err(SortError::LanguageMismatch {
            expected: provider.language().to_string(),
            found: tree.language().to_string(),
        });
    }
    Ok(tree)
}

pub struct Sorter<'a> {
    config: SortConfig,
    provider: Option<&'a dyn SyntaxProvider>,
    diagnostics: Option<&'a dyn DiagnosticsProvider>,
}

impl<'a> Sorter<'a> {
    pub fn new(config: SortConfig) -> Self {
        Self {
            config,
            provider: None,
            diagnostics: None,
        }
    }

    pub fn with_provider(mut self, provider: &'a dyn SyntaxProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: &'a dyn DiagnosticsProvider) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Sort every enabled declaration group in `buffer`
    pub fn run(&self, buffer: &mut dyn LineBuffer) -> Result<Report, SortError> {
        let provider = self.provider.ok_or(SortError::MissingParser)?;

        if let Some(found) = buffer.language() {
            if found != provider.language() {
                return Err(SortError::LanguageMismatch {
                    expected: provider.language().to_string(),
                    found: found.to_string(),
                });
            }
        }

        // fail on a missing or broken tree before any mutation
        let tree = parse_buffer(provider, buffer)?;

        let mut session = RenderSession::new(self.config);
        let mut report = Report::default();

        if self.config.sorts_class_members() {
            self.sort_class_members(buffer, provider, &mut session, tree)?;
        }
        let member_writes = session.writes();

        if self.config.sort_namespace_uses {
            self.sort_runs(buffer, provider, &mut session, |tree, buffer| {
                extract_imports(tree, buffer)
            }, Category::ImportUse)?;
        }
        let import_writes = session.writes() - member_writes;

        let mut pruned_import_spans = Vec::new();
        if self.config.remove_unused_imports {
            let (pruned, spans) = self.prune_imports(buffer, provider, &mut report.failures)?;
            report.pruned = pruned;
            pruned_import_spans = spans;
        }

        report.writes = session.writes();
        report.failures.extend(session.take_failures());

        let targets = NormalizeTargets {
            imports: import_writes > 0 || report.pruned > 0,
            members: member_writes > 0,
            pruned_import_spans,
        };
        if targets.imports || targets.members {
            let outcome = normalize(buffer, provider, &self.config, targets)?;
            report.removed_blank_lines = outcome.removed_blank_lines;
            report.inserted_separators = outcome.inserted_separators;
            report.failures.extend(outcome.failures);
        }

        if report.changed() {
            info!(
                "sorted buffer: {} rewrite(s), {} import(s) pruned, {} failure(s)",
                report.writes,
                report.pruned,
                report.failures.len()
            );
        }
        Ok(report)
    }

    fn sort_class_members(
        &self,
        buffer: &mut dyn LineBuffer,
        provider: &dyn SyntaxProvider,
        session: &mut RenderSession,
        tree: Box<dyn SyntaxTree>,
    ) -> Result<(), SortError> {
        let categories = [
            (Category::TraitUse, self.config.sort_traits),
            (Category::Constant, self.config.sort_constants),
            (Category::Property, self.config.sort_properties),
        ];

        // rewrites never add or remove scopes, so indices stay stable
        let scope_count = scopes(tree.as_ref()).len();
        drop(tree);

        for index in 0..scope_count {
            for (category, enabled) in categories {
                if !enabled {
                    continue;
                }
                self.sort_runs(
                    buffer,
                    provider,
                    session,
                    |tree, buffer| {
                        let Some(region) = scopes(tree).get(index).copied() else {
                            return Ok(ElementGroup::default());
                        };
                        let scope = extract(tree, buffer, region)?;
                        Ok(scope.group(category).cloned().unwrap_or_default())
                    },
                    category,
                )?;
            }
        }

        Ok(())
    }

    /// Sort each run of one group top-down, re-extracting after every write
    fn sort_runs<F>(
        &self,
        buffer: &mut dyn LineBuffer,
        provider: &dyn SyntaxProvider,
        session: &mut RenderSession,
        select: F,
        category: Category,
    ) -> Result<(), SortError>
    where
        F: Fn(&dyn SyntaxTree, &dyn LineBuffer) -> Result<ElementGroup, SortError>,
    {
        let use_visibility = matches!(category, Category::Constant | Category::Property);
        let is_property_group = category == Category::Property;

        let mut cached: Option<Vec<ElementGroup>> = None;
        let mut run_index = 0;

        loop {
            let runs = match cached.take() {
                Some(runs) => runs,
                None => {
                    let tree = parse_buffer(provider, buffer)?;
                    let group = select(tree.as_ref(), buffer)?;
                    runs_in(buffer, &group)?
                }
            };
            let Some(run) = runs.get(run_index) else {
                break;
            };
            run_index += 1;

            if run.has_overlap() {
                debug!("skipping {:?} run sharing lines at {:?}", category, run.union_range());
                cached = Some(runs);
                continue;
            }

            if !session.sort_and_render(buffer, run, use_visibility, is_property_group) {
                cached = Some(runs);
            }
        }

        Ok(())
    }

    /// Delete unused imports
    ///
    /// Returns the deletion count and the rows each import run covers afterwards.
    fn prune_imports(
        &self,
        buffer: &mut dyn LineBuffer,
        provider: &dyn SyntaxProvider,
        failures: &mut Vec<SortError>,
    ) -> Result<(usize, Vec<Range<usize>>), SortError> {
        let Some(diagnostics) = self.diagnostics else {
            warn!("unused import removal enabled without a diagnostics provider");
            return Ok((0, Vec::new()));
        };

        let tree = parse_buffer(provider, buffer)?;
        let imports = extract_imports(tree.as_ref(), buffer)?;
        if imports.is_empty() {
            return Ok((0, Vec::new()));
        }
        let spans: Vec<LineRange> = runs_in(buffer, &imports)?
            .iter()
            .filter_map(ElementGroup::union_range)
            .collect();

        let set = diagnostics.diagnose(&buffer.text()?);
        let outcome = prune_unused(buffer, &imports.elements, |row| set.is_unused(row));
        failures.extend(outcome.failures);
        if outcome.deleted.is_empty() {
            return Ok((0, Vec::new()));
        }

        let shifted = spans.iter().map(|span| shift_span(*span, &outcome.deleted)).collect();
        Ok((outcome.deleted.len(), shifted))
    }
}

/// Rows `span` occupies once the `deleted` lines are gone
fn shift_span(span: LineRange, deleted: &[LineRange]) -> Range<usize> {
    let above: usize = deleted.iter().filter(|d| d.end < span.start).map(LineRange::len).sum();
    let inside: usize = deleted
        .iter()
        .filter(|d| d.start >= span.start && d.end <= span.end)
        .map(LineRange::len)
        .sum();
    let (start, _) = span.rows();
    let start = start - above;
    start..start + span.len() - inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::prune::{Diagnostic, DiagnosticSet};
    use crate::testing::LineProvider;

    fn run(source: &str, config: SortConfig) -> (String, Report) {
        let provider = LineProvider;
        let mut buffer = MemoryBuffer::from_source(source).with_language("php");
        let report = Sorter::new(config)
            .with_provider(&provider)
            .run(&mut buffer)
            .unwrap();
        (buffer.to_source(), report)
    }

    #[test]
    fn test_missing_parser() {
        let mut buffer = MemoryBuffer::from_source("<?php\n");
        let err = Sorter::new(SortConfig::default()).run(&mut buffer).unwrap_err();
        assert!(matches!(err, SortError::MissingParser));
    }

    #[test]
    fn test_language_mismatch_aborts_before_mutation() {
        let provider = LineProvider;
        let mut buffer = MemoryBuffer::from_source("use B;\nuse A;\n").with_language("lua");
        let err = Sorter::new(SortConfig::default())
            .with_provider(&provider)
            .run(&mut buffer)
            .unwrap_err();

        assert!(matches!(err, SortError::LanguageMismatch { ref found, .. } if found == "lua"));
        assert_eq!(buffer.to_source(), "use B;\nuse A;\n");
    }

    #[test]
    fn test_sorts_members_and_imports() {
        let source = "\
<?php
use B;
use A;
class X {
    use T2;
    use T1;
    const B = 2;
    const A = 1;
    public $b;
    private $a;
}
";
        let (out, report) = run(source, SortConfig::default());
        assert_eq!(
            out,
            "\
<?php
use A;
use B;
class X {
    use T1;
    use T2;
    const A = 1;
    const B = 2;

    private $a;

    public $b;
}
"
        );
        assert_eq!(report.writes, 4);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let source = "<?php\nuse C;\n\nuse A;\nclass X {\n    public $z;\n    protected $y;\n    // x\n    private $x;\n}\n";
        let (once, report) = run(source, SortConfig::default());
        assert!(report.changed());

        let (twice, report) = run(&once, SortConfig::default());
        assert_eq!(once, twice);
        assert!(!report.changed());
    }

    #[test]
    fn test_disabled_categories_untouched() {
        let source = "<?php\nuse B;\nuse A;\nclass X {\n    public $b;\n    public $a;\n}\n";
        let config = SortConfig {
            sort_namespace_uses: false,
            ..SortConfig::default()
        };
        let (out, _) = run(source, config);
        assert!(out.starts_with("<?php\nuse B;\nuse A;\n"));
        assert!(out.contains("    public $a;\n    public $b;\n"));
    }

    #[test]
    fn test_runs_split_by_other_members() {
        let source = "<?php\nclass X {\n    public $b;\n    public $a;\n    function f() {}\n    public $d;\n    public $c;\n}\n";
        let config = SortConfig {
            add_visibility_spacing: false,
            ..SortConfig::default()
        };
        let (out, report) = run(source, config);
        assert_eq!(
            out,
            "<?php\nclass X {\n    public $a;\n    public $b;\n    function f() {}\n    public $c;\n    public $d;\n}\n"
        );
        assert_eq!(report.writes, 2);
    }

    #[test]
    fn test_visibility_cursor_spans_classes() {
        let class = "    public $b;\n    public $a;\n}\n";
        let source = format!("<?php\nclass A {{\n{class}class B {{\n{class}");
        let (out, _) = run(&source, SortConfig::default());

        // only the first class opens with a separator; B follows a public property of A
        assert_eq!(
            out,
            "<?php\nclass A {\n\n    public $a;\n    public $b;\n}\nclass B {\n    public $a;\n    public $b;\n}\n"
        );
    }

    struct Flagged(Vec<usize>);

    impl DiagnosticsProvider for Flagged {
        fn diagnose(&self, _source: &str) -> DiagnosticSet {
            DiagnosticSet::new(self.0.iter().map(|row| Diagnostic::new(*row, "Unused import")))
        }
    }

    #[test]
    fn test_prunes_flagged_imports() {
        let provider = LineProvider;
        let diagnostics = Flagged(vec![1, 3]);
        let config = SortConfig {
            remove_unused_imports: true,
            ..SortConfig::default()
        };
        let mut buffer = MemoryBuffer::from_source("<?php\nuse A;\nuse B;\nuse C;\n");
        let report = Sorter::new(config)
            .with_provider(&provider)
            .with_diagnostics(&diagnostics)
            .run(&mut buffer)
            .unwrap();

        assert_eq!(report.pruned, 2);
        assert_eq!(buffer.to_source(), "<?php\nuse B;\n");
    }

    #[test]
    fn test_pruned_import_between_blank_lines() {
        let provider = LineProvider;
        let diagnostics = Flagged(vec![2, 5]);
        let config = SortConfig {
            remove_unused_imports: true,
            ..SortConfig::default()
        };
        let mut buffer = MemoryBuffer::from_source("<?php\n\nuse A;\nuse B;\n\nuse C;\n\nnew B();\n");
        let report = Sorter::new(config)
            .with_provider(&provider)
            .with_diagnostics(&diagnostics)
            .run(&mut buffer)
            .unwrap();

        assert_eq!(report.pruned, 2);
        assert_eq!(buffer.to_source(), "<?php\n\nuse B;\n\nnew B();\n");
    }

    #[test]
    fn test_shift_span() {
        // run at lines 3..=6 with lines 1, 3 and 6 deleted
        let deleted = [LineRange::new(6, 6), LineRange::new(3, 3), LineRange::new(1, 1)];
        assert_eq!(shift_span(LineRange::new(3, 6), &deleted), 1..3);
        assert_eq!(shift_span(LineRange::new(8, 9), &deleted), 4..6);
    }

    #[test]
    fn test_write_failure_is_reported_not_fatal() {
        let provider = LineProvider;
        let mut buffer = MemoryBuffer::from_source("<?php\nuse B;\nuse A;\n").read_only();
        let report = Sorter::new(SortConfig::default())
            .with_provider(&provider)
            .run(&mut buffer)
            .unwrap();

        assert_eq!(report.writes, 0);
        assert_eq!(report.failures.len(), 1);
    }
}
