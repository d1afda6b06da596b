//! Sort-and-render engine
//!
//! A group is sorted with a stable sort, compared against its original order,
//! and only when the order changed re-rendered and written back over its union
//! range. Blank lines inside the group are dropped and re-derived from the
//! spacing rules. Statement lines themselves are copied verbatim.

use log::{debug, warn};

use crate::buffer::{is_blank, LineBuffer};
use crate::compare::ordering;
use crate::config::SortConfig;
use crate::element::{Category, Element, ElementGroup, Visibility};
use crate::error::SortError;

/// Per-invocation rendering state
///
/// The rolling cursors carry the category and visibility of the last element
/// seen, across groups, for the whole invocation. They are not reset between
/// classes, so whether a class's first property group opens with a
/// visibility separator depends on the class rendered before it.
#[derive(Debug)]
pub struct RenderSession {
    config: SortConfig,
    prev_category: Option<Category>,
    prev_visibility: Option<Visibility>,
    writes: usize,
    failures: Vec<SortError>,
}

impl RenderSession {
    pub fn new(config: SortConfig) -> Self {
        Self {
            config,
            prev_category: None,
            prev_visibility: None,
            writes: 0,
            failures: Vec::new(),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn failures(&self) -> &[SortError] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<SortError> {
        std::mem::take(&mut self.failures)
    }

    /// Sort `group` and rewrite its lines if the order changed
    ///
    /// Returns whether the buffer was written. Write failures are recorded on
    /// the session and reported as "nothing changed".
    pub fn sort_and_render(
        &mut self,
        buffer: &mut dyn LineBuffer,
        group: &ElementGroup,
        use_visibility: bool,
        is_property_group: bool,
    ) -> bool {
        let Some(range) = group.union_range() else {
            return false;
        };

        let default = self.config.default_visibility;
        let mut sorted = group.elements.clone();
        sorted.sort_by(|a, b| ordering(a, b, use_visibility, default));

        let unchanged = group
            .elements
            .iter()
            .map(Element::sort_key)
            .eq(sorted.iter().map(Element::sort_key));
        if unchanged {
            self.advance(&sorted);
            return false;
        }

        let (start, end) = range.rows();
        let preceding_blank = start > 0
            && buffer
                .get_lines(start - 1, start)
                .is_ok_and(|lines| lines.iter().all(|l| is_blank(l)));

        let rendered = self.render(&sorted, is_property_group, preceding_blank);

        let current = match buffer.get_lines(start, end) {
            Ok(lines) => lines,
            Err(err) => {
                warn!("cannot read lines {}..{}: {}", range.start, range.end, err);
                self.failures.push(SortError::Buffer(err));
                return false;
            }
        };
        if current == rendered {
            debug!("lines {}..{} already rendered", range.start, range.end);
            return false;
        }

        match buffer.set_lines(start, end, rendered) {
            Ok(()) => {
                debug!(
                    "rewrote {} {:?} element(s) at lines {}..{}",
                    sorted.len(),
                    sorted[0].category,
                    range.start,
                    range.end
                );
                self.writes += 1;
                true
            }
            Err(source) => {
                warn!("failed to write lines {}..{}: {}", range.start, range.end, source);
                self.failures.push(SortError::WriteFailure {
                    start: range.start,
                    end: range.end,
                    source,
                });
                false
            }
        }
    }

    /// Render sorted elements to output lines, advancing the cursors
    ///
    /// `preceding_blank` tells whether the line just above the output is blank.
    pub fn render(&mut self, sorted: &[Element], is_property_group: bool, preceding_blank: bool) -> Vec<String> {
        let default = self.config.default_visibility;
        let mut out: Vec<String> = Vec::new();

        for element in sorted {
            let visibility = element.visibility(default);

            if self.config.add_newline_between_const_and_properties
                && element.category == Category::Property
                && self.prev_category == Some(Category::Constant)
                && !ends_blank(&out, preceding_blank)
            {
                out.push(String::new());
            }

            if is_property_group
                && self.config.add_visibility_spacing
                && self.prev_visibility != Some(visibility)
                && !ends_blank(&out, preceding_blank)
            {
                out.push(String::new());
            }

            out.extend(element.rendered_lines());

            self.prev_category = Some(element.category);
            self.prev_visibility = Some(visibility);
        }

        out
    }

    /// Move the cursors past a group that needed no rewrite
    fn advance(&mut self, elements: &[Element]) {
        if let Some(last) = elements.last() {
            self.prev_category = Some(last.category);
            self.prev_visibility = Some(last.visibility(self.config.default_visibility));
        }
    }
}

fn ends_blank(out: &[String], preceding_blank: bool) -> bool {
    out.last().map_or(preceding_blank, |line| is_blank(line))
}
