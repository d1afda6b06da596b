//! Element model: one classified declaration and its metadata

use std::fmt;
use std::str::FromStr;

use crate::error::SortError;

/// Kind of declaration an element represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    ImportUse,
    TraitUse,
    Constant,
    Property,
}

/// Access modifier, ordered by sort rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    Private = 1,
    Protected = 2,
    Public = 3,
}

impl Visibility {
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Public => "public",
        }
    }

    /// Parse a modifier token, ignoring ASCII case as PHP does
    pub fn from_keyword(token: &str) -> Option<Visibility> {
        if token.eq_ignore_ascii_case("private") {
            Some(Visibility::Private)
        } else if token.eq_ignore_ascii_case("protected") {
            Some(Visibility::Protected)
        } else if token.eq_ignore_ascii_case("public") {
            Some(Visibility::Public)
        } else {
            None
        }
    }
}

impl FromStr for Visibility {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "protected" => Ok(Visibility::Protected),
            "public" => Ok(Visibility::Public),
            other => Err(SortError::InvalidVisibility(other.to_string())),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive, 1-indexed line interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start >= 1 && start <= end, "invalid line range {start}..={end}");
        Self { start, end }
    }

    /// Build from 0-indexed inclusive tree rows
    pub fn from_rows(start_row: usize, end_row: usize) -> Self {
        Self::new(start_row + 1, end_row + 1)
    }

    pub fn union(self, other: LineRange) -> LineRange {
        LineRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Number of lines covered (never zero)
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Buffer row span (0-indexed, end-exclusive)
    pub fn rows(&self) -> (usize, usize) {
        (self.start - 1, self.end)
    }

    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Leading comment attached to an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub range: LineRange,
    pub lines: Vec<String>,
}

/// One declaration statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub category: Category,
    pub range: LineRange,
    pub lines: Vec<String>,
    pub comment: Option<Comment>,
    /// Immediate modifier tokens of the declaration
    pub modifiers: Vec<String>,
    /// Literal statement text; this is the sort key
    pub text: String,
}

impl Element {
    /// Element whose lines are exactly its text
    pub fn new(category: Category, range: LineRange, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            category,
            range,
            lines: text.lines().map(str::to_string).collect(),
            comment: None,
            modifiers: Vec::new(),
            text,
        }
    }

    pub fn with_modifiers<I, S>(mut self, modifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modifiers = modifiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }

    pub fn sort_key(&self) -> &str {
        &self.text
    }

    /// Explicit visibility modifier, if the declaration carries one
    pub fn explicit_visibility(&self) -> Option<Visibility> {
        self.modifiers.iter().find_map(|m| Visibility::from_keyword(m))
    }

    pub fn visibility(&self, default: Visibility) -> Visibility {
        self.explicit_visibility().unwrap_or(default)
    }

    /// Range covering the element and its attached comment
    pub fn full_range(&self) -> LineRange {
        match &self.comment {
            Some(comment) => self.range.union(comment.range),
            None => self.range,
        }
    }

    /// Key used to detect group boundaries when normalizing blank lines
    ///
    /// Imports group by kind (`function`, `const` or plain), everything else by
    /// resolved visibility.
    pub fn group_key(&self, default: Visibility) -> String {
        match self.category {
            Category::ImportUse | Category::TraitUse => self.modifiers.join(" "),
            Category::Constant | Category::Property => self.visibility(default).to_string(),
        }
    }

    /// Comment lines followed by element lines
    pub fn rendered_lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.lines.len() + 1);
        if let Some(comment) = &self.comment {
            out.extend(comment.lines.iter().cloned());
        }
        out.extend(self.lines.iter().cloned());
        out
    }
}

/// Same-category elements of one scope, in ascending source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementGroup {
    pub elements: Vec<Element>,
}

impl ElementGroup {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Union of all member ranges, comments included
    pub fn union_range(&self) -> Option<LineRange> {
        union_range(&self.elements)
    }

    /// Whether any two members share a line
    pub fn has_overlap(&self) -> bool {
        self.elements
            .windows(2)
            .any(|pair| pair[0].full_range().overlaps(&pair[1].full_range()))
    }

    /// Split into maximal runs whose gaps hold only blank lines
    ///
    /// `is_blank_row` answers for 1-indexed buffer lines.
    pub fn runs(&self, is_blank_row: impl Fn(usize) -> bool) -> Vec<ElementGroup> {
        let mut runs: Vec<ElementGroup> = Vec::new();
        let mut current: Vec<Element> = Vec::new();

        for element in &self.elements {
            if let Some(prev) = current.last() {
                let gap_start = prev.full_range().end + 1;
                let gap_end = element.full_range().start;
                let contiguous = (gap_start..gap_end).all(&is_blank_row);
                if !contiguous {
                    runs.push(ElementGroup::new(std::mem::take(&mut current)));
                }
            }
            current.push(element.clone());
        }

        if !current.is_empty() {
            runs.push(ElementGroup::new(current));
        }

        runs
    }
}

/// Smallest range covering every element and its comment
pub fn union_range(elements: &[Element]) -> Option<LineRange> {
    elements
        .iter()
        .map(Element::full_range)
        .reduce(LineRange::union)
}
