//! Extractor adapter: tree captures to typed element groups

use log::debug;

use crate::buffer::{is_blank, LineBuffer};
use crate::element::{Category, Comment, Element, ElementGroup, LineRange};
use crate::error::SortError;
use crate::syntax::{CaptureName, NodeKind, SyntaxNode, SyntaxTree};

/// Row range to extract from (0-indexed, inclusive)
///
/// `end_row: None` selects only declarations starting on `start_row`, which is
/// how one-line scopes are scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start_row: usize,
    pub end_row: Option<usize>,
}

impl Region {
    pub fn new(start_row: usize, end_row: usize) -> Self {
        Self {
            start_row,
            end_row: Some(end_row),
        }
    }

    pub fn single(start_row: usize) -> Self {
        Self {
            start_row,
            end_row: None,
        }
    }

    pub fn effective_end(&self) -> usize {
        self.end_row.unwrap_or(self.start_row)
    }
}

/// Declaration groups found in one class-like scope
#[derive(Debug, Clone, Default)]
pub struct ScopeElements {
    pub traits: ElementGroup,
    pub constants: ElementGroup,
    pub properties: ElementGroup,
}

impl ScopeElements {
    pub fn group(&self, category: Category) -> Option<&ElementGroup> {
        match category {
            Category::TraitUse => Some(&self.traits),
            Category::Constant => Some(&self.constants),
            Category::Property => Some(&self.properties),
            Category::ImportUse => None,
        }
    }
}

/// Regions of every class-like body, in source order
pub fn scopes(tree: &dyn SyntaxTree) -> Vec<Region> {
    tree.iter_captures(0, usize::MAX)
        .filter(|capture| capture.name == CaptureName::Scope)
        .map(|capture| {
            let (start_row, _, end_row, _) = capture.node.range();
            if start_row == end_row {
                Region::single(start_row)
            } else {
                Region::new(start_row, end_row)
            }
        })
        .collect()
}

/// Trait uses, constants and properties starting inside `region`
pub fn extract(
    tree: &dyn SyntaxTree,
    buffer: &dyn LineBuffer,
    region: Region,
) -> Result<ScopeElements, SortError> {
    let mut scope = ScopeElements::default();

    for capture in tree.iter_captures(region.start_row, region.effective_end()) {
        let (category, group) = match capture.name {
            CaptureName::TraitUse => (Category::TraitUse, &mut scope.traits),
            CaptureName::Constant => (Category::Constant, &mut scope.constants),
            CaptureName::Property => (Category::Property, &mut scope.properties),
            CaptureName::Scope | CaptureName::ImportUse => continue,
        };
        if let Some(element) = element_from_node(tree, buffer, capture.node, category)? {
            group.elements.push(element);
        }
    }

    Ok(scope)
}

/// Namespace imports of the whole file
pub fn extract_imports(tree: &dyn SyntaxTree, buffer: &dyn LineBuffer) -> Result<ElementGroup, SortError> {
    let mut group = ElementGroup::default();

    for capture in tree.iter_captures(0, usize::MAX) {
        if capture.name != CaptureName::ImportUse {
            continue;
        }
        if let Some(element) = element_from_node(tree, buffer, capture.node, Category::ImportUse)? {
            group.elements.push(element);
        }
    }

    Ok(group)
}

/// Split `group` into runs separated by anything other than blank lines
pub fn runs_in(buffer: &dyn LineBuffer, group: &ElementGroup) -> Result<Vec<ElementGroup>, SortError> {
    if group.is_empty() {
        return Ok(Vec::new());
    }
    let lines = buffer.get_lines(0, buffer.line_count())?;
    Ok(group.runs(|line| lines.get(line - 1).map_or(true, |l| is_blank(l))))
}

/// Build an element, or `None` when the node shares its first line with other code
fn element_from_node(
    tree: &dyn SyntaxTree,
    buffer: &dyn LineBuffer,
    node: &SyntaxNode,
    category: Category,
) -> Result<Option<Element>, SortError> {
    let (start_row, start_col, end_row, _) = node.range();
    let lines = buffer.get_lines(start_row, end_row + 1)?;

    if !starts_own_line(&lines, start_col) {
        debug!("skipping {:?} at line {}: not on its own line", category, start_row + 1);
        return Ok(None);
    }

    Ok(Some(Element {
        category,
        range: LineRange::from_rows(start_row, end_row),
        lines,
        comment: leading_comment(tree, buffer, node)?,
        modifiers: node.modifiers().to_vec(),
        text: node.text().to_string(),
    }))
}

/// Comment directly above `node`: previous sibling, no blank line between, own line
fn leading_comment(
    tree: &dyn SyntaxTree,
    buffer: &dyn LineBuffer,
    node: &SyntaxNode,
) -> Result<Option<Comment>, SortError> {
    let Some(prev) = tree.prev_sibling(node) else {
        return Ok(None);
    };
    if prev.kind() != NodeKind::Comment {
        return Ok(None);
    }

    let (start_row, start_col, end_row, _) = prev.range();
    if end_row + 1 != node.start().row {
        return Ok(None);
    }

    let lines = buffer.get_lines(start_row, end_row + 1)?;
    if !starts_own_line(&lines, start_col) {
        return Ok(None);
    }

    Ok(Some(Comment {
        range: LineRange::from_rows(start_row, end_row),
        lines,
    }))
}

fn starts_own_line(lines: &[String], column: usize) -> bool {
    lines
        .first()
        .and_then(|line| line.get(..column))
        .is_some_and(is_blank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::element::Visibility;
    use crate::syntax::{NodeTable, Point};

    const SOURCE: &str = "<?php
class A
{
    use T;

    // the answer
    private const X = 42;
    /** @var int */

    public $b;
    protected $a; // trailing
}
";

    fn table() -> NodeTable {
        let mut t = NodeTable::new("php");
        t.push(NodeKind::Scope, Point::new(1, 0), Point::new(11, 1), "");
        t.push(NodeKind::TraitUse, Point::new(3, 4), Point::new(3, 10), "use T;");
        let comment = t.push(NodeKind::Comment, Point::new(5, 4), Point::new(5, 17), "// the answer");
        let x = t.push(NodeKind::Constant, Point::new(6, 4), Point::new(6, 25), "private const X = 42;");
        t.set_prev_sibling(x, comment);
        t.set_modifiers(x, vec!["private".to_string()]);
        let doc = t.push(NodeKind::Comment, Point::new(7, 4), Point::new(7, 20), "/** @var int */");
        let b = t.push(NodeKind::Property, Point::new(9, 4), Point::new(9, 14), "public $b;");
        t.set_prev_sibling(b, doc);
        t.set_modifiers(b, vec!["public".to_string()]);
        let a = t.push(NodeKind::Property, Point::new(10, 4), Point::new(10, 17), "protected $a;");
        t.set_prev_sibling(a, b);
        t.set_modifiers(a, vec!["protected".to_string()]);
        t
    }

    #[test]
    fn test_scopes() {
        let t = table();
        assert_eq!(scopes(&t), vec![Region::new(1, 11)]);
    }

    #[test]
    fn test_extract_groups_by_category() {
        let t = table();
        let buffer = MemoryBuffer::from_source(SOURCE);
        let scope = extract(&t, &buffer, Region::new(1, 11)).unwrap();

        assert_eq!(scope.traits.len(), 1);
        assert_eq!(scope.constants.len(), 1);
        assert_eq!(scope.properties.len(), 2);

        let x = &scope.constants.elements[0];
        assert_eq!(x.range, LineRange::new(7, 7));
        assert_eq!(x.lines, vec!["    private const X = 42;".to_string()]);
        assert_eq!(x.visibility(Visibility::Public), Visibility::Private);

        let comment = x.comment.as_ref().unwrap();
        assert_eq!(comment.range, LineRange::new(6, 6));
        assert_eq!(comment.lines, vec!["    // the answer".to_string()]);
    }

    #[test]
    fn test_comment_separated_by_blank_line_is_not_attached() {
        let t = table();
        let buffer = MemoryBuffer::from_source(SOURCE);
        let scope = extract(&t, &buffer, Region::new(1, 11)).unwrap();

        assert!(scope.properties.elements[0].comment.is_none());
        // previous sibling is a property, not a comment
        assert!(scope.properties.elements[1].comment.is_none());
        assert_eq!(scope.properties.elements[1].lines, vec!["    protected $a; // trailing".to_string()]);
    }

    #[test]
    fn test_single_row_region() {
        let t = table();
        let buffer = MemoryBuffer::from_source(SOURCE);
        let scope = extract(&t, &buffer, Region::single(9)).unwrap();
        assert_eq!(scope.properties.len(), 1);
        assert!(scope.constants.is_empty());
    }

    #[test]
    fn test_imports_skip_shared_first_line() {
        let source = "<?php use B;\nuse A;\n";
        let mut t = NodeTable::new("php");
        t.push(NodeKind::ImportUse, Point::new(0, 6), Point::new(0, 12), "use B;");
        t.push(NodeKind::ImportUse, Point::new(1, 0), Point::new(1, 6), "use A;");
        let buffer = MemoryBuffer::from_source(source);

        let imports = extract_imports(&t, &buffer).unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports.elements[0].text, "use A;");
    }

    #[test]
    fn test_out_of_range_node_is_an_error() {
        let mut t = NodeTable::new("php");
        t.push(NodeKind::ImportUse, Point::new(5, 0), Point::new(5, 6), "use A;");
        let buffer = MemoryBuffer::from_source("<?php\n");
        assert!(matches!(extract_imports(&t, &buffer), Err(SortError::Buffer(_))));
    }
}
