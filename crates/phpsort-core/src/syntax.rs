//! Syntax-tree provider interface
//!
//! The engine does not parse. A [`SyntaxProvider`] turns buffer text into a
//! [`SyntaxTree`] that can answer three questions: which declarations of
//! interest start in a row range, where a node sits, and what its previous
//! sibling is. [`NodeTable`] is an owned tree that any parser can populate.

use crate::error::SortError;

pub type NodeId = usize;

/// Position in the source, 0-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Body of a class, interface, trait or enum
    Scope,
    ImportUse,
    TraitUse,
    Constant,
    Property,
    Comment,
    Other,
}

/// Name under which a query reports a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureName {
    Scope,
    ImportUse,
    TraitUse,
    Constant,
    Property,
}

impl NodeKind {
    pub fn capture_name(self) -> Option<CaptureName> {
        match self {
            NodeKind::Scope => Some(CaptureName::Scope),
            NodeKind::ImportUse => Some(CaptureName::ImportUse),
            NodeKind::TraitUse => Some(CaptureName::TraitUse),
            NodeKind::Constant => Some(CaptureName::Constant),
            NodeKind::Property => Some(CaptureName::Property),
            NodeKind::Comment | NodeKind::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    id: NodeId,
    kind: NodeKind,
    start: Point,
    end: Point,
    text: String,
    modifiers: Vec<String>,
    prev_sibling: Option<NodeId>,
}

impl SyntaxNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// `(start_row, start_col, end_row, end_col)`
    pub fn range(&self) -> (usize, usize, usize, usize) {
        (self.start.row, self.start.column, self.end.row, self.end.column)
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Modifier tokens that are immediate children of this node
    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }
}

/// A node reported by [`SyntaxTree::iter_captures`]
#[derive(Debug, Clone, Copy)]
pub struct Capture<'t> {
    pub name: CaptureName,
    pub node: &'t SyntaxNode,
}

/// Queryable syntax tree for one buffer snapshot
pub trait SyntaxTree {
    fn language(&self) -> &str;

    /// Captured nodes whose start row lies in `start_row..=end_row`, in document order
    fn iter_captures(&self, start_row: usize, end_row: usize) -> Box<dyn Iterator<Item = Capture<'_>> + '_>;

    fn prev_sibling(&self, node: &SyntaxNode) -> Option<&SyntaxNode>;
}

/// Produces syntax trees for buffer text of one language
pub trait SyntaxProvider: Send + Sync {
    fn language(&self) -> &str;

    fn parse(&self, source: &str) -> Result<Box<dyn SyntaxTree>, SortError>;
}

/// Owned, parser-independent [`SyntaxTree`]
///
/// Nodes must be pushed in document order.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    language: String,
    nodes: Vec<SyntaxNode>,
}

impl NodeTable {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            nodes: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: NodeKind, start: Point, end: Point, text: impl Into<String>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SyntaxNode {
            id,
            kind,
            start,
            end,
            text: text.into(),
            modifiers: Vec::new(),
            prev_sibling: None,
        });
        id
    }

    pub fn set_modifiers(&mut self, node: NodeId, modifiers: Vec<String>) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.modifiers = modifiers;
        }
    }

    pub fn set_prev_sibling(&mut self, node: NodeId, prev: NodeId) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.prev_sibling = Some(prev);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }
}

impl SyntaxTree for NodeTable {
    fn language(&self) -> &str {
        &self.language
    }

    fn iter_captures(&self, start_row: usize, end_row: usize) -> Box<dyn Iterator<Item = Capture<'_>> + '_> {
        Box::new(self.nodes.iter().filter_map(move |node| {
            let name = node.kind.capture_name()?;
            (start_row..=end_row)
                .contains(&node.start.row)
                .then_some(Capture { name, node })
        }))
    }

    fn prev_sibling(&self, node: &SyntaxNode) -> Option<&SyntaxNode> {
        node.prev_sibling.and_then(|id| self.nodes.get(id))
    }
}
