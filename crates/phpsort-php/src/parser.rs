//! mago-backed syntax provider
//!
//! Walks top-level statements (descending into namespaces) and the member
//! lists of classes, interfaces, traits and enums. Method bodies are never
//! entered, so anonymous classes and closures are not scopes.

use bumpalo::Bump;
use log::debug;
use mago_database::file::FileId;
use mago_span::{HasSpan, Span};
use mago_syntax::ast::{ClassLikeMember, Modifier, NamespaceBody, Property, Statement};

use phpsort_core::{NodeId, NodeKind, NodeTable, Point, SortError, SyntaxProvider, SyntaxTree};

use crate::comments::CommentIndex;

pub const LANGUAGE: &str = "php";

/// Parses PHP source into a flat node table
#[derive(Debug, Default, Clone, Copy)]
pub struct PhpSyntaxProvider;

impl SyntaxProvider for PhpSyntaxProvider {
    fn language(&self) -> &str {
        LANGUAGE
    }

    fn parse(&self, source: &str) -> Result<Box<dyn SyntaxTree>, SortError> {
        Ok(Box::new(build_tree(source)?))
    }
}

/// Parse `source` and collect every declaration node the sorter cares about
pub fn build_tree(source: &str) -> Result<NodeTable, SortError> {
    let arena = Bump::new();
    let file_id = FileId::new("buffer");
    let (program, parse_error) = mago_syntax::parser::parse_file_content(&arena, file_id, source);

    if let Some(error) = parse_error {
        return Err(SortError::Syntax(error.to_string()));
    }

    let comments = CommentIndex::from_comments(source, program.trivia.comments());
    let mut builder = TreeBuilder::new(source, comments);
    builder.walk_statements(program.statements.iter(), 0);
    debug!("parsed {} node(s)", builder.table.nodes().len());
    Ok(builder.table)
}

/// Byte offset to row/column conversion
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn point(&self, offset: usize) -> Point {
        let row = self.starts.partition_point(|&start| start <= offset).saturating_sub(1);
        Point::new(row, offset - self.starts[row])
    }

    /// Point just past the last byte of `start..end`
    fn end_point(&self, start: usize, end: usize) -> Point {
        let last = self.point(end.max(start + 1) - 1);
        Point::new(last.row, last.column + 1)
    }
}

struct TreeBuilder<'s> {
    source: &'s str,
    index: LineIndex,
    comments: CommentIndex,
    table: NodeTable,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str, comments: CommentIndex) -> Self {
        Self {
            source,
            index: LineIndex::new(source),
            comments,
            table: NodeTable::new(LANGUAGE),
        }
    }

    fn get_text(&self, span: Span) -> &'s str {
        &self.source[span.start.offset as usize..span.end.offset as usize]
    }

    fn walk_statements<'m, 'a: 'm>(
        &mut self,
        statements: impl Iterator<Item = &'m Statement<'a>>,
        mut gap_start: usize,
    ) {
        let mut prev: Option<NodeId> = None;

        for stmt in statements {
            let span = stmt.span();
            let id = match stmt {
                Statement::Use(_) => {
                    let id = self.push(NodeKind::ImportUse, span, prev, gap_start);
                    let kind = import_kind(self.get_text(span));
                    self.table.set_modifiers(id, kind.into_iter().collect());
                    id
                }
                Statement::Namespace(ns) => {
                    let id = self.push(NodeKind::Other, span, prev, gap_start);
                    let statements = match &ns.body {
                        NamespaceBody::Implicit(body) => &body.statements,
                        NamespaceBody::BraceDelimited(body) => &body.statements,
                    };
                    self.walk_statements(statements.iter(), span.start.offset as usize);
                    id
                }
                Statement::Class(class) => {
                    let id = self.push(NodeKind::Scope, span, prev, gap_start);
                    self.walk_members(class.members.iter(), span.start.offset as usize);
                    id
                }
                Statement::Interface(iface) => {
                    let id = self.push(NodeKind::Scope, span, prev, gap_start);
                    self.walk_members(iface.members.iter(), span.start.offset as usize);
                    id
                }
                Statement::Trait(trait_def) => {
                    let id = self.push(NodeKind::Scope, span, prev, gap_start);
                    self.walk_members(trait_def.members.iter(), span.start.offset as usize);
                    id
                }
                Statement::Enum(enum_def) => {
                    let id = self.push(NodeKind::Scope, span, prev, gap_start);
                    self.walk_members(enum_def.members.iter(), span.start.offset as usize);
                    id
                }
                _ => self.push(NodeKind::Other, span, prev, gap_start),
            };

            prev = Some(id);
            gap_start = span.end.offset as usize;
        }
    }

    fn walk_members<'m, 'a: 'm>(
        &mut self,
        members: impl Iterator<Item = &'m ClassLikeMember<'a>>,
        mut gap_start: usize,
    ) {
        let mut prev: Option<NodeId> = None;

        for member in members {
            let span = member.span();
            let (kind, modifiers) = match member {
                ClassLikeMember::TraitUse(_) => (NodeKind::TraitUse, Vec::new()),
                ClassLikeMember::Constant(constant) => {
                    (NodeKind::Constant, self.modifier_texts(constant.modifiers.iter()))
                }
                ClassLikeMember::Property(Property::Plain(prop)) => {
                    (NodeKind::Property, self.modifier_texts(prop.modifiers.iter()))
                }
                ClassLikeMember::Property(Property::Hooked(hooked)) => {
                    (NodeKind::Property, self.modifier_texts(hooked.modifiers.iter()))
                }
                _ => (NodeKind::Other, Vec::new()),
            };

            let id = self.push(kind, span, prev, gap_start);
            self.table.set_modifiers(id, modifiers);
            prev = Some(id);
            gap_start = span.end.offset as usize;
        }
    }

    fn modifier_texts<'m, 'a: 'm>(&self, modifiers: impl Iterator<Item = &'m Modifier<'a>>) -> Vec<String> {
        modifiers.map(|m| self.get_text(m.span()).to_string()).collect()
    }

    /// Push a node, preceded by the comment that ends the gap before it
    fn push(&mut self, kind: NodeKind, span: Span, prev: Option<NodeId>, gap_start: usize) -> NodeId {
        let start = span.start.offset as usize;
        let end = span.end.offset as usize;
        let mut prev = prev;

        if let Some(block) = self.comments.before(self.source, gap_start, start) {
            let id = self.table.push(
                NodeKind::Comment,
                self.index.point(block.start),
                self.index.end_point(block.start, block.end),
                &self.source[block.start..block.end],
            );
            if let Some(p) = prev {
                self.table.set_prev_sibling(id, p);
            }
            prev = Some(id);
        }

        let id = self.table.push(
            kind,
            self.index.point(start),
            self.index.end_point(start, end),
            &self.source[start..end],
        );
        if let Some(p) = prev {
            self.table.set_prev_sibling(id, p);
        }
        id
    }
}

/// `function` or `const` for non-class imports
fn import_kind(text: &str) -> Option<String> {
    let rest = text.get(3..)?.trim_start();
    let word: String = rest.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let word = word.to_ascii_lowercase();
    matches!(word.as_str(), "function" | "const").then_some(word)
}
