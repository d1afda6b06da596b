//! Line-oriented fake syntax provider for engine tests

use crate::error::SortError;
use crate::syntax::{NodeId, NodeKind, NodeTable, Point, SyntaxProvider, SyntaxTree};

/// Classifies one statement per line: `class` opens a scope closed by `}`,
/// `use` is an import or trait use, `const` and `$...;` lines are class
/// members, `//` lines are comments.
pub(crate) struct LineProvider;

impl SyntaxProvider for LineProvider {
    fn language(&self) -> &str {
        "php"
    }

    fn parse(&self, source: &str) -> Result<Box<dyn SyntaxTree>, SortError> {
        let lines: Vec<&str> = source.lines().collect();
        let mut table = NodeTable::new("php");
        let mut prev: Option<NodeId> = None;
        let mut scope: Option<NodeId> = None;

        for (row, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            let column = line.len() - line.trim_start().len();
            if trimmed.is_empty() {
                continue;
            }

            if trimmed.starts_with("class ") {
                let end = lines[row..]
                    .iter()
                    .position(|l| l.trim() == "}")
                    .map_or(row, |offset| row + offset);
                let id = table.push(NodeKind::Scope, Point::new(row, column), Point::new(end, 1), trimmed);
                if let Some(p) = prev {
                    table.set_prev_sibling(id, p);
                }
                scope = Some(id);
                prev = None;
                continue;
            }
            if trimmed == "}" {
                prev = scope.take();
                continue;
            }

            let in_scope = scope.is_some();
            let words: Vec<&str> = trimmed.split_whitespace().collect();
            let (kind, modifiers) = if trimmed.starts_with("//") {
                (NodeKind::Comment, Vec::new())
            } else if words.first() == Some(&"use") {
                if in_scope {
                    (NodeKind::TraitUse, Vec::new())
                } else {
                    let kind_words = words
                        .get(1)
                        .filter(|w| matches!(**w, "function" | "const"))
                        .map(|w| vec![w.to_string()])
                        .unwrap_or_default();
                    (NodeKind::ImportUse, kind_words)
                }
            } else if in_scope && words.contains(&"const") {
                (NodeKind::Constant, leading_words(&words))
            } else if in_scope && trimmed.contains('$') && trimmed.ends_with(';') {
                (NodeKind::Property, leading_words(&words))
            } else {
                (NodeKind::Other, Vec::new())
            };

            let id = table.push(kind, Point::new(row, column), Point::new(row, line.len()), trimmed);
            table.set_modifiers(id, modifiers);
            if let Some(p) = prev {
                table.set_prev_sibling(id, p);
            }
            prev = Some(id);
        }

        Ok(Box::new(table))
    }
}

fn leading_words(words: &[&str]) -> Vec<String> {
    words
        .iter()
        .take_while(|w| !w.starts_with('$') && **w != "const")
        .map(|w| w.to_string())
        .collect()
}
