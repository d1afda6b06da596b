//! Comment lookup over parser trivia
//!
//! mago reports comments as trivia beside the statement tree. Adjacent
//! single-line comments (`//` or `#`, one per line) are merged into one block
//! so a multi-line `//` header travels with its declaration.

use mago_syntax::ast::Trivia;

/// Byte span of one comment block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CommentBlock {
    pub start: usize,
    pub end: usize,
}

/// Comment blocks of one file, in source order
#[derive(Debug, Default)]
pub(crate) struct CommentIndex {
    blocks: Vec<CommentBlock>,
}

impl CommentIndex {
    /// Build from the comment trivia of a parsed program
    pub fn from_comments<'t, 'a: 't>(source: &str, comments: impl Iterator<Item = &'t Trivia<'a>>) -> Self {
        let spans = comments.map(|comment| {
            (
                comment.span.start.offset as usize,
                comment.span.end.offset as usize,
                comment.kind.is_single_line_comment(),
            )
        });
        Self::from_spans(source, spans)
    }

    /// Build from `(start, end, is_single_line)` comment spans
    pub fn from_spans(source: &str, spans: impl IntoIterator<Item = (usize, usize, bool)>) -> Self {
        let mut spans: Vec<(usize, usize, bool)> = spans
            .into_iter()
            .map(|(start, end, single_line)| {
                // single-line trivia may include the line break
                let end = start + source.get(start..end).map_or(0, |text| text.trim_end().len());
                (start, end, single_line)
            })
            .collect();
        spans.sort_by_key(|span| span.0);

        let mut blocks: Vec<CommentBlock> = Vec::new();
        let mut last_single_line = false;
        for (start, end, single_line) in spans {
            if let Some(last) = blocks.last_mut() {
                if last_single_line && single_line && on_next_line(source, last.end, start) {
                    last.end = end;
                    continue;
                }
            }
            blocks.push(CommentBlock { start, end });
            last_single_line = single_line;
        }

        Self { blocks }
    }

    /// The block between `gap_start` and `node_start` followed only by whitespace
    pub fn before(&self, source: &str, gap_start: usize, node_start: usize) -> Option<CommentBlock> {
        let index = self.blocks.partition_point(|block| block.end <= node_start);
        let block = *self.blocks.get(index.checked_sub(1)?)?;
        if block.start < gap_start {
            return None;
        }
        source
            .get(block.end..node_start)
            .is_some_and(|between| between.trim().is_empty())
            .then_some(block)
    }
}

/// Whether `next` starts the line after `prev_end`, with nothing but indentation before it
fn on_next_line(source: &str, prev_end: usize, next: usize) -> bool {
    source
        .get(prev_end..next)
        .is_some_and(|between| between.trim().is_empty() && between.matches('\n').count() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(source: &str, needle: &str, single_line: bool) -> (usize, usize, bool) {
        let start = source.find(needle).unwrap();
        (start, start + needle.len(), single_line)
    }

    #[test]
    fn test_adjacent_line_comments_merge() {
        let source = "<?php\n// one\n// two\n$a = 1;\n";
        let index = CommentIndex::from_spans(
            source,
            [span(source, "// one\n", true), span(source, "// two", true)],
        );
        let node = source.find("$a").unwrap();
        let block = index.before(source, 0, node).unwrap();
        assert_eq!(&source[block.start..block.end], "// one\n// two");
    }

    #[test]
    fn test_blank_line_splits_line_comments() {
        let source = "<?php\n// one\n\n// two\n$a = 1;\n";
        let index = CommentIndex::from_spans(
            source,
            [span(source, "// one", true), span(source, "// two", true)],
        );
        let block = index.before(source, 0, source.find("$a").unwrap()).unwrap();
        assert_eq!(&source[block.start..block.end], "// two");
    }

    #[test]
    fn test_doc_block_is_not_merged_with_line_comment() {
        let source = "<?php\n// note\n/** doc */\n$a = 1;\n";
        let index = CommentIndex::from_spans(
            source,
            [span(source, "// note", true), span(source, "/** doc */", false)],
        );
        let block = index.before(source, 0, source.find("$a").unwrap()).unwrap();
        assert_eq!(&source[block.start..block.end], "/** doc */");
    }

    #[test]
    fn test_code_between_comment_and_node() {
        let source = "<?php\n// note\n$b = 2;\n$a = 1;\n";
        let index = CommentIndex::from_spans(source, [span(source, "// note", true)]);
        assert!(index.before(source, 0, source.find("$a").unwrap()).is_none());
    }

    #[test]
    fn test_comment_before_gap_start_is_ignored() {
        let source = "<?php\n// note\n$a = 1;\n";
        let index = CommentIndex::from_spans(source, [span(source, "// note", true)]);
        let node = source.find("$a").unwrap();
        assert!(index.before(source, node - 1, node).is_none());
    }
}
