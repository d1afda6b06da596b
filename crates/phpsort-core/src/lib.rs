//! phpsort-core: ordering and minimal-rewrite engine for PHP declarations
//!
//! This crate provides:
//! - `Element`: a classified declaration (import, trait use, constant, property)
//! - `compare()`: visibility-then-text ordering
//! - `extract()`: syntax-tree captures to element groups
//! - `RenderSession`: stable sort, change detection and minimal rewrite
//! - `prune_unused()`: bottom-up deletion of unused declarations
//! - `normalize()`: blank-line cleanup around reordered groups
//! - `Sorter`: the "sort elements" command tying the passes together
//!
//! Parsing, diagnostics and storage are collaborators behind the
//! `SyntaxProvider`, `DiagnosticsProvider` and `LineBuffer` traits.

mod buffer;
mod compare;
mod config;
mod element;
mod engine;
mod error;
pub mod extract;
mod normalize;
mod prune;
mod render;
pub mod syntax;

#[cfg(test)]
mod testing;

pub use buffer::{is_blank, LineBuffer, MemoryBuffer};
pub use compare::{compare, ordering};
pub use config::SortConfig;
pub use element::{union_range, Category, Comment, Element, ElementGroup, LineRange, Visibility};
pub use engine::{parse_buffer, Report, Sorter};
pub use error::{BufferError, SortError};
pub use extract::{extract, extract_imports, Region, ScopeElements};
pub use normalize::{normalize, NormalizeOutcome, NormalizeTargets};
pub use prune::{prune_unused, Diagnostic, DiagnosticSet, DiagnosticsProvider, PruneOutcome};
pub use render::RenderSession;
pub use syntax::{Capture, CaptureName, NodeId, NodeKind, NodeTable, Point, SyntaxNode, SyntaxProvider, SyntaxTree};
