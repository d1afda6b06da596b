//! phpsort-php: PHP support for phpsort
//!
//! - `PhpSyntaxProvider`: mago-syntax parse into a `NodeTable`
//! - `UnusedImportDiagnostics`: heuristic unused-import oracle

mod comments;
pub mod parser;
pub mod unused;

pub use parser::{build_tree, PhpSyntaxProvider, LANGUAGE};
pub use unused::UnusedImportDiagnostics;
