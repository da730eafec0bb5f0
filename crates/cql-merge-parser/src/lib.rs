//! CQL parsing pipeline for the merge engine
//!
//! Three layers, each usable on its own:
//! - [`tokenize`]: source text to a flat token stream (winnow lexer),
//! - [`parse`] / [`parse_tokens`]: token stream to a concrete parse tree,
//! - [`Visitor`]: parse tree to normalized [`cql_merge_ast::Declaration`]s.
//!
//! All errors are returned as values; nothing is ever reported to the
//! console, so callers choose between fail-fast and best-effort handling.

mod lexer;
mod parser;
mod tree;
mod visitor;

pub use lexer::{Token, TokenKind, is_keyword, tokenize};
pub use parser::{parse, parse_tokens};
pub use tree::{ParseTree, SyntaxKind, SyntaxNode};
pub use visitor::{Visitor, normalize_identifier, string_value};
