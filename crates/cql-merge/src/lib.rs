//! CQL library merge/flatten engine
//!
//! Combines a primary CQL library with its dependency libraries into one
//! self-contained, dependency-free library: every declaration referenced
//! from a dependency is inlined, name collisions resolve first-wins, and
//! `include` statements disappear from the output.
//!
//! # Example
//!
//! ```ignore
//! use cql_merge::{RawCql, export_cql, import_cql};
//!
//! let primary = RawCql::new(std::fs::read_to_string("Standard.cql")?);
//! let commons = RawCql::new(std::fs::read_to_string("Commons.cql")?);
//!
//! let group = import_cql(primary, vec![commons])?;
//! let flattened = export_cql(&group);
//! ```
//!
//! The pipeline is pure and synchronous: no I/O, no caching, no shared
//! state between invocations.

mod export;
mod import;
mod merge;

pub use export::{export, export_cql};
pub use import::import_cql;
pub use merge::merge;

// Re-export the underlying crates
pub use cql_merge_ast as ast;
pub use cql_merge_diagnostics as diagnostics;
pub use cql_merge_parser as parser;

// Convenience re-exports
pub use cql_merge_ast::{
    CqlLibrary, CqlLibraryGroup, Declaration, DeclarationKind, DependencyOutcome, MergedLibrary,
    RawCql,
};
pub use cql_merge_diagnostics::{CqlError, Result};
