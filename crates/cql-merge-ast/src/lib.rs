//! Normalized data model for the CQL merge engine
//!
//! Declarations are the unit the merge works with: typed records that keep
//! the literal source text so unmodified declarations re-serialize
//! byte-for-byte.

mod declaration;
mod library;

pub use declaration::*;
pub use library::*;
