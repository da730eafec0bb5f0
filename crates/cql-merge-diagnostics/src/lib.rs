//! Diagnostics and error handling for the CQL merge engine
//!
//! Error codes, source spans and locations, and the `CqlError` type shared
//! by the lexer, parser, and merge facade.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for merge-engine operations
pub type Result<T> = std::result::Result<T, CqlError>;
