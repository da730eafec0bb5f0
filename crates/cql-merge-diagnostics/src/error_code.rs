//! Structured error codes for the merge engine
//!
//! Error code ranges:
//! - CQL0001-CQL0099: lexical and syntax errors
//! - CQL0100-CQL0199: import and merge errors
//! - CQL0400-CQL0499: system errors (I/O, configuration)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a lexical or syntax error (0001-0099)
    pub const fn is_syntax_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is an import or merge error (0100-0199)
    pub const fn is_import_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CQL{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Lexical and syntax errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unexpected token"));
    map.insert(2, ErrorInfo::new("Unexpected end of input"));
    map.insert(3, ErrorInfo::new("Unexpected character"));
    map.insert(4, ErrorInfo::new("Unterminated string literal"));
    map.insert(5, ErrorInfo::new("Unterminated quoted identifier"));
    map.insert(6, ErrorInfo::new("Unterminated block comment"));
    map.insert(7, ErrorInfo::new("Expected identifier"));
    map.insert(8, ErrorInfo::new("Expected string literal"));
    map.insert(9, ErrorInfo::new("Unbalanced delimiter"));
    map.insert(17, ErrorInfo::new("Invalid library definition"));
    map.insert(18, ErrorInfo::new("Invalid using definition"));
    map.insert(19, ErrorInfo::new("Invalid include definition"));
    map.insert(20, ErrorInfo::new("Invalid parameter definition"));
    map.insert(21, ErrorInfo::new("Invalid codesystem definition"));
    map.insert(22, ErrorInfo::new("Invalid valueset definition"));
    map.insert(23, ErrorInfo::new("Invalid code definition"));
    map.insert(24, ErrorInfo::new("Invalid concept definition"));
    map.insert(25, ErrorInfo::new("Invalid context definition"));
    map.insert(26, ErrorInfo::new("Invalid function definition"));
    map.insert(27, ErrorInfo::new("Invalid expression definition"));

    // Import and merge errors (0100-0199)
    map.insert(
        100,
        ErrorInfo::new("Primary library failed to parse")
            .with_help("The primary library must be syntactically valid before it can be merged"),
    );
    map.insert(
        101,
        ErrorInfo::new("Dependency library failed to parse")
            .with_help("Unparseable dependencies are skipped; their declarations are not inlined"),
    );

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("I/O error"));
    map.insert(401, ErrorInfo::new("Invalid input encoding"));

    map
});

// Lexical and syntax errors
pub const CQL0001: ErrorCode = ErrorCode::new(1);
pub const CQL0002: ErrorCode = ErrorCode::new(2);
pub const CQL0003: ErrorCode = ErrorCode::new(3);
pub const CQL0004: ErrorCode = ErrorCode::new(4);
pub const CQL0005: ErrorCode = ErrorCode::new(5);
pub const CQL0006: ErrorCode = ErrorCode::new(6);
pub const CQL0007: ErrorCode = ErrorCode::new(7);
pub const CQL0008: ErrorCode = ErrorCode::new(8);
pub const CQL0009: ErrorCode = ErrorCode::new(9);
pub const CQL0017: ErrorCode = ErrorCode::new(17);
pub const CQL0018: ErrorCode = ErrorCode::new(18);
pub const CQL0019: ErrorCode = ErrorCode::new(19);
pub const CQL0020: ErrorCode = ErrorCode::new(20);
pub const CQL0021: ErrorCode = ErrorCode::new(21);
pub const CQL0022: ErrorCode = ErrorCode::new(22);
pub const CQL0023: ErrorCode = ErrorCode::new(23);
pub const CQL0024: ErrorCode = ErrorCode::new(24);
pub const CQL0025: ErrorCode = ErrorCode::new(25);
pub const CQL0026: ErrorCode = ErrorCode::new(26);
pub const CQL0027: ErrorCode = ErrorCode::new(27);

// Import and merge errors
pub const CQL0100: ErrorCode = ErrorCode::new(100);
pub const CQL0101: ErrorCode = ErrorCode::new(101);

// System errors
pub const CQL0400: ErrorCode = ErrorCode::new(400);
pub const CQL0401: ErrorCode = ErrorCode::new(401);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display() {
        assert_eq!(CQL0001.to_string(), "CQL0001");
        assert_eq!(CQL0100.to_string(), "CQL0100");
    }

    #[test]
    fn test_code_ranges() {
        assert!(CQL0004.is_syntax_error());
        assert!(!CQL0004.is_import_error());
        assert!(CQL0100.is_import_error());
        assert!(CQL0400.is_system_error());
    }

    #[test]
    fn test_code_info() {
        assert_eq!(CQL0004.info().description, "Unterminated string literal");
        assert!(CQL0100.info().help.is_some());
        assert_eq!(ErrorCode::new(999).info().description, "Unknown error");
    }
}
