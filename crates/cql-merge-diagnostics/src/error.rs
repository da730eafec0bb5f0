//! Error types for the merge engine

use crate::{ErrorCode, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the operation cannot proceed
    Error,
    /// Warning - potential issue but the operation can continue
    Warning,
    /// Informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message with location and optional help text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Source location, if known
    pub location: Option<SourceLocation>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render with ANSI colors for terminal output
    #[cfg(feature = "colored")]
    pub fn render(&self) -> String {
        use colored::Colorize;

        let severity = match self.severity {
            Severity::Error => self.severity.to_string().red().bold(),
            Severity::Warning => self.severity.to_string().yellow().bold(),
            Severity::Info => self.severity.to_string().cyan(),
        };
        let mut out = format!("{severity}: {} - {}", self.code, self.message);
        if let Some(loc) = &self.location {
            out.push_str(&format!(" at {}", loc.to_string().bold()));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  help: {help}"));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// Main error type for the merge engine
#[derive(Debug, Clone, Error)]
pub enum CqlError {
    /// Lexical error (illegal character, unterminated literal)
    #[error("{code}: {message}")]
    Lex {
        code: ErrorCode,
        message: String,
        location: Option<SourceLocation>,
    },

    /// Parse error (grammar violation)
    #[error("{code}: {message}")]
    Parse {
        code: ErrorCode,
        message: String,
        location: Option<SourceLocation>,
        context: Option<String>,
    },

    /// Import error (the primary library failed to parse)
    #[error("{code}: {message}")]
    Import {
        code: ErrorCode,
        message: String,
        /// Name hint of the offending library, if supplied
        library: Option<String>,
        #[source]
        source: Box<CqlError>,
    },

    /// System error (I/O, configuration)
    #[error("{code}: {message}")]
    System {
        code: ErrorCode,
        message: String,
    },
}

impl CqlError {
    /// Create a lexical error
    pub fn lex(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Lex {
            code,
            message: message.into(),
            location: None,
        }
    }

    /// Create a lexical error with a location
    pub fn lex_at(code: ErrorCode, message: impl Into<String>, location: SourceLocation) -> Self {
        Self::Lex {
            code,
            message: message.into(),
            location: Some(location),
        }
    }

    /// Create a parse error
    pub fn parse(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            location: None,
            context: None,
        }
    }

    /// Create a parse error with a location
    pub fn parse_at(code: ErrorCode, message: impl Into<String>, location: SourceLocation) -> Self {
        Self::Parse {
            code,
            message: message.into(),
            location: Some(location),
            context: None,
        }
    }

    /// Create an import error wrapping the underlying parse failure
    pub fn import(
        code: ErrorCode,
        message: impl Into<String>,
        library: Option<String>,
        source: CqlError,
    ) -> Self {
        Self::Import {
            code,
            message: message.into(),
            library,
            source: Box::new(source),
        }
    }

    /// Create a system error
    pub fn system(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::System {
            code,
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Lex { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Import { code, .. } => *code,
            Self::System { code, .. } => *code,
        }
    }

    /// Get the location if available
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Lex { location, .. } => location.as_ref(),
            Self::Parse { location, .. } => location.as_ref(),
            Self::Import { source, .. } => source.location(),
            _ => None,
        }
    }

    /// Convert to a diagnostic for rendering
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Lex { code, message, location } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(loc) = location {
                    diag = diag.with_location(loc.clone());
                }
                diag
            }
            Self::Parse { code, message, location, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(loc) = location {
                    diag = diag.with_location(loc.clone());
                }
                if let Some(ctx) = context {
                    diag = diag.with_help(ctx.clone());
                }
                diag
            }
            Self::Import { code, message, source, .. } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(loc) = source.location() {
                    diag = diag.with_location(loc.clone());
                }
                if let Some(help) = code.info().help {
                    diag = diag.with_help(help);
                }
                diag
            }
            Self::System { code, message } => Diagnostic::error(*code, message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CQL0001, CQL0100};

    #[test]
    fn test_parse_error_display() {
        let err = CqlError::parse_at(CQL0001, "Unexpected '}'", SourceLocation::new(2, 5, 14, 1));
        assert_eq!(err.code(), CQL0001);
        assert_eq!(err.location().map(|l| (l.line, l.column)), Some((2, 5)));
        assert!(err.to_string().contains("CQL0001"));
    }

    #[test]
    fn test_import_error_wraps_source() {
        let inner = CqlError::parse(CQL0001, "Unexpected token");
        let err = CqlError::import(
            CQL0100,
            "Primary library failed to parse",
            Some("Standard".into()),
            inner,
        );
        assert_eq!(err.code(), CQL0100);
        assert!(matches!(err, CqlError::Import { .. }));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error(CQL0001, "Unexpected token")
            .with_location(SourceLocation::new(1, 5, 4, 1));

        assert!(diag.to_string().contains("CQL0001"));
        assert!(diag.to_string().contains("1:5"));
    }
}
