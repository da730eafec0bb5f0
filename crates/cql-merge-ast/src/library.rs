//! Library, library group, and merged library values

use crate::Declaration;
use cql_merge_diagnostics::CqlError;
use serde::Serialize;

/// Raw, unparsed CQL source text with an optional name hint
///
/// The unit of input to parsing, preserved on the parsed library for
/// traceability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawCql {
    /// The original source text
    pub content: String,
    /// Optional name hint (e.g. a filename), used in error messages
    pub name: Option<String>,
}

impl RawCql {
    /// Wrap source text
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: None,
        }
    }

    /// Attach a name hint
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Library header metadata (the `library Name version '...'` line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryHeader {
    /// Library name
    pub name: String,
    /// Optional version
    pub version: Option<String>,
    /// Literal header text
    pub text: String,
}

/// A parsed, normalized CQL library
///
/// Immutable after construction by import.
#[derive(Debug, Clone, Serialize)]
pub struct CqlLibrary {
    /// Header metadata; CQL permits a library without a header line
    pub header: Option<LibraryHeader>,
    /// Declarations in source order
    pub declarations: Vec<Declaration>,
    /// The originating raw source
    pub source: RawCql,
}

impl CqlLibrary {
    /// Best available name: header name, then the raw source's name hint
    pub fn name(&self) -> Option<&str> {
        self.header
            .as_ref()
            .map(|h| h.name.as_str())
            .or(self.source.name.as_deref())
    }
}

/// Per-dependency parse outcome
///
/// A dependency that fails to parse occupies its slot as `Failed` rather
/// than aborting the import; the merge skips it.
#[derive(Debug, Clone)]
pub enum DependencyOutcome {
    /// The dependency parsed successfully
    Parsed(CqlLibrary),
    /// The dependency failed to parse and contributes no declarations
    Failed {
        /// Name hint of the failed dependency, if supplied
        name: Option<String>,
        /// The recorded parse failure
        error: CqlError,
    },
}

impl DependencyOutcome {
    /// The parsed library, if this slot holds one
    pub fn library(&self) -> Option<&CqlLibrary> {
        match self {
            Self::Parsed(lib) => Some(lib),
            Self::Failed { .. } => None,
        }
    }

    /// The recorded failure, if this slot holds one
    pub fn error(&self) -> Option<&CqlError> {
        match self {
            Self::Parsed(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// The primary library plus its ordered dependencies
///
/// Dependency order is the supplied order and is significant: it breaks
/// name-collision ties during the merge.
#[derive(Debug, Clone)]
pub struct CqlLibraryGroup {
    /// The primary library
    pub library: CqlLibrary,
    /// Dependency outcomes, in supplied order
    pub dependencies: Vec<DependencyOutcome>,
}

impl CqlLibraryGroup {
    /// Create a group from a parsed primary and its dependency outcomes
    pub fn new(library: CqlLibrary, dependencies: Vec<DependencyOutcome>) -> Self {
        Self {
            library,
            dependencies,
        }
    }

    /// Iterate the dependencies that parsed, in supplied order
    pub fn parsed_dependencies(&self) -> impl Iterator<Item = &CqlLibrary> {
        self.dependencies.iter().filter_map(|d| d.library())
    }
}

/// The flattened result of merging a library group
///
/// Exists only between merge and export; never persisted.
#[derive(Debug, Clone)]
pub struct MergedLibrary {
    /// Header taken from the primary library
    pub header: Option<LibraryHeader>,
    /// Single deduplicated, ordered declaration sequence
    pub declarations: Vec<Declaration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_cql_name_hint() {
        let raw = RawCql::new("library Demo").with_name("Demo.cql");
        assert_eq!(raw.name.as_deref(), Some("Demo.cql"));
    }

    #[test]
    fn test_library_name_falls_back_to_hint() {
        let lib = CqlLibrary {
            header: None,
            declarations: Vec::new(),
            source: RawCql::new("define X: 1").with_name("X.cql"),
        };
        assert_eq!(lib.name(), Some("X.cql"));
    }

    #[test]
    fn test_parsed_dependencies_skips_failures() {
        use cql_merge_diagnostics::{CQL0001, CqlError};

        let lib = CqlLibrary {
            header: Some(LibraryHeader {
                name: "Primary".into(),
                version: None,
                text: "library Primary".into(),
            }),
            declarations: Vec::new(),
            source: RawCql::new("library Primary"),
        };
        let group = CqlLibraryGroup::new(
            lib.clone(),
            vec![
                DependencyOutcome::Failed {
                    name: Some("Broken".into()),
                    error: CqlError::parse(CQL0001, "Unexpected token"),
                },
                DependencyOutcome::Parsed(lib),
            ],
        );
        assert_eq!(group.parsed_dependencies().count(), 1);
    }
}
