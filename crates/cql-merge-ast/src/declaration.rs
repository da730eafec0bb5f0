//! Declaration records produced by the visitor

use cql_merge_diagnostics::Span;
use serde::Serialize;
use std::fmt;

/// Declaration kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeclarationKind {
    Using,
    Include,
    Codesystem,
    Valueset,
    Code,
    Concept,
    Parameter,
    Context,
    Expression,
    Function,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Using => "using",
            Self::Include => "include",
            Self::Codesystem => "codesystem",
            Self::Valueset => "valueset",
            Self::Code => "code",
            Self::Concept => "concept",
            Self::Parameter => "parameter",
            Self::Context => "context",
            Self::Expression => "expression",
            Self::Function => "function",
        };
        write!(f, "{name}")
    }
}

/// A `using` declaration (data model reference)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsingDeclaration {
    /// Model identifier (e.g. "FHIR")
    pub model: String,
    /// Optional model version
    pub version: Option<String>,
    /// Literal declaration text
    pub text: String,
    /// Span in the originating source
    pub span: Span,
}

/// An `include` declaration (library dependency reference)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludeDeclaration {
    /// Included library identifier
    pub library: String,
    /// Optional library version
    pub version: Option<String>,
    /// Optional `called` alias
    pub alias: Option<String>,
    /// Literal declaration text
    pub text: String,
    /// Span in the originating source
    pub span: Span,
}

/// Any other named declaration, body kept as literal text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedDeclaration {
    /// Declaration name (quoted identifiers are stored unquoted)
    pub name: String,
    /// Literal declaration text
    pub text: String,
    /// Span in the originating source
    pub span: Span,
}

/// A function definition, body kept as literal text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDeclaration {
    /// Function name
    pub name: String,
    /// Whether this is a fluent function
    pub fluent: bool,
    /// Whether the body is `external`
    pub external: bool,
    /// Literal declaration text
    pub text: String,
    /// Span in the originating source
    pub span: Span,
}

/// A normalized top-level declaration
///
/// Tagged variant over the declaration kinds of the CQL library grammar.
/// Every variant retains enough literal source text to be re-emitted
/// byte-for-byte when the merge leaves it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Declaration {
    Using(UsingDeclaration),
    Include(IncludeDeclaration),
    Codesystem(NamedDeclaration),
    Valueset(NamedDeclaration),
    Code(NamedDeclaration),
    Concept(NamedDeclaration),
    Parameter(NamedDeclaration),
    Context(NamedDeclaration),
    Expression(NamedDeclaration),
    Function(FunctionDeclaration),
}

impl Declaration {
    /// The declaration kind
    pub fn kind(&self) -> DeclarationKind {
        match self {
            Self::Using(_) => DeclarationKind::Using,
            Self::Include(_) => DeclarationKind::Include,
            Self::Codesystem(_) => DeclarationKind::Codesystem,
            Self::Valueset(_) => DeclarationKind::Valueset,
            Self::Code(_) => DeclarationKind::Code,
            Self::Concept(_) => DeclarationKind::Concept,
            Self::Parameter(_) => DeclarationKind::Parameter,
            Self::Context(_) => DeclarationKind::Context,
            Self::Expression(_) => DeclarationKind::Expression,
            Self::Function(_) => DeclarationKind::Function,
        }
    }

    /// The declaration name used for collision detection
    pub fn name(&self) -> &str {
        match self {
            Self::Using(d) => &d.model,
            Self::Include(d) => &d.library,
            Self::Codesystem(d)
            | Self::Valueset(d)
            | Self::Code(d)
            | Self::Concept(d)
            | Self::Parameter(d)
            | Self::Context(d)
            | Self::Expression(d) => &d.name,
            Self::Function(d) => &d.name,
        }
    }

    /// The literal source text of the declaration
    pub fn text(&self) -> &str {
        match self {
            Self::Using(d) => &d.text,
            Self::Include(d) => &d.text,
            Self::Codesystem(d)
            | Self::Valueset(d)
            | Self::Code(d)
            | Self::Concept(d)
            | Self::Parameter(d)
            | Self::Context(d)
            | Self::Expression(d) => &d.text,
            Self::Function(d) => &d.text,
        }
    }

    /// The span of the declaration in its originating source
    pub fn span(&self) -> Span {
        match self {
            Self::Using(d) => d.span,
            Self::Include(d) => d.span,
            Self::Codesystem(d)
            | Self::Valueset(d)
            | Self::Code(d)
            | Self::Concept(d)
            | Self::Parameter(d)
            | Self::Context(d)
            | Self::Expression(d) => d.span,
            Self::Function(d) => d.span,
        }
    }

    /// Whether this declaration is a statement (function or expression
    /// definition) as opposed to a header-section definition
    pub fn is_statement(&self) -> bool {
        matches!(self, Self::Expression(_) | Self::Function(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, text: &str) -> NamedDeclaration {
        NamedDeclaration {
            name: name.into(),
            text: text.into(),
            span: Span::new(0, text.len()),
        }
    }

    #[test]
    fn test_declaration_accessors() {
        let decl = Declaration::Parameter(named("Period", "parameter Period Interval<DateTime>"));
        assert_eq!(decl.kind(), DeclarationKind::Parameter);
        assert_eq!(decl.name(), "Period");
        assert!(decl.text().starts_with("parameter"));
        assert!(!decl.is_statement());
    }

    #[test]
    fn test_statement_classification() {
        let expr = Declaration::Expression(named("InPopulation", "define InPopulation: true"));
        assert!(expr.is_statement());

        let using = Declaration::Using(UsingDeclaration {
            model: "FHIR".into(),
            version: Some("4.0.1".into()),
            text: "using FHIR version '4.0.1'".into(),
            span: Span::new(0, 26),
        });
        assert_eq!(using.name(), "FHIR");
        assert!(!using.is_statement());
    }
}
