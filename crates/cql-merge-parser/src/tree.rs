//! Concrete parse tree
//!
//! Nodes are labelled by grammar production and carry the span covering
//! their significant tokens, so any node re-emits from the source text
//! without re-serialization logic.

use cql_merge_diagnostics::Span;

/// Grammar production labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    /// Whole library (root)
    Library,
    /// `library Name version '...'` header
    LibraryDefinition,
    /// `using Model version '...'`
    UsingDefinition,
    /// `include Lib version '...' called Alias`
    IncludeDefinition,
    /// `codesystem Name: '...'`
    CodesystemDefinition,
    /// `valueset Name: '...'`
    ValuesetDefinition,
    /// `code Name: '...' from CS`
    CodeDefinition,
    /// `concept Name: { ... }`
    ConceptDefinition,
    /// `parameter Name ...`
    ParameterDefinition,
    /// `context Name`
    ContextDefinition,
    /// `define Name: ...`
    ExpressionDefinition,
    /// `define function Name(...): ...`
    FunctionDefinition,
    /// `public` / `private` prefix
    AccessModifier,
    /// `fluent` prefix on a function definition
    FluentModifier,
    /// `external` in place of a function body
    ExternalBody,
    /// Single identifier (plain or quoted)
    Identifier,
    /// Dotted identifier path
    QualifiedIdentifier,
    /// Version string of a header/using/include/terminology definition
    VersionSpecifier,
    /// Opaque expression body (type specifiers, defaults, function bodies)
    Expression,
}

/// A node in the concrete parse tree
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    /// Production label
    pub kind: SyntaxKind,
    /// Span covering the node's significant tokens
    pub span: Span,
    /// Child nodes in source order
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    /// Create a leaf node
    pub fn leaf(kind: SyntaxKind, span: Span) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    /// Create a node with children
    pub fn new(kind: SyntaxKind, span: Span, children: Vec<SyntaxNode>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    /// The node's text in the given source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source)
    }

    /// First child with the given kind
    pub fn child(&self, kind: SyntaxKind) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// All children with the given kind
    pub fn children_of(&self, kind: SyntaxKind) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }
}

/// A parsed library's concrete parse tree
///
/// Owned by the parser during construction; consumed by the visitor.
#[derive(Debug, Clone)]
pub struct ParseTree {
    /// The `Library` root node
    pub root: SyntaxNode,
}

impl ParseTree {
    /// Top-level definition nodes in source order
    pub fn definitions(&self) -> &[SyntaxNode] {
        &self.root.children
    }
}
