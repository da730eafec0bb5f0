//! Parse tree visitor producing normalized declarations
//!
//! One handler per declaration production; everything else falls through to
//! visiting children and concatenating results, so productions without
//! explicit handling pass through instead of crashing the build. Each
//! declaration keeps the literal source slice of its node, which is what
//! lets the exporter re-emit untouched declarations byte-for-byte.

use crate::tree::{ParseTree, SyntaxKind, SyntaxNode};
use cql_merge_ast::{
    Declaration, FunctionDeclaration, IncludeDeclaration, LibraryHeader, NamedDeclaration,
    UsingDeclaration,
};

/// Builds `Declaration` records from a parse tree
pub struct Visitor<'a> {
    source: &'a str,
}

impl<'a> Visitor<'a> {
    /// Create a visitor over the source the tree was parsed from
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Collect all declarations of the library, in source order
    pub fn build(&self, tree: &ParseTree) -> Vec<Declaration> {
        self.visit(&tree.root)
    }

    /// Extract the library header, if the library has one
    pub fn library_header(&self, tree: &ParseTree) -> Option<LibraryHeader> {
        let def = tree.root.child(SyntaxKind::LibraryDefinition)?;
        let name = def
            .child(SyntaxKind::QualifiedIdentifier)
            .map(|n| normalize_identifier(n.text(self.source)))?;
        Some(LibraryHeader {
            name,
            version: self.version_of(def),
            text: def.text(self.source).to_string(),
        })
    }

    fn visit(&self, node: &SyntaxNode) -> Vec<Declaration> {
        match node.kind {
            SyntaxKind::UsingDefinition => vec![self.using(node)],
            SyntaxKind::IncludeDefinition => vec![self.include(node)],
            SyntaxKind::CodesystemDefinition => vec![Declaration::Codesystem(self.named(node))],
            SyntaxKind::ValuesetDefinition => vec![Declaration::Valueset(self.named(node))],
            SyntaxKind::CodeDefinition => vec![Declaration::Code(self.named(node))],
            SyntaxKind::ConceptDefinition => vec![Declaration::Concept(self.named(node))],
            SyntaxKind::ParameterDefinition => vec![Declaration::Parameter(self.named(node))],
            SyntaxKind::ContextDefinition => vec![Declaration::Context(self.named(node))],
            SyntaxKind::ExpressionDefinition => vec![Declaration::Expression(self.named(node))],
            SyntaxKind::FunctionDefinition => vec![self.function(node)],
            // Default: recurse into children and concatenate.
            _ => node
                .children
                .iter()
                .flat_map(|child| self.visit(child))
                .collect(),
        }
    }

    fn decl_name(&self, node: &SyntaxNode) -> String {
        node.child(SyntaxKind::Identifier)
            .or_else(|| node.child(SyntaxKind::QualifiedIdentifier))
            .map(|n| normalize_identifier(n.text(self.source)))
            .unwrap_or_default()
    }

    fn version_of(&self, node: &SyntaxNode) -> Option<String> {
        node.child(SyntaxKind::VersionSpecifier)
            .map(|n| string_value(n.text(self.source)))
    }

    fn named(&self, node: &SyntaxNode) -> NamedDeclaration {
        NamedDeclaration {
            name: self.decl_name(node),
            text: node.text(self.source).to_string(),
            span: node.span,
        }
    }

    fn using(&self, node: &SyntaxNode) -> Declaration {
        Declaration::Using(UsingDeclaration {
            model: self.decl_name(node),
            version: self.version_of(node),
            text: node.text(self.source).to_string(),
            span: node.span,
        })
    }

    fn include(&self, node: &SyntaxNode) -> Declaration {
        let library = node
            .child(SyntaxKind::QualifiedIdentifier)
            .map(|n| normalize_identifier(n.text(self.source)))
            .unwrap_or_default();
        // The alias is the only plain identifier child of an include.
        let alias = node
            .child(SyntaxKind::Identifier)
            .map(|n| normalize_identifier(n.text(self.source)));
        Declaration::Include(IncludeDeclaration {
            library,
            version: self.version_of(node),
            alias,
            text: node.text(self.source).to_string(),
            span: node.span,
        })
    }

    fn function(&self, node: &SyntaxNode) -> Declaration {
        Declaration::Function(FunctionDeclaration {
            name: self.decl_name(node),
            fluent: node.child(SyntaxKind::FluentModifier).is_some(),
            external: node.child(SyntaxKind::ExternalBody).is_some(),
            text: node.text(self.source).to_string(),
            span: node.span,
        })
    }
}

/// Strip quoting from an identifier or dotted identifier path
///
/// `"Shared Codes"` becomes `Shared Codes`; quoted segments of a dotted
/// path are unwrapped the same way. Backslash escapes inside quotes are
/// resolved.
pub fn normalize_identifier(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Value of a single-quoted string literal token
pub fn string_value(text: &str) -> String {
    let inner = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' if chars.peek() == Some(&'\'') => {
                chars.next();
                out.push('\'');
            }
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            _ => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("FHIRHelpers"), "FHIRHelpers");
        assert_eq!(normalize_identifier("\"Shared Codes\""), "Shared Codes");
        assert_eq!(normalize_identifier("Lib.\"Sub Name\""), "Lib.Sub Name");
    }

    #[test]
    fn test_string_value() {
        assert_eq!(string_value("'4.0.1'"), "4.0.1");
        assert_eq!(string_value("'it''s'"), "it's");
    }
}
