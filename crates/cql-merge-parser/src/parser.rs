//! Recursive descent parser for the CQL library grammar
//!
//! Consumes the significant-token stream and builds a concrete parse tree.
//! Expression bodies are not parsed into operator trees: the merge works at
//! declaration granularity, so bodies are captured as opaque `Expression`
//! nodes delimited by bracket-depth-aware scanning to the next top-level
//! definition keyword. Errors are returned as values, never printed; no
//! partial tree is produced on failure.

use crate::lexer::{Token, TokenKind, tokenize};
use crate::tree::{ParseTree, SyntaxKind, SyntaxNode};
use cql_merge_diagnostics::{
    CQL0001, CQL0002, CQL0007, CQL0008, CQL0009, CQL0017, CQL0018, CQL0019, CQL0020, CQL0021,
    CQL0022, CQL0023, CQL0024, CQL0025, CQL0026, CQL0027, CqlError, ErrorCode, Result,
    SourceLocation, Span,
};

/// Keywords that begin a new top-level definition and therefore terminate
/// an opaque expression body at bracket depth zero.
const DEFINITION_STARTERS: &[&str] = &[
    "library",
    "using",
    "include",
    "codesystem",
    "valueset",
    "code",
    "concept",
    "parameter",
    "context",
    "define",
    "public",
    "private",
];

/// Parse CQL source text into a parse tree for the `library` rule
pub fn parse(source: &str) -> Result<ParseTree> {
    let tokens = tokenize(source)?;
    parse_tokens(source, tokens)
}

/// Parse a previously produced token stream
///
/// Trivia tokens are tolerated in the stream and skipped.
pub fn parse_tokens(source: &str, tokens: Vec<Token>) -> Result<ParseTree> {
    Parser::new(source, tokens).library()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    comments: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, tokens: Vec<Token>) -> Self {
        let comments = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
            .copied()
            .collect();
        Self {
            source,
            tokens: tokens.into_iter().filter(|t| !t.kind.is_trivia()).collect(),
            comments,
            pos: 0,
        }
    }

    // === token cursor ===

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos];
        self.pos += 1;
        tok
    }

    fn text_of(&self, tok: Token) -> &'a str {
        tok.span.slice(self.source)
    }

    /// Start offset of a definition whose first token is `tok`, pulled back
    /// over the run of standalone comments directly above it, so comment
    /// lines travel with the declaration they annotate.
    fn leading_comment_start(&self, tok: Token) -> usize {
        let prev_end = if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        };
        self.comments
            .iter()
            .find(|c| {
                c.span.start >= prev_end
                    && c.span.end <= tok.span.start
                    && (prev_end == 0 || self.source[prev_end..c.span.start].contains('\n'))
            })
            .map(|c| c.span.start)
            .unwrap_or(tok.span.start)
    }

    /// End offset of a definition ending at `end`, extended through any
    /// comment on the same line, bounded by the next significant token.
    fn trailing_comment_end(&self, end: usize, limit: usize) -> usize {
        self.comments
            .iter()
            .filter(|c| {
                c.span.start >= end
                    && c.span.end <= limit
                    && !self.source[end..c.span.start].contains('\n')
            })
            .last()
            .map(|c| c.span.end)
            .unwrap_or(end)
    }

    fn at_keyword(&self, kw: &str) -> bool {
        self.peek()
            .is_some_and(|t| t.kind == TokenKind::Keyword && self.text_of(t) == kw)
    }

    fn at_symbol(&self, sym: &str) -> bool {
        self.peek()
            .is_some_and(|t| t.kind == TokenKind::Symbol && self.text_of(t) == sym)
    }

    // === error helpers ===

    fn error_at(&self, tok: Token, code: ErrorCode, message: impl Into<String>) -> CqlError {
        CqlError::parse_at(code, message, tok.location(self.source))
    }

    fn error_eof(&self, code: ErrorCode, message: impl Into<String>) -> CqlError {
        let location =
            SourceLocation::from_span(Span::point(self.source.len()), self.source);
        CqlError::parse_at(code, message, location)
    }

    fn expect_keyword(&mut self, kw: &str, code: ErrorCode) -> Result<Token> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Keyword && self.text_of(t) == kw => Ok(self.bump()),
            Some(t) => Err(self.error_at(
                t,
                code,
                format!("Expected '{kw}', found '{}'", self.text_of(t)),
            )),
            None => Err(self.error_eof(code, format!("Expected '{kw}'"))),
        }
    }

    fn expect_symbol(&mut self, sym: &str, code: ErrorCode) -> Result<Token> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Symbol && self.text_of(t) == sym => Ok(self.bump()),
            Some(t) => Err(self.error_at(
                t,
                code,
                format!("Expected '{sym}', found '{}'", self.text_of(t)),
            )),
            None => Err(self.error_eof(code, format!("Expected '{sym}'"))),
        }
    }

    fn expect_identifier(&mut self, code: ErrorCode) -> Result<Token> {
        match self.peek() {
            Some(t)
                if matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier) =>
            {
                Ok(self.bump())
            }
            Some(t) => Err(self.error_at(
                t,
                CQL0007,
                format!("Expected identifier, found '{}'", self.text_of(t)),
            )),
            None => Err(self.error_eof(code, "Expected identifier")),
        }
    }

    fn expect_string(&mut self, code: ErrorCode) -> Result<Token> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::String => Ok(self.bump()),
            Some(t) => Err(self.error_at(
                t,
                CQL0008,
                format!("Expected string literal, found '{}'", self.text_of(t)),
            )),
            None => Err(self.error_eof(code, "Expected string literal")),
        }
    }

    // === grammar rules ===

    fn library(mut self) -> Result<ParseTree> {
        let mut children = Vec::new();

        if self.at_keyword("library") {
            let node = self.library_definition()?;
            children.push(self.with_trailing_comment(node));
        }
        while self.peek().is_some() {
            let node = self.definition()?;
            children.push(self.with_trailing_comment(node));
        }

        let span = Span::new(0, self.source.len());
        Ok(ParseTree {
            root: SyntaxNode::new(SyntaxKind::Library, span, children),
        })
    }

    fn with_trailing_comment(&self, mut node: SyntaxNode) -> SyntaxNode {
        let limit = self
            .peek()
            .map_or(self.source.len(), |t| t.span.start);
        node.span.end = self.trailing_comment_end(node.span.end, limit);
        node
    }

    fn library_definition(&mut self) -> Result<SyntaxNode> {
        // library() only calls this with the `library` keyword pending
        let start = self
            .peek()
            .map(|tok| self.leading_comment_start(tok))
            .unwrap_or(0);
        self.expect_keyword("library", CQL0017)?;
        let name = self.qualified_identifier(CQL0017)?;
        let mut end = name.span.end;
        let mut children = vec![name];

        if self.at_keyword("version") {
            self.bump();
            let version = self.expect_string(CQL0017)?;
            children.push(SyntaxNode::leaf(SyntaxKind::VersionSpecifier, version.span));
            end = version.span.end;
        }

        Ok(SyntaxNode::new(
            SyntaxKind::LibraryDefinition,
            Span::new(start, end),
            children,
        ))
    }

    fn definition(&mut self) -> Result<SyntaxNode> {
        // peek() is Some here: the library loop only calls with input left
        let start = self
            .peek()
            .map(|tok| self.leading_comment_start(tok))
            .unwrap_or(self.source.len());
        let mut children = Vec::new();

        if self.at_keyword("public") || self.at_keyword("private") {
            let modifier = self.bump();
            children.push(SyntaxNode::leaf(SyntaxKind::AccessModifier, modifier.span));
        }

        let Some(tok) = self.peek() else {
            return Err(self.error_eof(CQL0002, "Expected a definition"));
        };
        match (tok.kind, self.text_of(tok)) {
            (TokenKind::Keyword, "using") => self.using_definition(start, children),
            (TokenKind::Keyword, "include") => self.include_definition(start, children),
            (TokenKind::Keyword, "codesystem") => self.codesystem_definition(start, children),
            (TokenKind::Keyword, "valueset") => self.valueset_definition(start, children),
            (TokenKind::Keyword, "code") => self.code_definition(start, children),
            (TokenKind::Keyword, "concept") => self.concept_definition(start, children),
            (TokenKind::Keyword, "parameter") => self.parameter_definition(start, children),
            (TokenKind::Keyword, "context") => self.context_definition(start, children),
            (TokenKind::Keyword, "define") => self.statement_definition(start, children),
            (_, text) => Err(self.error_at(
                tok,
                CQL0001,
                format!("Expected a definition, found '{text}'"),
            )),
        }
    }

    fn using_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        self.bump();
        let name = self.expect_identifier(CQL0018)?;
        children.push(SyntaxNode::leaf(SyntaxKind::Identifier, name.span));
        let mut end = name.span.end;

        if self.at_keyword("version") {
            self.bump();
            let version = self.expect_string(CQL0018)?;
            children.push(SyntaxNode::leaf(SyntaxKind::VersionSpecifier, version.span));
            end = version.span.end;
        }

        Ok(SyntaxNode::new(
            SyntaxKind::UsingDefinition,
            Span::new(start, end),
            children,
        ))
    }

    fn include_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        self.bump();
        let name = self.qualified_identifier(CQL0019)?;
        let mut end = name.span.end;
        children.push(name);

        if self.at_keyword("version") {
            self.bump();
            let version = self.expect_string(CQL0019)?;
            children.push(SyntaxNode::leaf(SyntaxKind::VersionSpecifier, version.span));
            end = version.span.end;
        }
        if self.at_keyword("called") {
            self.bump();
            let alias = self.expect_identifier(CQL0019)?;
            children.push(SyntaxNode::leaf(SyntaxKind::Identifier, alias.span));
            end = alias.span.end;
        }

        Ok(SyntaxNode::new(
            SyntaxKind::IncludeDefinition,
            Span::new(start, end),
            children,
        ))
    }

    fn codesystem_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        self.bump();
        let name = self.expect_identifier(CQL0021)?;
        children.push(SyntaxNode::leaf(SyntaxKind::Identifier, name.span));
        self.expect_symbol(":", CQL0021)?;
        let uri = self.expect_string(CQL0021)?;
        let mut end = uri.span.end;

        if self.at_keyword("version") {
            self.bump();
            let version = self.expect_string(CQL0021)?;
            children.push(SyntaxNode::leaf(SyntaxKind::VersionSpecifier, version.span));
            end = version.span.end;
        }

        Ok(SyntaxNode::new(
            SyntaxKind::CodesystemDefinition,
            Span::new(start, end),
            children,
        ))
    }

    fn valueset_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        self.bump();
        let name = self.expect_identifier(CQL0022)?;
        children.push(SyntaxNode::leaf(SyntaxKind::Identifier, name.span));
        self.expect_symbol(":", CQL0022)?;
        let uri = self.expect_string(CQL0022)?;
        let mut end = uri.span.end;

        if self.at_keyword("version") {
            self.bump();
            let version = self.expect_string(CQL0022)?;
            children.push(SyntaxNode::leaf(SyntaxKind::VersionSpecifier, version.span));
            end = version.span.end;
        }
        if self.at_keyword("codesystems") {
            self.bump();
            loop {
                let cs = self.qualified_identifier(CQL0022)?;
                end = cs.span.end;
                if self.at_symbol(",") {
                    self.bump();
                } else {
                    break;
                }
            }
        }

        Ok(SyntaxNode::new(
            SyntaxKind::ValuesetDefinition,
            Span::new(start, end),
            children,
        ))
    }

    fn code_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        self.bump();
        let name = self.expect_identifier(CQL0023)?;
        children.push(SyntaxNode::leaf(SyntaxKind::Identifier, name.span));
        self.expect_symbol(":", CQL0023)?;
        self.expect_string(CQL0023)?;
        self.expect_keyword("from", CQL0023)?;
        let codesystem = self.qualified_identifier(CQL0023)?;
        let mut end = codesystem.span.end;

        if self.at_keyword("display") {
            self.bump();
            let display = self.expect_string(CQL0023)?;
            end = display.span.end;
        }

        Ok(SyntaxNode::new(
            SyntaxKind::CodeDefinition,
            Span::new(start, end),
            children,
        ))
    }

    fn concept_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        self.bump();
        let name = self.expect_identifier(CQL0024)?;
        children.push(SyntaxNode::leaf(SyntaxKind::Identifier, name.span));
        self.expect_symbol(":", CQL0024)?;
        let open = self.expect_symbol("{", CQL0024)?;
        let close = self.balanced_to("{", "}", open)?;
        let mut end = close.span.end;

        if self.at_keyword("display") {
            self.bump();
            let display = self.expect_string(CQL0024)?;
            end = display.span.end;
        }

        Ok(SyntaxNode::new(
            SyntaxKind::ConceptDefinition,
            Span::new(start, end),
            children,
        ))
    }

    fn parameter_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        self.bump();
        let name = self.expect_identifier(CQL0020)?;
        children.push(SyntaxNode::leaf(SyntaxKind::Identifier, name.span));
        let mut end = name.span.end;

        // Anything up to the next definition is the parameter's type and
        // optional default, kept as opaque text.
        if self.peek().is_some_and(|t| !self.at_definition_boundary(t)) {
            let body = self.expression_span(CQL0020, "a type or default")?;
            children.push(SyntaxNode::leaf(SyntaxKind::Expression, body));
            end = body.end;
        }

        Ok(SyntaxNode::new(
            SyntaxKind::ParameterDefinition,
            Span::new(start, end),
            children,
        ))
    }

    fn context_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        self.bump();
        let name = self.qualified_identifier(CQL0025)?;
        let end = name.span.end;
        children.push(name);

        Ok(SyntaxNode::new(
            SyntaxKind::ContextDefinition,
            Span::new(start, end),
            children,
        ))
    }

    fn statement_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        self.bump();

        let fluent = if self.at_keyword("fluent") {
            let tok = self.bump();
            children.push(SyntaxNode::leaf(SyntaxKind::FluentModifier, tok.span));
            true
        } else {
            false
        };

        if fluent || self.at_keyword("function") {
            self.function_definition(start, children)
        } else {
            self.expression_definition(start, children)
        }
    }

    fn expression_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        let name = self.expect_identifier(CQL0027)?;
        children.push(SyntaxNode::leaf(SyntaxKind::Identifier, name.span));
        self.expect_symbol(":", CQL0027)?;
        let body = self.expression_span(CQL0027, "an expression")?;
        children.push(SyntaxNode::leaf(SyntaxKind::Expression, body));

        Ok(SyntaxNode::new(
            SyntaxKind::ExpressionDefinition,
            Span::new(start, body.end),
            children,
        ))
    }

    fn function_definition(
        &mut self,
        start: usize,
        mut children: Vec<SyntaxNode>,
    ) -> Result<SyntaxNode> {
        self.expect_keyword("function", CQL0026)?;
        let name = self.expect_identifier(CQL0026)?;
        children.push(SyntaxNode::leaf(SyntaxKind::Identifier, name.span));

        let open = self.expect_symbol("(", CQL0026)?;
        self.balanced_to("(", ")", open)?;

        if self.at_keyword("returns") {
            self.bump();
            // Return type tokens run until the body or the external marker.
            while let Some(tok) = self.peek() {
                let text = self.text_of(tok);
                if (tok.kind == TokenKind::Symbol && text == ":")
                    || (tok.kind == TokenKind::Keyword && text == "external")
                {
                    break;
                }
                self.bump();
            }
        }

        if self.at_keyword("external") {
            let tok = self.bump();
            children.push(SyntaxNode::leaf(SyntaxKind::ExternalBody, tok.span));
            return Ok(SyntaxNode::new(
                SyntaxKind::FunctionDefinition,
                Span::new(start, tok.span.end),
                children,
            ));
        }

        self.expect_symbol(":", CQL0026)?;
        let body = self.expression_span(CQL0026, "a function body")?;
        children.push(SyntaxNode::leaf(SyntaxKind::Expression, body));

        Ok(SyntaxNode::new(
            SyntaxKind::FunctionDefinition,
            Span::new(start, body.end),
            children,
        ))
    }

    // === shared pieces ===

    fn qualified_identifier(&mut self, code: ErrorCode) -> Result<SyntaxNode> {
        let first = self.expect_identifier(code)?;
        let mut end = first.span.end;

        while self.at_symbol(".") {
            let checkpoint = self.pos;
            self.bump();
            match self.peek() {
                Some(t)
                    if matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier) =>
                {
                    let t = self.bump();
                    end = t.span.end;
                }
                _ => {
                    self.pos = checkpoint;
                    break;
                }
            }
        }

        Ok(SyntaxNode::leaf(
            SyntaxKind::QualifiedIdentifier,
            Span::new(first.span.start, end),
        ))
    }

    /// Consume tokens up to and including the delimiter matching `open_tok`
    fn balanced_to(&mut self, open: &str, close: &str, open_tok: Token) -> Result<Token> {
        let mut depth = 1usize;
        let mut last = open_tok;
        while depth > 0 {
            let Some(tok) = self.peek() else {
                return Err(self.error_eof(CQL0009, format!("Unbalanced '{open}'")));
            };
            if tok.kind == TokenKind::Symbol {
                let text = self.text_of(tok);
                if text == open {
                    depth += 1;
                } else if text == close {
                    depth -= 1;
                }
            }
            self.bump();
            last = tok;
        }
        Ok(last)
    }

    fn at_definition_boundary(&self, tok: Token) -> bool {
        tok.kind == TokenKind::Keyword && DEFINITION_STARTERS.contains(&self.text_of(tok))
    }

    /// Scan an opaque expression body: consume tokens, tracking bracket
    /// depth, until a top-level definition keyword or end of input.
    fn expression_span(&mut self, code: ErrorCode, what: &str) -> Result<Span> {
        let Some(first) = self.peek() else {
            return Err(self.error_eof(code, format!("Expected {what}")));
        };
        if self.at_definition_boundary(first) {
            return Err(self.error_at(
                first,
                code,
                format!("Expected {what}, found '{}'", self.text_of(first)),
            ));
        }

        let mut depth = 0usize;
        let mut prev: Option<Token> = None;
        let mut last = first;

        while let Some(tok) = self.peek() {
            let text = self.text_of(tok);

            // A definition keyword at depth zero ends the body, unless it is
            // a property access like `X.code`.
            let after_dot = prev
                .is_some_and(|p| p.kind == TokenKind::Symbol && self.text_of(p) == ".");
            if depth == 0 && prev.is_some() && self.at_definition_boundary(tok) && !after_dot {
                break;
            }

            if tok.kind == TokenKind::Symbol {
                match text {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return Err(self.error_at(
                                tok,
                                CQL0009,
                                format!("Unbalanced '{text}'"),
                            ));
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
            }

            self.bump();
            prev = Some(tok);
            last = tok;
        }

        if depth != 0 {
            return Err(self.error_eof(CQL0009, "Unbalanced delimiter"));
        }

        Ok(Span::new(first.span.start, last.span.end))
    }
}
