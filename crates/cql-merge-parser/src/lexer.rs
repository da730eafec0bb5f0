//! CQL lexer using winnow
//!
//! Produces a flat token stream over the raw source text. Trivia (comments
//! and whitespace) is kept in the stream so declaration text can be sliced
//! back out of the source byte-for-byte; the parser skips it.

use cql_merge_diagnostics::{
    CQL0003, CQL0004, CQL0005, CQL0006, CqlError, Result, SourceLocation, Span,
};
use winnow::combinator::{alt, cut_err, opt, preceded, repeat, terminated};
use winnow::prelude::*;
use winnow::token::{any, none_of, one_of, take_until, take_while};

type Input<'a> = &'a str;
type PResult<T> = ModalResult<T>;

/// Lexical token kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Reserved word of the CQL grammar
    Keyword,
    /// Plain identifier
    Identifier,
    /// Double-quoted identifier
    QuotedIdentifier,
    /// Single-quoted string literal
    String,
    /// Numeric literal (integer, decimal, long)
    Number,
    /// `@`-prefixed date, datetime, or time literal
    DateTime,
    /// Operator or punctuation
    Symbol,
    /// `//` or `/* */` comment
    Comment,
    /// Whitespace run
    Whitespace,
}

impl TokenKind {
    /// Whether the parser should skip this token
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Comment | Self::Whitespace)
    }
}

/// A lexical token: kind plus source span
///
/// Tokens own no text; slice the original source with the span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Token kind
    pub kind: TokenKind,
    /// Byte range in the source
    pub span: Span,
}

impl Token {
    /// The token's text in the given source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source)
    }

    /// Line/column location of the token in the given source
    pub fn location(&self, source: &str) -> SourceLocation {
        SourceLocation::from_span(self.span, source)
    }
}

/// Tokenize CQL source text
///
/// Pure function of the input; restartable from scratch only. Illegal
/// characters and unterminated literals are reported as lexical errors with
/// line/column locations.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut rest: Input<'_> = source;
    let mut tokens = Vec::new();

    while !rest.is_empty() {
        let start = source.len() - rest.len();
        match token(&mut rest) {
            Ok(kind) => {
                let end = source.len() - rest.len();
                tokens.push(Token {
                    kind,
                    span: Span::new(start, end),
                });
            }
            Err(_) => return Err(lex_error_at(source, start)),
        }
    }

    Ok(tokens)
}

fn lex_error_at(source: &str, offset: usize) -> CqlError {
    let location = SourceLocation::from_span(Span::point(offset), source);
    let rest = &source[offset..];
    if rest.starts_with('\'') {
        CqlError::lex_at(CQL0004, "Unterminated string literal", location)
    } else if rest.starts_with('"') {
        CqlError::lex_at(CQL0005, "Unterminated quoted identifier", location)
    } else if rest.starts_with("/*") {
        CqlError::lex_at(CQL0006, "Unterminated block comment", location)
    } else {
        let ch = rest.chars().next().unwrap_or('\0');
        CqlError::lex_at(CQL0003, format!("Unexpected character '{ch}'"), location)
    }
}

fn token(input: &mut Input<'_>) -> PResult<TokenKind> {
    alt((
        whitespace,
        line_comment,
        block_comment,
        string_literal,
        quoted_identifier,
        datetime_literal,
        number_literal,
        identifier_like,
        symbol,
    ))
    .parse_next(input)
}

fn whitespace(input: &mut Input<'_>) -> PResult<TokenKind> {
    take_while(1.., char::is_whitespace)
        .value(TokenKind::Whitespace)
        .parse_next(input)
}

fn line_comment(input: &mut Input<'_>) -> PResult<TokenKind> {
    ("//", take_while(0.., |c: char| c != '\n' && c != '\r'))
        .value(TokenKind::Comment)
        .parse_next(input)
}

fn block_comment(input: &mut Input<'_>) -> PResult<TokenKind> {
    preceded("/*", cut_err(terminated(take_until(0.., "*/"), "*/")))
        .value(TokenKind::Comment)
        .parse_next(input)
}

// Content of a single-quoted string: '' and backslash escapes allowed.
fn string_body(input: &mut Input<'_>) -> PResult<()> {
    repeat(
        0..,
        alt((
            "''".void(),
            ('\\', any).void(),
            none_of(['\'', '\\']).void(),
        )),
    )
    .parse_next(input)
}

fn string_literal(input: &mut Input<'_>) -> PResult<TokenKind> {
    '\''.parse_next(input)?;
    cut_err(terminated(string_body, '\'')).parse_next(input)?;
    Ok(TokenKind::String)
}

fn quoted_body(input: &mut Input<'_>) -> PResult<()> {
    repeat(0.., alt((('\\', any).void(), none_of(['"', '\\']).void()))).parse_next(input)
}

fn quoted_identifier(input: &mut Input<'_>) -> PResult<TokenKind> {
    '"'.parse_next(input)?;
    cut_err(terminated(quoted_body, '"')).parse_next(input)?;
    Ok(TokenKind::QuotedIdentifier)
}

fn datetime_literal(input: &mut Input<'_>) -> PResult<TokenKind> {
    (
        '@',
        take_while(1.., |c: char| {
            c.is_ascii_digit() || matches!(c, 'T' | 'Z' | ':' | '+' | '-' | '.')
        }),
    )
        .value(TokenKind::DateTime)
        .parse_next(input)
}

fn number_literal(input: &mut Input<'_>) -> PResult<TokenKind> {
    (
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
        opt(one_of(['L', 'l'])),
    )
        .value(TokenKind::Number)
        .parse_next(input)
}

fn identifier_like(input: &mut Input<'_>) -> PResult<TokenKind> {
    let text = (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)?;

    Ok(if is_keyword(text) {
        TokenKind::Keyword
    } else {
        TokenKind::Identifier
    })
}

fn symbol(input: &mut Input<'_>) -> PResult<TokenKind> {
    alt((
        alt(("<=", ">=", "!=", "!~", "=>", "..")).void(),
        one_of([
            '(', ')', '[', ']', '{', '}', '<', '>', '=', '~', '!', '+', '-', '*', '/', '%', '^',
            '.', ',', ':', ';', '|', '&', '?',
        ])
        .void(),
    ))
    .value(TokenKind::Symbol)
    .parse_next(input)
}

/// Check if a word is a reserved CQL keyword (case-sensitive)
pub fn is_keyword(s: &str) -> bool {
    matches!(
        s,
        "library"
            | "version"
            | "using"
            | "include"
            | "called"
            | "parameter"
            | "default"
            | "public"
            | "private"
            | "codesystem"
            | "codesystems"
            | "valueset"
            | "code"
            | "concept"
            | "from"
            | "display"
            | "context"
            | "define"
            | "function"
            | "fluent"
            | "external"
            | "returns"
            | "null"
            | "true"
            | "false"
            | "and"
            | "or"
            | "xor"
            | "not"
            | "implies"
            | "is"
            | "as"
            | "cast"
            | "between"
            | "in"
            | "contains"
            | "if"
            | "then"
            | "else"
            | "case"
            | "when"
            | "exists"
            | "flatten"
            | "distinct"
            | "collapse"
            | "singleton"
            | "such"
            | "that"
            | "with"
            | "without"
            | "where"
            | "return"
            | "all"
            | "sort"
            | "by"
            | "asc"
            | "ascending"
            | "desc"
            | "descending"
            | "let"
            | "aggregate"
            | "starting"
            | "union"
            | "intersect"
            | "except"
            | "interval"
            | "div"
            | "mod"
    )
}
