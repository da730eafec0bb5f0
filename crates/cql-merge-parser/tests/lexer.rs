//! Tests for CQL tokenization
//!
//! Covers:
//! - Token kinds over realistic declaration snippets
//! - Trivia retention (comments and whitespace stay in the stream)
//! - Spans that tile the source with no gaps
//! - Escape handling in strings and quoted identifiers
//! - Keyword case sensitivity

use cql_merge_parser::{TokenKind, is_keyword, tokenize};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn significant_kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .unwrap_or_else(|e| panic!("tokenize failed: {e}"))
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .map(|t| t.kind)
        .collect()
}

#[rstest]
#[case("using FHIR version '4.0.1'", vec![
    TokenKind::Keyword,
    TokenKind::Identifier,
    TokenKind::Keyword,
    TokenKind::String,
])]
#[case("codesystem \"LOINC\": 'http://loinc.org'", vec![
    TokenKind::Keyword,
    TokenKind::QuotedIdentifier,
    TokenKind::Symbol,
    TokenKind::String,
])]
#[case("define X: 1.5 + @2019-01-01", vec![
    TokenKind::Keyword,
    TokenKind::Identifier,
    TokenKind::Symbol,
    TokenKind::Number,
    TokenKind::Symbol,
    TokenKind::DateTime,
])]
#[case("A <= B // trailing", vec![
    TokenKind::Identifier,
    TokenKind::Symbol,
    TokenKind::Identifier,
])]
fn test_token_kinds(#[case] source: &str, #[case] expected: Vec<TokenKind>) {
    assert_eq!(significant_kinds(source), expected);
}

#[test]
fn test_trivia_is_kept_in_stream() {
    let source = "define /* note */ X: 1";
    let tokens = tokenize(source).unwrap();
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Comment));
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Whitespace));
}

#[test]
fn test_spans_tile_the_source() {
    let source = "library Demo version '1.0.0'\n// done\n";
    let tokens = tokenize(source).unwrap();

    let mut offset = 0;
    for token in &tokens {
        assert_eq!(token.span.start, offset, "gap before {token:?}");
        offset = token.span.end;
    }
    assert_eq!(offset, source.len());
}

#[test]
fn test_token_text_slices_source() {
    let source = "parameter \"Measurement Period\" Interval<DateTime>";
    let tokens = tokenize(source).unwrap();
    let quoted = tokens
        .iter()
        .find(|t| t.kind == TokenKind::QuotedIdentifier)
        .unwrap();
    assert_eq!(quoted.text(source), "\"Measurement Period\"");
}

#[rstest]
#[case("'it''s fine'")]
#[case("'backslash \\' quote'")]
#[case("''")]
fn test_string_escapes(#[case] source: &str) {
    let tokens = tokenize(source).unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].span.end, source.len());
}

#[test]
fn test_multi_char_operators_are_single_tokens() {
    let kinds = significant_kinds("A >= B != C");
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Symbol,
            TokenKind::Identifier,
            TokenKind::Symbol,
            TokenKind::Identifier,
        ]
    );
}

#[rstest]
#[case("define", true)]
#[case("codesystem", true)]
#[case("Define", false)]
#[case("Code", false)]
#[case("Observation", false)]
fn test_keyword_case_sensitivity(#[case] word: &str, #[case] expected: bool) {
    assert_eq!(is_keyword(word), expected);
}

#[test]
fn test_windows_line_endings_lex_cleanly() {
    let source = "library Demo\r\ndefine X: 1\r\n";
    let kinds = significant_kinds(source);
    assert_eq!(kinds.len(), 6);
}
