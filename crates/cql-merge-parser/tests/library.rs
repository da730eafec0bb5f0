//! Tests for parsing complete CQL libraries into declarations
//!
//! Covers:
//! - Library header (name, version)
//! - Using/include definitions (aliases, quoted names)
//! - Terminology definitions (codesystem, valueset, code, concept)
//! - Parameter and context definitions
//! - Expression and function definitions, including nested function calls
//! - Byte-identical declaration text capture

use cql_merge_ast::{Declaration, DeclarationKind};
use cql_merge_parser::{Visitor, parse};
use pretty_assertions::assert_eq;
use rstest::rstest;

const DEMO: &str = "\
library CDSDemo version '1.2.0'

using FHIR version '4.0.1'

include CommonsHelpers version '1.0.0' called Helpers
include \"CDS Conversions\" version '2.1.0' called Convert

codesystem \"LOINC\": 'http://loinc.org'
codesystem \"SNOMEDCT\": 'http://snomed.info/sct'

valueset \"Diabetes\": 'urn:oid:2.16.840.1.113883.3.464.1003.103.12.1001'

code \"Systolic blood pressure\": '8480-6' from \"LOINC\" display 'Systolic blood pressure'

concept \"Blood pressure panel\": { \"Systolic blood pressure\" } display 'Blood pressure'

parameter MeasurementPeriod Interval<DateTime> default Interval[@2019-01-01T00:00:00.0, @2020-01-01T00:00:00.0)

context Patient

define InDemographic: AgeInYearsAt(start of MeasurementPeriod) >= 18

define function HighestObservation(observations List<FHIR.Observation>):
  Max(observations O return O.value as FHIR.Quantity)
";

fn declarations(source: &str) -> Vec<Declaration> {
    let tree = parse(source).unwrap_or_else(|e| panic!("parse failed: {e}"));
    Visitor::new(source).build(&tree)
}

#[test]
fn test_header() {
    let tree = parse(DEMO).unwrap();
    let header = Visitor::new(DEMO).library_header(&tree).unwrap();
    assert_eq!(header.name, "CDSDemo");
    assert_eq!(header.version.as_deref(), Some("1.2.0"));
    assert_eq!(header.text, "library CDSDemo version '1.2.0'");
}

#[test]
fn test_declaration_kinds_in_order() {
    let kinds: Vec<DeclarationKind> = declarations(DEMO).iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            DeclarationKind::Using,
            DeclarationKind::Include,
            DeclarationKind::Include,
            DeclarationKind::Codesystem,
            DeclarationKind::Codesystem,
            DeclarationKind::Valueset,
            DeclarationKind::Code,
            DeclarationKind::Concept,
            DeclarationKind::Parameter,
            DeclarationKind::Context,
            DeclarationKind::Expression,
            DeclarationKind::Function,
        ]
    );
}

#[test]
fn test_include_alias_and_quoted_name() {
    let decls = declarations(DEMO);
    let includes: Vec<_> = decls
        .iter()
        .filter_map(|d| match d {
            Declaration::Include(inc) => Some(inc),
            _ => None,
        })
        .collect();

    assert_eq!(includes[0].library, "CommonsHelpers");
    assert_eq!(includes[0].version.as_deref(), Some("1.0.0"));
    assert_eq!(includes[0].alias.as_deref(), Some("Helpers"));
    assert_eq!(includes[1].library, "CDS Conversions");
    assert_eq!(includes[1].alias.as_deref(), Some("Convert"));
}

#[rstest]
#[case("LOINC", DeclarationKind::Codesystem)]
#[case("Diabetes", DeclarationKind::Valueset)]
#[case("Systolic blood pressure", DeclarationKind::Code)]
#[case("Blood pressure panel", DeclarationKind::Concept)]
#[case("MeasurementPeriod", DeclarationKind::Parameter)]
#[case("Patient", DeclarationKind::Context)]
#[case("InDemographic", DeclarationKind::Expression)]
#[case("HighestObservation", DeclarationKind::Function)]
fn test_declaration_names(#[case] name: &str, #[case] kind: DeclarationKind) {
    let decls = declarations(DEMO);
    assert!(
        decls.iter().any(|d| d.name() == name && d.kind() == kind),
        "no {kind} named {name}"
    );
}

#[test]
fn test_declaration_text_is_source_slice() {
    let decls = declarations(DEMO);

    let parameter = decls
        .iter()
        .find(|d| d.kind() == DeclarationKind::Parameter)
        .unwrap();
    assert_eq!(
        parameter.text(),
        "parameter MeasurementPeriod Interval<DateTime> default Interval[@2019-01-01T00:00:00.0, @2020-01-01T00:00:00.0)"
    );

    let function = decls
        .iter()
        .find(|d| d.kind() == DeclarationKind::Function)
        .unwrap();
    assert_eq!(
        function.text(),
        "define function HighestObservation(observations List<FHIR.Observation>):\n  Max(observations O return O.value as FHIR.Quantity)"
    );

    // Spans slice back to the same text.
    for decl in &decls {
        assert_eq!(decl.span().slice(DEMO), decl.text());
    }
}

#[test]
fn test_function_calling_local_function() {
    let source = "\
library Nested version '0.1.0'

define function Inner(value Integer):
  value * 2

define function Outer(value Integer):
  Inner(value) + 1
";
    let decls = declarations(source);
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[0].name(), "Inner");
    assert_eq!(decls[1].name(), "Outer");
    assert!(decls[1].text().contains("Inner(value)"));
}

#[test]
fn test_fluent_and_external_functions() {
    let source = "\
library Fns

define fluent function toQuantity(value Decimal):
  System.Quantity { value: value }

define function Now() returns DateTime external
";
    let decls = declarations(source);

    let Declaration::Function(fluent) = &decls[0] else {
        panic!("expected function");
    };
    assert!(fluent.fluent);
    assert!(!fluent.external);
    assert_eq!(fluent.name, "toQuantity");

    let Declaration::Function(external) = &decls[1] else {
        panic!("expected function");
    };
    assert!(external.external);
    assert_eq!(external.text, "define function Now() returns DateTime external");
}

#[test]
fn test_library_without_header_or_dependencies() {
    let source = "define X: 1";
    let tree = parse(source).unwrap();
    let visitor = Visitor::new(source);
    assert!(visitor.library_header(&tree).is_none());
    let decls = visitor.build(&tree);
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].text(), "define X: 1");
}

#[test]
fn test_access_modifiers_kept_in_text() {
    let source = "\
library Access

private parameter Threshold Integer default 5

public define Visible: Threshold > 3
";
    let decls = declarations(source);
    assert_eq!(decls[0].text(), "private parameter Threshold Integer default 5");
    assert_eq!(decls[1].text(), "public define Visible: Threshold > 3");
}

#[test]
fn test_comments_between_declarations_are_kept() {
    let source = "\
library Comments

// leading comment
define A: 1

/* block */
define B: 2
";
    let decls = declarations(source);
    assert_eq!(decls[0].text(), "// leading comment\ndefine A: 1");
    assert_eq!(decls[1].text(), "/* block */\ndefine B: 2");
}
