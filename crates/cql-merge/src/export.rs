//! Deterministic serialization of a merged library

use crate::merge;
use cql_merge_ast::{CqlLibraryGroup, DeclarationKind, MergedLibrary};

// Header-section kinds in the order the library grammar requires them.
const SECTION_ORDER: &[DeclarationKind] = &[
    DeclarationKind::Using,
    DeclarationKind::Codesystem,
    DeclarationKind::Valueset,
    DeclarationKind::Code,
    DeclarationKind::Concept,
    DeclarationKind::Parameter,
    DeclarationKind::Context,
];

/// Serialize a merged library back to CQL source text
///
/// Header line first, then the header-section declarations grouped by kind
/// in grammar order, then the function and expression definitions. Within
/// each group the merged sequence order is preserved. Declarations are
/// emitted as their literal captured text, one blank line apart, with line
/// endings normalized to `\n`. Total: never fails on a well-formed merged
/// library.
pub fn export(merged: &MergedLibrary) -> String {
    let mut blocks: Vec<&str> = Vec::new();

    if let Some(header) = &merged.header {
        blocks.push(header.text.as_str());
    }
    for kind in SECTION_ORDER {
        for decl in merged.declarations.iter().filter(|d| d.kind() == *kind) {
            blocks.push(decl.text());
        }
    }
    for decl in merged.declarations.iter().filter(|d| d.is_statement()) {
        blocks.push(decl.text());
    }

    let mut out = blocks.join("\n\n").replace("\r\n", "\n");
    out.push('\n');
    out
}

/// Merge a library group and serialize the result
pub fn export_cql(group: &CqlLibraryGroup) -> String {
    export(&merge(group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import_cql;
    use cql_merge_ast::RawCql;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_export_groups_by_kind() {
        let source = "library Demo version '1.0'\n\
                      using FHIR version '4.0.1'\n\
                      define X: 1\n\
                      parameter Period Interval<DateTime>\n\
                      context Patient";
        let group = import_cql(RawCql::new(source), Vec::new()).unwrap();

        let expected = "library Demo version '1.0'\n\n\
                        using FHIR version '4.0.1'\n\n\
                        parameter Period Interval<DateTime>\n\n\
                        context Patient\n\n\
                        define X: 1\n";
        assert_eq!(export_cql(&group), expected);
    }

    #[test]
    fn test_export_keeps_standalone_comments() {
        let group = import_cql(
            RawCql::new("library Main\n// standalone comment\ndefine X: 1"),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(
            export_cql(&group),
            "library Main\n\n// standalone comment\ndefine X: 1\n"
        );
    }

    #[test]
    fn test_export_normalizes_line_endings() {
        let group = import_cql(
            RawCql::new("library Demo\r\ndefine X:\r\n  1 + 2"),
            Vec::new(),
        )
        .unwrap();
        let out = export_cql(&group);
        assert!(!out.contains('\r'));
        assert!(out.contains("define X:\n  1 + 2"));
    }

    #[test]
    fn test_export_is_total_for_empty_library() {
        let group = import_cql(RawCql::new("library Empty version '0.1'"), Vec::new()).unwrap();
        assert_eq!(export_cql(&group), "library Empty version '0.1'\n");
    }
}
