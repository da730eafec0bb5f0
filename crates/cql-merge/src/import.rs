//! Importing raw CQL into a library group

use cql_merge_ast::{CqlLibrary, CqlLibraryGroup, DependencyOutcome, RawCql};
use cql_merge_diagnostics::{CQL0100, CQL0101, CqlError, Result};
use cql_merge_parser::{Visitor, parse};

/// Parse a primary library and its dependencies into a library group
///
/// The primary library must parse; a failure there is fatal and returned as
/// an import error wrapping the parse failure. Each dependency is parsed
/// independently: a failing dependency occupies its slot as a recorded
/// failure and is skipped by the merge, so one broken dependency never
/// blocks the others. Dependency order is preserved; it decides collision
/// ties during the merge.
pub fn import_cql(primary: RawCql, dependencies: Vec<RawCql>) -> Result<CqlLibraryGroup> {
    let library = parse_library(primary).map_err(|(name, error)| {
        let message = match &name {
            Some(name) => format!("Primary library '{name}' failed to parse"),
            None => "Primary library failed to parse".to_string(),
        };
        CqlError::import(CQL0100, message, name, error)
    })?;

    let dependencies = dependencies
        .into_iter()
        .map(|raw| match parse_library(raw) {
            Ok(lib) => DependencyOutcome::Parsed(lib),
            Err((name, error)) => {
                log::warn!(
                    "dependency {} failed to parse and will be skipped: {error}",
                    name.as_deref().unwrap_or("<unnamed>")
                );
                let message = match &name {
                    Some(name) => format!("Dependency library '{name}' failed to parse"),
                    None => "Dependency library failed to parse".to_string(),
                };
                let error = CqlError::import(CQL0101, message, name.clone(), error);
                DependencyOutcome::Failed { name, error }
            }
        })
        .collect();

    Ok(CqlLibraryGroup::new(library, dependencies))
}

/// Parse one raw library into its normalized form
///
/// On failure the raw source's name hint is handed back alongside the error
/// so the caller can attribute it.
fn parse_library(raw: RawCql) -> std::result::Result<CqlLibrary, (Option<String>, CqlError)> {
    match parse(&raw.content) {
        Ok(tree) => {
            let visitor = Visitor::new(&raw.content);
            let header = visitor.library_header(&tree);
            let declarations = visitor.build(&tree);
            Ok(CqlLibrary {
                header,
                declarations,
                source: raw,
            })
        }
        Err(error) => Err((raw.name, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_parses_primary() {
        let group = import_cql(
            RawCql::new("library Demo version '1.0'\ndefine X: 1"),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(group.library.header.as_ref().unwrap().name, "Demo");
        assert_eq!(group.library.declarations.len(), 1);
    }

    #[test]
    fn test_primary_failure_is_fatal() {
        let err = import_cql(RawCql::new("library Demo\ndefine : broken"), Vec::new())
            .unwrap_err();
        assert_eq!(err.code(), CQL0100);
    }

    #[test]
    fn test_dependency_failure_is_recorded_not_fatal() {
        let group = import_cql(
            RawCql::new("library Demo\ndefine X: 1"),
            vec![
                RawCql::new("library Broken\ndefine : nope").with_name("Broken.cql"),
                RawCql::new("library Ok\ndefine Y: 2"),
            ],
        )
        .unwrap();
        assert_eq!(group.dependencies.len(), 2);
        assert_eq!(
            group.dependencies[0].error().map(|e| e.code()),
            Some(CQL0101)
        );
        assert!(group.dependencies[1].library().is_some());
    }
}
