//! The merge algorithm

use cql_merge_ast::{CqlLibraryGroup, Declaration, DependencyOutcome, MergedLibrary};
use std::collections::HashSet;

/// Flatten a library group into a single merged library
///
/// The merged sequence starts as the primary library's declarations minus
/// its includes (the dependencies they point at are being inlined). Each
/// parsed dependency's declarations are then appended in the group's stored
/// order, minus that dependency's includes and usings, and minus any
/// declaration whose name was already seen. The first occurrence by merge
/// order wins, compared by name only. Identically named declarations across
/// a library and its commons dependencies are assumed to be the same shared
/// definition, so duplicates are dropped, never renamed.
///
/// Never fails: unparsed dependencies were recorded at import time and are
/// skipped here.
pub fn merge(group: &CqlLibraryGroup) -> MergedLibrary {
    let mut seen: HashSet<String> = HashSet::new();
    let mut declarations = Vec::new();

    // Primary declarations are never renamed or dropped.
    for decl in &group.library.declarations {
        if matches!(decl, Declaration::Include(_)) {
            continue;
        }
        seen.insert(decl.name().to_string());
        declarations.push(decl.clone());
    }

    for outcome in &group.dependencies {
        let dep = match outcome {
            DependencyOutcome::Parsed(dep) => dep,
            DependencyOutcome::Failed { name, error } => {
                log::warn!(
                    "merge skipping unparsed dependency {}: {error}",
                    name.as_deref().unwrap_or("<unnamed>")
                );
                continue;
            }
        };

        for decl in &dep.declarations {
            // Includes and usings describe relationships the flattening
            // removes.
            if matches!(decl, Declaration::Include(_) | Declaration::Using(_)) {
                continue;
            }
            if seen.contains(decl.name()) {
                log::debug!(
                    "dropping duplicate {} '{}' from dependency {}",
                    decl.kind(),
                    decl.name(),
                    dep.name().unwrap_or("<unnamed>")
                );
                continue;
            }
            seen.insert(decl.name().to_string());
            declarations.push(decl.clone());
        }
    }

    MergedLibrary {
        header: group.library.header.clone(),
        declarations,
    }
}
