//! Atom normalization: resolving raw atoms against a catalog snapshot.
//!
//! Normalization fills in canonical fields (reference id, display name),
//! detects ambiguity for holder-less named patterns, and validates ad-hoc
//! payloads. It is idempotent: feeding a normalized atom back through
//! produces the same atom field-for-field. Resolution failures follow the
//! strict/lenient split — strict mode fails, lenient mode records a
//! diagnostic and passes the atom through unresolved (the evaluator later
//! substitutes an empty predicate for it).

use crate::atom::{AtomKind, ScopeAtom};
use crate::catalog::Catalog;
use crate::diag::{DiagnosticCode, ScopeDiagnostic};
use crate::engine::ResolveOptions;
use crate::error::{ResolutionError, ScopeResult};
use crate::refid::ReferenceId;
use crate::workspace::WorkspaceModel;

/// Normalize one atom against the catalog snapshot.
///
/// Returns the canonical atom plus any diagnostics collected in lenient
/// mode. Strict mode turns every resolution problem into an error instead.
pub fn normalize_atom(
    atom: &ScopeAtom,
    catalog: &Catalog,
    workspace: &dyn WorkspaceModel,
    options: &ResolveOptions,
) -> ScopeResult<(ScopeAtom, Vec<ScopeDiagnostic>)> {
    let mut out = atom.clone();
    let mut diagnostics = Vec::new();

    match &atom.kind {
        // Reference-carrying kinds: the reference id is the payload and
        // cannot be synthesized here.
        AtomKind::CatalogRef | AtomKind::ProviderContributed { .. } => {
            let Some(reference) = atom.scope_ref.clone() else {
                degrade(
                    ResolutionError::MissingReference {
                        atom: atom.id.to_string(),
                    },
                    DiagnosticCode::UnresolvedAtom,
                    atom,
                    &mut diagnostics,
                    options,
                )?;
                return Ok((out, diagnostics));
            };
            match catalog.get(&reference) {
                Some(record) if record.requires_user_input && !options.allow_interactive => {
                    degrade(
                        ResolutionError::InteractiveNotAllowed {
                            reference: reference.to_string(),
                        },
                        DiagnosticCode::UnresolvedAtom,
                        atom,
                        &mut diagnostics,
                        options,
                    )?;
                }
                Some(record) => {
                    out.display_name = Some(record.display_name.clone());
                }
                None => {
                    degrade(
                        ResolutionError::UnknownReference {
                            reference: reference.to_string(),
                        },
                        DiagnosticCode::UnresolvedAtom,
                        atom,
                        &mut diagnostics,
                        options,
                    )?;
                }
            }
        }

        // Deterministic synthesis: no ambiguity possible, existence is
        // enforced when the predicate is looked up at evaluation time.
        AtomKind::Standard { preset } => {
            let reference = ReferenceId::standard(preset);
            match catalog.get(&reference) {
                Some(record) if record.requires_user_input && !options.allow_interactive => {
                    degrade(
                        ResolutionError::InteractiveNotAllowed {
                            reference: reference.to_string(),
                        },
                        DiagnosticCode::UnresolvedAtom,
                        atom,
                        &mut diagnostics,
                        options,
                    )?;
                    out.scope_ref = Some(reference);
                }
                Some(record) => {
                    out.display_name = Some(record.display_name.clone());
                    out.scope_ref = Some(reference);
                }
                None => {
                    out.display_name = Some(preset.clone());
                    out.scope_ref = Some(reference);
                }
            }
        }

        AtomKind::Module { module, flavor } => {
            let reference = ReferenceId::module(module, *flavor);
            out.display_name = Some(match catalog.get(&reference) {
                Some(record) => record.display_name.clone(),
                None => format!("Module '{module}'{}", flavor.display_suffix()),
            });
            out.scope_ref = Some(reference);
        }

        AtomKind::NamedPattern { name, holder } => match holder {
            Some(holder_id) => {
                let reference = ReferenceId::named(holder_id, name);
                out.display_name = Some(match catalog.get(&reference) {
                    Some(record) => record.display_name.clone(),
                    None => name.clone(),
                });
                out.scope_ref = Some(reference);
            }
            None => {
                let candidates = catalog.find_named(name);
                match candidates.as_slice() {
                    [] => {
                        degrade(
                            ResolutionError::NamedScopeNotFound { name: name.clone() },
                            DiagnosticCode::UnresolvedAtom,
                            atom,
                            &mut diagnostics,
                            options,
                        )?;
                    }
                    [record] => {
                        let (holder_id, scope_name) = record
                            .named_scope
                            .clone()
                            .unwrap_or_else(|| (String::new(), name.clone()));
                        out.kind = AtomKind::NamedPattern {
                            name: scope_name,
                            holder: Some(holder_id),
                        };
                        out.display_name = Some(record.display_name.clone());
                        out.scope_ref = Some(record.reference_id.clone());
                    }
                    many => {
                        let holders: Vec<&str> = many
                            .iter()
                            .filter_map(|r| r.named_scope.as_ref())
                            .map(|(h, _)| h.as_str())
                            .collect();
                        degrade(
                            ResolutionError::AmbiguousNamedScope {
                                name: name.clone(),
                                holders: holders.join(", "),
                            },
                            DiagnosticCode::AmbiguousNamedScope,
                            atom,
                            &mut diagnostics,
                            options,
                        )?;
                    }
                }
            }
        },

        AtomKind::AdHocPattern { pattern } => {
            let trimmed = pattern.trim().to_string();
            match workspace.compile_pattern(&trimmed) {
                Ok(_) => {
                    out.scope_ref = Some(ReferenceId::pattern(&trimmed));
                    out.display_name = Some(format!("Pattern '{trimmed}'"));
                    out.kind = AtomKind::AdHocPattern { pattern: trimmed };
                }
                Err(err) => {
                    degrade(
                        ResolutionError::PatternSyntax(err),
                        DiagnosticCode::PatternSyntax,
                        atom,
                        &mut diagnostics,
                        options,
                    )?;
                }
            }
        }

        AtomKind::Directory { url, recursive } => {
            if workspace.directory_scope(url, *recursive).is_some() {
                out.scope_ref = Some(ReferenceId::directory(url, *recursive));
                out.display_name = Some(format!("Directory '{url}'"));
            } else {
                degrade(
                    ResolutionError::DirectoryNotFound { url: url.clone() },
                    DiagnosticCode::UnresolvedAtom,
                    atom,
                    &mut diagnostics,
                    options,
                )?;
            }
        }

        AtomKind::FileSet { files } => {
            if files.is_empty() {
                degrade(
                    ResolutionError::EmptyFileSet {
                        atom: atom.id.to_string(),
                    },
                    DiagnosticCode::UnresolvedAtom,
                    atom,
                    &mut diagnostics,
                    options,
                )?;
            } else {
                let mut sorted = files.clone();
                sorted.sort();
                sorted.dedup();
                out.scope_ref = Some(ReferenceId::file_set(&sorted));
                out.display_name = Some(format!("{} files", sorted.len()));
                out.kind = AtomKind::FileSet { files: sorted };
            }
        }
    }

    Ok((out, diagnostics))
}

/// Strict mode fails with the error; lenient mode records it and continues.
fn degrade(
    error: ResolutionError,
    code: DiagnosticCode,
    atom: &ScopeAtom,
    diagnostics: &mut Vec<ScopeDiagnostic>,
    options: &ResolveOptions,
) -> ScopeResult<()> {
    if options.strict {
        return Err(error.into());
    }
    tracing::debug!(atom = %atom.id, error = %error, "lenient degradation during normalization");
    diagnostics.push(ScopeDiagnostic::for_atom(code, atom.id.clone(), error.to_string()));
    Ok(())
}
