//! Program evaluator: a stack machine over RPN scope tokens.
//!
//! Walks the token list in order, pushing resolved atom predicates and
//! combining them with `And`/`Or`/`Not`. Structural problems (unknown atom
//! id, arity underflow, leftover stack) are always fatal with the offending
//! token index; resolution and negation problems follow the strict/lenient
//! split, substituting an empty predicate and recording a diagnostic in
//! lenient mode so the evaluation either fully fails or fully completes.

use std::collections::BTreeMap;

use crate::atom::{AtomKind, ScopeAtom};
use crate::catalog::Catalog;
use crate::descriptor::ScopeToken;
use crate::diag::{DiagnosticCode, ScopeDiagnostic};
use crate::engine::ResolveOptions;
use crate::error::{NegationError, ResolutionError, ScopeResult, StructuralError};
use crate::predicate::ScopePredicate;
use crate::refid::{AtomId, ReferenceId};
use crate::shape::Shape;
use crate::workspace::{FileKey, WorkspaceModel};

/// The ephemeral result of executing a scope program against a fresh
/// catalog snapshot. Not serializable; consumers re-resolve the descriptor
/// whenever they need a live predicate.
#[derive(Debug)]
pub struct ResolvedScope {
    pub predicate: ScopePredicate,
    pub display_name: String,
    pub shape: Shape,
    pub diagnostics: Vec<ScopeDiagnostic>,
}

/// Execute the token program over the normalized atoms.
pub fn evaluate(
    tokens: &[ScopeToken],
    atoms: &BTreeMap<AtomId, ScopeAtom>,
    catalog: &Catalog,
    workspace: &dyn WorkspaceModel,
    options: &ResolveOptions,
) -> ScopeResult<ResolvedScope> {
    if tokens.is_empty() {
        return Err(StructuralError::EmptyProgram.into());
    }

    let mut stack: Vec<ScopePredicate> = Vec::new();
    let mut diagnostics = Vec::new();

    for (token_index, token) in tokens.iter().enumerate() {
        match token {
            ScopeToken::PushAtom { atom } => {
                // A missing atom id is a structural error in the request,
                // not a resolution failure.
                let Some(entry) = atoms.get(atom) else {
                    return Err(StructuralError::UnknownAtomId {
                        atom: atom.to_string(),
                        token_index,
                    }
                    .into());
                };
                match resolve_predicate(entry, catalog, workspace, options) {
                    Ok(predicate) => stack.push(predicate),
                    Err(error) => {
                        if options.strict {
                            return Err(error.into());
                        }
                        tracing::debug!(
                            atom = %entry.id,
                            error = %error,
                            "lenient degradation: substituting empty predicate"
                        );
                        diagnostics.push(ScopeDiagnostic::for_atom(
                            DiagnosticCode::UnresolvedAtom,
                            entry.id.clone(),
                            error.to_string(),
                        ));
                        stack.push(ScopePredicate::Empty);
                    }
                }
            }

            ScopeToken::And | ScopeToken::Or => {
                if stack.len() < 2 {
                    return Err(StructuralError::StackUnderflow {
                        operator: token.operator_name(),
                        token_index,
                        needed: 2,
                        available: stack.len(),
                    }
                    .into());
                }
                let right = stack.pop().expect("stack size checked");
                let left = stack.pop().expect("stack size checked");
                note_opaque_operand(&left, &mut diagnostics);
                note_opaque_operand(&right, &mut diagnostics);
                let combined = match token {
                    ScopeToken::And => left.intersect(right),
                    _ => left.union(right),
                };
                stack.push(combined);
            }

            ScopeToken::Not => {
                if stack.is_empty() {
                    return Err(StructuralError::StackUnderflow {
                        operator: token.operator_name(),
                        token_index,
                        needed: 1,
                        available: 0,
                    }
                    .into());
                }
                let operand = stack.pop().expect("stack size checked");
                let shape = operand.shape();
                if !shape.supports_complement() {
                    if options.strict {
                        return Err(NegationError::NonGlobalOperand { shape, token_index }.into());
                    }
                    tracing::debug!(
                        %shape,
                        token_index,
                        "lenient degradation: negation of non-global operand"
                    );
                    diagnostics.push(ScopeDiagnostic::new(
                        DiagnosticCode::NegationDegraded,
                        format!(
                            "token #{token_index}: cannot negate a {shape}-shaped predicate; \
                             substituted the empty predicate"
                        ),
                    ));
                    stack.push(ScopePredicate::Empty);
                } else {
                    stack.push(operand.complement());
                }
            }
        }
    }

    if stack.len() != 1 {
        return Err(StructuralError::UnbalancedProgram {
            leftover: stack.len(),
        }
        .into());
    }
    let predicate = stack.pop().expect("stack size checked");
    let shape = predicate.shape();
    let display_name = predicate.display_name();
    tracing::debug!(tokens = tokens.len(), %shape, scope = %display_name, "evaluated scope program");

    Ok(ResolvedScope {
        predicate,
        display_name,
        shape,
        diagnostics,
    })
}

/// Record the degradation when an opaque mixed-shape leaf enters a
/// combination: the combined predicate stays testable per-file but cannot
/// be split into global and local parts.
fn note_opaque_operand(operand: &ScopePredicate, diagnostics: &mut Vec<ScopeDiagnostic>) {
    if let ScopePredicate::Leaf(_) = operand {
        if operand.shape() == Shape::Mixed {
            diagnostics.push(ScopeDiagnostic::new(
                DiagnosticCode::OpaqueDegradation,
                format!(
                    "scope \"{}\" has an opaque shape; the combination is testable per-file \
                     but cannot be enumerated",
                    operand.display_name()
                ),
            ));
        }
    }
}

/// Resolve one normalized atom to its live predicate.
fn resolve_predicate(
    atom: &ScopeAtom,
    catalog: &Catalog,
    workspace: &dyn WorkspaceModel,
    options: &ResolveOptions,
) -> Result<ScopePredicate, ResolutionError> {
    match &atom.kind {
        // Ad-hoc kinds resolve through the workspace model, not the catalog.
        AtomKind::AdHocPattern { pattern } => {
            let leaf = workspace.compile_pattern(pattern.trim())?;
            Ok(ScopePredicate::leaf(leaf))
        }
        AtomKind::Directory { url, recursive } => workspace
            .directory_scope(url, *recursive)
            .map(ScopePredicate::leaf)
            .ok_or_else(|| ResolutionError::DirectoryNotFound { url: url.clone() }),
        AtomKind::FileSet { files } => {
            if files.is_empty() {
                return Err(ResolutionError::EmptyFileSet {
                    atom: atom.id.to_string(),
                });
            }
            let mut sorted = files.clone();
            sorted.sort();
            sorted.dedup();
            let keys: Vec<FileKey> = sorted.iter().map(FileKey::new).collect();
            Ok(ScopePredicate::leaf(workspace.file_set_scope(&keys)))
        }

        // Catalog-backed kinds.
        _ => {
            let reference = atom.scope_ref.clone().or_else(|| synthesize_reference(atom));
            let Some(reference) = reference else {
                return Err(unresolved_error(atom, None));
            };
            let Some(record) = catalog.get(&reference) else {
                return Err(unresolved_error(atom, Some(&reference)));
            };
            if record.requires_user_input && !options.allow_interactive {
                return Err(ResolutionError::InteractiveNotAllowed {
                    reference: reference.to_string(),
                });
            }
            Ok(record.predicate.clone())
        }
    }
}

/// Deterministic reference for kinds that synthesize one, when normalization
/// has not filled it in (e.g. a hand-built request evaluated directly).
fn synthesize_reference(atom: &ScopeAtom) -> Option<ReferenceId> {
    match &atom.kind {
        AtomKind::Standard { preset } => Some(ReferenceId::standard(preset)),
        AtomKind::Module { module, flavor } => Some(ReferenceId::module(module, *flavor)),
        AtomKind::NamedPattern {
            name,
            holder: Some(holder),
        } => Some(ReferenceId::named(holder, name)),
        _ => None,
    }
}

/// The kind-specific resolution error for a catalog miss.
fn unresolved_error(atom: &ScopeAtom, reference: Option<&ReferenceId>) -> ResolutionError {
    match &atom.kind {
        AtomKind::Standard { preset } => ResolutionError::UnknownStandardScope {
            preset: preset.clone(),
        },
        AtomKind::Module { module, .. } => ResolutionError::UnknownModule {
            module: module.clone(),
        },
        AtomKind::NamedPattern { name, .. } => ResolutionError::NamedScopeNotFound {
            name: name.clone(),
        },
        _ => match reference {
            Some(reference) => ResolutionError::UnknownReference {
                reference: reference.to_string(),
            },
            None => ResolutionError::MissingReference {
                atom: atom.id.to_string(),
            },
        },
    }
}
