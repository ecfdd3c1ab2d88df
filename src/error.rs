//! Rich diagnostic error types for the seshat engine.
//!
//! The taxonomy mirrors how failures propagate: [`StructuralError`] marks a
//! malformed token program and is always fatal regardless of resolution
//! policy; [`ResolutionError`] and [`NegationError`] are fatal in strict
//! mode and downgraded to diagnostics with an empty-predicate substitute in
//! lenient mode. Every variant carries a miette `#[diagnostic]` with an
//! error code and help text so callers know exactly what went wrong.

use miette::Diagnostic;
use thiserror::Error;

use crate::shape::Shape;

/// Top-level error type for the seshat engine.
///
/// Wraps the three error classes transparently, preserving the full
/// diagnostic chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum ScopeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Negation(#[from] NegationError),
}

pub type ScopeResult<T> = std::result::Result<T, ScopeError>;

// ---------------------------------------------------------------------------
// Structural errors: caller bugs in the token program, always fatal
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StructuralError {
    #[error("duplicate atom id \"{atom}\" in scope request")]
    #[diagnostic(
        code(seshat::structural::duplicate_atom),
        help("Each atom in a request must have a unique request-local id. Rename one of the duplicates.")
    )]
    DuplicateAtomId { atom: String },

    #[error("token #{token_index} pushes unknown atom id \"{atom}\"")]
    #[diagnostic(
        code(seshat::structural::unknown_atom),
        help("Every PushAtom token must reference an entry in the request's atom list by its id.")
    )]
    UnknownAtomId { atom: String, token_index: usize },

    #[error("token #{token_index} ({operator}) needs {needed} stack operand(s), found {available}")]
    #[diagnostic(
        code(seshat::structural::stack_underflow),
        help(
            "The token program is reverse-Polish: every And/Or consumes two previously \
             pushed operands and Not consumes one. Push the missing atoms first."
        )
    )]
    StackUnderflow {
        operator: &'static str,
        token_index: usize,
        needed: usize,
        available: usize,
    },

    #[error("token program left {leftover} items on the stack, expected exactly 1")]
    #[diagnostic(
        code(seshat::structural::unbalanced_program),
        help(
            "A well-formed program reduces to a single predicate. Combine the leftover \
             operands with And/Or, or drop the extra pushes."
        )
    )]
    UnbalancedProgram { leftover: usize },

    #[error("empty token program")]
    #[diagnostic(
        code(seshat::structural::empty_program),
        help("A scope program must contain at least one PushAtom token.")
    )]
    EmptyProgram,
}

// ---------------------------------------------------------------------------
// Resolution errors: data-dependent lookup failures, strict-mode fatal
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ResolutionError {
    #[error("unknown catalog reference \"{reference}\"")]
    #[diagnostic(
        code(seshat::resolve::unknown_reference),
        help(
            "The reference id is not in the current catalog snapshot. The workspace may have \
             changed since the descriptor was compiled; list the catalog to see what is available."
        )
    )]
    UnknownReference { reference: String },

    #[error("atom \"{atom}\" has no catalog reference")]
    #[diagnostic(
        code(seshat::resolve::missing_reference),
        help("Atoms of this kind cannot be synthesized ad hoc; they must carry a reference id obtained from the catalog.")
    )]
    MissingReference { atom: String },

    #[error("unknown standard scope \"{preset}\"")]
    #[diagnostic(
        code(seshat::resolve::unknown_standard),
        help("The workspace does not enumerate this preset. List the catalog for available standard scopes.")
    )]
    UnknownStandardScope { preset: String },

    #[error("unknown module \"{module}\"")]
    #[diagnostic(
        code(seshat::resolve::unknown_module),
        help("No module with this name exists in the workspace.")
    )]
    UnknownModule { module: String },

    #[error("named scope \"{name}\" not found in any holder")]
    #[diagnostic(
        code(seshat::resolve::named_scope_not_found),
        help("Check the scope name, or specify the holder id explicitly.")
    )]
    NamedScopeNotFound { name: String },

    #[error("named scope \"{name}\" is ambiguous: defined by holders {holders}")]
    #[diagnostic(
        code(seshat::resolve::ambiguous_named_scope),
        help("Specify the holder id on the atom to pick one of the candidates.")
    )]
    AmbiguousNamedScope { name: String, holders: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    PatternSyntax(#[from] crate::workspace::PatternSyntaxError),

    #[error("atom \"{atom}\" has an empty file set")]
    #[diagnostic(
        code(seshat::resolve::empty_file_set),
        help("A FileSet atom must list at least one file url.")
    )]
    EmptyFileSet { atom: String },

    #[error("directory \"{url}\" not found in workspace")]
    #[diagnostic(
        code(seshat::resolve::directory_not_found),
        help("The workspace model does not know this directory. Check the url.")
    )]
    DirectoryNotFound { url: String },

    #[error("scope \"{reference}\" requires user input and interactive resolution is disabled")]
    #[diagnostic(
        code(seshat::resolve::interactive_not_allowed),
        help("Pass allow_interactive=true, or replace the scope with a non-interactive one.")
    )]
    InteractiveNotAllowed { reference: String },
}

// ---------------------------------------------------------------------------
// Negation errors: Not applied to a non-enumerable operand
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum NegationError {
    #[error("token #{token_index}: cannot negate a {shape}-shaped predicate")]
    #[diagnostic(
        code(seshat::negate::non_global),
        help(
            "Only global (index-style) predicates have a well-defined workspace complement. \
             Local and mixed predicates cannot be safely negated."
        )
    )]
    NonGlobalOperand { shape: Shape, token_index: usize },
}
