//! Serializable diagnostics collected during lenient resolution.
//!
//! Unlike the error types in [`crate::error`], diagnostics are data: they
//! travel inside descriptors and resolved scopes, survive serialization, and
//! are compared order-independently (re-normalizing a descriptor may collect
//! the same records in a different order).

use serde::{Deserialize, Serialize};

use crate::refid::AtomId;

/// Machine-readable classification of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// A catalog family registered a reference id that was already taken.
    CatalogShadowed,
    /// A scope provider failed; its contributions are missing from the catalog.
    ProviderFailed,
    /// A scope provider exposed no usable scopes.
    ProviderEmpty,
    /// An atom could not be resolved; an empty predicate was substituted.
    UnresolvedAtom,
    /// A named scope matched more than one holder.
    AmbiguousNamedScope,
    /// Pattern text failed to compile.
    PatternSyntax,
    /// `Not` was applied to a non-global operand; an empty predicate was
    /// substituted.
    NegationDegraded,
    /// An opaque mixed-shape leaf was combined; the result is testable
    /// per-file but cannot be split into global and local parts.
    OpaqueDegradation,
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DiagnosticCode::CatalogShadowed => "catalog_shadowed",
            DiagnosticCode::ProviderFailed => "provider_failed",
            DiagnosticCode::ProviderEmpty => "provider_empty",
            DiagnosticCode::UnresolvedAtom => "unresolved_atom",
            DiagnosticCode::AmbiguousNamedScope => "ambiguous_named_scope",
            DiagnosticCode::PatternSyntax => "pattern_syntax",
            DiagnosticCode::NegationDegraded => "negation_degraded",
            DiagnosticCode::OpaqueDegradation => "opaque_degradation",
        };
        write!(f, "{name}")
    }
}

/// One collected diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeDiagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    /// The request-local atom the record refers to, where applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atom: Option<AtomId>,
}

impl ScopeDiagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        ScopeDiagnostic {
            code,
            message: message.into(),
            atom: None,
        }
    }

    pub fn for_atom(code: DiagnosticCode, atom: AtomId, message: impl Into<String>) -> Self {
        ScopeDiagnostic {
            code,
            message: message.into(),
            atom: Some(atom),
        }
    }
}

impl std::fmt::Display for ScopeDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.atom {
            Some(atom) => write!(f, "[{}] atom \"{atom}\": {}", self.code, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Order-independent equality over two diagnostic lists.
pub fn diagnostics_equivalent(a: &[ScopeDiagnostic], b: &[ScopeDiagnostic]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left: Vec<&ScopeDiagnostic> = a.iter().collect();
    let mut right: Vec<&ScopeDiagnostic> = b.iter().collect();
    left.sort();
    right.sort();
    left == right
}
