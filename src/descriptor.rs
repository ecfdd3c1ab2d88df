//! Scope program descriptors: the serializable compile artifact.
//!
//! A descriptor packages the normalized atoms, the original RPN token list,
//! and the resulting display name, shape, and diagnostics. It is the only
//! artifact that crosses component or process boundaries; consumers store
//! it (typically as JSON) and re-resolve it against a fresh catalog
//! snapshot each time they need a live predicate.

use serde::{Deserialize, Serialize};

use crate::atom::ScopeAtom;
use crate::diag::{diagnostics_equivalent, ScopeDiagnostic};
use crate::refid::AtomId;
use crate::shape::Shape;

/// Current descriptor format version.
pub const DESCRIPTOR_VERSION: u32 = 1;

fn current_version() -> u32 {
    DESCRIPTOR_VERSION
}

/// One RPN instruction of a scope program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScopeToken {
    /// Push the predicate of the atom with the given request-local id.
    #[serde(rename = "push")]
    PushAtom { atom: AtomId },
    /// Pop two operands, push their intersection.
    And,
    /// Pop two operands, push their union.
    Or,
    /// Pop one global operand, push its workspace complement.
    Not,
}

impl ScopeToken {
    pub fn push(atom: impl Into<String>) -> Self {
        ScopeToken::PushAtom {
            atom: AtomId::new(atom),
        }
    }

    /// Operator name for structural error messages.
    pub fn operator_name(&self) -> &'static str {
        match self {
            ScopeToken::PushAtom { .. } => "push",
            ScopeToken::And => "and",
            ScopeToken::Or => "or",
            ScopeToken::Not => "not",
        }
    }
}

impl std::fmt::Display for ScopeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeToken::PushAtom { atom } => write!(f, "push({atom})"),
            _ => write!(f, "{}", self.operator_name()),
        }
    }
}

/// The compiled, serializable scope program.
///
/// Immutable once produced: re-normalizing it yields the same atoms
/// byte-for-byte, with diagnostics compared order-independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeProgramDescriptor {
    /// Format version, for forward compatibility.
    #[serde(default = "current_version")]
    pub version: u32,
    pub atoms: Vec<ScopeAtom>,
    pub tokens: Vec<ScopeToken>,
    /// Display name derived from the final predicate.
    pub display_name: String,
    /// Shape of the final predicate at compile time.
    pub shape: Shape,
    /// Diagnostics collected during compilation (empty in strict mode
    /// unless the catalog itself degraded, e.g. a failing provider).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ScopeDiagnostic>,
}

impl ScopeProgramDescriptor {
    /// Serialize to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Structural equality with order-independent diagnostics, the
    /// idempotency contract for re-normalization.
    pub fn equivalent_to(&self, other: &ScopeProgramDescriptor) -> bool {
        self.version == other.version
            && self.atoms == other.atoms
            && self.tokens == other.tokens
            && self.display_name == other.display_name
            && self.shape == other.shape
            && diagnostics_equivalent(&self.diagnostics, &other.diagnostics)
    }
}
