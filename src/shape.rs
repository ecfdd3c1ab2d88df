//! Predicate shape classification.
//!
//! Every predicate has a [`Shape`] describing how safely it can be consumed:
//! `Global` predicates support full enumeration and complement, `Local`
//! predicates are finite element snapshots that can only be iterated, and
//! `Mixed` predicates arise from combining the two and are only testable
//! per-file. The shape is recomputed after every `And`/`Or`/`Not`.

use serde::{Deserialize, Serialize};

/// Tri-state classification of a predicate's enumerability and negatability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Index-style predicate: supports full enumeration and complement.
    Global,
    /// Finite explicit element snapshot: no enumeration, no complement.
    Local,
    /// Combination of global and local parts: testable per-file only.
    Mixed,
}

impl Shape {
    /// Shape of an `And`/`Or` combination of two operands.
    ///
    /// `Global` survives only when both operands are `Global`; `Local`
    /// survives only when both are `Local`; every other pairing is `Mixed`.
    pub fn combine(self, other: Shape) -> Shape {
        match (self, other) {
            (Shape::Global, Shape::Global) => Shape::Global,
            (Shape::Local, Shape::Local) => Shape::Local,
            _ => Shape::Mixed,
        }
    }

    /// Whether `Not` may be applied to a predicate of this shape.
    pub fn supports_complement(self) -> bool {
        matches!(self, Shape::Global)
    }

    /// Whether a predicate of this shape can be fully enumerated.
    pub fn supports_enumeration(self) -> bool {
        matches!(self, Shape::Global | Shape::Local)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Global => write!(f, "global"),
            Shape::Local => write!(f, "local"),
            Shape::Mixed => write!(f, "mixed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_table() {
        assert_eq!(Shape::Global.combine(Shape::Global), Shape::Global);
        assert_eq!(Shape::Local.combine(Shape::Local), Shape::Local);
        assert_eq!(Shape::Global.combine(Shape::Local), Shape::Mixed);
        assert_eq!(Shape::Local.combine(Shape::Global), Shape::Mixed);
        assert_eq!(Shape::Mixed.combine(Shape::Global), Shape::Mixed);
        assert_eq!(Shape::Local.combine(Shape::Mixed), Shape::Mixed);
    }

    #[test]
    fn complement_only_on_global() {
        assert!(Shape::Global.supports_complement());
        assert!(!Shape::Local.supports_complement());
        assert!(!Shape::Mixed.supports_complement());
    }

    #[test]
    fn serde_round_trip() {
        let json = serde_json::to_string(&Shape::Mixed).unwrap();
        assert_eq!(json, "\"mixed\"");
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Shape::Mixed);
    }
}
