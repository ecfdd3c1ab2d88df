//! The predicate algebra the evaluator constructs.
//!
//! [`ScopePredicate`] is a sum type over workspace-supplied leaves and the
//! three set combinators. Membership testing, shape classification, and
//! display-name derivation all recurse over the structure; the
//! [`ScopePredicate::global_local_parts`] capability splits a predicate into
//! its enumerable global part and its finite local part where that split is
//! exact, replacing the original design's reflective decomposition of
//! opaque union types.

use std::sync::Arc;

use crate::shape::Shape;
use crate::workspace::{FileKey, LeafPredicate};

/// A file-membership predicate built by the evaluator.
#[derive(Clone)]
pub enum ScopePredicate {
    /// Accepts nothing. The lenient-mode substitute for anything that
    /// failed to resolve.
    Empty,
    /// A workspace-supplied atomic scope.
    Leaf(Arc<dyn LeafPredicate>),
    /// Set intersection of two predicates.
    Intersection(Box<ScopePredicate>, Box<ScopePredicate>),
    /// Set union of two predicates.
    Union(Box<ScopePredicate>, Box<ScopePredicate>),
    /// Workspace complement of a global predicate.
    Complement(Box<ScopePredicate>),
}

impl ScopePredicate {
    pub fn leaf(leaf: Arc<dyn LeafPredicate>) -> Self {
        ScopePredicate::Leaf(leaf)
    }

    /// Test whether the file belongs to this predicate.
    pub fn contains(&self, file: &FileKey) -> bool {
        match self {
            ScopePredicate::Empty => false,
            ScopePredicate::Leaf(leaf) => leaf.contains(file),
            ScopePredicate::Intersection(a, b) => a.contains(file) && b.contains(file),
            ScopePredicate::Union(a, b) => a.contains(file) || b.contains(file),
            ScopePredicate::Complement(inner) => !inner.contains(file),
        }
    }

    /// Shape of this predicate, recomputed from its structure.
    ///
    /// The empty predicate is `Global`: it is trivially enumerable and its
    /// complement (everything) is well defined.
    pub fn shape(&self) -> Shape {
        match self {
            ScopePredicate::Empty => Shape::Global,
            ScopePredicate::Leaf(leaf) => leaf.shape(),
            ScopePredicate::Intersection(a, b) | ScopePredicate::Union(a, b) => {
                a.shape().combine(b.shape())
            }
            ScopePredicate::Complement(_) => Shape::Global,
        }
    }

    /// Human-readable description, derived from the structure.
    pub fn display_name(&self) -> String {
        match self {
            ScopePredicate::Empty => "(empty)".to_string(),
            ScopePredicate::Leaf(leaf) => leaf.display_name(),
            ScopePredicate::Intersection(a, b) => {
                format!("{} && {}", a.display_operand(), b.display_operand())
            }
            ScopePredicate::Union(a, b) => {
                format!("{} || {}", a.display_operand(), b.display_operand())
            }
            ScopePredicate::Complement(inner) => format!("!{}", inner.display_operand()),
        }
    }

    /// Operand rendering: composites are parenthesized, leaves are not.
    fn display_operand(&self) -> String {
        match self {
            ScopePredicate::Empty | ScopePredicate::Leaf(_) => self.display_name(),
            _ => format!("({})", self.display_name()),
        }
    }

    /// Intersect with another predicate. Intersections with the empty
    /// predicate collapse to empty.
    pub fn intersect(self, other: ScopePredicate) -> ScopePredicate {
        match (self, other) {
            (ScopePredicate::Empty, _) | (_, ScopePredicate::Empty) => ScopePredicate::Empty,
            (a, b) => ScopePredicate::Intersection(Box::new(a), Box::new(b)),
        }
    }

    /// Union with another predicate. The empty predicate is the identity.
    pub fn union(self, other: ScopePredicate) -> ScopePredicate {
        match (self, other) {
            (ScopePredicate::Empty, b) => b,
            (a, ScopePredicate::Empty) => a,
            (a, b) => ScopePredicate::Union(Box::new(a), Box::new(b)),
        }
    }

    /// Workspace complement. Double complements cancel.
    ///
    /// The caller must have checked [`Shape::supports_complement`] on the
    /// operand; this constructor does not re-validate.
    pub fn complement(self) -> ScopePredicate {
        match self {
            ScopePredicate::Complement(inner) => *inner,
            other => ScopePredicate::Complement(Box::new(other)),
        }
    }

    /// Split into `(global, local)` parts such that the predicate equals
    /// their union, where the split is exact.
    ///
    /// Returns `None` for predicates containing an opaque mixed-shape leaf
    /// in a position where no exact split exists. Consumers that need the
    /// split (enumerate the local part, index-walk the global part) must
    /// fall back to per-file membership testing when they get `None`.
    pub fn global_local_parts(&self) -> Option<(ScopePredicate, ScopePredicate)> {
        match self.shape() {
            Shape::Global => Some((self.clone(), ScopePredicate::Empty)),
            Shape::Local => Some((ScopePredicate::Empty, self.clone())),
            Shape::Mixed => match self {
                // A union splits exactly when both operands split.
                ScopePredicate::Union(a, b) => {
                    let (ga, la) = a.global_local_parts()?;
                    let (gb, lb) = b.global_local_parts()?;
                    Some((ga.union(gb), la.union(lb)))
                }
                _ => None,
            },
        }
    }

    /// The explicit element snapshot, for `Local`-shaped predicates.
    pub fn local_elements(&self) -> Option<Vec<FileKey>> {
        if self.shape() != Shape::Local {
            return None;
        }
        match self {
            ScopePredicate::Leaf(leaf) => leaf.local_elements(),
            ScopePredicate::Union(a, b) => {
                let mut files = a.local_elements()?;
                for file in b.local_elements()? {
                    if !files.contains(&file) {
                        files.push(file);
                    }
                }
                Some(files)
            }
            ScopePredicate::Intersection(a, b) => {
                let files = a.local_elements()?;
                Some(files.into_iter().filter(|f| b.contains(f)).collect())
            }
            _ => None,
        }
    }

    /// True when this predicate contains an opaque mixed-shape leaf, i.e.
    /// one that cannot be split into global and local parts.
    pub fn has_opaque_leaf(&self) -> bool {
        match self {
            ScopePredicate::Empty => false,
            ScopePredicate::Leaf(leaf) => leaf.shape() == Shape::Mixed,
            ScopePredicate::Intersection(a, b) | ScopePredicate::Union(a, b) => {
                a.has_opaque_leaf() || b.has_opaque_leaf()
            }
            ScopePredicate::Complement(inner) => inner.has_opaque_leaf(),
        }
    }
}

impl std::fmt::Debug for ScopePredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScopePredicate({}, {})", self.display_name(), self.shape())
    }
}

impl std::fmt::Display for ScopePredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
