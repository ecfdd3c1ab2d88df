//! Scope atoms: atomic predicate descriptions before and after
//! normalization.
//!
//! An atom names one atomic scope either by direct catalog reference or by
//! kind-specific coordinates. [`AtomKind`] is a tagged union with one
//! variant per kind, so only the fields relevant to a kind exist at all;
//! the advisory fields (`scope_ref`, `display_name`) are filled in by
//! normalization and are denormalized copies of catalog state.

use serde::{Deserialize, Serialize};

use crate::refid::{AtomId, ReferenceId};
use crate::workspace::ModuleFlavor;

/// One atomic predicate description inside a scope request or descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeAtom {
    /// Request-local id, referenced by `PushAtom` tokens.
    pub id: AtomId,
    /// Stable catalog reference, filled in by normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_ref: Option<ReferenceId>,
    /// Advisory display name, filled in by normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub kind: AtomKind,
}

/// Kind-specific payload of a [`ScopeAtom`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AtomKind {
    /// Opaque reference into the catalog; the reference id is the payload.
    CatalogRef,
    /// A well-known preset, e.g. `AllFiles`, `ProjectFiles`.
    Standard { preset: String },
    /// One module in one of the four flavors.
    Module { module: String, flavor: ModuleFlavor },
    /// A named, holder-scoped pattern set. Without a holder the name is
    /// searched across all holders and must match exactly one.
    NamedPattern {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        holder: Option<String>,
    },
    /// Raw, unregistered pattern text.
    AdHocPattern { pattern: String },
    /// An explicit directory, optionally recursive.
    Directory {
        url: String,
        #[serde(default)]
        recursive: bool,
    },
    /// An explicit file-url list.
    FileSet { files: Vec<String> },
    /// A provider contribution; cannot be synthesized ad hoc, so the atom
    /// must already carry a `provider:` reference id.
    ProviderContributed { provider: String },
}

impl AtomKind {
    /// Short kind name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            AtomKind::CatalogRef => "catalog_ref",
            AtomKind::Standard { .. } => "standard",
            AtomKind::Module { .. } => "module",
            AtomKind::NamedPattern { .. } => "named_pattern",
            AtomKind::AdHocPattern { .. } => "ad_hoc_pattern",
            AtomKind::Directory { .. } => "directory",
            AtomKind::FileSet { .. } => "file_set",
            AtomKind::ProviderContributed { .. } => "provider_contributed",
        }
    }
}

impl ScopeAtom {
    pub fn new(id: impl Into<String>, kind: AtomKind) -> Self {
        ScopeAtom {
            id: AtomId::new(id),
            scope_ref: None,
            display_name: None,
            kind,
        }
    }

    /// Atom referencing a catalog entry directly.
    pub fn catalog_ref(id: impl Into<String>, reference: ReferenceId) -> Self {
        ScopeAtom {
            id: AtomId::new(id),
            scope_ref: Some(reference),
            display_name: None,
            kind: AtomKind::CatalogRef,
        }
    }

    pub fn standard(id: impl Into<String>, preset: impl Into<String>) -> Self {
        ScopeAtom::new(
            id,
            AtomKind::Standard {
                preset: preset.into(),
            },
        )
    }

    pub fn module(id: impl Into<String>, module: impl Into<String>, flavor: ModuleFlavor) -> Self {
        ScopeAtom::new(
            id,
            AtomKind::Module {
                module: module.into(),
                flavor,
            },
        )
    }

    pub fn named_pattern(id: impl Into<String>, name: impl Into<String>) -> Self {
        ScopeAtom::new(
            id,
            AtomKind::NamedPattern {
                name: name.into(),
                holder: None,
            },
        )
    }

    pub fn named_pattern_in(
        id: impl Into<String>,
        name: impl Into<String>,
        holder: impl Into<String>,
    ) -> Self {
        ScopeAtom::new(
            id,
            AtomKind::NamedPattern {
                name: name.into(),
                holder: Some(holder.into()),
            },
        )
    }

    pub fn ad_hoc_pattern(id: impl Into<String>, pattern: impl Into<String>) -> Self {
        ScopeAtom::new(
            id,
            AtomKind::AdHocPattern {
                pattern: pattern.into(),
            },
        )
    }

    pub fn directory(id: impl Into<String>, url: impl Into<String>, recursive: bool) -> Self {
        ScopeAtom::new(
            id,
            AtomKind::Directory {
                url: url.into(),
                recursive,
            },
        )
    }

    pub fn file_set(id: impl Into<String>, files: Vec<String>) -> Self {
        ScopeAtom::new(id, AtomKind::FileSet { files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_serialization() {
        let atom = ScopeAtom::standard("a", "ProjectFiles");
        let json = serde_json::to_value(&atom).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["kind"], "standard");
        assert_eq!(json["preset"], "ProjectFiles");
        // Unset advisory fields are absent, not null.
        assert!(json.get("scope_ref").is_none());
        assert!(json.get("display_name").is_none());
    }

    #[test]
    fn round_trip_preserves_kind_payload() {
        let atom = ScopeAtom::module("m", "core", ModuleFlavor::WithDependenciesAndLibraries);
        let json = serde_json::to_string(&atom).unwrap();
        let back: ScopeAtom = serde_json::from_str(&json).unwrap();
        assert_eq!(back, atom);
    }

    #[test]
    fn directory_recursive_defaults_false() {
        let atom: ScopeAtom = serde_json::from_str(
            r#"{"id":"d","kind":"directory","url":"file:///src"}"#,
        )
        .unwrap();
        assert_eq!(
            atom.kind,
            AtomKind::Directory {
                url: "file:///src".into(),
                recursive: false
            }
        );
    }
}
