//! Stable reference identifiers for catalog entries.
//!
//! Every atomic scope the catalog knows about is keyed by a [`ReferenceId`]:
//! a family-prefixed string that is deterministic across catalog rebuilds.
//! Named families (`standard:`, `module:`, `named:`) derive the id directly
//! from their coordinates; ad-hoc families (`pattern:`, `directory:`,
//! `files:`) and provider contributions embed a SHA-256 content hash so that
//! two structurally identical atoms normalize to the same id across separate
//! calls.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::workspace::ModuleFlavor;

/// Number of hex characters kept from the SHA-256 digest.
const HASH_LEN: usize = 16;

/// Stable, deterministic identifier of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(String);

impl ReferenceId {
    /// Wrap a raw reference-id string (e.g. one read back from a descriptor).
    pub fn new(raw: impl Into<String>) -> Self {
        ReferenceId(raw.into())
    }

    /// Reference id for a standard preset scope.
    pub fn standard(preset_id: &str) -> Self {
        ReferenceId(format!("standard:{preset_id}"))
    }

    /// Reference id for a provider-contributed scope.
    ///
    /// The contributing provider controls neither naming scheme nor
    /// uniqueness, so the id hashes the contribution's identity triple.
    pub fn provider(provider_id: &str, name: &str, display_name: &str, impl_kind: &str) -> Self {
        let hash = content_hash(&[name, display_name, impl_kind]);
        ReferenceId(format!("provider:{provider_id}:{hash}"))
    }

    /// Reference id for a named pattern scope owned by a holder.
    pub fn named(holder_id: &str, scope_name: &str) -> Self {
        ReferenceId(format!("named:{holder_id}:{scope_name}"))
    }

    /// Reference id for a module-flavor scope.
    pub fn module(module_name: &str, flavor: ModuleFlavor) -> Self {
        ReferenceId(format!("module:{module_name}:{}", flavor.id_segment()))
    }

    /// Reference id for an ad-hoc pattern atom (post-trim pattern text).
    pub fn pattern(normalized_pattern: &str) -> Self {
        ReferenceId(format!("pattern:{}", content_hash(&[normalized_pattern])))
    }

    /// Reference id for a directory atom.
    pub fn directory(url: &str, recursive: bool) -> Self {
        let suffix = if recursive { "r" } else { "f" };
        ReferenceId(format!("directory:{suffix}:{url}"))
    }

    /// Reference id for an explicit file-set atom.
    ///
    /// Callers must pass the deduplicated, sorted url list so the hash is
    /// insensitive to input ordering.
    pub fn file_set(sorted_urls: &[String]) -> Self {
        let refs: Vec<&str> = sorted_urls.iter().map(String::as_str).collect();
        ReferenceId(format!("files:{}", content_hash(&refs)))
    }

    /// The underlying id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The family prefix (`standard`, `provider`, `named`, `module`,
    /// `pattern`, `directory`, `files`), if well-formed.
    pub fn family(&self) -> Option<&str> {
        self.0.split(':').next()
    }
}

impl std::fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request-local identifier of one atom inside a scope program.
///
/// Distinct from [`ReferenceId`]: the atom id only has meaning within a
/// single descriptor, where `PushAtom` tokens use it to refer to entries in
/// the accompanying atom list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomId(String);

impl AtomId {
    pub fn new(raw: impl Into<String>) -> Self {
        AtomId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AtomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AtomId {
    fn from(raw: &str) -> Self {
        AtomId(raw.to_string())
    }
}

/// Short SHA-256 content hash over a list of parts.
///
/// Parts are length-prefixed before hashing so that `["ab", "c"]` and
/// `["a", "bc"]` digest differently.
pub fn content_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(HASH_LEN);
    for byte in digest.iter().take(HASH_LEN / 2) {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_families_are_deterministic() {
        assert_eq!(ReferenceId::standard("ProjectFiles").as_str(), "standard:ProjectFiles");
        assert_eq!(
            ReferenceId::module("core", ModuleFlavor::WithDependencies).as_str(),
            "module:core:deps"
        );
        assert_eq!(ReferenceId::named("h1", "Generated").as_str(), "named:h1:Generated");
    }

    #[test]
    fn content_hash_is_stable_and_prefix_safe() {
        assert_eq!(content_hash(&["a", "bc"]), content_hash(&["a", "bc"]));
        assert_ne!(content_hash(&["a", "bc"]), content_hash(&["ab", "c"]));
        assert_eq!(content_hash(&["x"]).len(), HASH_LEN);
    }

    #[test]
    fn identical_file_sets_share_an_id() {
        let a = ReferenceId::file_set(&["file:///a.rs".into(), "file:///b.rs".into()]);
        let b = ReferenceId::file_set(&["file:///a.rs".into(), "file:///b.rs".into()]);
        assert_eq!(a, b);
        assert_eq!(a.family(), Some("files"));
    }

    #[test]
    fn directory_ids_distinguish_recursion() {
        let flat = ReferenceId::directory("file:///src", false);
        let deep = ReferenceId::directory("file:///src", true);
        assert_ne!(flat, deep);
    }
}
