//! Workspace model: the collaborator surface the engine resolves against.
//!
//! The engine itself performs no file I/O and holds no index; everything it
//! knows about the workspace comes through [`WorkspaceModel`]. Embedders
//! implement this trait over their own project model (the crate ships
//! [`crate::memory::MemoryWorkspace`] as the reference implementation).

use std::sync::Arc;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shape::Shape;

/// Key identifying one file in the workspace, by URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileKey(String);

impl FileKey {
    pub fn new(url: impl Into<String>) -> Self {
        FileKey(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FileKey {
    fn from(url: &str) -> Self {
        FileKey(url.to_string())
    }
}

/// One atomic membership predicate supplied by the workspace model.
///
/// Leaves report their native [`Shape`]: `Global` for index-style scopes,
/// `Local` for explicit element snapshots. Opaque provider-contributed
/// leaves that cannot guarantee either may report `Mixed`; the evaluator
/// then falls back to membership-testing only and records a degradation
/// diagnostic when such a leaf is combined.
pub trait LeafPredicate: Send + Sync {
    /// Test whether the file belongs to this scope.
    fn contains(&self, file: &FileKey) -> bool;

    /// The leaf's native shape.
    fn shape(&self) -> Shape;

    /// Human-readable name of this scope.
    fn display_name(&self) -> String;

    /// The explicit element snapshot, for `Local` leaves.
    fn local_elements(&self) -> Option<Vec<FileKey>> {
        None
    }
}

/// The four per-module scope flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleFlavor {
    /// The module's own content files.
    Content,
    /// Content plus the content of every (transitive) module dependency.
    WithDependencies,
    /// Content plus the module's attached libraries.
    WithLibraries,
    /// Content plus dependencies plus libraries.
    WithDependenciesAndLibraries,
}

impl ModuleFlavor {
    pub const ALL: [ModuleFlavor; 4] = [
        ModuleFlavor::Content,
        ModuleFlavor::WithDependencies,
        ModuleFlavor::WithLibraries,
        ModuleFlavor::WithDependenciesAndLibraries,
    ];

    /// Stable segment used inside `module:` reference ids.
    pub fn id_segment(self) -> &'static str {
        match self {
            ModuleFlavor::Content => "content",
            ModuleFlavor::WithDependencies => "deps",
            ModuleFlavor::WithLibraries => "libs",
            ModuleFlavor::WithDependenciesAndLibraries => "deps-libs",
        }
    }

    /// Suffix used in display names, e.g. `Module 'core' with dependencies`.
    pub fn display_suffix(self) -> &'static str {
        match self {
            ModuleFlavor::Content => "",
            ModuleFlavor::WithDependencies => " with dependencies",
            ModuleFlavor::WithLibraries => " with libraries",
            ModuleFlavor::WithDependenciesAndLibraries => " with dependencies and libraries",
        }
    }
}

impl std::fmt::Display for ModuleFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id_segment())
    }
}

/// A well-known preset scope enumerated by the workspace.
#[derive(Clone)]
pub struct StandardScope {
    /// Preset id, e.g. `AllFiles`, `ProjectFiles`.
    pub id: String,
    pub display_name: String,
    /// True for scopes that only make sense interactively (e.g. current file).
    pub requires_user_input: bool,
    /// True for scopes whose underlying state is volatile (e.g. recent files).
    pub unstable: bool,
    pub predicate: Arc<dyn LeafPredicate>,
}

/// A named scope contributed by an external provider.
#[derive(Clone)]
pub struct ContributedScope {
    /// Provider-local scope name.
    pub name: String,
    pub display_name: String,
    /// Opaque tag describing the contribution's implementation, hashed into
    /// the reference id so renamed implementations get fresh ids.
    pub implementation_kind: String,
    pub requires_user_input: bool,
    pub unstable: bool,
    pub predicate: Arc<dyn LeafPredicate>,
}

/// Failure reported by one scope provider.
///
/// Provider failures are expected and non-fatal: the catalog collects them
/// as diagnostics and keeps building from the remaining providers.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("scope provider \"{provider}\" failed: {message}")]
#[diagnostic(
    code(seshat::workspace::provider_failed),
    help("The provider is skipped for this catalog build; its scopes are unavailable until it recovers.")
)]
pub struct ProviderFailure {
    pub provider: String,
    pub message: String,
}

/// An externally contributed source of named scopes.
///
/// Implementations are registered on the workspace model and queried once
/// per catalog build. `list_scopes` must be a pure read of the provider's
/// current state.
pub trait ScopeProvider: Send + Sync {
    /// Stable identifier of this provider, used in reference ids.
    fn provider_id(&self) -> &str;

    /// The scopes this provider currently contributes. May be empty.
    fn list_scopes(&self) -> Result<Vec<ContributedScope>, ProviderFailure>;
}

/// One named pattern scope exposed by a holder.
pub struct NamedPatternScope {
    pub name: String,
    pub predicate: Arc<dyn LeafPredicate>,
}

/// A holder grouping named pattern scopes (e.g. one per settings layer).
pub struct PatternHolder {
    /// Stable holder id, used in `named:` reference ids.
    pub id: String,
    pub display_name: String,
    pub scopes: Vec<NamedPatternScope>,
}

/// Syntax error from compiling raw pattern text.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("invalid scope pattern \"{pattern}\": {message}")]
#[diagnostic(
    code(seshat::workspace::pattern_syntax),
    help("Fix the pattern text; the message comes from the underlying pattern parser.")
)]
pub struct PatternSyntaxError {
    pub pattern: String,
    pub message: String,
}

/// Read-only view of the workspace the engine resolves against.
///
/// All methods are pure snapshots of externally synchronized state; the
/// engine calls them once per catalog build and never caches the results
/// across calls.
pub trait WorkspaceModel: Send + Sync {
    /// The standard preset scopes, in registration order.
    fn standard_scopes(&self) -> Vec<StandardScope>;

    /// The registered external scope providers.
    fn providers(&self) -> Vec<Arc<dyn ScopeProvider>>;

    /// The named pattern-scope holders, in registration order.
    fn pattern_holders(&self) -> Vec<PatternHolder>;

    /// Names of all modules in the workspace.
    fn modules(&self) -> Vec<String>;

    /// The scope for one module flavor, or `None` for an unknown module.
    fn module_scope(&self, module: &str, flavor: ModuleFlavor) -> Option<Arc<dyn LeafPredicate>>;

    /// Compile raw pattern text into a predicate.
    fn compile_pattern(&self, text: &str) -> Result<Arc<dyn LeafPredicate>, PatternSyntaxError>;

    /// The scope for an explicit directory, or `None` if the workspace does
    /// not know the directory.
    fn directory_scope(&self, url: &str, recursive: bool) -> Option<Arc<dyn LeafPredicate>>;

    /// The scope for an explicit file list. The caller guarantees the list
    /// is non-empty, deduplicated, and sorted.
    fn file_set_scope(&self, files: &[FileKey]) -> Arc<dyn LeafPredicate>;
}
