//! In-memory workspace model: the reference [`WorkspaceModel`]
//! implementation.
//!
//! `MemoryWorkspace` holds declared modules (content files, dependency
//! edges, attached libraries), named pattern holders, and registered scope
//! providers, and answers every collaborator query from those declarations.
//! It backs the CLI (loaded from a TOML [`WorkspaceSpec`]) and the test
//! suite, and doubles as the template for embedders wiring the engine onto
//! a real project model.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shape::Shape;
use crate::workspace::{
    ContributedScope, FileKey, LeafPredicate, ModuleFlavor, NamedPatternScope, PatternHolder,
    PatternSyntaxError, ProviderFailure, ScopeProvider, StandardScope, WorkspaceModel,
};

/// Errors from loading or building an in-memory workspace.
#[derive(Debug, Error, Diagnostic)]
pub enum WorkspaceSpecError {
    #[error("failed to read workspace spec: {path}")]
    #[diagnostic(
        code(seshat::memory::spec_read),
        help("Ensure the spec file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse workspace spec: {path}")]
    #[diagnostic(
        code(seshat::memory::spec_parse),
        help("Check the TOML syntax in the workspace spec file.")
    )]
    Parse { path: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pattern(#[from] PatternSyntaxError),
}

// ---------------------------------------------------------------------------
// TOML workspace spec
// ---------------------------------------------------------------------------

/// Declarative workspace description, persisted as TOML.
///
/// ```toml
/// [[modules]]
/// name = "core"
/// files = ["file:///proj/core/src/lib.rs"]
/// dependencies = ["util"]
/// libraries = ["file:///libs/serde/lib.rs"]
///
/// [[holders]]
/// id = "settings"
///
/// [[holders.scopes]]
/// name = "Generated"
/// patterns = ["**/generated/**"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceSpec {
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
    #[serde(default)]
    pub holders: Vec<HolderSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub libraries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderSpec {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub scopes: Vec<NamedScopeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedScopeSpec {
    pub name: String,
    pub patterns: Vec<String>,
}

impl WorkspaceSpec {
    /// Load a spec from a TOML file.
    pub fn load(path: &Path) -> Result<WorkspaceSpec, WorkspaceSpecError> {
        let text = std::fs::read_to_string(path).map_err(|source| WorkspaceSpecError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| WorkspaceSpecError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Leaf predicate implementations
// ---------------------------------------------------------------------------

/// Leaf over an explicit file-url set.
pub struct FileSetLeaf {
    name: String,
    shape: Shape,
    files: BTreeSet<String>,
}

impl FileSetLeaf {
    pub fn new(
        name: impl Into<String>,
        shape: Shape,
        files: impl IntoIterator<Item = String>,
    ) -> Self {
        FileSetLeaf {
            name: name.into(),
            shape,
            files: files.into_iter().collect(),
        }
    }
}

impl LeafPredicate for FileSetLeaf {
    fn contains(&self, file: &FileKey) -> bool {
        self.files.contains(file.as_str())
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn local_elements(&self) -> Option<Vec<FileKey>> {
        (self.shape == Shape::Local)
            .then(|| self.files.iter().map(FileKey::new).collect())
    }
}

/// Leaf matching file urls against a compiled glob set.
struct PatternLeaf {
    text: String,
    set: GlobSet,
}

impl LeafPredicate for PatternLeaf {
    fn contains(&self, file: &FileKey) -> bool {
        self.set.is_match(url_path(file.as_str()))
    }

    fn shape(&self) -> Shape {
        Shape::Global
    }

    fn display_name(&self) -> String {
        format!("Pattern '{}'", self.text)
    }
}

/// Leaf accepting files under one directory.
struct DirectoryLeaf {
    url: String,
    recursive: bool,
}

impl LeafPredicate for DirectoryLeaf {
    fn contains(&self, file: &FileKey) -> bool {
        let Some(rest) = file.as_str().strip_prefix(&self.url) else {
            return false;
        };
        let Some(rest) = rest.strip_prefix('/') else {
            return false;
        };
        self.recursive || !rest.contains('/')
    }

    fn shape(&self) -> Shape {
        Shape::Global
    }

    fn display_name(&self) -> String {
        if self.recursive {
            format!("Directory '{}' (recursive)", self.url)
        } else {
            format!("Directory '{}'", self.url)
        }
    }
}

/// Path part of a file url, for glob matching.
fn url_path(url: &str) -> &str {
    match url.strip_prefix("file://") {
        Some(path) => path.trim_start_matches('/'),
        None => url,
    }
}

/// Compile a comma-separated pattern list into a leaf.
fn compile_patterns(text: &str, patterns: &[String]) -> Result<Arc<PatternLeaf>, PatternSyntaxError> {
    if patterns.is_empty() {
        return Err(PatternSyntaxError {
            pattern: text.to_string(),
            message: "empty pattern".to_string(),
        });
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| PatternSyntaxError {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|e| PatternSyntaxError {
        pattern: text.to_string(),
        message: e.to_string(),
    })?;
    Ok(Arc::new(PatternLeaf {
        text: text.to_string(),
        set,
    }))
}

// ---------------------------------------------------------------------------
// Static provider
// ---------------------------------------------------------------------------

/// A [`ScopeProvider`] over a fixed contribution list, or a fixed failure.
///
/// Real providers adapt external subsystems (VCS state, task trackers);
/// this one serves registration from configuration and tests.
pub struct StaticScopeProvider {
    id: String,
    scopes: Vec<ContributedScope>,
    failure: Option<String>,
}

impl StaticScopeProvider {
    pub fn new(id: impl Into<String>, scopes: Vec<ContributedScope>) -> Self {
        StaticScopeProvider {
            id: id.into(),
            scopes,
            failure: None,
        }
    }

    /// A provider that always fails, for degradation paths.
    pub fn failing(id: impl Into<String>, message: impl Into<String>) -> Self {
        StaticScopeProvider {
            id: id.into(),
            scopes: Vec::new(),
            failure: Some(message.into()),
        }
    }
}

impl ScopeProvider for StaticScopeProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    fn list_scopes(&self) -> Result<Vec<ContributedScope>, ProviderFailure> {
        match &self.failure {
            Some(message) => Err(ProviderFailure {
                provider: self.id.clone(),
                message: message.clone(),
            }),
            None => Ok(self.scopes.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// The in-memory workspace
// ---------------------------------------------------------------------------

struct ModuleData {
    files: BTreeSet<String>,
    dependencies: Vec<String>,
    libraries: BTreeSet<String>,
}

struct HolderData {
    id: String,
    display_name: String,
    scopes: Vec<(String, Arc<PatternLeaf>)>,
}

/// In-memory [`WorkspaceModel`] over declared modules, holders, and
/// providers.
pub struct MemoryWorkspace {
    modules: BTreeMap<String, ModuleData>,
    holders: Vec<HolderData>,
    providers: Vec<Arc<dyn ScopeProvider>>,
    extra_standard: Vec<StandardScope>,
    current_file: Option<String>,
    recent_files: Vec<String>,
}

impl MemoryWorkspace {
    pub fn builder() -> MemoryWorkspaceBuilder {
        MemoryWorkspaceBuilder::default()
    }

    /// Build a workspace from a declarative spec.
    pub fn from_spec(spec: &WorkspaceSpec) -> Result<MemoryWorkspace, WorkspaceSpecError> {
        let mut builder = MemoryWorkspace::builder();
        for module in &spec.modules {
            builder = builder.module_full(
                &module.name,
                &as_strs(&module.files),
                &as_strs(&module.dependencies),
                &as_strs(&module.libraries),
            );
        }
        for holder in &spec.holders {
            let scopes: Vec<(&str, Vec<&str>)> = holder
                .scopes
                .iter()
                .map(|s| (s.name.as_str(), s.patterns.iter().map(String::as_str).collect()))
                .collect();
            builder = builder.holder_full(
                &holder.id,
                holder.display_name.as_deref().unwrap_or(&holder.id),
                &scopes,
            );
        }
        builder.build()
    }

    /// All content files (module files), without libraries.
    fn content_files(&self) -> BTreeSet<String> {
        self.modules
            .values()
            .flat_map(|m| m.files.iter().cloned())
            .collect()
    }

    /// All library files.
    fn library_files(&self) -> BTreeSet<String> {
        self.modules
            .values()
            .flat_map(|m| m.libraries.iter().cloned())
            .collect()
    }

    /// Every file url the workspace knows about.
    fn all_files(&self) -> BTreeSet<String> {
        let mut files = self.content_files();
        files.extend(self.library_files());
        files
    }

    /// Transitive dependency closure of a module, including itself.
    fn dependency_closure(&self, module: &str) -> BTreeSet<String> {
        let mut closure = BTreeSet::new();
        let mut queue = vec![module.to_string()];
        while let Some(name) = queue.pop() {
            if !closure.insert(name.clone()) {
                continue;
            }
            if let Some(data) = self.modules.get(&name) {
                queue.extend(data.dependencies.iter().cloned());
            }
        }
        closure
    }
}

fn as_strs(v: &[String]) -> Vec<&str> {
    v.iter().map(String::as_str).collect()
}

impl WorkspaceModel for MemoryWorkspace {
    fn standard_scopes(&self) -> Vec<StandardScope> {
        let mut scopes = vec![
            StandardScope {
                id: "AllFiles".into(),
                display_name: "All Files".into(),
                requires_user_input: false,
                unstable: false,
                predicate: Arc::new(FileSetLeaf::new("All Files", Shape::Global, self.all_files())),
            },
            StandardScope {
                id: "ProjectFiles".into(),
                display_name: "Project Files".into(),
                requires_user_input: false,
                unstable: false,
                predicate: Arc::new(FileSetLeaf::new(
                    "Project Files",
                    Shape::Global,
                    self.content_files(),
                )),
            },
            StandardScope {
                id: "ProjectLibraries".into(),
                display_name: "Project Libraries".into(),
                requires_user_input: false,
                unstable: false,
                predicate: Arc::new(FileSetLeaf::new(
                    "Project Libraries",
                    Shape::Global,
                    self.library_files(),
                )),
            },
        ];
        if !self.recent_files.is_empty() {
            scopes.push(StandardScope {
                id: "RecentFiles".into(),
                display_name: "Recent Files".into(),
                requires_user_input: false,
                unstable: true,
                predicate: Arc::new(FileSetLeaf::new(
                    "Recent Files",
                    Shape::Local,
                    self.recent_files.iter().cloned(),
                )),
            });
        }
        if let Some(current) = &self.current_file {
            scopes.push(StandardScope {
                id: "CurrentFile".into(),
                display_name: "Current File".into(),
                requires_user_input: true,
                unstable: false,
                predicate: Arc::new(FileSetLeaf::new(
                    "Current File",
                    Shape::Local,
                    [current.clone()],
                )),
            });
        }
        scopes.extend(self.extra_standard.iter().cloned());
        scopes
    }

    fn providers(&self) -> Vec<Arc<dyn ScopeProvider>> {
        self.providers.clone()
    }

    fn pattern_holders(&self) -> Vec<PatternHolder> {
        self.holders
            .iter()
            .map(|holder| PatternHolder {
                id: holder.id.clone(),
                display_name: holder.display_name.clone(),
                scopes: holder
                    .scopes
                    .iter()
                    .map(|(name, leaf)| NamedPatternScope {
                        name: name.clone(),
                        predicate: leaf.clone() as Arc<dyn LeafPredicate>,
                    })
                    .collect(),
            })
            .collect()
    }

    fn modules(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    fn module_scope(&self, module: &str, flavor: ModuleFlavor) -> Option<Arc<dyn LeafPredicate>> {
        let data = self.modules.get(module)?;
        let mut files: BTreeSet<String> = data.files.clone();
        match flavor {
            ModuleFlavor::Content => {}
            ModuleFlavor::WithLibraries => {
                files.extend(data.libraries.iter().cloned());
            }
            ModuleFlavor::WithDependencies | ModuleFlavor::WithDependenciesAndLibraries => {
                for name in self.dependency_closure(module) {
                    if let Some(dep) = self.modules.get(&name) {
                        files.extend(dep.files.iter().cloned());
                        if flavor == ModuleFlavor::WithDependenciesAndLibraries {
                            files.extend(dep.libraries.iter().cloned());
                        }
                    }
                }
            }
        }
        Some(Arc::new(FileSetLeaf::new(
            format!("Module '{module}'{}", flavor.display_suffix()),
            Shape::Global,
            files,
        )))
    }

    fn compile_pattern(&self, text: &str) -> Result<Arc<dyn LeafPredicate>, PatternSyntaxError> {
        let trimmed = text.trim();
        let patterns: Vec<String> = trimmed
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        compile_patterns(trimmed, &patterns).map(|leaf| leaf as Arc<dyn LeafPredicate>)
    }

    fn directory_scope(&self, url: &str, recursive: bool) -> Option<Arc<dyn LeafPredicate>> {
        let url = url.trim_end_matches('/').to_string();
        let prefix = format!("{url}/");
        let known = self.all_files().iter().any(|f| f.starts_with(&prefix));
        if !known {
            return None;
        }
        Some(Arc::new(DirectoryLeaf { url, recursive }))
    }

    fn file_set_scope(&self, files: &[FileKey]) -> Arc<dyn LeafPredicate> {
        Arc::new(FileSetLeaf::new(
            format!("{} files", files.len()),
            Shape::Local,
            files.iter().map(|f| f.as_str().to_string()),
        ))
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryWorkspaceBuilder {
    modules: BTreeMap<String, ModuleData>,
    holders: Vec<(String, String, Vec<(String, Vec<String>)>)>,
    providers: Vec<Arc<dyn ScopeProvider>>,
    extra_standard: Vec<StandardScope>,
    current_file: Option<String>,
    recent_files: Vec<String>,
}

impl MemoryWorkspaceBuilder {
    /// Declare a module with content files only.
    pub fn module(self, name: &str, files: &[&str]) -> Self {
        self.module_full(name, files, &[], &[])
    }

    /// Declare a module with dependencies and libraries.
    pub fn module_full(
        mut self,
        name: &str,
        files: &[&str],
        dependencies: &[&str],
        libraries: &[&str],
    ) -> Self {
        self.modules.insert(
            name.to_string(),
            ModuleData {
                files: files.iter().map(|f| f.to_string()).collect(),
                dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
                libraries: libraries.iter().map(|l| l.to_string()).collect(),
            },
        );
        self
    }

    /// Declare a pattern holder with `(scope name, patterns)` pairs.
    pub fn holder(self, id: &str, scopes: &[(&str, &[&str])]) -> Self {
        let scopes: Vec<(&str, Vec<&str>)> = scopes
            .iter()
            .map(|(name, patterns)| (*name, patterns.to_vec()))
            .collect();
        self.holder_full(id, id, &scopes)
    }

    pub fn holder_full(mut self, id: &str, display_name: &str, scopes: &[(&str, Vec<&str>)]) -> Self {
        self.holders.push((
            id.to_string(),
            display_name.to_string(),
            scopes
                .iter()
                .map(|(name, patterns)| {
                    (
                        name.to_string(),
                        patterns.iter().map(|p| p.to_string()).collect(),
                    )
                })
                .collect(),
        ));
        self
    }

    pub fn provider(mut self, provider: Arc<dyn ScopeProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Register an additional standard preset.
    pub fn standard_scope(mut self, scope: StandardScope) -> Self {
        self.extra_standard.push(scope);
        self
    }

    pub fn current_file(mut self, url: &str) -> Self {
        self.current_file = Some(url.to_string());
        self
    }

    pub fn recent_files(mut self, urls: &[&str]) -> Self {
        self.recent_files = urls.iter().map(|u| u.to_string()).collect();
        self
    }

    /// Compile holder patterns and produce the workspace.
    pub fn build(self) -> Result<MemoryWorkspace, WorkspaceSpecError> {
        let mut holders = Vec::with_capacity(self.holders.len());
        for (id, display_name, scopes) in self.holders {
            let mut compiled = Vec::with_capacity(scopes.len());
            for (name, patterns) in scopes {
                let text = patterns.join(", ");
                compiled.push((name, compile_patterns(&text, &patterns)?));
            }
            holders.push(HolderData {
                id,
                display_name,
                scopes: compiled,
            });
        }
        Ok(MemoryWorkspace {
            modules: self.modules,
            holders,
            providers: self.providers,
            extra_standard: self.extra_standard,
            current_file: self.current_file,
            recent_files: self.recent_files,
        })
    }
}
