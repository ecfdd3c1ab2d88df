//! Engine facade: top-level API for compiling and resolving scopes.
//!
//! The [`ScopeEngine`] owns the workspace model and provides the three
//! operations every consumer uses: `compile` a request into a storable
//! descriptor, `resolve` a descriptor back into a live predicate against a
//! fresh catalog snapshot, and `list_catalog` for discovery surfaces.
//! Every call rebuilds its own catalog; nothing is cached across calls
//! because the workspace may change underneath stored descriptors.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::atom::ScopeAtom;
use crate::catalog::{Catalog, CatalogFamily, CatalogOptions};
use crate::descriptor::{ScopeProgramDescriptor, ScopeToken, DESCRIPTOR_VERSION};
use crate::diag::ScopeDiagnostic;
use crate::error::{ScopeResult, StructuralError};
use crate::eval::{evaluate, ResolvedScope};
use crate::normalize::normalize_atom;
use crate::refid::{AtomId, ReferenceId};
use crate::shape::Shape;
use crate::workspace::{ModuleFlavor, WorkspaceModel};

/// Per-request resolution policy.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Strict mode fails on the first resolution problem; lenient mode
    /// substitutes empty predicates and collects diagnostics. Structural
    /// errors are fatal either way.
    pub strict: bool,
    /// Whether scopes that require user input (e.g. "current file") may
    /// resolve.
    pub allow_interactive: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            strict: true,
            allow_interactive: false,
        }
    }
}

impl ResolveOptions {
    /// Strict, non-interactive: the default for programmatic pipelines.
    pub fn strict() -> Self {
        ResolveOptions::default()
    }

    /// Lenient, non-interactive: the default for exploratory/UI flows,
    /// where partial results with warnings beat hard failure.
    pub fn lenient() -> Self {
        ResolveOptions {
            strict: false,
            allow_interactive: false,
        }
    }

    pub fn with_interactive(mut self, allow: bool) -> Self {
        self.allow_interactive = allow;
        self
    }
}

/// A raw compile request: atoms plus the RPN program over them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeRequest {
    pub atoms: Vec<ScopeAtom>,
    pub tokens: Vec<ScopeToken>,
}

/// Serializable projection of one catalog record, for discovery/UI
/// population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub reference_id: ReferenceId,
    pub display_name: String,
    pub family: CatalogFamily,
    pub shape: Shape,
    pub requires_user_input: bool,
    pub unstable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<(String, ModuleFlavor)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_scope: Option<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// The scope-algebra resolution engine.
///
/// Holds the workspace model behind an `Arc` so concurrent callers can
/// share one engine; each call is an independent, synchronous computation
/// over its own catalog snapshot.
pub struct ScopeEngine {
    workspace: Arc<dyn WorkspaceModel>,
    catalog_options: CatalogOptions,
}

impl ScopeEngine {
    pub fn new(workspace: Arc<dyn WorkspaceModel>) -> Self {
        ScopeEngine {
            workspace,
            catalog_options: CatalogOptions::default(),
        }
    }

    pub fn with_catalog_options(mut self, options: CatalogOptions) -> Self {
        self.catalog_options = options;
        self
    }

    /// Compile a request into a storable descriptor.
    ///
    /// Normalizes every atom against a fresh catalog snapshot, evaluates
    /// the token program, and packages the result. Duplicate atom ids are
    /// a structural error regardless of strictness.
    pub fn compile(
        &self,
        request: &ScopeRequest,
        options: &ResolveOptions,
    ) -> ScopeResult<ScopeProgramDescriptor> {
        tracing::debug!(
            atoms = request.atoms.len(),
            tokens = request.tokens.len(),
            strict = options.strict,
            "compiling scope program"
        );
        let catalog = Catalog::build(&*self.workspace, &self.catalog_options);
        let (atoms, by_id, mut diagnostics) =
            self.normalize_all(&request.atoms, &catalog, options)?;

        let resolved = evaluate(
            &request.tokens,
            &by_id,
            &catalog,
            &*self.workspace,
            options,
        )?;
        diagnostics.extend(resolved.diagnostics);

        Ok(ScopeProgramDescriptor {
            version: DESCRIPTOR_VERSION,
            atoms,
            tokens: request.tokens.clone(),
            display_name: resolved.display_name,
            shape: resolved.shape,
            diagnostics,
        })
    }

    /// Re-derive a live predicate from a stored descriptor.
    ///
    /// Resolution is lenient: a descriptor that outlived parts of the
    /// workspace still resolves, with diagnostics marking what degraded.
    /// Use [`ScopeEngine::resolve_with`] for strict re-resolution.
    pub fn resolve(
        &self,
        descriptor: &ScopeProgramDescriptor,
        allow_interactive: bool,
    ) -> ScopeResult<ResolvedScope> {
        self.resolve_with(
            descriptor,
            &ResolveOptions {
                strict: false,
                allow_interactive,
            },
        )
    }

    /// Re-derive a live predicate with an explicit resolution policy.
    pub fn resolve_with(
        &self,
        descriptor: &ScopeProgramDescriptor,
        options: &ResolveOptions,
    ) -> ScopeResult<ResolvedScope> {
        tracing::debug!(
            version = descriptor.version,
            atoms = descriptor.atoms.len(),
            strict = options.strict,
            "resolving stored descriptor"
        );
        let catalog = Catalog::build(&*self.workspace, &self.catalog_options);
        let (_, by_id, mut diagnostics) =
            self.normalize_all(&descriptor.atoms, &catalog, options)?;

        let resolved = evaluate(
            &descriptor.tokens,
            &by_id,
            &catalog,
            &*self.workspace,
            options,
        )?;
        diagnostics.extend(resolved.diagnostics);

        Ok(ResolvedScope {
            diagnostics,
            ..resolved
        })
    }

    /// List the current catalog for discovery surfaces.
    ///
    /// Entries requiring user input are omitted unless `allow_interactive`
    /// is set.
    pub fn list_catalog(&self, allow_interactive: bool) -> Vec<CatalogEntry> {
        let catalog = Catalog::build(&*self.workspace, &self.catalog_options);
        catalog
            .records()
            .filter(|r| allow_interactive || !r.requires_user_input)
            .map(|r| CatalogEntry {
                reference_id: r.reference_id.clone(),
                display_name: r.display_name.clone(),
                family: r.family,
                shape: r.shape,
                requires_user_input: r.requires_user_input,
                unstable: r.unstable,
                module: r.module.clone(),
                named_scope: r.named_scope.clone(),
                provider: r.provider.clone(),
            })
            .collect()
    }

    /// Normalize a batch of atoms, enforcing request-local id uniqueness.
    fn normalize_all(
        &self,
        atoms: &[ScopeAtom],
        catalog: &Catalog,
        options: &ResolveOptions,
    ) -> ScopeResult<(
        Vec<ScopeAtom>,
        BTreeMap<AtomId, ScopeAtom>,
        Vec<ScopeDiagnostic>,
    )> {
        let mut diagnostics: Vec<ScopeDiagnostic> = catalog.diagnostics().to_vec();
        let mut normalized = Vec::with_capacity(atoms.len());
        let mut by_id = BTreeMap::new();
        for atom in atoms {
            if by_id.contains_key(&atom.id) {
                return Err(StructuralError::DuplicateAtomId {
                    atom: atom.id.to_string(),
                }
                .into());
            }
            let (norm, diags) = normalize_atom(atom, catalog, &*self.workspace, options)?;
            diagnostics.extend(diags);
            by_id.insert(norm.id.clone(), norm.clone());
            normalized.push(norm);
        }
        Ok((normalized, by_id, diagnostics))
    }
}
