//! Catalog builder: the per-call snapshot of available atomic scopes.
//!
//! A [`Catalog`] is a pure function of workspace state at call time, keyed
//! by stable [`ReferenceId`]s and rebuilt for every compile or resolve. The
//! four families register in a fixed order (standard, provider, named
//! pattern, module flavors); id collisions are resolved by the configured
//! [`CollisionPolicy`] and always leave a diagnostic, so the tie-break is
//! observable. Building never fails: broken providers degrade to
//! diagnostics.

use std::collections::BTreeMap;

use crate::diag::{DiagnosticCode, ScopeDiagnostic};
use crate::predicate::ScopePredicate;
use crate::refid::ReferenceId;
use crate::shape::Shape;
use crate::workspace::{ModuleFlavor, WorkspaceModel};

/// Which family registered a catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogFamily {
    Standard,
    Provider,
    NamedPattern,
    Module,
}

impl std::fmt::Display for CatalogFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogFamily::Standard => write!(f, "standard"),
            CatalogFamily::Provider => write!(f, "provider"),
            CatalogFamily::NamedPattern => write!(f, "named_pattern"),
            CatalogFamily::Module => write!(f, "module"),
        }
    }
}

/// How reference-id collisions between families are resolved.
///
/// The historical behavior is first-registration-wins; keep it unless a
/// workspace deliberately layers later families over earlier ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    #[default]
    FirstWins,
    LastWins,
}

/// Options controlling catalog construction.
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    pub collision_policy: CollisionPolicy,
}

/// One entry of a catalog snapshot.
///
/// Records exist only inside one snapshot and are never persisted; the
/// serializable projection for discovery surfaces is
/// [`crate::engine::CatalogEntry`].
pub struct CatalogRecord {
    pub reference_id: ReferenceId,
    pub display_name: String,
    pub family: CatalogFamily,
    pub shape: Shape,
    /// True for scopes that only make sense interactively.
    pub requires_user_input: bool,
    /// True for scopes whose underlying state is volatile.
    pub unstable: bool,
    /// Module coordinates, for `Module`-family records.
    pub module: Option<(String, ModuleFlavor)>,
    /// `(holder id, scope name)`, for `NamedPattern`-family records.
    pub named_scope: Option<(String, String)>,
    /// Contributing provider id, for `Provider`-family records.
    pub provider: Option<String>,
    pub predicate: ScopePredicate,
}

/// Snapshot of all currently available atomic scopes.
pub struct Catalog {
    records: BTreeMap<ReferenceId, CatalogRecord>,
    diagnostics: Vec<ScopeDiagnostic>,
}

impl Catalog {
    /// Build a fresh snapshot from the workspace model.
    pub fn build(workspace: &dyn WorkspaceModel, options: &CatalogOptions) -> Catalog {
        let mut catalog = Catalog {
            records: BTreeMap::new(),
            diagnostics: Vec::new(),
        };

        catalog.collect_standard(workspace, options);
        catalog.collect_providers(workspace, options);
        catalog.collect_named_patterns(workspace, options);
        catalog.collect_modules(workspace, options);

        tracing::debug!(
            records = catalog.records.len(),
            diagnostics = catalog.diagnostics.len(),
            "built catalog snapshot"
        );
        catalog
    }

    fn collect_standard(&mut self, workspace: &dyn WorkspaceModel, options: &CatalogOptions) {
        for scope in workspace.standard_scopes() {
            let predicate = ScopePredicate::leaf(scope.predicate);
            let shape = predicate.shape();
            self.insert(
                CatalogRecord {
                    reference_id: ReferenceId::standard(&scope.id),
                    display_name: scope.display_name,
                    family: CatalogFamily::Standard,
                    shape,
                    requires_user_input: scope.requires_user_input,
                    unstable: scope.unstable,
                    module: None,
                    named_scope: None,
                    provider: None,
                    predicate,
                },
                options.collision_policy,
            );
        }
    }

    fn collect_providers(&mut self, workspace: &dyn WorkspaceModel, options: &CatalogOptions) {
        for provider in workspace.providers() {
            let provider_id = provider.provider_id().to_string();
            match provider.list_scopes() {
                Ok(scopes) => {
                    if scopes.is_empty() {
                        self.diagnostics.push(ScopeDiagnostic::new(
                            DiagnosticCode::ProviderEmpty,
                            format!("scope provider \"{provider_id}\" contributed no scopes"),
                        ));
                        continue;
                    }
                    for scope in scopes {
                        let reference_id = ReferenceId::provider(
                            &provider_id,
                            &scope.name,
                            &scope.display_name,
                            &scope.implementation_kind,
                        );
                        let predicate = ScopePredicate::leaf(scope.predicate);
                        let shape = predicate.shape();
                        self.insert(
                            CatalogRecord {
                                reference_id,
                                display_name: scope.display_name,
                                family: CatalogFamily::Provider,
                                shape,
                                requires_user_input: scope.requires_user_input,
                                unstable: scope.unstable,
                                module: None,
                                named_scope: None,
                                provider: Some(provider_id.clone()),
                                predicate,
                            },
                            options.collision_policy,
                        );
                    }
                }
                Err(failure) => {
                    tracing::warn!(
                        provider = %provider_id,
                        error = %failure.message,
                        "scope provider failed, skipping"
                    );
                    self.diagnostics.push(ScopeDiagnostic::new(
                        DiagnosticCode::ProviderFailed,
                        failure.to_string(),
                    ));
                }
            }
        }
    }

    fn collect_named_patterns(&mut self, workspace: &dyn WorkspaceModel, options: &CatalogOptions) {
        for holder in workspace.pattern_holders() {
            for scope in holder.scopes {
                let predicate = ScopePredicate::leaf(scope.predicate);
                let shape = predicate.shape();
                self.insert(
                    CatalogRecord {
                        reference_id: ReferenceId::named(&holder.id, &scope.name),
                        display_name: scope.name.clone(),
                        family: CatalogFamily::NamedPattern,
                        shape,
                        requires_user_input: false,
                        unstable: false,
                        module: None,
                        named_scope: Some((holder.id.clone(), scope.name)),
                        provider: None,
                        predicate,
                    },
                    options.collision_policy,
                );
            }
        }
    }

    fn collect_modules(&mut self, workspace: &dyn WorkspaceModel, options: &CatalogOptions) {
        for module in workspace.modules() {
            for flavor in ModuleFlavor::ALL {
                let Some(leaf) = workspace.module_scope(&module, flavor) else {
                    continue;
                };
                let predicate = ScopePredicate::leaf(leaf);
                let shape = predicate.shape();
                self.insert(
                    CatalogRecord {
                        reference_id: ReferenceId::module(&module, flavor),
                        display_name: format!("Module '{module}'{}", flavor.display_suffix()),
                        family: CatalogFamily::Module,
                        shape,
                        requires_user_input: false,
                        unstable: false,
                        module: Some((module.clone(), flavor)),
                        named_scope: None,
                        provider: None,
                        predicate,
                    },
                    options.collision_policy,
                );
            }
        }
    }

    fn insert(&mut self, record: CatalogRecord, policy: CollisionPolicy) {
        if let Some(existing) = self.records.get(&record.reference_id) {
            let (kept, shadowed) = match policy {
                CollisionPolicy::FirstWins => (existing.family, record.family),
                CollisionPolicy::LastWins => (record.family, existing.family),
            };
            self.diagnostics.push(ScopeDiagnostic::new(
                DiagnosticCode::CatalogShadowed,
                format!(
                    "reference id \"{}\" registered by both {kept} and {shadowed} families; {kept} wins",
                    record.reference_id
                ),
            ));
            if policy == CollisionPolicy::FirstWins {
                return;
            }
        }
        self.records.insert(record.reference_id.clone(), record);
    }

    /// Look up a record by reference id.
    pub fn get(&self, reference: &ReferenceId) -> Option<&CatalogRecord> {
        self.records.get(reference)
    }

    /// All records, ordered by reference id.
    pub fn records(&self) -> impl Iterator<Item = &CatalogRecord> {
        self.records.values()
    }

    /// All named-pattern records whose scope name matches, ordered by
    /// reference id (and therefore by holder id). Used for holder-less
    /// named-pattern resolution and its ambiguity check.
    pub fn find_named(&self, name: &str) -> Vec<&CatalogRecord> {
        self.records
            .values()
            .filter(|r| {
                r.family == CatalogFamily::NamedPattern
                    && r.named_scope.as_ref().is_some_and(|(_, n)| n == name)
            })
            .collect()
    }

    /// Diagnostics collected while building (provider failures, shadowed
    /// registrations).
    pub fn diagnostics(&self) -> &[ScopeDiagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
