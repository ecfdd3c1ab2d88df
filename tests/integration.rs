//! End-to-end integration tests for the seshat engine.
//!
//! These tests exercise the full pipeline from workspace declaration
//! through catalog building, compilation, serialization, and re-resolution,
//! validating that the catalog, normalizer, and evaluator work together.

use std::sync::Arc;

use seshat::atom::{AtomKind, ScopeAtom};
use seshat::catalog::{CatalogOptions, CollisionPolicy};
use seshat::descriptor::{ScopeProgramDescriptor, ScopeToken};
use seshat::diag::DiagnosticCode;
use seshat::engine::{ResolveOptions, ScopeEngine, ScopeRequest};
use seshat::error::{ResolutionError, ScopeError, StructuralError};
use seshat::memory::{FileSetLeaf, MemoryWorkspace, StaticScopeProvider};
use seshat::shape::Shape;
use seshat::workspace::{ContributedScope, FileKey, ModuleFlavor, StandardScope};

const CORE_LIB: &str = "file:///proj/core/lib.rs";
const CORE_EVAL: &str = "file:///proj/core/eval.rs";
const UTIL_LIB: &str = "file:///proj/util/lib.rs";
const SERDE_LIB: &str = "file:///libs/serde/lib.rs";

fn test_workspace() -> MemoryWorkspace {
    MemoryWorkspace::builder()
        .module_full("core", &[CORE_LIB, CORE_EVAL], &["util"], &[SERDE_LIB])
        .module("util", &[UTIL_LIB])
        .holder("settings", &[("Generated", &["**/generated/**"])])
        .holder(
            "plugin",
            &[("Generated", &["**/gen/**"]), ("Docs", &["**/*.md"])],
        )
        .build()
        .unwrap()
}

fn test_engine() -> ScopeEngine {
    ScopeEngine::new(Arc::new(test_workspace()))
}

fn request(atoms: Vec<ScopeAtom>, tokens: Vec<ScopeToken>) -> ScopeRequest {
    ScopeRequest { atoms, tokens }
}

#[test]
fn intersection_of_two_presets_is_global_with_no_diagnostics() {
    let engine = test_engine();
    let descriptor = engine
        .compile(
            &request(
                vec![
                    ScopeAtom::standard("a", "ProjectFiles"),
                    ScopeAtom::standard("b", "ProjectLibraries"),
                ],
                vec![ScopeToken::push("a"), ScopeToken::push("b"), ScopeToken::And],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();

    assert_eq!(descriptor.shape, Shape::Global);
    assert!(descriptor.diagnostics.is_empty());

    let scope = engine.resolve(&descriptor, false).unwrap();
    // Content and libraries are disjoint here, so the intersection is empty.
    assert!(!scope.predicate.contains(&FileKey::from(CORE_LIB)));
    assert!(!scope.predicate.contains(&FileKey::from(SERDE_LIB)));
}

#[test]
fn single_push_takes_the_atom_shape_and_predicate() {
    let engine = test_engine();
    let files = vec![CORE_LIB.to_string()];
    let descriptor = engine
        .compile(
            &request(
                vec![ScopeAtom::file_set("a", files)],
                vec![ScopeToken::push("a")],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();
    assert_eq!(descriptor.shape, Shape::Local);

    let scope = engine.resolve(&descriptor, false).unwrap();
    assert!(scope.predicate.contains(&FileKey::from(CORE_LIB)));
    assert!(!scope.predicate.contains(&FileKey::from(UTIL_LIB)));
}

#[test]
fn leftover_stack_is_a_structural_error() {
    let engine = test_engine();
    let err = engine
        .compile(
            &request(
                vec![
                    ScopeAtom::standard("a", "ProjectFiles"),
                    ScopeAtom::standard("b", "ProjectLibraries"),
                ],
                vec![ScopeToken::push("a"), ScopeToken::push("b")],
            ),
            // Lenient does not soften structural errors.
            &ResolveOptions::lenient(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ScopeError::Structural(StructuralError::UnbalancedProgram { leftover: 2 })
    ));
}

#[test]
fn duplicate_atom_ids_are_rejected() {
    let engine = test_engine();
    let err = engine
        .compile(
            &request(
                vec![
                    ScopeAtom::standard("a", "ProjectFiles"),
                    ScopeAtom::standard("a", "AllFiles"),
                ],
                vec![ScopeToken::push("a")],
            ),
            &ResolveOptions::lenient(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ScopeError::Structural(StructuralError::DuplicateAtomId { .. })
    ));
}

#[test]
fn ambiguous_named_scope_strict_fails_lenient_degrades() {
    let engine = test_engine();
    let req = request(
        vec![ScopeAtom::named_pattern("x", "Generated")],
        vec![ScopeToken::push("x")],
    );

    let err = engine.compile(&req, &ResolveOptions::strict()).unwrap_err();
    match err {
        ScopeError::Resolution(ResolutionError::AmbiguousNamedScope { holders, .. }) => {
            assert!(holders.contains("settings"));
            assert!(holders.contains("plugin"));
        }
        other => panic!("expected ambiguity error, got {other}"),
    }

    // Lenient: the compile still succeeds, with the empty substitute.
    let descriptor = engine.compile(&req, &ResolveOptions::lenient()).unwrap();
    let codes: Vec<DiagnosticCode> = descriptor.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&DiagnosticCode::AmbiguousNamedScope));
    assert!(codes.contains(&DiagnosticCode::UnresolvedAtom));

    let scope = engine.resolve(&descriptor, false).unwrap();
    assert!(!scope.predicate.contains(&FileKey::from(CORE_LIB)));
}

#[test]
fn holder_qualified_named_scope_is_unambiguous() {
    let engine = test_engine();
    let descriptor = engine
        .compile(
            &request(
                vec![ScopeAtom::named_pattern_in("x", "Generated", "settings")],
                vec![ScopeToken::push("x")],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();
    assert_eq!(
        descriptor.atoms[0].scope_ref.as_ref().unwrap().as_str(),
        "named:settings:Generated"
    );
}

#[test]
fn renormalizing_a_descriptor_is_idempotent() {
    let engine = test_engine();
    let req = request(
        vec![
            ScopeAtom::standard("a", "ProjectFiles"),
            ScopeAtom::module("b", "core", ModuleFlavor::WithDependencies),
            ScopeAtom::named_pattern("c", "Docs"),
            ScopeAtom::ad_hoc_pattern("d", "  **/*.rs "),
            ScopeAtom::file_set("e", vec![UTIL_LIB.into(), CORE_LIB.into(), UTIL_LIB.into()]),
        ],
        vec![
            ScopeToken::push("a"),
            ScopeToken::push("b"),
            ScopeToken::And,
            ScopeToken::push("c"),
            ScopeToken::Or,
            ScopeToken::push("d"),
            ScopeToken::Or,
            ScopeToken::push("e"),
            ScopeToken::Or,
        ],
    );
    let first = engine.compile(&req, &ResolveOptions::strict()).unwrap();
    let second = engine
        .compile(
            &request(first.atoms.clone(), first.tokens.clone()),
            &ResolveOptions::strict(),
        )
        .unwrap();
    assert!(second.equivalent_to(&first));
    assert_eq!(second.atoms, first.atoms);
}

#[test]
fn catalog_ids_are_deterministic_across_builds() {
    let engine = test_engine();
    let first: Vec<String> = engine
        .list_catalog(true)
        .into_iter()
        .map(|e| e.reference_id.to_string())
        .collect();
    let second: Vec<String> = engine
        .list_catalog(true)
        .into_iter()
        .map(|e| e.reference_id.to_string())
        .collect();
    assert_eq!(first, second);
    assert!(first.contains(&"standard:ProjectFiles".to_string()));
    assert!(first.contains(&"module:core:deps-libs".to_string()));
    assert!(first.contains(&"named:plugin:Docs".to_string()));
}

#[test]
fn ad_hoc_ids_are_stable_across_compile_calls() {
    let engine = test_engine();
    let compile_pattern = |text: &str| {
        engine
            .compile(
                &request(
                    vec![ScopeAtom::ad_hoc_pattern("p", text)],
                    vec![ScopeToken::push("p")],
                ),
                &ResolveOptions::strict(),
            )
            .unwrap()
            .atoms[0]
            .scope_ref
            .clone()
            .unwrap()
    };
    // Identical post-trim pattern text, separate compile calls.
    assert_eq!(compile_pattern("**/*.rs"), compile_pattern("  **/*.rs  "));
    assert_ne!(compile_pattern("**/*.rs"), compile_pattern("**/*.toml"));
}

#[test]
fn descriptor_survives_json_round_trip() {
    let engine = test_engine();
    let descriptor = engine
        .compile(
            &request(
                vec![
                    ScopeAtom::standard("a", "ProjectFiles"),
                    ScopeAtom::ad_hoc_pattern("b", "**/eval.rs"),
                ],
                vec![ScopeToken::push("a"), ScopeToken::push("b"), ScopeToken::And],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();

    let json = descriptor.to_json().unwrap();
    let restored = ScopeProgramDescriptor::from_json(&json).unwrap();
    assert!(restored.equivalent_to(&descriptor));

    let scope = engine.resolve(&restored, false).unwrap();
    assert!(scope.predicate.contains(&FileKey::from(CORE_EVAL)));
    assert!(!scope.predicate.contains(&FileKey::from(CORE_LIB)));
}

#[test]
fn stored_descriptor_degrades_when_the_workspace_changes() {
    let engine = test_engine();
    let descriptor = engine
        .compile(
            &request(
                vec![ScopeAtom::module("m", "core", ModuleFlavor::Content)],
                vec![ScopeToken::push("m")],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();

    // The module is gone in the new workspace.
    let shrunk = ScopeEngine::new(Arc::new(
        MemoryWorkspace::builder()
            .module("util", &[UTIL_LIB])
            .build()
            .unwrap(),
    ));

    let scope = shrunk.resolve(&descriptor, false).unwrap();
    assert_eq!(scope.diagnostics.len(), 1);
    assert_eq!(scope.diagnostics[0].code, DiagnosticCode::UnresolvedAtom);
    assert!(!scope.predicate.contains(&FileKey::from(CORE_LIB)));

    // Strict re-resolution refuses instead.
    let err = shrunk
        .resolve_with(&descriptor, &ResolveOptions::strict())
        .unwrap_err();
    assert!(matches!(
        err,
        ScopeError::Resolution(ResolutionError::UnknownModule { .. })
    ));
}

#[test]
fn provider_scopes_resolve_by_catalog_reference() {
    let contributed = ContributedScope {
        name: "changed".into(),
        display_name: "Changed Files".into(),
        implementation_kind: "vcs-status".into(),
        requires_user_input: false,
        unstable: true,
        predicate: Arc::new(FileSetLeaf::new(
            "Changed Files",
            Shape::Global,
            [CORE_EVAL.to_string()],
        )),
    };
    let workspace = MemoryWorkspace::builder()
        .module("core", &[CORE_LIB, CORE_EVAL])
        .provider(Arc::new(StaticScopeProvider::new("vcs", vec![contributed])))
        .build()
        .unwrap();
    let engine = ScopeEngine::new(Arc::new(workspace));

    let entry = engine
        .list_catalog(false)
        .into_iter()
        .find(|e| e.provider.as_deref() == Some("vcs"))
        .unwrap();
    assert!(entry.unstable);
    assert!(entry.reference_id.as_str().starts_with("provider:vcs:"));

    let descriptor = engine
        .compile(
            &request(
                vec![ScopeAtom::catalog_ref("c", entry.reference_id.clone())],
                vec![ScopeToken::push("c")],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();
    assert_eq!(descriptor.atoms[0].display_name.as_deref(), Some("Changed Files"));

    let scope = engine.resolve(&descriptor, false).unwrap();
    assert!(scope.predicate.contains(&FileKey::from(CORE_EVAL)));
    assert!(!scope.predicate.contains(&FileKey::from(CORE_LIB)));
}

#[test]
fn failing_provider_degrades_to_a_diagnostic() {
    let workspace = MemoryWorkspace::builder()
        .module("core", &[CORE_LIB])
        .provider(Arc::new(StaticScopeProvider::failing("vcs", "daemon not running")))
        .build()
        .unwrap();
    let engine = ScopeEngine::new(Arc::new(workspace));

    // The catalog still builds and other scopes still compile.
    let descriptor = engine
        .compile(
            &request(
                vec![ScopeAtom::standard("a", "ProjectFiles")],
                vec![ScopeToken::push("a")],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();
    assert_eq!(descriptor.diagnostics.len(), 1);
    assert_eq!(descriptor.diagnostics[0].code, DiagnosticCode::ProviderFailed);
}

#[test]
fn interactive_scopes_are_gated() {
    let workspace = MemoryWorkspace::builder()
        .module("core", &[CORE_LIB])
        .current_file(CORE_LIB)
        .build()
        .unwrap();
    let engine = ScopeEngine::new(Arc::new(workspace));

    // Hidden from non-interactive discovery.
    assert!(!engine
        .list_catalog(false)
        .iter()
        .any(|e| e.requires_user_input));
    let entry = engine
        .list_catalog(true)
        .into_iter()
        .find(|e| e.requires_user_input)
        .unwrap();
    assert_eq!(entry.reference_id.as_str(), "standard:CurrentFile");

    let req = request(
        vec![ScopeAtom::standard("a", "CurrentFile")],
        vec![ScopeToken::push("a")],
    );
    let err = engine.compile(&req, &ResolveOptions::strict()).unwrap_err();
    assert!(matches!(
        err,
        ScopeError::Resolution(ResolutionError::InteractiveNotAllowed { .. })
    ));

    let descriptor = engine
        .compile(&req, &ResolveOptions::strict().with_interactive(true))
        .unwrap();
    let scope = engine.resolve(&descriptor, true).unwrap();
    assert!(scope.predicate.contains(&FileKey::from(CORE_LIB)));
}

#[test]
fn collision_policy_is_configurable() {
    let shadowing = || StandardScope {
        id: "ProjectFiles".into(),
        display_name: "Overridden Project Files".into(),
        requires_user_input: false,
        unstable: false,
        predicate: Arc::new(FileSetLeaf::new(
            "Overridden Project Files",
            Shape::Global,
            [UTIL_LIB.to_string()],
        )),
    };

    let first_wins = ScopeEngine::new(Arc::new(
        MemoryWorkspace::builder()
            .module("core", &[CORE_LIB])
            .standard_scope(shadowing())
            .build()
            .unwrap(),
    ));
    let entry = first_wins
        .list_catalog(false)
        .into_iter()
        .find(|e| e.reference_id.as_str() == "standard:ProjectFiles")
        .unwrap();
    assert_eq!(entry.display_name, "Project Files");

    let last_wins = ScopeEngine::new(Arc::new(
        MemoryWorkspace::builder()
            .module("core", &[CORE_LIB])
            .standard_scope(shadowing())
            .build()
            .unwrap(),
    ))
    .with_catalog_options(CatalogOptions {
        collision_policy: CollisionPolicy::LastWins,
    });
    let entry = last_wins
        .list_catalog(false)
        .into_iter()
        .find(|e| e.reference_id.as_str() == "standard:ProjectFiles")
        .unwrap();
    assert_eq!(entry.display_name, "Overridden Project Files");

    // Either way the shadowing is observable.
    let descriptor = last_wins
        .compile(
            &request(
                vec![ScopeAtom::standard("a", "AllFiles")],
                vec![ScopeToken::push("a")],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();
    assert!(descriptor
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::CatalogShadowed));
}

#[test]
fn opaque_provider_scope_degrades_combinations() {
    let opaque = ContributedScope {
        name: "tracked".into(),
        display_name: "Tracked Elements".into(),
        implementation_kind: "opaque".into(),
        requires_user_input: false,
        unstable: false,
        predicate: Arc::new(FileSetLeaf::new(
            "Tracked Elements",
            Shape::Mixed,
            [CORE_LIB.to_string()],
        )),
    };
    let workspace = MemoryWorkspace::builder()
        .module("core", &[CORE_LIB, CORE_EVAL])
        .provider(Arc::new(StaticScopeProvider::new("tracker", vec![opaque])))
        .build()
        .unwrap();
    let engine = ScopeEngine::new(Arc::new(workspace));
    let entry = engine
        .list_catalog(false)
        .into_iter()
        .find(|e| e.provider.is_some())
        .unwrap();

    let descriptor = engine
        .compile(
            &request(
                vec![
                    ScopeAtom::catalog_ref("o", entry.reference_id.clone()),
                    ScopeAtom::standard("a", "ProjectFiles"),
                ],
                vec![ScopeToken::push("o"), ScopeToken::push("a"), ScopeToken::And],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();
    assert_eq!(descriptor.shape, Shape::Mixed);
    assert!(descriptor
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::OpaqueDegradation));

    // Membership stays exact; negation of the mixed result is refused.
    let scope = engine.resolve(&descriptor, false).unwrap();
    assert!(scope.predicate.contains(&FileKey::from(CORE_LIB)));
    assert!(scope.predicate.global_local_parts().is_none());
}

#[test]
fn workspace_spec_loads_from_toml() {
    use std::io::Write;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("workspace.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"
[[modules]]
name = "core"
files = ["{CORE_LIB}", "{CORE_EVAL}"]

[[holders]]
id = "settings"

[[holders.scopes]]
name = "Evaluators"
patterns = ["**/eval.rs"]
"#
    )
    .unwrap();

    let spec = seshat::memory::WorkspaceSpec::load(&path).unwrap();
    let engine = ScopeEngine::new(Arc::new(MemoryWorkspace::from_spec(&spec).unwrap()));

    let descriptor = engine
        .compile(
            &request(
                vec![
                    ScopeAtom::named_pattern("n", "Evaluators"),
                    ScopeAtom::standard("a", "ProjectFiles"),
                ],
                vec![ScopeToken::push("n"), ScopeToken::push("a"), ScopeToken::And],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();
    assert_eq!(
        descriptor.atoms[0].kind,
        AtomKind::NamedPattern {
            name: "Evaluators".into(),
            holder: Some("settings".into())
        }
    );

    let scope = engine.resolve(&descriptor, false).unwrap();
    assert!(scope.predicate.contains(&FileKey::from(CORE_EVAL)));
    assert!(!scope.predicate.contains(&FileKey::from(CORE_LIB)));
}

#[test]
fn not_excludes_generated_files() {
    let engine = test_engine();
    let descriptor = engine
        .compile(
            &request(
                vec![
                    ScopeAtom::standard("a", "ProjectFiles"),
                    ScopeAtom::named_pattern_in("g", "Generated", "settings"),
                ],
                vec![
                    ScopeToken::push("a"),
                    ScopeToken::push("g"),
                    ScopeToken::Not,
                    ScopeToken::And,
                ],
            ),
            &ResolveOptions::strict(),
        )
        .unwrap();
    assert_eq!(descriptor.shape, Shape::Global);

    let generated = MemoryWorkspace::builder()
        .module("core", &[CORE_LIB, "file:///proj/core/generated/api.rs"])
        .holder("settings", &[("Generated", &["**/generated/**"])])
        .build()
        .unwrap();
    let engine = ScopeEngine::new(Arc::new(generated));
    let scope = engine.resolve(&descriptor, false).unwrap();
    assert!(scope.predicate.contains(&FileKey::from(CORE_LIB)));
    assert!(!scope
        .predicate
        .contains(&FileKey::from("file:///proj/core/generated/api.rs")));
}
