//! # seshat
//!
//! A scope-algebra resolution engine: turns a declarative description of
//! "which files are in play" — atomic scope predicates combined by a
//! reverse-Polish boolean program — into one evaluable membership
//! predicate, plus metadata describing how safely that predicate can be
//! enumerated versus merely tested.
//!
//! ## Architecture
//!
//! - **Catalog builder** (`catalog`): per-call snapshot of available atomic
//!   scopes, keyed by stable reference ids
//! - **Atom normalizer** (`normalize`): canonicalization, ambiguity
//!   detection, idempotent re-normalization
//! - **Program evaluator** (`eval`): stack machine over `push`/`and`/`or`/
//!   `not` tokens with shape tracking
//! - **Descriptors** (`descriptor`): the serializable artifact consumers
//!   store and re-resolve
//! - **Workspace model** (`workspace`): the collaborator trait everything
//!   resolves against; `memory` ships the in-memory reference
//!   implementation
//!
//! ## Library usage
//!
//! ```
//! use std::sync::Arc;
//! use seshat::atom::ScopeAtom;
//! use seshat::descriptor::ScopeToken;
//! use seshat::engine::{ResolveOptions, ScopeEngine, ScopeRequest};
//! use seshat::memory::MemoryWorkspace;
//! use seshat::workspace::FileKey;
//!
//! let workspace = MemoryWorkspace::builder()
//!     .module("core", &["file:///proj/core/lib.rs"])
//!     .module("util", &["file:///proj/util/lib.rs"])
//!     .build()
//!     .unwrap();
//! let engine = ScopeEngine::new(Arc::new(workspace));
//!
//! let request = ScopeRequest {
//!     atoms: vec![
//!         ScopeAtom::standard("a", "ProjectFiles"),
//!         ScopeAtom::ad_hoc_pattern("b", "**/core/**"),
//!     ],
//!     tokens: vec![ScopeToken::push("a"), ScopeToken::push("b"), ScopeToken::And],
//! };
//! let descriptor = engine.compile(&request, &ResolveOptions::strict()).unwrap();
//!
//! let scope = engine.resolve(&descriptor, false).unwrap();
//! assert!(scope.predicate.contains(&FileKey::from("file:///proj/core/lib.rs")));
//! assert!(!scope.predicate.contains(&FileKey::from("file:///proj/util/lib.rs")));
//! ```

pub mod atom;
pub mod catalog;
pub mod descriptor;
pub mod diag;
pub mod engine;
pub mod error;
pub mod eval;
pub mod memory;
pub mod normalize;
pub mod predicate;
pub mod refid;
pub mod shape;
pub mod workspace;
