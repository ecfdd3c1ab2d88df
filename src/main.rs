//! seshat CLI: compile, resolve, and inspect file scopes.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use seshat::descriptor::ScopeProgramDescriptor;
use seshat::engine::{ResolveOptions, ScopeEngine, ScopeRequest};
use seshat::memory::{MemoryWorkspace, WorkspaceSpec};
use seshat::workspace::FileKey;

#[derive(Parser)]
#[command(name = "seshat", version, about = "Scope algebra engine")]
struct Cli {
    /// Path to the workspace spec (TOML).
    #[arg(long, global = true, default_value = "workspace.toml")]
    workspace: PathBuf,

    /// Allow scopes that require user input (e.g. "current file").
    #[arg(long, global = true)]
    interactive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog of available atomic scopes.
    Catalog,

    /// Compile a scope request (JSON) into a descriptor (JSON on stdout).
    Compile {
        /// Path to the request JSON ({"atoms": [...], "tokens": [...]}).
        #[arg(long)]
        request: PathBuf,

        /// Collect diagnostics instead of failing on resolution problems.
        #[arg(long)]
        lenient: bool,
    },

    /// Resolve a stored descriptor against the current workspace.
    Resolve {
        /// Path to the descriptor JSON.
        #[arg(long)]
        descriptor: PathBuf,
    },

    /// Test file membership against a stored descriptor.
    Check {
        /// Path to the descriptor JSON.
        #[arg(long)]
        descriptor: PathBuf,

        /// File urls to test.
        files: Vec<String>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let spec = WorkspaceSpec::load(&cli.workspace)?;
    let workspace = MemoryWorkspace::from_spec(&spec)?;
    let engine = ScopeEngine::new(Arc::new(workspace));

    match cli.command {
        Commands::Catalog => {
            for entry in engine.list_catalog(cli.interactive) {
                let mut flags = String::new();
                if entry.requires_user_input {
                    flags.push_str(" [interactive]");
                }
                if entry.unstable {
                    flags.push_str(" [unstable]");
                }
                println!(
                    "{:<44} {:<8} {}{}",
                    entry.reference_id.to_string(),
                    entry.shape.to_string(),
                    entry.display_name,
                    flags
                );
            }
        }

        Commands::Compile { request, lenient } => {
            let text = std::fs::read_to_string(&request).into_diagnostic()?;
            let request: ScopeRequest = serde_json::from_str(&text).into_diagnostic()?;
            let options = ResolveOptions {
                strict: !lenient,
                allow_interactive: cli.interactive,
            };
            let descriptor = engine.compile(&request, &options)?;
            println!("{}", descriptor.to_json().into_diagnostic()?);
        }

        Commands::Resolve { descriptor } => {
            let descriptor = load_descriptor(&descriptor)?;
            let resolved = engine.resolve(&descriptor, cli.interactive)?;
            println!("scope: {}", resolved.display_name);
            println!("shape: {}", resolved.shape);
            for diagnostic in &resolved.diagnostics {
                println!("warning: {diagnostic}");
            }
        }

        Commands::Check { descriptor, files } => {
            let descriptor = load_descriptor(&descriptor)?;
            let resolved = engine.resolve(&descriptor, cli.interactive)?;
            for file in files {
                let key = FileKey::new(&file);
                let verdict = if resolved.predicate.contains(&key) {
                    "in"
                } else {
                    "out"
                };
                println!("{verdict:<4} {file}");
            }
        }
    }

    Ok(())
}

fn load_descriptor(path: &PathBuf) -> Result<ScopeProgramDescriptor> {
    let text = std::fs::read_to_string(path).into_diagnostic()?;
    ScopeProgramDescriptor::from_json(&text).into_diagnostic()
}
