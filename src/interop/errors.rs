//! Orchestration error types.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Failure of the interop bridge. Resolution errors are raised before any
/// external tool runs.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum InteropError {
    #[error("unknown target `{request}`")]
    #[diagnostic(code(libgraph::interop::unresolved_target))]
    UnresolvedTarget { request: String, known: Vec<String> },

    #[error("library `{name}` not found")]
    #[diagnostic(code(libgraph::interop::unresolved_library))]
    UnresolvedLibrary { name: String, searched: Vec<PathBuf> },

    #[error("library `{name}` cannot be used: {reason}")]
    #[diagnostic(code(libgraph::interop::incompatible_library))]
    IncompatibleLibrary { name: String, reason: String },

    #[error("dependency cycle through library `{library}`")]
    #[diagnostic(code(libgraph::interop::dependency_cycle))]
    DependencyCycle { library: String },

    #[error("`{tool}` failed: {message}")]
    #[diagnostic(code(libgraph::interop::tool_failed))]
    ToolFailed { tool: String, message: String },
}

impl InteropError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            InteropError::UnresolvedTarget { request, known } => {
                Diagnostic::error(format!("unknown target `{}`", request))
                    .with_context(format!("known targets: {}", known.join(", ")))
                    .with_suggestion(suggestions::LIST_TARGETS)
            }

            InteropError::UnresolvedLibrary { name, searched } => {
                let mut diag = Diagnostic::error(format!("library `{}` not found", name));
                for path in searched {
                    diag = diag.with_context(format!("searched: {}", path.display()));
                }
                diag.with_suggestion(suggestions::ADD_REPO)
            }

            InteropError::IncompatibleLibrary { name, reason } => {
                Diagnostic::error(format!("library `{}` cannot be used", name))
                    .with_context(reason.clone())
                    .with_suggestion(suggestions::REBUILD_LIBRARY)
            }

            InteropError::DependencyCycle { library } => Diagnostic::error(format!(
                "libraries depend on each other in a cycle through `{}`",
                library
            ))
            .with_context("check the `depends` entries of the library manifests"),

            InteropError::ToolFailed { tool, message } => {
                Diagnostic::error(format!("`{}` failed", tool))
                    .with_location(tool)
                    .with_context(message.clone())
                    .with_suggestion(suggestions::RUN_VERBOSE)
            }
        }
    }
}
