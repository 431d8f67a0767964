//! Module loading error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while turning a library into a module descriptor.
///
/// Every variant is fatal for the load that produced it: no partially
/// initialized module is ever handed back.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum LoadError {
    #[error("corrupt module header in library `{library}`: {message}")]
    #[diagnostic(code(libgraph::load::corrupt_header))]
    CorruptHeader { library: String, message: String },

    #[error("inconsistent manifest: interop library `{library}` should have `package` specified")]
    #[diagnostic(
        code(libgraph::load::inconsistent_manifest),
        help("add a `package=<name>` entry to the library manifest")
    )]
    InconsistentManifest { library: String },

    #[error("failed to read {what} of library `{library}`")]
    #[diagnostic(code(libgraph::load::read))]
    LibraryRead {
        library: String,
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt metadata for package `{package}` in library `{library}`: {message}")]
    #[diagnostic(code(libgraph::load::corrupt_package))]
    CorruptPackage {
        library: String,
        package: String,
        message: String,
    },

    #[error(
        "package `{package}` in library `{library}` has metadata version {found}, expected {expected}"
    )]
    #[diagnostic(
        code(libgraph::load::incompatible_metadata),
        help("rebuild the library with a compatible compiler or set `skip_metadata_version_check`")
    )]
    IncompatibleMetadata {
        library: String,
        package: String,
        found: String,
        expected: String,
    },

    #[error("module `{module}` was queried before it was initialized")]
    #[diagnostic(code(libgraph::load::not_initialized))]
    ModuleNotInitialized { module: String },

    #[error("module `{module}` is already initialized")]
    #[diagnostic(code(libgraph::load::already_initialized))]
    ModuleAlreadyInitialized { module: String },

    #[error("package `{package}` has no deserialization components")]
    #[diagnostic(code(libgraph::load::components_missing))]
    ComponentsMissing { package: String },

    #[error("deserialization components for package `{package}` are already set")]
    #[diagnostic(code(libgraph::load::components_already_set))]
    ComponentsAlreadySet { package: String },
}

impl LoadError {
    /// Name of the library the error is about, when there is one.
    pub fn library(&self) -> Option<&str> {
        match self {
            LoadError::CorruptHeader { library, .. }
            | LoadError::InconsistentManifest { library }
            | LoadError::LibraryRead { library, .. }
            | LoadError::CorruptPackage { library, .. }
            | LoadError::IncompatibleMetadata { library, .. } => Some(library),
            _ => None,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            LoadError::CorruptHeader { library, message } => {
                Diagnostic::error(format!("library `{}` has a corrupt module header", library))
                    .with_context(message.clone())
                    .with_suggestion(suggestions::REBUILD_LIBRARY)
            }

            LoadError::InconsistentManifest { library } => Diagnostic::error(format!(
                "interop library `{}` does not declare its package",
                library
            ))
            .with_context("`interop=true` requires a `package` entry in the manifest")
            .with_suggestion(suggestions::DECLARE_PACKAGE),

            LoadError::LibraryRead {
                library,
                what,
                source,
            } => Diagnostic::error(format!("could not read {} of `{}`", what, library))
                .with_context(source.to_string())
                .with_suggestion(suggestions::CHECK_LIBRARY_PATH),

            LoadError::CorruptPackage {
                library,
                package,
                message,
            } => Diagnostic::error(format!(
                "package `{}` of `{}` could not be decoded",
                package, library
            ))
            .with_context(message.clone())
            .with_suggestion(suggestions::REBUILD_LIBRARY),

            LoadError::IncompatibleMetadata {
                library,
                package,
                found,
                expected,
            } => Diagnostic::error(format!(
                "package `{}` of `{}` uses metadata version {}",
                package, library, found
            ))
            .with_context(format!("this loader reads metadata version {}", expected))
            .with_suggestion(suggestions::REBUILD_LIBRARY),

            other => Diagnostic::error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inconsistent_manifest_names_library() {
        let err = LoadError::InconsistentManifest {
            library: "sdl".to_string(),
        };

        assert!(err.to_string().contains("`sdl`"));
        assert_eq!(err.library(), Some("sdl"));

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("error: interop library `sdl`"));
        assert!(output.contains("help: consider:"));
    }

    #[test]
    fn test_not_initialized_has_no_library() {
        let err = LoadError::ModuleNotInitialized {
            module: "<sdl>".to_string(),
        };
        assert_eq!(err.library(), None);
        assert!(err.to_diagnostic().format(false).contains("before it was initialized"));
    }
}
