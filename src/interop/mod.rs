//! Interop build orchestration.
//!
//! An interop build runs in two fixed stages. The header-import tool
//! generates bindings and native stubs for a set of native headers; the
//! library-production stage then compiles those into a library. This module
//! parses the shared argument list, resolves the target and the libraries
//! it references, and derives both stages' arguments.

pub mod args;
pub mod compiler;
pub mod errors;
pub mod platform;
pub mod resolver;
pub mod tool;

pub use args::{BuildLayout, InteropArgs};
pub use compiler::{import_directives, InteropCompiler, InteropInvocation};
pub use errors::InteropError;
pub use platform::{NativeTarget, PlatformManager};
pub use resolver::{LibraryResolver, ResolvedLibrary};
pub use tool::{ExternalHeaderImportTool, HeaderImportTool};
