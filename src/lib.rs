//! libgraph - lazy module graphs for compiled libraries
//!
//! This crate loads compiled library artifacts into module descriptors whose
//! package contents are decoded on first use, bridges native-interop forward
//! declarations to their definitions, and drives the two-stage interop
//! build.

pub mod core;
pub mod descriptors;
pub mod interop;
pub mod ops;
pub mod util;

/// Test utilities and mocks for libgraph unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides in-memory library fixtures and a mock
/// header-import tool.
#[cfg(test)]
pub mod test_support;

pub use core::{
    errors::LoadError,
    library::{DirectoryLibrary, Library, MemoryLibrary},
    manifest::LibraryManifest,
    name::{ClassId, FqName, Name},
};
pub use descriptors::{create_module_descriptor, ModuleDescriptor, ModuleGraph, ModuleLoadOptions};
pub use interop::{InteropCompiler, InteropError};
