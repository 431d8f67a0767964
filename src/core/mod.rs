//! Core data structures for libgraph.
//!
//! This module contains the foundational types used throughout libgraph:
//! - Interned identifiers (Name, FqName, ClassId)
//! - Library artifacts and their manifests
//! - The module header and package payload formats

pub mod errors;
pub mod header;
pub mod library;
pub mod manifest;
pub mod name;
pub mod payload;

pub use errors::LoadError;
pub use header::{parse_module_header, ModuleHeader};
pub use library::{DirectoryLibrary, Library, MemoryLibrary};
pub use manifest::LibraryManifest;
pub use name::{ClassId, FqName, Name};
pub use payload::{BincodeSymbolDecoder, PackagePayload, SymbolDecoder};
