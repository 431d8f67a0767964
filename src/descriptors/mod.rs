//! Module descriptors built from compiled libraries.
//!
//! Loading goes header → fragments → synthetic fragments → components →
//! module. Everything after the header is lazy: package payloads are decoded
//! the first time something looks inside them.

pub mod classifier;
pub mod components;
pub mod factory;
pub mod fragment;
pub mod graph;
pub mod module;
pub mod provider;
pub mod synthetic;

pub use classifier::{ClassDescriptor, ClassKind, ClassOrigin, ForwardDeclarationNamespace};
pub use components::{
    DeserializationComponents, LanguageVersion, LanguageVersionSettings, PackageAccessedHandler,
    StorageContext,
};
pub use factory::{create_module_descriptor, ModuleLoadOptions};
pub use fragment::PackageFragment;
pub use graph::{ModuleGraph, Resolution};
pub use module::{ModuleDescriptor, ModuleOrigin};
pub use provider::PackageFragmentProvider;
