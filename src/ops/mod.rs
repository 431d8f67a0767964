//! High-level operations.
//!
//! This module contains the implementation of libgraph commands.

pub mod inspect;
pub mod interop;
pub mod lookup;

pub use inspect::{
    format_report, inspect_libraries, inspect_library, load_library_dir, FragmentSummary,
    InspectOptions, ModuleReport,
};
pub use interop::{run_interop, run_interop_with, InteropOptions};
pub use lookup::{format_lookup, lookup_class, LookupReport};
