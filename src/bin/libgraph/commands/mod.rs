//! Command implementations

pub mod completions;
pub mod inspect;
pub mod interop;
pub mod lookup;
