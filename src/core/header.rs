//! Module header: the module name and the ordered list of packages a
//! library declares.
//!
//! The blob is a four-byte magic followed by the bincode encoding of
//! [`ModuleHeader`]. Anything else is a corrupt header.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::core::errors::LoadError;

/// Leading bytes of every module header blob.
pub const HEADER_MAGIC: &[u8; 4] = b"LGMH";

/// Upper bound on a decoded header, so a corrupt length prefix cannot
/// trigger a huge allocation.
const HEADER_SIZE_LIMIT: u64 = 16 * 1024 * 1024;

/// Structured module header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHeader {
    /// Module name, without the surrounding `<>`.
    pub module_name: String,

    /// Package names in declaration order.
    pub package_fragment_names: Vec<String>,
}

impl ModuleHeader {
    pub fn new<I, S>(module_name: impl Into<String>, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ModuleHeader {
            module_name: module_name.into(),
            package_fragment_names: packages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Whether `name` is usable as a package name. The root package is empty;
/// otherwise every dot-separated segment is non-empty and free of path
/// separators.
pub fn is_valid_package_name(name: &str) -> bool {
    name.is_empty()
        || name
            .split('.')
            .all(|segment| !segment.is_empty() && !segment.contains(['/', '\\']))
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_limit(HEADER_SIZE_LIMIT)
}

/// Decode a header blob read from `library`.
pub fn parse_module_header(library: &str, bytes: &[u8]) -> Result<ModuleHeader, LoadError> {
    let corrupt = |message: String| LoadError::CorruptHeader {
        library: library.to_string(),
        message,
    };

    let body = bytes
        .strip_prefix(HEADER_MAGIC.as_slice())
        .ok_or_else(|| corrupt("missing module header magic".to_string()))?;

    let header: ModuleHeader = codec()
        .deserialize(body)
        .map_err(|e| corrupt(e.to_string()))?;

    if header.module_name.is_empty() {
        return Err(corrupt("empty module name".to_string()));
    }
    if let Some(name) = header
        .package_fragment_names
        .iter()
        .find(|name| !is_valid_package_name(name))
    {
        return Err(corrupt(format!("invalid package name `{}`", name)));
    }

    Ok(header)
}

/// Encode a header into its blob form.
pub fn encode_module_header(header: &ModuleHeader) -> Result<Vec<u8>, bincode::Error> {
    let mut bytes = HEADER_MAGIC.to_vec();
    bytes.extend(codec().serialize(header)?);
    Ok(bytes)
}
