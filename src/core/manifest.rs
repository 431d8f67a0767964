//! Library manifest - key/value metadata stored beside the symbol payload.
//!
//! The manifest uses the properties format: one `key=value` per line,
//! `#`/`!` comments, a trailing backslash continues a line. List-valued
//! keys (`exportForwardDeclarations`, `includedHeaders`, `depends`,
//! `native_targets`) are whitespace separated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::name::FqName;

pub const KEY_UNIQUE_NAME: &str = "unique_name";
pub const KEY_PACKAGE: &str = "package";
pub const KEY_INTEROP: &str = "interop";
pub const KEY_EXPORT_FORWARD_DECLARATIONS: &str = "exportForwardDeclarations";
pub const KEY_INCLUDED_HEADERS: &str = "includedHeaders";
pub const KEY_DEPENDS: &str = "depends";
pub const KEY_ABI_VERSION: &str = "abi_version";
pub const KEY_NATIVE_TARGETS: &str = "native_targets";

/// Error reading a manifest from disk.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write manifest `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parsed library manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryManifest {
    properties: BTreeMap<String, String>,
}

impl LibraryManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        LibraryManifest::default()
    }

    /// Parse properties text. Malformed lines degrade to keys with empty
    /// values, which is how the format has always been read.
    pub fn parse(text: &str) -> Self {
        let mut properties = BTreeMap::new();
        let mut pending = String::new();

        for raw in text.lines() {
            let line = raw.trim_start();
            if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
            {
                continue;
            }

            if let Some(stripped) = line.strip_suffix('\\') {
                pending.push_str(stripped);
                continue;
            }

            pending.push_str(line);
            let logical = std::mem::take(&mut pending);
            let (key, value) = split_property(&logical);
            if !key.is_empty() {
                properties.insert(key.to_string(), value.to_string());
            }
        }

        if !pending.is_empty() {
            let (key, value) = split_property(&pending);
            if !key.is_empty() {
                properties.insert(key.to_string(), value.to_string());
            }
        }

        LibraryManifest { properties }
    }

    /// Load a manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Write the manifest in properties form.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        std::fs::write(path, self.to_properties_string()).map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render in properties form, keys sorted.
    pub fn to_properties_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.properties {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Raw property lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Set a raw property.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// All raw properties.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn unique_name(&self) -> Option<&str> {
        self.get(KEY_UNIQUE_NAME).filter(|s| !s.is_empty())
    }

    /// The interop package, if declared.
    pub fn package_fq_name(&self) -> Option<FqName> {
        self.get(KEY_PACKAGE)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(FqName::new)
    }

    pub fn is_interop(&self) -> bool {
        self.get(KEY_INTEROP)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Qualified names of forward declarations this library exports.
    pub fn export_forward_declarations(&self) -> Vec<FqName> {
        self.list(KEY_EXPORT_FORWARD_DECLARATIONS)
            .into_iter()
            .map(FqName::new)
            .collect()
    }

    /// Native header identifiers, in declaration order.
    pub fn included_headers(&self) -> Vec<String> {
        self.list(KEY_INCLUDED_HEADERS)
    }

    /// Unique names of libraries this one depends on.
    pub fn depends(&self) -> Vec<String> {
        self.list(KEY_DEPENDS)
    }

    pub fn native_targets(&self) -> Vec<String> {
        self.list(KEY_NATIVE_TARGETS)
    }

    pub fn abi_version(&self) -> Option<u32> {
        let raw = self.get(KEY_ABI_VERSION)?.trim();
        match raw.parse() {
            Ok(version) => Some(version),
            Err(_) => {
                tracing::warn!("ignoring malformed {} `{}`", KEY_ABI_VERSION, raw);
                None
            }
        }
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn with_unique_name(mut self, name: impl Into<String>) -> Self {
        self.set(KEY_UNIQUE_NAME, name);
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.set(KEY_PACKAGE, package);
        self
    }

    pub fn with_interop(mut self, interop: bool) -> Self {
        self.set(KEY_INTEROP, interop.to_string());
        self
    }

    pub fn with_export_forward_declarations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set(KEY_EXPORT_FORWARD_DECLARATIONS, join(names));
        self
    }

    pub fn with_included_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set(KEY_INCLUDED_HEADERS, join(headers));
        self
    }

    pub fn with_depends<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set(KEY_DEPENDS, join(libraries));
        self
    }
}

fn join<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn split_property(line: &str) -> (&str, &str) {
    match line.find(['=', ':']) {
        Some(idx) => (line[..idx].trim(), line[idx + 1..].trim()),
        None => (line.trim(), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_interop_manifest() {
        let manifest = LibraryManifest::parse(
            "# generated\n\
             unique_name=sdl\n\
             package=sdl\n\
             interop=true\n\
             exportForwardDeclarations=cnames.structs.SDL_Window \\\n    cnames.structs.SDL_Renderer\n\
             includedHeaders=SDL.h SDL_video.h\n",
        );

        assert_eq!(manifest.unique_name(), Some("sdl"));
        assert_eq!(manifest.package_fq_name(), Some(FqName::new("sdl")));
        assert!(manifest.is_interop());
        assert_eq!(
            manifest.export_forward_declarations(),
            vec![
                FqName::new("cnames.structs.SDL_Window"),
                FqName::new("cnames.structs.SDL_Renderer")
            ]
        );
        assert_eq!(manifest.included_headers(), vec!["SDL.h", "SDL_video.h"]);
    }

    #[test]
    fn test_missing_and_blank_values() {
        let manifest = LibraryManifest::parse("interop = TRUE\npackage =\n");
        assert!(manifest.is_interop());
        assert_eq!(manifest.package_fq_name(), None);
        assert!(manifest.depends().is_empty());
        assert_eq!(manifest.abi_version(), None);
    }

    #[test]
    fn test_colon_separator_and_bad_abi() {
        let manifest = LibraryManifest::parse("abi_version: nope\ndepends: a b\n");
        assert_eq!(manifest.abi_version(), None);
        assert_eq!(manifest.depends(), vec!["a", "b"]);
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("manifest");

        let manifest = LibraryManifest::new()
            .with_unique_name("posix")
            .with_package("platform.posix")
            .with_interop(true)
            .with_included_headers(["stdio.h", "time.h"]);
        manifest.save(&path).unwrap();

        let loaded = LibraryManifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
    }
}
