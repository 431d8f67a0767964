//! Library artifacts - the read-only inputs of a module load.
//!
//! A [`Library`] exposes a manifest, a header blob and one payload blob per
//! package fragment. A package may be split into several fragments; the
//! header then lists its name once per part, and parts are numbered in
//! header order starting at zero. Two implementations ship: [`DirectoryLibrary`] for the on-disk
//! layout and [`MemoryLibrary`] for artifacts assembled in memory.
//!
//! On-disk layout:
//!
//! ```text
//! <lib>/manifest
//! <lib>/linkdata/module
//! <lib>/linkdata/package_<fqname>/<part>
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::header::{encode_module_header, is_valid_package_name, ModuleHeader};
use crate::core::manifest::{LibraryManifest, ManifestError};
use crate::core::name::FqName;
use crate::core::payload::{encode_package_payload, PackagePayload};
use crate::util::fs::ensure_dir;

/// Name of the manifest file inside a library directory.
pub const MANIFEST_FILE: &str = "manifest";

/// Directory holding header and payload blobs.
pub const LINKDATA_DIR: &str = "linkdata";

/// Header blob file name inside [`LINKDATA_DIR`].
pub const MODULE_HEADER_FILE: &str = "module";

/// An immutable compiled library.
pub trait Library: Send + Sync + fmt::Debug {
    /// Name used in diagnostics.
    fn library_name(&self) -> &str;

    fn manifest(&self) -> &LibraryManifest;

    /// Raw header blob.
    fn module_header_data(&self) -> io::Result<Vec<u8>>;

    /// Raw payload blob of one fragment of a package.
    fn package_metadata(&self, fq_name: &FqName, part: usize) -> io::Result<Vec<u8>>;
}

/// Directory name of a package's payload parts. The root package maps to a
/// bare `package_`.
pub fn package_dir_name(fq_name: &FqName) -> String {
    format!("package_{}", fq_name)
}

/// Number each payload by its occurrence among payloads of the same package.
fn number_parts(payloads: &[PackagePayload]) -> Vec<(FqName, usize, &PackagePayload)> {
    let mut seen: HashMap<FqName, usize> = HashMap::new();
    payloads
        .iter()
        .map(|payload| {
            let fq_name = FqName::new(&payload.fq_name);
            let part = seen.entry(fq_name).or_insert(0);
            let numbered = (fq_name, *part, payload);
            *part += 1;
            numbered
        })
        .collect()
}

/// Whether `dir` looks like a library directory.
pub fn is_library_dir(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}

/// A library stored as a directory.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
    name: String,
    manifest: LibraryManifest,
}

impl DirectoryLibrary {
    /// Open a library directory. Only the manifest is read here.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let root = root.as_ref().to_path_buf();
        let manifest = LibraryManifest::load(&root.join(MANIFEST_FILE))?;

        let name = manifest
            .unique_name()
            .map(str::to_string)
            .or_else(|| {
                root.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| root.display().to_string());

        Ok(DirectoryLibrary {
            root,
            name,
            manifest,
        })
    }

    /// Write a library directory and open it.
    pub fn create(
        root: impl AsRef<Path>,
        manifest: &LibraryManifest,
        header: &ModuleHeader,
        payloads: &[PackagePayload],
    ) -> Result<Self> {
        let root = root.as_ref();
        let linkdata = root.join(LINKDATA_DIR);
        ensure_dir(&linkdata)?;

        manifest
            .save(&root.join(MANIFEST_FILE))
            .context("failed to write library manifest")?;

        let header_bytes = encode_module_header(header).context("failed to encode module header")?;
        std::fs::write(linkdata.join(MODULE_HEADER_FILE), header_bytes)
            .with_context(|| format!("failed to write module header in {}", root.display()))?;

        for (fq_name, part, payload) in number_parts(payloads) {
            let bytes = encode_package_payload(payload)
                .with_context(|| format!("failed to encode package `{}`", fq_name))?;
            let dir = linkdata.join(package_dir_name(&fq_name));
            ensure_dir(&dir)?;
            std::fs::write(dir.join(part.to_string()), bytes)
                .with_context(|| format!("failed to write package `{}`", fq_name))?;
        }

        Self::open(root).map_err(Into::into)
    }

    /// The library directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Library for DirectoryLibrary {
    fn library_name(&self) -> &str {
        &self.name
    }

    fn manifest(&self) -> &LibraryManifest {
        &self.manifest
    }

    fn module_header_data(&self) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(LINKDATA_DIR).join(MODULE_HEADER_FILE))
    }

    fn package_metadata(&self, fq_name: &FqName, part: usize) -> io::Result<Vec<u8>> {
        if !is_valid_package_name(fq_name.as_str()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid package name `{}`", fq_name),
            ));
        }
        std::fs::read(
            self.root
                .join(LINKDATA_DIR)
                .join(package_dir_name(fq_name))
                .join(part.to_string()),
        )
    }
}

/// A library held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryLibrary {
    name: String,
    manifest: LibraryManifest,
    header: Vec<u8>,
    packages: HashMap<(FqName, usize), Vec<u8>>,
}

impl MemoryLibrary {
    /// Assemble a library from already-encoded parts.
    pub fn from_parts(
        name: impl Into<String>,
        manifest: LibraryManifest,
        header: Vec<u8>,
        packages: HashMap<(FqName, usize), Vec<u8>>,
    ) -> Self {
        MemoryLibrary {
            name: name.into(),
            manifest,
            header,
            packages,
        }
    }

    /// Start building a library whose module is named `name`.
    pub fn builder(name: impl Into<String>) -> MemoryLibraryBuilder {
        MemoryLibraryBuilder::new(name)
    }
}

impl Library for MemoryLibrary {
    fn library_name(&self) -> &str {
        &self.name
    }

    fn manifest(&self) -> &LibraryManifest {
        &self.manifest
    }

    fn module_header_data(&self) -> io::Result<Vec<u8>> {
        Ok(self.header.clone())
    }

    fn package_metadata(&self, fq_name: &FqName, part: usize) -> io::Result<Vec<u8>> {
        self.packages.get(&(*fq_name, part)).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no payload for package `{}` part {}", fq_name, part),
            )
        })
    }
}

/// Builder for [`MemoryLibrary`].
///
/// Packages are declared in the header in the order they are added.
#[derive(Debug, Clone)]
pub struct MemoryLibraryBuilder {
    name: String,
    module_name: Option<String>,
    manifest: LibraryManifest,
    payloads: Vec<PackagePayload>,
    extra_packages: Vec<String>,
}

impl MemoryLibraryBuilder {
    fn new(name: impl Into<String>) -> Self {
        MemoryLibraryBuilder {
            name: name.into(),
            module_name: None,
            manifest: LibraryManifest::new(),
            payloads: Vec::new(),
            extra_packages: Vec::new(),
        }
    }

    /// Module name written to the header; defaults to the library name.
    pub fn module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    pub fn manifest(mut self, manifest: LibraryManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Declare a package and store its payload.
    pub fn package(mut self, payload: PackagePayload) -> Self {
        self.payloads.push(payload);
        self
    }

    /// Declare a package in the header without storing a payload.
    pub fn declared_package(mut self, fq_name: impl Into<String>) -> Self {
        self.extra_packages.push(fq_name.into());
        self
    }

    pub fn build(self) -> Result<MemoryLibrary, bincode::Error> {
        let module_name = self.module_name.unwrap_or_else(|| self.name.clone());
        let names = self
            .payloads
            .iter()
            .map(|p| p.fq_name.clone())
            .chain(self.extra_packages.iter().cloned());
        let header = encode_module_header(&ModuleHeader::new(module_name, names))?;

        let mut packages = HashMap::new();
        for (fq_name, part, payload) in number_parts(&self.payloads) {
            packages.insert((fq_name, part), encode_package_payload(payload)?);
        }

        Ok(MemoryLibrary::from_parts(self.name, self.manifest, header, packages))
    }
}
