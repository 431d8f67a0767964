//! Test fixtures for common test scenarios.
//!
//! Libraries are built either in memory, for loader tests, or as
//! directories, for resolver and CLI tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::core::header::ModuleHeader;
use crate::core::library::{DirectoryLibrary, MemoryLibrary, MANIFEST_FILE};
use crate::core::manifest::LibraryManifest;
use crate::core::name::FqName;
use crate::core::payload::{
    AnnotationProto, BincodeSymbolDecoder, ClassKindProto, ClassProto, ConstantProto,
    DecodeError, PackagePayload, SymbolDecoder,
};
use crate::descriptors::components::PackageAccessedHandler;

/// Payload with two structs and one function.
pub fn sample_payload(fq_name: &str) -> PackagePayload {
    PackagePayload::new(fq_name)
        .with_class(ClassProto::new("SDL_Rect", ClassKindProto::Class))
        .with_class(ClassProto::new("SDL_Point", ClassKindProto::Class))
        .with_function("SDL_Init")
}

/// A non-interop library with one sample payload per entry of `packages`.
/// A repeated name becomes another part of that package.
pub fn plain_library(name: &str, packages: &[&str]) -> MemoryLibrary {
    let mut builder = MemoryLibrary::builder(name)
        .manifest(LibraryManifest::new().with_unique_name(name));
    for package in packages {
        builder = builder.package(sample_payload(package));
    }
    builder.build().unwrap()
}

/// An interop library whose module is named `name`.
pub fn interop_library(
    name: &str,
    package: &str,
    packages: &[&str],
    exported: &[&str],
) -> MemoryLibrary {
    let manifest = LibraryManifest::new()
        .with_unique_name(name)
        .with_package(package)
        .with_interop(true)
        .with_export_forward_declarations(exported.iter().copied());
    let mut builder = MemoryLibrary::builder(name).manifest(manifest);
    for fq_name in packages {
        builder = builder.package(sample_payload(fq_name));
    }
    builder.build().unwrap()
}

/// Annotation usage with a single string argument.
pub fn annotation(class_id: &str, argument: &str, value: &str) -> AnnotationProto {
    AnnotationProto {
        class_id: class_id.to_string(),
        arguments: vec![(argument.to_string(), ConstantProto::String(value.to_string()))],
    }
}

/// Write a manifest-only library directory `<repo>/<name>`.
pub fn write_library_dir(repo: &Path, name: &str, manifest: LibraryManifest) -> PathBuf {
    let dir = repo.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    manifest.save(&dir.join(MANIFEST_FILE)).unwrap();
    dir
}

/// Write a complete interop library directory `<repo>/<name>` with sample
/// payloads.
pub fn write_interop_library(
    repo: &Path,
    name: &str,
    package: &str,
    packages: &[&str],
    exported: &[&str],
) -> PathBuf {
    let dir = repo.join(name);
    let manifest = LibraryManifest::new()
        .with_unique_name(name)
        .with_package(package)
        .with_interop(true)
        .with_export_forward_declarations(exported.iter().copied());
    let header = ModuleHeader::new(name, packages.iter().copied());
    let payloads: Vec<_> = packages.iter().map(|p| sample_payload(p)).collect();
    DirectoryLibrary::create(&dir, &manifest, &header, &payloads).unwrap();
    dir
}

/// Decoder that counts calls and can be slowed down to widen race windows.
#[derive(Debug, Default)]
pub struct CountingDecoder {
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl CountingDecoder {
    pub fn with_delay_ms(ms: u64) -> Self {
        CountingDecoder {
            calls: AtomicUsize::new(0),
            delay: Some(Duration::from_millis(ms)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SymbolDecoder for CountingDecoder {
    fn decode_package(&self, fq_name: &FqName, bytes: &[u8]) -> Result<PackagePayload, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        BincodeSymbolDecoder.decode_package(fq_name, bytes)
    }
}

/// Handler that records every package it is told about.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    accessed: Mutex<Vec<FqName>>,
}

impl RecordingHandler {
    pub fn accessed(&self) -> Vec<FqName> {
        self.accessed.lock().unwrap().clone()
    }
}

impl PackageAccessedHandler for RecordingHandler {
    fn mark_package_accessed(&self, fq_name: &FqName) {
        self.accessed.lock().unwrap().push(*fq_name);
    }
}
