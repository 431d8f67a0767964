//! CLI integration tests for libgraph.
//!
//! Library directories are written through the public API and the binary
//! is run against them.

use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

use libgraph::core::header::ModuleHeader;
use libgraph::core::payload::{ClassKindProto, ClassProto, PackagePayload};
use libgraph::{DirectoryLibrary, LibraryManifest};

/// Get the libgraph binary command.
fn libgraph() -> Command {
    Command::cargo_bin("libgraph").unwrap()
}

fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

/// Write an interop library `<repo>/<name>` with one struct per package.
fn interop_library(repo: &Path, name: &str, packages: &[&str], exported: &[&str]) -> PathBuf {
    let dir = repo.join(name);
    let manifest = LibraryManifest::new()
        .with_unique_name(name)
        .with_package(name)
        .with_interop(true)
        .with_export_forward_declarations(exported.iter().copied());
    let header = ModuleHeader::new(name, packages.iter().copied());
    let payloads: Vec<_> = packages
        .iter()
        .map(|p| {
            PackagePayload::new(*p).with_class(ClassProto::new("SDL_Rect", ClassKindProto::Class))
        })
        .collect();
    DirectoryLibrary::create(&dir, &manifest, &header, &payloads).unwrap();
    dir
}

// ============================================================================
// libgraph inspect
// ============================================================================

#[test]
fn test_inspect_prints_fragments() {
    let tmp = temp_dir();
    let sdl = interop_library(tmp.path(), "sdl", &["sdl"], &[]);

    libgraph()
        .arg("inspect")
        .arg(&sdl)
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("module <sdl>"))
        .stdout(predicate::str::contains("sdl [deserialized]"))
        .stdout(predicate::str::contains("cnames.structs [alias]"));
}

#[test]
fn test_inspect_json() {
    let tmp = temp_dir();
    let sdl = interop_library(tmp.path(), "sdl", &["sdl"], &[]);

    let output = libgraph()
        .args(["inspect", "--json", "--classifiers"])
        .arg(&sdl)
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports[0]["module"], "<sdl>");
    assert_eq!(reports[0]["interop"], true);
    assert_eq!(reports[0]["fragments"][0]["classifiers"][0], "SDL_Rect");
}

#[test]
fn test_inspect_missing_library_fails() {
    let tmp = temp_dir();

    libgraph()
        .args(["inspect", "nope"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open library"));
}

// ============================================================================
// libgraph lookup
// ============================================================================

#[test]
fn test_lookup_resolves_alias() {
    let tmp = temp_dir();
    let app = interop_library(tmp.path(), "app", &["app"], &["cnames.structs.SDL_Rect"]);

    libgraph()
        .args(["lookup", "cnames.structs/SDL_Rect", "-l"])
        .arg(&app)
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "cnames.structs/SDL_Rect: aliased in <app> as app/SDL_Rect",
        ));
}

#[test]
fn test_lookup_not_found() {
    let tmp = temp_dir();
    let app = interop_library(tmp.path(), "app", &["app"], &[]);

    libgraph()
        .args(["lookup", "app/SDL_Surface", "--json", "-l"])
        .arg(&app)
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"not-found\""));
}

// ============================================================================
// libgraph interop
// ============================================================================

#[test]
fn test_interop_unknown_target() {
    let tmp = temp_dir();

    libgraph()
        .args(["interop", "--tool", "/nonexistent", "--", "-target", "amiga"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown target `amiga`"));
}

#[test]
fn test_interop_missing_library() {
    let tmp = temp_dir();

    libgraph()
        .args(["interop", "--tool", "/nonexistent", "--", "-library", "curl"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("library `curl` not found"));
}

#[cfg(unix)]
#[test]
fn test_interop_print_only() {
    let tmp = temp_dir();

    libgraph()
        .args([
            "interop",
            "--print-only",
            "--tool",
            "true",
            "--",
            "-o",
            "out",
            "-target",
            "linux",
            "-nodefaultlibs",
        ])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("-produce library -o out -target linux_x64"))
        .stdout(predicate::str::contains("-nativelibrary"))
        .stdout(predicate::str::ends_with("-nodefaultlibs\n"));
}

#[cfg(unix)]
#[test]
fn test_interop_without_compiler_fails() {
    let tmp = temp_dir();

    libgraph()
        .args(["interop", "--tool", "true", "--", "-o", "out"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no library-production program configured"));
}

// ============================================================================
// libgraph completions
// ============================================================================

#[test]
fn test_completions_bash() {
    libgraph()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("libgraph"));
}
