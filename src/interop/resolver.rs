//! Resolving library names to library directories.
//!
//! A name is tried as a path, then inside each repository in order, then in
//! the default-libraries directory. Dependencies listed in a manifest's
//! `depends` entry are followed transitively. The result is ordered with
//! dependencies before their dependents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, trace};

use crate::core::library::{is_library_dir, MANIFEST_FILE};
use crate::core::manifest::LibraryManifest;
use crate::core::name::FqName;
use crate::interop::errors::InteropError;
use crate::interop::platform::NativeTarget;
use crate::util::fs::find_library_dirs;

/// ABI version of libraries this resolver accepts.
pub const CURRENT_ABI_VERSION: u32 = 1;

/// Name of the standard library, which interop never links against.
pub const STDLIB: &str = "stdlib";

/// A library found on disk.
#[derive(Debug, Clone)]
pub struct ResolvedLibrary {
    pub name: String,
    pub path: PathBuf,
    pub manifest: LibraryManifest,
    /// Came from the default-libraries directory rather than a request.
    pub is_default: bool,
}

impl ResolvedLibrary {
    pub fn package(&self) -> Option<FqName> {
        self.manifest.package_fq_name()
    }

    pub fn included_headers(&self) -> Vec<String> {
        self.manifest.included_headers()
    }
}

/// Finds libraries in repositories.
#[derive(Debug, Clone)]
pub struct LibraryResolver {
    repos: Vec<PathBuf>,
    target: NativeTarget,
    default_libs_dir: Option<PathBuf>,
    abi_version: u32,
}

impl LibraryResolver {
    pub fn new(repos: Vec<PathBuf>, target: NativeTarget) -> Self {
        LibraryResolver {
            repos,
            target,
            default_libs_dir: None,
            abi_version: CURRENT_ABI_VERSION,
        }
    }

    pub fn with_default_libs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_libs_dir = Some(dir.into());
        self
    }

    pub fn with_abi_version(mut self, version: u32) -> Self {
        self.abi_version = version;
        self
    }

    /// Candidate locations for `name`, in search order.
    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(name)];
        candidates.extend(self.repos.iter().map(|r| r.join(name)));
        if let Some(dir) = &self.default_libs_dir {
            candidates.push(dir.join(name));
        }
        candidates
    }

    fn locate(&self, name: &str) -> Result<PathBuf, InteropError> {
        let candidates = self.candidates(name);
        for candidate in &candidates {
            trace!("looking for library `{}` at {}", name, candidate.display());
            if is_library_dir(candidate) {
                return Ok(candidate.clone());
            }
        }
        Err(InteropError::UnresolvedLibrary {
            name: name.to_string(),
            searched: candidates,
        })
    }

    fn open(&self, requested: &str, path: &Path, is_default: bool) -> Result<ResolvedLibrary, InteropError> {
        let manifest = LibraryManifest::load(&path.join(MANIFEST_FILE)).map_err(|e| {
            InteropError::IncompatibleLibrary {
                name: requested.to_string(),
                reason: e.to_string(),
            }
        })?;

        if let Some(abi) = manifest.abi_version() {
            if abi != self.abi_version {
                return Err(InteropError::IncompatibleLibrary {
                    name: requested.to_string(),
                    reason: format!("ABI version {} (expected {})", abi, self.abi_version),
                });
            }
        }

        let targets = manifest.native_targets();
        if !targets.is_empty() && !targets.iter().any(|t| t == self.target.visible_name()) {
            return Err(InteropError::IncompatibleLibrary {
                name: requested.to_string(),
                reason: format!(
                    "built for {} but the target is {}",
                    targets.join(", "),
                    self.target
                ),
            });
        }

        let name = manifest
            .unique_name()
            .map(str::to_string)
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| requested.to_string());

        Ok(ResolvedLibrary {
            name,
            path: path.to_path_buf(),
            manifest,
            is_default,
        })
    }

    fn default_libraries(&self) -> Vec<PathBuf> {
        self.default_libs_dir
            .as_deref()
            .map(|dir| find_library_dirs(dir, 1))
            .unwrap_or_default()
    }

    /// Resolve `names` and everything they depend on.
    ///
    /// With `no_std_lib` the standard library is left out wherever it
    /// appears. Default libraries are added unless `no_default_libs`.
    pub fn resolve_with_dependencies(
        &self,
        names: &[String],
        no_std_lib: bool,
        no_default_libs: bool,
    ) -> Result<Vec<ResolvedLibrary>, InteropError> {
        // Edge a -> b means a depends on b.
        let mut graph: DiGraph<ResolvedLibrary, ()> = DiGraph::new();
        let mut by_name: HashMap<String, NodeIndex> = HashMap::new();

        let mut pending: Vec<(String, Option<PathBuf>, Option<NodeIndex>, bool)> = names
            .iter()
            .map(|n| (n.clone(), None, None, false))
            .collect();
        if !no_default_libs {
            for path in self.default_libraries() {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                pending.push((name, Some(path), None, true));
            }
        }
        pending.reverse();

        while let Some((requested, path, dependent, is_default)) = pending.pop() {
            if no_std_lib && requested == STDLIB {
                continue;
            }

            let path = match path {
                Some(path) => path,
                None => self.locate(&requested)?,
            };
            let library = self.open(&requested, &path, is_default)?;
            if no_std_lib && library.name == STDLIB {
                continue;
            }

            let node = match by_name.get(&library.name) {
                Some(&node) => node,
                None => {
                    debug!(
                        "resolved library `{}` at {}",
                        library.name,
                        library.path.display()
                    );
                    let depends = library.manifest.depends();
                    let name = library.name.clone();
                    let node = graph.add_node(library);
                    by_name.insert(name, node);
                    for dependency in depends.into_iter().rev() {
                        pending.push((dependency, None, Some(node), false));
                    }
                    node
                }
            };

            if let Some(dependent) = dependent {
                if !graph.contains_edge(dependent, node) {
                    graph.add_edge(dependent, node, ());
                }
            }
        }

        let mut order = toposort(&graph, None).map_err(|cycle| InteropError::DependencyCycle {
            library: graph[cycle.node_id()].name.clone(),
        })?;
        // toposort puts dependents first.
        order.reverse();

        Ok(order.into_iter().map(|node| graph[node].clone()).collect())
    }
}
