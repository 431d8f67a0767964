//! Loading library directories and summarizing the resulting modules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::core::library::{DirectoryLibrary, Library};
use crate::descriptors::components::StorageStats;
use crate::descriptors::factory::{create_module_descriptor, ModuleLoadOptions};
use crate::descriptors::fragment::PackageFragment;
use crate::descriptors::module::ModuleDescriptor;

/// Options for `inspect`.
#[derive(Debug, Clone, Default)]
pub struct InspectOptions {
    pub load: ModuleLoadOptions,
    /// List classifier names, which decodes every payload.
    pub classifiers: bool,
}

/// One fragment of an inspected module.
#[derive(Debug, Clone, Serialize)]
pub struct FragmentSummary {
    pub package: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classifiers: Vec<String>,
}

/// Summary of one loaded module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub module: String,
    pub library: String,
    pub path: PathBuf,
    pub interop: bool,
    pub package: Option<String>,
    pub fragments: Vec<FragmentSummary>,
    pub stats: StorageStats,
}

impl ModuleReport {
    pub fn synthetic_count(&self) -> usize {
        self.fragments
            .iter()
            .filter(|f| f.kind != "deserialized")
            .count()
    }
}

/// Open the library directory at `path` and load it into a module.
pub fn load_library_dir(
    path: &Path,
    options: &ModuleLoadOptions,
) -> Result<(Arc<dyn Library>, Arc<ModuleDescriptor>)> {
    let library: Arc<dyn Library> = Arc::new(
        DirectoryLibrary::open(path)
            .with_context(|| format!("failed to open library at {}", path.display()))?,
    );
    let module = create_module_descriptor(Arc::clone(&library), options)?;
    Ok((library, module))
}

fn summarize(fragment: &PackageFragment, classifiers: bool) -> Result<FragmentSummary> {
    let names = if classifiers {
        let mut names: Vec<String> = fragment
            .classifier_names()?
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        names.sort();
        names
    } else {
        Vec::new()
    };

    Ok(FragmentSummary {
        package: fragment.fq_name().to_string(),
        kind: fragment.kind_label(),
        part: fragment.as_deserialized().map(|f| f.part()),
        classifiers: names,
    })
}

/// Load one library and describe it.
pub fn inspect_library(path: &Path, options: &InspectOptions) -> Result<ModuleReport> {
    let (library, module) = load_library_dir(path, &options.load)?;

    let fragments = module
        .fragments()?
        .iter()
        .map(|f| summarize(f, options.classifiers))
        .collect::<Result<Vec<_>>>()?;

    let manifest = library.manifest();
    Ok(ModuleReport {
        module: module.name().to_string(),
        library: library.library_name().to_string(),
        path: path.to_path_buf(),
        interop: manifest.is_interop(),
        package: manifest.package_fq_name().map(|p| p.to_string()),
        fragments,
        stats: module.components()?.storage().stats(),
    })
}

/// Inspect several libraries in parallel. Reports keep the input order.
pub fn inspect_libraries(paths: &[PathBuf], options: &InspectOptions) -> Result<Vec<ModuleReport>> {
    paths
        .par_iter()
        .map(|path| inspect_library(path, options))
        .collect()
}

/// Human-readable rendering of a report.
pub fn format_report(report: &ModuleReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("module {} ({})\n", report.module, report.path.display()));
    if report.interop {
        let package = report.package.as_deref().unwrap_or("?");
        out.push_str(&format!("  interop package: {}\n", package));
    }
    out.push_str(&format!(
        "  fragments: {} deserialized, {} synthetic\n",
        report.fragments.len() - report.synthetic_count(),
        report.synthetic_count()
    ));

    for fragment in &report.fragments {
        let package = if fragment.package.is_empty() {
            "<root>"
        } else {
            fragment.package.as_str()
        };
        match fragment.part {
            Some(part) if part > 0 => {
                out.push_str(&format!("    {} [{} #{}]\n", package, fragment.kind, part))
            }
            _ => out.push_str(&format!("    {} [{}]\n", package, fragment.kind)),
        }
        for name in &fragment.classifiers {
            out.push_str(&format!("      {}\n", name));
        }
    }

    out
}
