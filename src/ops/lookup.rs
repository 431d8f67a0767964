//! Resolving a class id across a set of libraries.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::core::name::ClassId;
use crate::descriptors::factory::ModuleLoadOptions;
use crate::descriptors::graph::{ModuleGraph, Resolution};
use crate::ops::inspect::load_library_dir;

/// Where a class id resolved.
#[derive(Debug, Clone, Serialize)]
pub struct LookupReport {
    pub class_id: String,
    pub resolution: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Id of the descriptor that answered; differs from `class_id` for aliases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub supertypes: Vec<String>,
}

impl LookupReport {
    fn from_resolution(class_id: ClassId, resolution: &Resolution) -> Self {
        let class = resolution.class();
        LookupReport {
            class_id: class_id.to_string(),
            resolution: resolution.label(),
            module: resolution.module().map(|m| m.name().to_string()),
            resolved_id: class.map(|c| c.class_id().to_string()),
            kind: class.map(|c| format!("{:?}", c.kind())),
            supertypes: class
                .map(|c| c.supertypes().iter().map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.resolution != "not-found"
    }
}

/// Load every library in order and resolve `class_id` (`a.b/C`).
pub fn lookup_class(
    class_id: &str,
    libraries: &[PathBuf],
    options: &ModuleLoadOptions,
) -> Result<LookupReport> {
    let class_id = ClassId::parse(class_id);

    let mut graph = ModuleGraph::new();
    for path in libraries {
        let (_, module) = load_library_dir(path, options)?;
        graph.add(module);
    }
    debug!("resolving {} across {} modules", class_id, graph.len());

    let resolution = graph.resolve_classifier(class_id)?;
    Ok(LookupReport::from_resolution(class_id, &resolution))
}

/// Human-readable rendering of a lookup.
pub fn format_lookup(report: &LookupReport) -> String {
    match (&report.module, &report.resolved_id) {
        (Some(module), Some(resolved)) if resolved != &report.class_id => format!(
            "{}: {} in {} as {}",
            report.class_id, report.resolution, module, resolved
        ),
        (Some(module), _) => format!("{}: {} in {}", report.class_id, report.resolution, module),
        _ => format!("{}: {}", report.class_id, report.resolution),
    }
}
