//! A set of loaded modules resolved together.
//!
//! Resolution runs in three passes over all modules: real declarations,
//! then alias fragments, then exported forward declarations. A concrete
//! definition therefore wins over a placeholder no matter which library was
//! loaded first.
//!
//! Two libraries may export the same forward declaration. Nothing decides
//! which is right, so the module loaded last answers.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::core::errors::LoadError;
use crate::core::library::Library;
use crate::core::name::ClassId;
use crate::descriptors::classifier::ClassDescriptor;
use crate::descriptors::factory::{create_module_descriptor, ModuleLoadOptions};
use crate::descriptors::fragment::PackageFragment;
use crate::descriptors::module::ModuleDescriptor;

/// How a class id was resolved.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Declared in a real fragment of `module`.
    Declared {
        module: Arc<ModuleDescriptor>,
        class: Arc<ClassDescriptor>,
    },
    /// Found through one of `module`'s alias fragments.
    Aliased {
        module: Arc<ModuleDescriptor>,
        class: Arc<ClassDescriptor>,
    },
    /// Only known as an exported forward declaration of `module`.
    ForwardDeclared {
        module: Arc<ModuleDescriptor>,
        class: Arc<ClassDescriptor>,
    },
    NotFound,
}

impl Resolution {
    pub fn class(&self) -> Option<&Arc<ClassDescriptor>> {
        match self {
            Resolution::Declared { class, .. }
            | Resolution::Aliased { class, .. }
            | Resolution::ForwardDeclared { class, .. } => Some(class),
            Resolution::NotFound => None,
        }
    }

    pub fn module(&self) -> Option<&Arc<ModuleDescriptor>> {
        match self {
            Resolution::Declared { module, .. }
            | Resolution::Aliased { module, .. }
            | Resolution::ForwardDeclared { module, .. } => Some(module),
            Resolution::NotFound => None,
        }
    }

    /// Short label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Declared { .. } => "declared",
            Resolution::Aliased { .. } => "aliased",
            Resolution::ForwardDeclared { .. } => "forward-declared",
            Resolution::NotFound => "not-found",
        }
    }
}

/// Modules in load order.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Arc<ModuleDescriptor>>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        ModuleGraph::default()
    }

    pub fn add(&mut self, module: Arc<ModuleDescriptor>) {
        self.modules.push(module);
    }

    /// Load `library` and add the resulting module.
    pub fn load(
        &mut self,
        library: Arc<dyn Library>,
        options: &ModuleLoadOptions,
    ) -> Result<Arc<ModuleDescriptor>, LoadError> {
        let module = create_module_descriptor(library, options)?;
        self.add(Arc::clone(&module));
        Ok(module)
    }

    pub fn modules(&self) -> &[Arc<ModuleDescriptor>] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn resolve_classifier(&self, class_id: ClassId) -> Result<Resolution, LoadError> {
        let package = class_id.package();
        let name = class_id.relative_name();

        for module in &self.modules {
            for fragment in module.package_fragments(&package)? {
                if let PackageFragment::Deserialized(fragment) = fragment {
                    if let Some(class) = fragment.contributed_classifier(name)? {
                        trace!(class = %class_id, module = %module.name(), "declared");
                        return Ok(Resolution::Declared {
                            module: Arc::clone(module),
                            class,
                        });
                    }
                }
            }
        }

        for module in &self.modules {
            for fragment in module.package_fragments(&package)? {
                if let PackageFragment::Alias(fragment) = fragment {
                    if let Some(class) = fragment.contributed_classifier(name)? {
                        trace!(class = %class_id, module = %module.name(), "aliased");
                        return Ok(Resolution::Aliased {
                            module: Arc::clone(module),
                            class,
                        });
                    }
                }
            }
        }

        let fq_name = class_id.as_fq_name();
        for module in self.modules.iter().rev() {
            for fragment in module.synthetic_fragments()? {
                let PackageFragment::ExportedForwardDeclarations(fragment) = fragment else {
                    continue;
                };
                let placeholder = fragment.placeholder_for(&fq_name).or_else(|| {
                    (fragment.fq_name() == package)
                        .then(|| fragment.contributed_classifier(name))
                        .flatten()
                });
                if let Some(class) = placeholder {
                    trace!(class = %class_id, module = %module.name(), "forward declared");
                    return Ok(Resolution::ForwardDeclared {
                        module: Arc::clone(module),
                        class,
                    });
                }
            }
        }

        debug!(class = %class_id, modules = self.modules.len(), "class not found in module graph");
        Ok(Resolution::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::library::MemoryLibrary;
    use crate::core::manifest::LibraryManifest;
    use crate::core::payload::{ClassKindProto, ClassProto, PackagePayload};
    use crate::test_support::fixtures::interop_library;

    fn window_library() -> MemoryLibrary {
        let manifest = LibraryManifest::new()
            .with_unique_name("video")
            .with_package("video")
            .with_interop(true);
        MemoryLibrary::builder("video")
            .manifest(manifest)
            .package(
                PackagePayload::new("video")
                    .with_class(ClassProto::new("SDL_Window", ClassKindProto::Class)),
            )
            .build()
            .unwrap()
    }

    fn graph_of(libraries: Vec<MemoryLibrary>) -> ModuleGraph {
        let mut graph = ModuleGraph::new();
        for library in libraries {
            graph
                .load(Arc::new(library), &ModuleLoadOptions::default())
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_forward_declaration_before_definition() {
        let id = ClassId::parse("cnames.structs/SDL_Window");
        let consumer = || interop_library("app", "app", &["app"], &["cnames.structs.SDL_Window"]);

        let alone = graph_of(vec![consumer()]);
        let resolution = alone.resolve_classifier(id).unwrap();
        assert!(matches!(resolution, Resolution::ForwardDeclared { .. }));
        assert!(resolution.class().unwrap().is_forward_declaration());

        for libraries in [vec![consumer(), window_library()], vec![window_library(), consumer()]] {
            let graph = graph_of(libraries);
            let resolution = graph.resolve_classifier(id).unwrap();
            assert_eq!(resolution.label(), "aliased");
            assert_eq!(resolution.module().unwrap().name().as_str(), "<video>");
            assert_eq!(
                resolution.class().unwrap().class_id(),
                ClassId::parse("video/SDL_Window")
            );
        }
    }

    #[test]
    fn test_real_declaration_wins() {
        let graph = graph_of(vec![
            interop_library("app", "app", &["app"], &["cnames.structs.SDL_Window"]),
            window_library(),
        ]);
        let resolution = graph
            .resolve_classifier(ClassId::parse("video/SDL_Window"))
            .unwrap();
        assert_eq!(resolution.label(), "declared");
    }

    #[test]
    fn test_unknown_class_is_not_found() {
        let graph = graph_of(vec![window_library()]);
        let resolution = graph
            .resolve_classifier(ClassId::parse("cnames.structs/SDL_Surface"))
            .unwrap();
        assert!(matches!(resolution, Resolution::NotFound));
        assert!(resolution.class().is_none());
    }

    // Conflicting exports have no defined winner; this pins the current
    // last-loaded-wins behavior.
    #[test]
    fn test_conflicting_forward_declarations_last_loaded_wins() {
        let id = ClassId::parse("objcnames.classes/NSWindow");
        let graph = graph_of(vec![
            interop_library("first", "first", &["first"], &["objcnames.classes.NSWindow"]),
            interop_library("second", "second", &["second"], &["objcnames.classes.NSWindow"]),
        ]);

        let resolution = graph.resolve_classifier(id).unwrap();
        assert_eq!(resolution.label(), "forward-declared");
        assert_eq!(resolution.module().unwrap().name().as_str(), "<second>");
    }
}
