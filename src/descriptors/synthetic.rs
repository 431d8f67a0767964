//! Synthetic fragments for interop libraries.
//!
//! Native headers often forward-declare a struct, Objective-C class or
//! protocol without defining it. Such names live in three reserved
//! namespaces. An interop library gets one alias fragment per namespace that
//! forwards lookups to its own package, and one fragment that hands out
//! placeholders for every name listed in `exportForwardDeclarations`.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::core::errors::LoadError;
use crate::core::library::Library;
use crate::core::name::{ClassId, FqName, Name};
use crate::descriptors::classifier::{ClassDescriptor, ClassKind, ForwardDeclarationNamespace};
use crate::descriptors::fragment::{DeserializedPackageFragment, PackageFragment};
use crate::descriptors::module::ModuleDescriptor;

/// Redirects lookups in one reserved namespace to the interop package.
#[derive(Debug)]
pub struct ClassifierAliasingFragment {
    namespace: ForwardDeclarationNamespace,
    fq_name: FqName,
    targets: Vec<Arc<DeserializedPackageFragment>>,
    module: Weak<ModuleDescriptor>,
}

impl ClassifierAliasingFragment {
    pub fn new(
        namespace: ForwardDeclarationNamespace,
        targets: Vec<Arc<DeserializedPackageFragment>>,
        module: Weak<ModuleDescriptor>,
    ) -> Self {
        ClassifierAliasingFragment {
            namespace,
            fq_name: namespace.fq_name(),
            targets,
            module,
        }
    }

    pub fn fq_name(&self) -> FqName {
        self.fq_name
    }

    pub fn namespace(&self) -> ForwardDeclarationNamespace {
        self.namespace
    }

    pub fn targets(&self) -> &[Arc<DeserializedPackageFragment>] {
        &self.targets
    }

    pub fn module(&self) -> Option<Arc<ModuleDescriptor>> {
        self.module.upgrade()
    }

    /// The real classifier named `name` from the first target declaring it.
    ///
    /// A miss is `None`; the name may belong to a module not loaded yet.
    pub fn contributed_classifier(
        &self,
        name: Name,
    ) -> Result<Option<Arc<ClassDescriptor>>, LoadError> {
        for target in &self.targets {
            if target.has_top_level_classifier(name)? {
                return target.contributed_classifier(name);
            }
        }
        trace!(namespace = %self.fq_name, %name, "alias lookup fell through");
        Ok(None)
    }

    /// Names reachable through this alias, first target first.
    pub fn classifier_names(&self) -> Result<Vec<Name>, LoadError> {
        let mut names = Vec::new();
        for target in &self.targets {
            for name in target.classifier_names()? {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }
}

/// Advertises the forward declarations an interop library exports.
#[derive(Debug)]
pub struct ExportedForwardDeclarationsFragment {
    fq_name: FqName,
    declarations: Vec<FqName>,
    placeholders: DashMap<FqName, Arc<ClassDescriptor>>,
}

impl ExportedForwardDeclarationsFragment {
    pub fn new(fq_name: FqName, declarations: Vec<FqName>) -> Self {
        ExportedForwardDeclarationsFragment {
            fq_name,
            declarations,
            placeholders: DashMap::new(),
        }
    }

    /// The interop package this fragment is bound to.
    pub fn fq_name(&self) -> FqName {
        self.fq_name
    }

    /// Fully qualified declared names, in manifest order.
    pub fn declarations(&self) -> &[FqName] {
        &self.declarations
    }

    pub fn declares(&self, declaration: &FqName) -> bool {
        self.declarations.contains(declaration)
    }

    /// Short names of the declarations.
    pub fn classifier_names(&self) -> Vec<Name> {
        let mut names = Vec::new();
        for declaration in &self.declarations {
            let name = declaration.short_name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Placeholder for the first declaration whose short name is `name`.
    pub fn contributed_classifier(&self, name: Name) -> Option<Arc<ClassDescriptor>> {
        let declaration = self
            .declarations
            .iter()
            .find(|d| d.short_name() == name)?;
        Some(self.placeholder(*declaration))
    }

    /// Placeholder for a fully qualified declared name.
    pub fn placeholder_for(&self, declaration: &FqName) -> Option<Arc<ClassDescriptor>> {
        self.declares(declaration)
            .then(|| self.placeholder(*declaration))
    }

    fn placeholder(&self, declaration: FqName) -> Arc<ClassDescriptor> {
        let entry = self.placeholders.entry(declaration).or_insert_with(|| {
            let class_id = ClassId::from_fq_name(declaration);
            let kind = ForwardDeclarationNamespace::from_fq_name(&class_id.package())
                .map(ForwardDeclarationNamespace::classifier_kind)
                .unwrap_or(ClassKind::Class);
            Arc::new(ClassDescriptor::forward_declaration(class_id, kind))
        });
        Arc::clone(entry.value())
    }
}

/// Synthetic fragments of `library`: three alias fragments followed by the
/// exported-forward-declarations fragment, or nothing for a non-interop
/// library.
pub fn synthetic_package_fragments(
    library: &dyn Library,
    module: &Weak<ModuleDescriptor>,
    fragments: &[Arc<DeserializedPackageFragment>],
) -> Result<Vec<PackageFragment>, LoadError> {
    let manifest = library.manifest();
    if !manifest.is_interop() {
        return Ok(Vec::new());
    }

    let Some(package) = manifest.package_fq_name() else {
        return Err(LoadError::InconsistentManifest {
            library: library.library_name().to_string(),
        });
    };

    let interop_fragments: Vec<Arc<DeserializedPackageFragment>> = fragments
        .iter()
        .filter(|f| f.fq_name() == package)
        .cloned()
        .collect();

    let mut synthetic: Vec<PackageFragment> = ForwardDeclarationNamespace::ALL
        .into_iter()
        .map(|namespace| {
            PackageFragment::Alias(Arc::new(ClassifierAliasingFragment::new(
                namespace,
                interop_fragments.clone(),
                Weak::clone(module),
            )))
        })
        .collect();

    let declarations = manifest.export_forward_declarations();
    debug!(
        library = library.library_name(),
        package = %package,
        interop_fragments = interop_fragments.len(),
        exported = declarations.len(),
        "synthesized forward declaration fragments"
    );
    synthetic.push(PackageFragment::ExportedForwardDeclarations(Arc::new(
        ExportedForwardDeclarationsFragment::new(package, declarations),
    )));

    Ok(synthetic)
}
