//! The module descriptor: the queryable entry point of one loaded library.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::core::errors::LoadError;
use crate::core::library::Library;
use crate::core::name::{ClassId, FqName, Name};
use crate::descriptors::classifier::ClassDescriptor;
use crate::descriptors::components::DeserializationComponents;
use crate::descriptors::fragment::{DeserializedPackageFragment, PackageFragment};
use crate::descriptors::provider::PackageFragmentProvider;

/// Where a module came from.
#[derive(Debug, Clone)]
pub enum ModuleOrigin {
    /// Loaded from a compiled library.
    Deserialized(Arc<dyn Library>),
}

impl ModuleOrigin {
    pub fn library(&self) -> &Arc<dyn Library> {
        match self {
            ModuleOrigin::Deserialized(library) => library,
        }
    }
}

struct Initialized {
    provider: Arc<dyn PackageFragmentProvider>,
    components: Arc<DeserializationComponents>,
}

/// Root symbol-resolution object of one loaded library.
///
/// Built in two steps: [`ModuleDescriptor::new`] creates an empty module that
/// fragments can point back to, and [`ModuleDescriptor::initialize`] installs
/// the provider once. Every query before that fails with
/// [`LoadError::ModuleNotInitialized`].
pub struct ModuleDescriptor {
    name: Name,
    origin: ModuleOrigin,
    state: OnceCell<Initialized>,
}

impl ModuleDescriptor {
    pub fn new(name: Name, origin: ModuleOrigin) -> Arc<Self> {
        Arc::new(ModuleDescriptor {
            name,
            origin,
            state: OnceCell::new(),
        })
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    pub fn library(&self) -> &Arc<dyn Library> {
        self.origin.library()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    /// Install the fragment provider and the module's components.
    pub fn initialize(
        &self,
        provider: Arc<dyn PackageFragmentProvider>,
        components: Arc<DeserializationComponents>,
    ) -> Result<(), LoadError> {
        self.state
            .set(Initialized {
                provider,
                components,
            })
            .map_err(|_| LoadError::ModuleAlreadyInitialized {
                module: self.name.to_string(),
            })
    }

    fn state(&self) -> Result<&Initialized, LoadError> {
        self.state.get().ok_or_else(|| LoadError::ModuleNotInitialized {
            module: self.name.to_string(),
        })
    }

    pub fn provider(&self) -> Result<&Arc<dyn PackageFragmentProvider>, LoadError> {
        Ok(&self.state()?.provider)
    }

    pub fn components(&self) -> Result<&Arc<DeserializationComponents>, LoadError> {
        Ok(&self.state()?.components)
    }

    /// Fragments bound to `fq_name`, real ones first.
    pub fn package_fragments(&self, fq_name: &FqName) -> Result<Vec<PackageFragment>, LoadError> {
        Ok(self.provider()?.package_fragments(fq_name))
    }

    /// All fragments, real ones first.
    pub fn fragments(&self) -> Result<Vec<PackageFragment>, LoadError> {
        Ok(self.provider()?.fragments())
    }

    pub fn deserialized_fragments(
        &self,
    ) -> Result<Vec<Arc<DeserializedPackageFragment>>, LoadError> {
        Ok(self
            .fragments()?
            .iter()
            .filter_map(|f| f.as_deserialized().cloned())
            .collect())
    }

    pub fn synthetic_fragments(&self) -> Result<Vec<PackageFragment>, LoadError> {
        Ok(self
            .fragments()?
            .into_iter()
            .filter(PackageFragment::is_synthetic)
            .collect())
    }

    /// Distinct package names, in fragment order.
    pub fn package_names(&self) -> Result<Vec<FqName>, LoadError> {
        let mut names = Vec::new();
        for fragment in self.fragments()? {
            let name = fragment.fq_name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }

    pub fn sub_package_names(&self, fq_name: &FqName) -> Result<Vec<FqName>, LoadError> {
        Ok(self.provider()?.sub_package_names(fq_name))
    }

    /// The classifier `class_id` names, if any fragment of its package
    /// contributes one.
    pub fn find_classifier(
        &self,
        class_id: ClassId,
    ) -> Result<Option<Arc<ClassDescriptor>>, LoadError> {
        self.components()?.find_classifier(class_id)
    }

    /// Like [`find_classifier`](Self::find_classifier), falling back to the
    /// module's not-found placeholder.
    pub fn resolve_class(&self, class_id: ClassId) -> Result<Arc<ClassDescriptor>, LoadError> {
        self.components()?.resolve_class(class_id)
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("library", &self.library().library_name())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::library::MemoryLibrary;

    #[test]
    fn test_queries_fail_before_initialize() {
        let library: Arc<dyn Library> = Arc::new(MemoryLibrary::builder("early").build().unwrap());
        let module = ModuleDescriptor::new(Name::special("early"), ModuleOrigin::Deserialized(library));

        assert!(!module.is_initialized());
        let err = module.fragments().unwrap_err();
        assert!(matches!(err, LoadError::ModuleNotInitialized { ref module } if module == "<early>"));
        assert!(module
            .find_classifier(ClassId::parse("early/Thing"))
            .is_err());
    }
}
