//! Package fragments: one package's symbol table within one module.
//!
//! Deserialized fragments are built from the module header and stay empty
//! until the first member lookup. The payload is then decoded exactly once,
//! even when several threads race for it, and kept for the module's lifetime.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::core::errors::LoadError;
use crate::core::header::ModuleHeader;
use crate::core::library::Library;
use crate::core::name::{ClassId, FqName, Name};
use crate::core::payload::{ClassProto, MetadataVersion, PackagePayload};
use crate::descriptors::classifier::ClassDescriptor;
use crate::descriptors::components::{
    DeserializationComponents, PackageAccessedHandler, StorageContext,
};
use crate::descriptors::module::ModuleDescriptor;
use crate::descriptors::synthetic::{
    ClassifierAliasingFragment, ExportedForwardDeclarationsFragment,
};

/// Decoded contents of one fragment, indexed by classifier name.
#[derive(Debug)]
pub struct PackageScope {
    payload: PackagePayload,
    classes: HashMap<Name, usize>,
}

impl PackageScope {
    fn new(payload: PackagePayload) -> Self {
        let mut classes = HashMap::with_capacity(payload.classes.len());
        for (index, class) in payload.classes.iter().enumerate() {
            classes.entry(Name::identifier(&class.name)).or_insert(index);
        }
        PackageScope { payload, classes }
    }

    pub fn class(&self, name: Name) -> Option<&ClassProto> {
        self.classes.get(&name).map(|&i| &self.payload.classes[i])
    }

    /// Classifier names in declaration order.
    pub fn classifier_names(&self) -> Vec<Name> {
        self.payload
            .classes
            .iter()
            .map(|c| Name::identifier(&c.name))
            .collect()
    }

    pub fn function_names(&self) -> Vec<Name> {
        self.payload.functions.iter().map(Name::identifier).collect()
    }

    pub fn property_names(&self) -> Vec<Name> {
        self.payload.properties.iter().map(Name::identifier).collect()
    }

    pub fn metadata_version(&self) -> MetadataVersion {
        self.payload.metadata_version
    }
}

/// A fragment backed by the library's payload for its package.
pub struct DeserializedPackageFragment {
    fq_name: FqName,
    part: usize,
    library: Arc<dyn Library>,
    module: Weak<ModuleDescriptor>,
    handler: Option<Arc<dyn PackageAccessedHandler>>,
    storage: Arc<StorageContext>,
    components: OnceCell<Arc<DeserializationComponents>>,
    scope: OnceCell<Arc<PackageScope>>,
}

impl DeserializedPackageFragment {
    pub fn new(
        fq_name: FqName,
        part: usize,
        library: Arc<dyn Library>,
        module: Weak<ModuleDescriptor>,
        handler: Option<Arc<dyn PackageAccessedHandler>>,
        storage: Arc<StorageContext>,
    ) -> Self {
        DeserializedPackageFragment {
            fq_name,
            part,
            library,
            module,
            handler,
            storage,
            components: OnceCell::new(),
            scope: OnceCell::new(),
        }
    }

    pub fn fq_name(&self) -> FqName {
        self.fq_name
    }

    /// Index of this fragment among the fragments of the same package.
    pub fn part(&self) -> usize {
        self.part
    }

    pub fn library(&self) -> &Arc<dyn Library> {
        &self.library
    }

    /// The owning module, while it is alive.
    pub fn module(&self) -> Option<Arc<ModuleDescriptor>> {
        self.module.upgrade()
    }

    /// Inject the module's shared components. Only the first call succeeds.
    pub fn initialize(&self, components: Arc<DeserializationComponents>) -> Result<(), LoadError> {
        self.components
            .set(components)
            .map_err(|_| LoadError::ComponentsAlreadySet {
                package: self.fq_name.to_string(),
            })
    }

    pub fn components(&self) -> Result<&Arc<DeserializationComponents>, LoadError> {
        self.components.get().ok_or_else(|| LoadError::ComponentsMissing {
            package: self.fq_name.to_string(),
        })
    }

    /// Whether the payload has been decoded.
    pub fn is_populated(&self) -> bool {
        self.scope.get().is_some()
    }

    /// The decoded scope, decoding it on first use.
    pub fn scope(&self) -> Result<&Arc<PackageScope>, LoadError> {
        self.scope.get_or_try_init(|| self.load_scope().map(Arc::new))
    }

    fn load_scope(&self) -> Result<PackageScope, LoadError> {
        let components = self.components()?;
        let library = self.library.library_name();

        let bytes = self
            .library
            .package_metadata(&self.fq_name, self.part)
            .map_err(|source| LoadError::LibraryRead {
                library: library.to_string(),
                what: format!("metadata of package `{}`", self.fq_name),
                source,
            })?;

        self.storage.record_package_decoded();
        let payload = components
            .decoder()
            .decode_package(&self.fq_name, &bytes)
            .map_err(|e| LoadError::CorruptPackage {
                library: library.to_string(),
                package: self.fq_name.to_string(),
                message: e.message,
            })?;

        let current = MetadataVersion::CURRENT;
        if !components.configuration().skip_metadata_version_check
            && !payload.metadata_version.is_compatible_with(&current)
        {
            return Err(LoadError::IncompatibleMetadata {
                library: library.to_string(),
                package: self.fq_name.to_string(),
                found: payload.metadata_version.to_string(),
                expected: current.to_string(),
            });
        }

        if let Some(handler) = &self.handler {
            handler.mark_package_accessed(&self.fq_name);
        }

        debug!(
            library,
            package = %self.fq_name,
            part = self.part,
            classes = payload.classes.len(),
            "decoded package payload"
        );
        Ok(PackageScope::new(payload))
    }

    /// Serialized form of a classifier declared in this fragment.
    pub fn class_proto(&self, name: Name) -> Result<Option<ClassProto>, LoadError> {
        Ok(self.scope()?.class(name).cloned())
    }

    pub fn has_top_level_classifier(&self, name: Name) -> Result<bool, LoadError> {
        Ok(self.scope()?.class(name).is_some())
    }

    pub fn classifier_names(&self) -> Result<Vec<Name>, LoadError> {
        Ok(self.scope()?.classifier_names())
    }

    pub fn function_names(&self) -> Result<Vec<Name>, LoadError> {
        Ok(self.scope()?.function_names())
    }

    pub fn property_names(&self) -> Result<Vec<Name>, LoadError> {
        Ok(self.scope()?.property_names())
    }

    /// The classifier this fragment declares under `name`.
    pub fn contributed_classifier(
        &self,
        name: Name,
    ) -> Result<Option<Arc<ClassDescriptor>>, LoadError> {
        if !self.has_top_level_classifier(name)? {
            return Ok(None);
        }
        let class_id = ClassId::new(self.fq_name, name);
        self.components()?.deserialize_class(class_id)
    }
}

impl fmt::Debug for DeserializedPackageFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeserializedPackageFragment")
            .field("fq_name", &self.fq_name)
            .field("part", &self.part)
            .field("library", &self.library.library_name())
            .field("populated", &self.is_populated())
            .finish()
    }
}

/// Build one fragment per header entry, in header order.
///
/// Nothing is decoded here. A package listed several times gets one fragment
/// per listing, numbered from zero.
pub fn build_package_fragments(
    header: &ModuleHeader,
    library: &Arc<dyn Library>,
    module: &Arc<ModuleDescriptor>,
    handler: Option<&Arc<dyn PackageAccessedHandler>>,
    storage: &Arc<StorageContext>,
) -> Vec<Arc<DeserializedPackageFragment>> {
    let mut parts: HashMap<FqName, usize> = HashMap::new();
    header
        .package_fragment_names
        .iter()
        .map(|name| {
            let fq_name = FqName::new(name);
            let part = parts.entry(fq_name).or_insert(0);
            let fragment = DeserializedPackageFragment::new(
                fq_name,
                *part,
                Arc::clone(library),
                Arc::downgrade(module),
                handler.cloned(),
                Arc::clone(storage),
            );
            *part += 1;
            Arc::new(fragment)
        })
        .collect()
}

/// A fragment of a module, real or synthetic.
#[derive(Debug, Clone)]
pub enum PackageFragment {
    Deserialized(Arc<DeserializedPackageFragment>),
    Alias(Arc<ClassifierAliasingFragment>),
    ExportedForwardDeclarations(Arc<ExportedForwardDeclarationsFragment>),
}

impl PackageFragment {
    pub fn fq_name(&self) -> FqName {
        match self {
            PackageFragment::Deserialized(f) => f.fq_name(),
            PackageFragment::Alias(f) => f.fq_name(),
            PackageFragment::ExportedForwardDeclarations(f) => f.fq_name(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        !matches!(self, PackageFragment::Deserialized(_))
    }

    /// Short label for reports.
    pub fn kind_label(&self) -> &'static str {
        match self {
            PackageFragment::Deserialized(_) => "deserialized",
            PackageFragment::Alias(_) => "alias",
            PackageFragment::ExportedForwardDeclarations(_) => "exported-forward-declarations",
        }
    }

    pub fn contributed_classifier(
        &self,
        name: Name,
    ) -> Result<Option<Arc<ClassDescriptor>>, LoadError> {
        match self {
            PackageFragment::Deserialized(f) => f.contributed_classifier(name),
            PackageFragment::Alias(f) => f.contributed_classifier(name),
            PackageFragment::ExportedForwardDeclarations(f) => Ok(f.contributed_classifier(name)),
        }
    }

    pub fn classifier_names(&self) -> Result<Vec<Name>, LoadError> {
        match self {
            PackageFragment::Deserialized(f) => f.classifier_names(),
            PackageFragment::Alias(f) => f.classifier_names(),
            PackageFragment::ExportedForwardDeclarations(f) => Ok(f.classifier_names()),
        }
    }

    pub fn as_deserialized(&self) -> Option<&Arc<DeserializedPackageFragment>> {
        match self {
            PackageFragment::Deserialized(f) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::payload::ClassKindProto;

    #[test]
    fn test_scope_keeps_first_duplicate() {
        let payload = PackagePayload::new("sdl")
            .with_class(ClassProto::new("SDL_Rect", ClassKindProto::Class))
            .with_class(ClassProto::new("SDL_Rect", ClassKindProto::Interface))
            .with_function("SDL_Init");
        let scope = PackageScope::new(payload);

        let rect = scope.class(Name::identifier("SDL_Rect")).unwrap();
        assert_eq!(rect.kind, ClassKindProto::Class);
        assert_eq!(scope.function_names(), vec![Name::identifier("SDL_Init")]);
        assert!(scope.class(Name::identifier("SDL_Point")).is_none());
    }
}
