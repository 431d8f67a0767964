//! Deserialization components shared by every fragment of one module.
//!
//! A module owns exactly one [`DeserializationComponents`]. Every deserialized
//! fragment of the module holds the same `Arc`, so the class cache and the
//! not-found registry are shared and a class resolves to the same descriptor
//! no matter which fragment asked for it.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, trace};

use crate::core::errors::LoadError;
use crate::core::name::{ClassId, FqName, Name};
use crate::core::payload::{AnnotationProto, ClassProto, SymbolDecoder};
use crate::descriptors::classifier::{
    AnnotationClass, AnnotationDescriptor, ClassDescriptor, ConstantValue,
};
use crate::descriptors::fragment::{DeserializedPackageFragment, PackageFragment};
use crate::descriptors::provider::PackageFragmentProvider;

/// Notified the first time a package's payload is read.
pub trait PackageAccessedHandler: Send + Sync + fmt::Debug {
    fn mark_package_accessed(&self, fq_name: &FqName);
}

/// A `major.minor` language or API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguageVersion {
    pub major: u32,
    pub minor: u32,
}

impl LanguageVersion {
    pub const LATEST_STABLE: LanguageVersion = LanguageVersion::new(1, 3);

    pub const fn new(major: u32, minor: u32) -> Self {
        LanguageVersion { major, minor }
    }
}

impl Default for LanguageVersion {
    fn default() -> Self {
        LanguageVersion::LATEST_STABLE
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for LanguageVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("expected `major.minor`, got `{}`", s))?;
        let major = major
            .parse()
            .map_err(|_| format!("invalid major version in `{}`", s))?;
        let minor = minor
            .parse()
            .map_err(|_| format!("invalid minor version in `{}`", s))?;
        Ok(LanguageVersion::new(major, minor))
    }
}

/// Caller-supplied language feature settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LanguageVersionSettings {
    pub language_version: LanguageVersion,
    pub skip_metadata_version_check: bool,
    pub allow_unstable_dependencies: bool,
}

/// Flags consulted while deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeserializationConfiguration {
    pub skip_metadata_version_check: bool,
    pub allow_unstable_dependencies: bool,
    pub type_alias_expansion: bool,
}

impl From<&LanguageVersionSettings> for DeserializationConfiguration {
    fn from(settings: &LanguageVersionSettings) -> Self {
        DeserializationConfiguration {
            skip_metadata_version_check: settings.skip_metadata_version_check,
            allow_unstable_dependencies: settings.allow_unstable_dependencies,
            type_alias_expansion: settings.language_version >= LanguageVersion::new(1, 1),
        }
    }
}

/// Counters shared by everything loaded with one storage context.
#[derive(Debug, Default)]
pub struct StorageContext {
    packages_decoded: AtomicUsize,
    classes_deserialized: AtomicUsize,
    not_found_classes: AtomicUsize,
}

/// Point-in-time copy of [`StorageContext`] counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StorageStats {
    pub packages_decoded: usize,
    pub classes_deserialized: usize,
    pub not_found_classes: usize,
}

impl StorageContext {
    pub fn new() -> Arc<Self> {
        Arc::new(StorageContext::default())
    }

    pub(crate) fn record_package_decoded(&self) {
        self.packages_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_class_deserialized(&self) {
        self.classes_deserialized.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_not_found_class(&self) {
        self.not_found_classes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            packages_decoded: self.packages_decoded.load(Ordering::Relaxed),
            classes_deserialized: self.classes_deserialized.load(Ordering::Relaxed),
            not_found_classes: self.not_found_classes.load(Ordering::Relaxed),
        }
    }
}

/// Locates the serialized form of a class among the module's real fragments.
#[derive(Debug, Clone)]
pub struct DeserializedClassDataFinder {
    provider: Weak<dyn PackageFragmentProvider>,
}

impl DeserializedClassDataFinder {
    pub fn new(provider: Weak<dyn PackageFragmentProvider>) -> Self {
        DeserializedClassDataFinder { provider }
    }

    fn provider(&self) -> Option<Arc<dyn PackageFragmentProvider>> {
        self.provider.upgrade()
    }

    /// First real fragment of the class's package that declares it, with
    /// its proto.
    pub fn find_class_data(
        &self,
        class_id: ClassId,
    ) -> Result<Option<(Arc<DeserializedPackageFragment>, ClassProto)>, LoadError> {
        let Some(provider) = self.provider() else {
            return Ok(None);
        };
        for fragment in provider.package_fragments(&class_id.package()) {
            if let PackageFragment::Deserialized(fragment) = fragment {
                if let Some(proto) = fragment.class_proto(class_id.relative_name())? {
                    return Ok(Some((fragment, proto)));
                }
            }
        }
        Ok(None)
    }
}

/// Placeholder classes for references the module cannot satisfy.
///
/// Placeholders are memoized by class id and arity, so repeated misses hand
/// back the same descriptor.
#[derive(Debug)]
pub struct NotFoundClasses {
    module_name: Name,
    classes: DashMap<(ClassId, u32), Arc<ClassDescriptor>>,
    storage: Arc<StorageContext>,
}

impl NotFoundClasses {
    pub fn new(module_name: Name, storage: Arc<StorageContext>) -> Self {
        NotFoundClasses {
            module_name,
            classes: DashMap::new(),
            storage,
        }
    }

    pub fn get_class(&self, class_id: ClassId, type_parameter_count: u32) -> Arc<ClassDescriptor> {
        let entry = self
            .classes
            .entry((class_id, type_parameter_count))
            .or_insert_with(|| {
                debug!(
                    module = %self.module_name,
                    class = %class_id,
                    arity = type_parameter_count,
                    "creating not-found class"
                );
                self.storage.record_not_found_class();
                Arc::new(ClassDescriptor::not_found(class_id, type_parameter_count))
            });
        Arc::clone(entry.value())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Resolves annotation usages and their constant arguments.
#[derive(Debug, Clone)]
pub struct AnnotationAndConstantLoader {
    finder: DeserializedClassDataFinder,
}

impl AnnotationAndConstantLoader {
    pub fn new(finder: DeserializedClassDataFinder) -> Self {
        AnnotationAndConstantLoader { finder }
    }

    pub fn load_annotation(
        &self,
        proto: &AnnotationProto,
        not_found: &NotFoundClasses,
    ) -> Result<AnnotationDescriptor, LoadError> {
        let class_id = ClassId::parse(&proto.class_id);
        let annotation_class = if self.finder.find_class_data(class_id)?.is_some() {
            AnnotationClass::Declared(class_id)
        } else {
            AnnotationClass::NotFound(not_found.get_class(class_id, 0))
        };

        let arguments = proto
            .arguments
            .iter()
            .map(|(name, value)| (Name::identifier(name), ConstantValue::from(value)))
            .collect();

        Ok(AnnotationDescriptor {
            annotation_class,
            arguments,
        })
    }
}

type ClassCell = Arc<OnceCell<Option<Arc<ClassDescriptor>>>>;

/// The per-module service set.
pub struct DeserializationComponents {
    module_name: Name,
    configuration: DeserializationConfiguration,
    class_data_finder: DeserializedClassDataFinder,
    annotation_loader: AnnotationAndConstantLoader,
    not_found_classes: NotFoundClasses,
    decoder: Arc<dyn SymbolDecoder>,
    storage: Arc<StorageContext>,
    classes: DashMap<ClassId, ClassCell>,
}

impl DeserializationComponents {
    pub fn new(
        module_name: Name,
        configuration: DeserializationConfiguration,
        provider: Weak<dyn PackageFragmentProvider>,
        decoder: Arc<dyn SymbolDecoder>,
        storage: Arc<StorageContext>,
    ) -> Self {
        let class_data_finder = DeserializedClassDataFinder::new(provider);
        DeserializationComponents {
            module_name,
            configuration,
            annotation_loader: AnnotationAndConstantLoader::new(class_data_finder.clone()),
            class_data_finder,
            not_found_classes: NotFoundClasses::new(module_name, Arc::clone(&storage)),
            decoder,
            storage,
            classes: DashMap::new(),
        }
    }

    pub fn module_name(&self) -> Name {
        self.module_name
    }

    pub fn configuration(&self) -> &DeserializationConfiguration {
        &self.configuration
    }

    pub fn decoder(&self) -> &dyn SymbolDecoder {
        self.decoder.as_ref()
    }

    pub fn storage(&self) -> &Arc<StorageContext> {
        &self.storage
    }

    pub fn not_found_classes(&self) -> &NotFoundClasses {
        &self.not_found_classes
    }

    pub fn class_data_finder(&self) -> &DeserializedClassDataFinder {
        &self.class_data_finder
    }

    /// Descriptor of a class declared in one of the module's real fragments.
    ///
    /// Computed at most once per class id, even under concurrent callers.
    pub fn deserialize_class(
        &self,
        class_id: ClassId,
    ) -> Result<Option<Arc<ClassDescriptor>>, LoadError> {
        let cell: ClassCell = self.classes.entry(class_id).or_default().value().clone();
        cell.get_or_try_init(|| -> Result<_, LoadError> {
            let Some((fragment, proto)) = self.class_data_finder.find_class_data(class_id)? else {
                return Ok(None);
            };

            let annotations = proto
                .annotations
                .iter()
                .map(|a| self.annotation_loader.load_annotation(a, &self.not_found_classes))
                .collect::<Result<Vec<_>, _>>()?;
            let supertypes = proto.supertypes.iter().map(|s| ClassId::parse(s)).collect();

            trace!(
                module = %self.module_name,
                class = %class_id,
                fragment = %fragment.fq_name(),
                "deserialized class"
            );
            self.storage.record_class_deserialized();

            Ok(Some(Arc::new(ClassDescriptor::deserialized(
                class_id,
                proto.kind.into(),
                proto.type_parameters,
                supertypes,
                annotations,
            ))))
        })
        .cloned()
    }

    /// First classifier any fragment of the class's package contributes,
    /// real fragments before synthetic ones.
    pub fn find_classifier(
        &self,
        class_id: ClassId,
    ) -> Result<Option<Arc<ClassDescriptor>>, LoadError> {
        let Some(provider) = self.class_data_finder.provider() else {
            return Ok(None);
        };
        for fragment in provider.package_fragments(&class_id.package()) {
            if let Some(class) = fragment.contributed_classifier(class_id.relative_name())? {
                return Ok(Some(class));
            }
        }
        Ok(None)
    }

    /// Like [`find_classifier`](Self::find_classifier), but a miss yields the
    /// module's not-found placeholder.
    pub fn resolve_class(&self, class_id: ClassId) -> Result<Arc<ClassDescriptor>, LoadError> {
        match self.find_classifier(class_id)? {
            Some(class) => Ok(class),
            None => Ok(self.not_found_classes.get_class(class_id, 0)),
        }
    }
}

impl fmt::Debug for DeserializationComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeserializationComponents")
            .field("module_name", &self.module_name)
            .field("configuration", &self.configuration)
            .field("cached_classes", &self.classes.len())
            .field("not_found_classes", &self.not_found_classes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_version_parse() {
        assert_eq!("1.3".parse::<LanguageVersion>().unwrap(), LanguageVersion::new(1, 3));
        assert_eq!(LanguageVersion::new(1, 4).to_string(), "1.4");
        assert!("13".parse::<LanguageVersion>().is_err());
        assert!("1.x".parse::<LanguageVersion>().is_err());
    }

    #[test]
    fn test_configuration_from_settings() {
        let settings = LanguageVersionSettings {
            skip_metadata_version_check: true,
            ..Default::default()
        };
        let config = DeserializationConfiguration::from(&settings);
        assert!(config.skip_metadata_version_check);
        assert!(!config.allow_unstable_dependencies);
        assert!(config.type_alias_expansion);
    }

    #[test]
    fn test_not_found_identity() {
        let storage = StorageContext::new();
        let registry = NotFoundClasses::new(Name::special("sdl"), Arc::clone(&storage));
        let id = ClassId::parse("cnames.structs/SDL_Window");

        let first = registry.get_class(id, 0);
        let second = registry.get_class(id, 0);
        let generic = registry.get_class(id, 1);

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &generic));
        assert!(first.is_not_found());
        assert_eq!(registry.len(), 2);
        assert_eq!(storage.stats().not_found_classes, 2);
    }
}
