//! Turning a library into an initialized module descriptor.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::errors::LoadError;
use crate::core::header::parse_module_header;
use crate::core::library::Library;
use crate::core::name::Name;
use crate::core::payload::{BincodeSymbolDecoder, SymbolDecoder};
use crate::descriptors::components::{
    DeserializationComponents, DeserializationConfiguration, LanguageVersionSettings,
    PackageAccessedHandler, StorageContext,
};
use crate::descriptors::fragment::{build_package_fragments, PackageFragment};
use crate::descriptors::module::{ModuleDescriptor, ModuleOrigin};
use crate::descriptors::provider::{
    CompositePackageFragmentProvider, FragmentListProvider, PackageFragmentProvider,
};
use crate::descriptors::synthetic::synthetic_package_fragments;

/// Everything a load needs besides the library itself.
#[derive(Clone)]
pub struct ModuleLoadOptions {
    pub language_settings: LanguageVersionSettings,
    /// Notified once per fragment when its payload is first read.
    pub package_accessed_handler: Option<Arc<dyn PackageAccessedHandler>>,
    /// Shared counters; a fresh context is created per load when unset.
    pub storage: Option<Arc<StorageContext>>,
    pub decoder: Arc<dyn SymbolDecoder>,
}

impl Default for ModuleLoadOptions {
    fn default() -> Self {
        ModuleLoadOptions {
            language_settings: LanguageVersionSettings::default(),
            package_accessed_handler: None,
            storage: None,
            decoder: Arc::new(BincodeSymbolDecoder),
        }
    }
}

impl ModuleLoadOptions {
    pub fn with_language_settings(mut self, settings: LanguageVersionSettings) -> Self {
        self.language_settings = settings;
        self
    }

    pub fn with_package_accessed_handler(mut self, handler: Arc<dyn PackageAccessedHandler>) -> Self {
        self.package_accessed_handler = Some(handler);
        self
    }

    pub fn with_storage(mut self, storage: Arc<StorageContext>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn SymbolDecoder>) -> Self {
        self.decoder = decoder;
        self
    }
}

impl fmt::Debug for ModuleLoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoadOptions")
            .field("language_settings", &self.language_settings)
            .field("package_accessed_handler", &self.package_accessed_handler)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

/// Load `library` into a fully initialized module.
///
/// Only the header is decoded here; package payloads are read on first
/// lookup. On error no descriptor escapes.
pub fn create_module_descriptor(
    library: Arc<dyn Library>,
    options: &ModuleLoadOptions,
) -> Result<Arc<ModuleDescriptor>, LoadError> {
    let library_name = library.library_name().to_string();
    debug!(library = %library_name, "loading module");

    let header_bytes = library
        .module_header_data()
        .map_err(|source| LoadError::LibraryRead {
            library: library_name.clone(),
            what: "module header".to_string(),
            source,
        })?;
    let header = parse_module_header(&library_name, &header_bytes)?;

    let storage = options.storage.clone().unwrap_or_else(StorageContext::new);
    let module = ModuleDescriptor::new(
        Name::special(&header.module_name),
        ModuleOrigin::Deserialized(Arc::clone(&library)),
    );

    let fragments = build_package_fragments(
        &header,
        &library,
        &module,
        options.package_accessed_handler.as_ref(),
        &storage,
    );
    let synthetic =
        synthetic_package_fragments(library.as_ref(), &Arc::downgrade(&module), &fragments)?;

    let real_count = fragments.len();
    let synthetic_count = synthetic.len();
    let real: Vec<PackageFragment> = fragments
        .iter()
        .cloned()
        .map(PackageFragment::Deserialized)
        .collect();

    let providers: Vec<Arc<dyn PackageFragmentProvider>> = vec![
        Arc::new(FragmentListProvider::new(real)),
        Arc::new(FragmentListProvider::new(synthetic)),
    ];
    let provider: Arc<dyn PackageFragmentProvider> =
        Arc::new(CompositePackageFragmentProvider::new(providers));

    let components = Arc::new(DeserializationComponents::new(
        module.name(),
        DeserializationConfiguration::from(&options.language_settings),
        Arc::downgrade(&provider),
        Arc::clone(&options.decoder),
        storage,
    ));
    for fragment in &fragments {
        fragment.initialize(Arc::clone(&components))?;
    }

    module.initialize(provider, components)?;

    info!(
        library = %library_name,
        module = %module.name(),
        fragments = real_count,
        synthetic = synthetic_count,
        "loaded module"
    );
    Ok(module)
}
