//! Package payload - the per-package symbol data produced by the symbol
//! engine, and the [`SymbolDecoder`] seam that produces it.
//!
//! The loader never looks inside the raw bytes itself; it hands them to a
//! decoder. [`BincodeSymbolDecoder`] reads the bincode form written by
//! [`encode_package_payload`].

use std::fmt;

use bincode::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::name::FqName;

const PAYLOAD_SIZE_LIMIT: u64 = 256 * 1024 * 1024;

/// Version of the payload layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MetadataVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl MetadataVersion {
    /// The version this loader reads.
    pub const CURRENT: MetadataVersion = MetadataVersion::new(1, 4, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        MetadataVersion {
            major,
            minor,
            patch,
        }
    }

    /// Readable by a loader at `current`: same major, not newer minor.
    pub fn is_compatible_with(&self, current: &MetadataVersion) -> bool {
        self.major == current.major && self.minor <= current.minor
    }
}

impl fmt::Display for MetadataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for MetadataVersion {
    fn default() -> Self {
        MetadataVersion::CURRENT
    }
}

/// Kind of a serialized classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKindProto {
    Class,
    Interface,
    EnumClass,
    Object,
    AnnotationClass,
}

/// A constant argument of an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstantProto {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    EnumEntry { class_id: String, entry: String },
    Array(Vec<ConstantProto>),
}

/// A serialized annotation usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationProto {
    /// Annotation class in `a.b/C` form.
    pub class_id: String,
    pub arguments: Vec<(String, ConstantProto)>,
}

/// A serialized classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProto {
    /// Name relative to the package; nested classes use `Outer.Inner`.
    pub name: String,
    pub kind: ClassKindProto,
    pub type_parameters: u32,
    /// Supertypes in `a.b/C` form.
    pub supertypes: Vec<String>,
    pub annotations: Vec<AnnotationProto>,
}

impl ClassProto {
    /// A plain class with no supertypes or annotations.
    pub fn new(name: impl Into<String>, kind: ClassKindProto) -> Self {
        ClassProto {
            name: name.into(),
            kind,
            type_parameters: 0,
            supertypes: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_type_parameters(mut self, count: u32) -> Self {
        self.type_parameters = count;
        self
    }

    pub fn with_supertype(mut self, class_id: impl Into<String>) -> Self {
        self.supertypes.push(class_id.into());
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationProto) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Decoded symbol data of one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagePayload {
    pub fq_name: String,
    pub metadata_version: MetadataVersion,
    pub classes: Vec<ClassProto>,
    pub functions: Vec<String>,
    pub properties: Vec<String>,
}

impl PackagePayload {
    pub fn new(fq_name: impl Into<String>) -> Self {
        PackagePayload {
            fq_name: fq_name.into(),
            metadata_version: MetadataVersion::CURRENT,
            classes: Vec::new(),
            functions: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: ClassProto) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.functions.push(name.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(name.into());
        self
    }

    pub fn with_metadata_version(mut self, version: MetadataVersion) -> Self {
        self.metadata_version = version;
        self
    }
}

/// Failure reported by a [`SymbolDecoder`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        DecodeError {
            message: message.into(),
        }
    }
}

/// Turns the raw bytes of one package into a [`PackagePayload`].
///
/// Implementations must be thread-safe; the loader calls them from whatever
/// thread first touches a package.
pub trait SymbolDecoder: Send + Sync {
    fn decode_package(&self, fq_name: &FqName, bytes: &[u8]) -> Result<PackagePayload, DecodeError>;
}

/// Decoder for the bincode payload format.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSymbolDecoder;

fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_limit(PAYLOAD_SIZE_LIMIT)
}

impl SymbolDecoder for BincodeSymbolDecoder {
    fn decode_package(&self, fq_name: &FqName, bytes: &[u8]) -> Result<PackagePayload, DecodeError> {
        let payload: PackagePayload = codec()
            .deserialize(bytes)
            .map_err(|e| DecodeError::new(e.to_string()))?;

        if payload.fq_name != fq_name.as_str() {
            return Err(DecodeError::new(format!(
                "payload declares package `{}`",
                payload.fq_name
            )));
        }

        Ok(payload)
    }
}

/// Encode a payload in the form [`BincodeSymbolDecoder`] reads.
pub fn encode_package_payload(payload: &PackagePayload) -> Result<Vec<u8>, bincode::Error> {
    codec().serialize(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_compatibility() {
        let current = MetadataVersion::CURRENT;
        assert!(MetadataVersion::new(1, 0, 7).is_compatible_with(&current));
        assert!(!MetadataVersion::new(1, current.minor + 1, 0).is_compatible_with(&current));
        assert!(!MetadataVersion::new(2, 0, 0).is_compatible_with(&current));
    }

    #[test]
    fn test_decoder_rejects_foreign_package() {
        let payload = PackagePayload::new("sdl.video");
        let bytes = encode_package_payload(&payload).unwrap();

        let err = BincodeSymbolDecoder
            .decode_package(&FqName::new("sdl"), &bytes)
            .unwrap_err();
        assert!(err.message.contains("sdl.video"));
    }

    #[test]
    fn test_decoder_reads_classes() {
        let payload = PackagePayload::new("sdl")
            .with_class(ClassProto::new("SDL_Window", ClassKindProto::Class))
            .with_function("SDL_Init");
        let bytes = encode_package_payload(&payload).unwrap();

        let decoded = BincodeSymbolDecoder
            .decode_package(&FqName::new("sdl"), &bytes)
            .unwrap();
        assert_eq!(decoded, payload);
    }
}
