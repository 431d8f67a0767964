//! Classifier descriptors handed out by package fragments.

use std::sync::Arc;

use crate::core::name::{ClassId, FqName, Name};
use crate::core::payload::{ClassKindProto, ConstantProto};

/// Reserved namespace of the classic `C struct` forward declarations.
pub const CNAMES_STRUCTS: &str = "cnames.structs";

/// Reserved namespace of Objective-C class forward declarations.
pub const OBJCNAMES_CLASSES: &str = "objcnames.classes";

/// Reserved namespace of Objective-C protocol forward declarations.
pub const OBJCNAMES_PROTOCOLS: &str = "objcnames.protocols";

/// The reserved namespaces forward-declared native names live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardDeclarationNamespace {
    CStructs,
    ObjCClasses,
    ObjCProtocols,
}

impl ForwardDeclarationNamespace {
    /// All namespaces, in the order alias fragments are synthesized.
    pub const ALL: [ForwardDeclarationNamespace; 3] = [
        ForwardDeclarationNamespace::CStructs,
        ForwardDeclarationNamespace::ObjCClasses,
        ForwardDeclarationNamespace::ObjCProtocols,
    ];

    pub fn fq_name(self) -> FqName {
        FqName::new(match self {
            ForwardDeclarationNamespace::CStructs => CNAMES_STRUCTS,
            ForwardDeclarationNamespace::ObjCClasses => OBJCNAMES_CLASSES,
            ForwardDeclarationNamespace::ObjCProtocols => OBJCNAMES_PROTOCOLS,
        })
    }

    pub fn from_fq_name(fq_name: &FqName) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.fq_name() == *fq_name)
    }

    /// Kind of the placeholder classifier created for a name in this
    /// namespace.
    pub fn classifier_kind(self) -> ClassKind {
        match self {
            ForwardDeclarationNamespace::CStructs | ForwardDeclarationNamespace::ObjCClasses => {
                ClassKind::Class
            }
            ForwardDeclarationNamespace::ObjCProtocols => ClassKind::Interface,
        }
    }
}

/// Kind of a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    EnumClass,
    Object,
    AnnotationClass,
}

impl From<ClassKindProto> for ClassKind {
    fn from(kind: ClassKindProto) -> Self {
        match kind {
            ClassKindProto::Class => ClassKind::Class,
            ClassKindProto::Interface => ClassKind::Interface,
            ClassKindProto::EnumClass => ClassKind::EnumClass,
            ClassKindProto::Object => ClassKind::Object,
            ClassKindProto::AnnotationClass => ClassKind::AnnotationClass,
        }
    }
}

/// Where a classifier descriptor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassOrigin {
    /// Decoded from a package payload of the owning module.
    Deserialized,
    /// Placeholder for an exported forward declaration.
    ForwardDeclaration,
    /// Placeholder for a class the module references but does not contain.
    NotFound,
}

/// A resolved constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    EnumEntry { class_id: ClassId, entry: Name },
    Array(Vec<ConstantValue>),
}

impl From<&ConstantProto> for ConstantValue {
    fn from(proto: &ConstantProto) -> Self {
        match proto {
            ConstantProto::Bool(v) => ConstantValue::Bool(*v),
            ConstantProto::Int(v) => ConstantValue::Int(*v),
            ConstantProto::Double(v) => ConstantValue::Double(*v),
            ConstantProto::String(v) => ConstantValue::String(v.clone()),
            ConstantProto::EnumEntry { class_id, entry } => ConstantValue::EnumEntry {
                class_id: ClassId::parse(class_id),
                entry: Name::identifier(entry),
            },
            ConstantProto::Array(items) => {
                ConstantValue::Array(items.iter().map(ConstantValue::from).collect())
            }
        }
    }
}

/// The class an annotation refers to.
#[derive(Debug, Clone)]
pub enum AnnotationClass {
    /// Declared in the owning module.
    Declared(ClassId),
    /// Missing from the module; carries the module's not-found placeholder.
    NotFound(Arc<ClassDescriptor>),
}

impl AnnotationClass {
    pub fn class_id(&self) -> ClassId {
        match self {
            AnnotationClass::Declared(id) => *id,
            AnnotationClass::NotFound(descriptor) => descriptor.class_id(),
        }
    }
}

/// An annotation usage with its constant arguments.
#[derive(Debug, Clone)]
pub struct AnnotationDescriptor {
    pub annotation_class: AnnotationClass,
    pub arguments: Vec<(Name, ConstantValue)>,
}

impl AnnotationDescriptor {
    /// Look up an argument by name.
    pub fn argument(&self, name: &str) -> Option<&ConstantValue> {
        self.arguments
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| v)
    }
}

/// A classifier.
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    class_id: ClassId,
    kind: ClassKind,
    type_parameter_count: u32,
    supertypes: Vec<ClassId>,
    annotations: Vec<AnnotationDescriptor>,
    origin: ClassOrigin,
}

impl ClassDescriptor {
    pub(crate) fn deserialized(
        class_id: ClassId,
        kind: ClassKind,
        type_parameter_count: u32,
        supertypes: Vec<ClassId>,
        annotations: Vec<AnnotationDescriptor>,
    ) -> Self {
        ClassDescriptor {
            class_id,
            kind,
            type_parameter_count,
            supertypes,
            annotations,
            origin: ClassOrigin::Deserialized,
        }
    }

    pub(crate) fn forward_declaration(class_id: ClassId, kind: ClassKind) -> Self {
        ClassDescriptor {
            class_id,
            kind,
            type_parameter_count: 0,
            supertypes: Vec::new(),
            annotations: Vec::new(),
            origin: ClassOrigin::ForwardDeclaration,
        }
    }

    pub(crate) fn not_found(class_id: ClassId, type_parameter_count: u32) -> Self {
        ClassDescriptor {
            class_id,
            kind: ClassKind::Class,
            type_parameter_count,
            supertypes: Vec::new(),
            annotations: Vec::new(),
            origin: ClassOrigin::NotFound,
        }
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn name(&self) -> Name {
        self.class_id.short_class_name()
    }

    pub fn fq_name(&self) -> FqName {
        self.class_id.as_fq_name()
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn type_parameter_count(&self) -> u32 {
        self.type_parameter_count
    }

    pub fn supertypes(&self) -> &[ClassId] {
        &self.supertypes
    }

    pub fn annotations(&self) -> &[AnnotationDescriptor] {
        &self.annotations
    }

    pub fn origin(&self) -> ClassOrigin {
        self.origin
    }

    pub fn is_forward_declaration(&self) -> bool {
        self.origin == ClassOrigin::ForwardDeclaration
    }

    pub fn is_not_found(&self) -> bool {
        self.origin == ClassOrigin::NotFound
    }
}
