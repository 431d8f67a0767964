//! Identifiers used by the module graph: short names, qualified package
//! names and class ids.
//!
//! Both `Name` and `FqName` are interned, so equality and hashing are
//! pointer operations and copies are free.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{LazyLock, PoisonError, RwLock};

/// Global identifier interner shared by `Name` and `FqName`.
static INTERNER: LazyLock<RwLock<HashSet<&'static str>>> =
    LazyLock::new(|| RwLock::new(HashSet::new()));

fn intern(s: &str) -> &'static str {
    {
        let interner = INTERNER.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(&interned) = interner.get(s) {
            return interned;
        }
    }

    let mut interner = INTERNER.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(&interned) = interner.get(s) {
        return interned;
    }

    let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
    interner.insert(leaked);
    leaked
}

macro_rules! interned_identifier {
    ($ty:ident) => {
        impl $ty {
            /// Get the underlying string slice.
            #[inline]
            pub fn as_str(&self) -> &'static str {
                self.inner
            }
        }

        impl PartialEq for $ty {
            #[inline]
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.inner, other.inner)
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            #[inline]
            fn hash<H: Hasher>(&self, state: &mut H) {
                std::ptr::hash(self.inner, state)
            }
        }

        impl PartialOrd for $ty {
            #[inline]
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            #[inline]
            fn cmp(&self, other: &Self) -> Ordering {
                self.inner.cmp(other.inner)
            }
        }

        impl AsRef<str> for $ty {
            #[inline]
            fn as_ref(&self) -> &str {
                self.inner
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self.inner, f)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self.inner, f)
            }
        }
    };
}

/// A single identifier segment, e.g. `Foo` or the special `<main>`.
#[derive(Clone, Copy)]
pub struct Name {
    inner: &'static str,
}

interned_identifier!(Name);

impl Name {
    /// An ordinary identifier.
    pub fn identifier(s: impl AsRef<str>) -> Self {
        Name {
            inner: intern(s.as_ref()),
        }
    }

    /// A special name, rendered as `<s>`. Module names are special.
    pub fn special(s: impl AsRef<str>) -> Self {
        let s = s.as_ref();
        if s.starts_with('<') && s.ends_with('>') {
            return Name::identifier(s);
        }
        Name::identifier(format!("<{}>", s))
    }

    /// Whether this is a special (`<...>`) name.
    pub fn is_special(&self) -> bool {
        self.inner.starts_with('<')
    }
}

impl Borrow<str> for Name {
    #[inline]
    fn borrow(&self) -> &str {
        self.inner
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::identifier(s)
    }
}

/// A dot-separated qualified name. The root package is the empty name.
#[derive(Clone, Copy)]
pub struct FqName {
    inner: &'static str,
}

interned_identifier!(FqName);

impl FqName {
    /// Create a qualified name from its dotted form.
    pub fn new(s: impl AsRef<str>) -> Self {
        FqName {
            inner: intern(s.as_ref().trim()),
        }
    }

    /// The root package.
    pub fn root() -> Self {
        FqName::new("")
    }

    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    /// The enclosing name; the parent of a single segment is the root.
    pub fn parent(&self) -> FqName {
        match self.inner.rfind('.') {
            Some(idx) => FqName::new(&self.inner[..idx]),
            None => FqName::root(),
        }
    }

    /// The last segment.
    pub fn short_name(&self) -> Name {
        match self.inner.rfind('.') {
            Some(idx) => Name::identifier(&self.inner[idx + 1..]),
            None => Name::identifier(self.inner),
        }
    }

    /// Append a segment.
    pub fn child(&self, name: Name) -> FqName {
        if self.is_root() {
            FqName::new(name.as_str())
        } else {
            FqName::new(format!("{}.{}", self.inner, name))
        }
    }

    /// Iterate over the segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = Name> + '_ {
        self.inner
            .split('.')
            .filter(|s| !s.is_empty())
            .map(Name::identifier)
    }

    /// Whether `self` equals `prefix` or lies below it.
    pub fn starts_with(&self, prefix: &FqName) -> bool {
        if prefix.is_root() {
            return true;
        }
        self.inner == prefix.inner
            || (self.inner.starts_with(prefix.inner)
                && self.inner.as_bytes().get(prefix.inner.len()) == Some(&b'.'))
    }
}

impl From<&str> for FqName {
    fn from(s: &str) -> Self {
        FqName::new(s)
    }
}

/// Identifies a classifier: its package plus the (possibly nested) relative
/// name, written `a.b/Outer.Inner`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId {
    package: FqName,
    relative: Name,
}

impl ClassId {
    pub fn new(package: FqName, relative: Name) -> Self {
        ClassId { package, relative }
    }

    /// Class id for a top-level classifier of `package`.
    pub fn top_level(package: FqName, name: Name) -> Self {
        ClassId::new(package, name)
    }

    /// Class id whose package is the parent of `fq_name`.
    pub fn from_fq_name(fq_name: FqName) -> Self {
        ClassId::new(fq_name.parent(), fq_name.short_name())
    }

    /// Parse `a.b/C`; without a `/` the last dot separates the package.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.split_once('/') {
            Some((package, relative)) => {
                ClassId::new(FqName::new(package.replace('/', ".")), Name::identifier(relative))
            }
            None => ClassId::from_fq_name(FqName::new(s)),
        }
    }

    pub fn package(&self) -> FqName {
        self.package
    }

    pub fn relative_name(&self) -> Name {
        self.relative
    }

    /// Name of the innermost class.
    pub fn short_class_name(&self) -> Name {
        FqName::new(self.relative.as_str()).short_name()
    }

    pub fn is_nested(&self) -> bool {
        self.relative.as_str().contains('.')
    }

    /// The fully qualified dotted name.
    pub fn as_fq_name(&self) -> FqName {
        self.package.child(self.relative)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.relative)
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_equality() {
        let a = FqName::new("platform.posix");
        let b = FqName::new("platform.posix");
        let c = FqName::new("platform.darwin");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(std::ptr::eq(a.as_str(), b.as_str()));
    }

    #[test]
    fn test_fq_name_navigation() {
        let fq = FqName::new("cnames.structs.timeval");
        assert_eq!(fq.parent(), FqName::new("cnames.structs"));
        assert_eq!(fq.short_name(), Name::identifier("timeval"));
        assert_eq!(FqName::new("kotlinx").parent(), FqName::root());
        assert_eq!(FqName::root().child(Name::identifier("a")), FqName::new("a"));
        assert_eq!(
            fq.segments().map(|n| n.to_string()).collect::<Vec<_>>(),
            vec!["cnames", "structs", "timeval"]
        );
    }

    #[test]
    fn test_starts_with_respects_segments() {
        let fq = FqName::new("platform.posix.time");
        assert!(fq.starts_with(&FqName::new("platform")));
        assert!(fq.starts_with(&FqName::new("platform.posix")));
        assert!(!fq.starts_with(&FqName::new("platform.pos")));
        assert!(fq.starts_with(&FqName::root()));
    }

    #[test]
    fn test_special_names() {
        let name = Name::special("sdl");
        assert_eq!(name.as_str(), "<sdl>");
        assert!(name.is_special());
        assert_eq!(Name::special("<sdl>"), name);
    }

    #[test]
    fn test_class_id_parse() {
        let id = ClassId::parse("platform.posix/timeval");
        assert_eq!(id.package(), FqName::new("platform.posix"));
        assert_eq!(id.relative_name(), Name::identifier("timeval"));
        assert_eq!(id.to_string(), "platform.posix/timeval");

        let dotted = ClassId::parse("cnames.structs.SDL_Window");
        assert_eq!(dotted.package(), FqName::new("cnames.structs"));
        assert_eq!(dotted.short_class_name(), Name::identifier("SDL_Window"));

        let nested = ClassId::parse("a.b/Outer.Inner");
        assert!(nested.is_nested());
        assert_eq!(nested.short_class_name(), Name::identifier("Inner"));
        assert_eq!(nested.as_fq_name(), FqName::new("a.b.Outer.Inner"));
    }
}
