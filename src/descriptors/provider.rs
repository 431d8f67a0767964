//! Package fragment providers.
//!
//! A module answers package queries through a [`CompositePackageFragmentProvider`]
//! holding the real fragments first and the synthetic ones second. Queries
//! concatenate sub-provider answers in order, so callers that take the first
//! match see real declarations before aliases.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::name::FqName;
use crate::descriptors::fragment::PackageFragment;

/// Source of package fragments for a module.
pub trait PackageFragmentProvider: Send + Sync + fmt::Debug {
    /// Fragments bound to exactly `fq_name`, in declaration order.
    fn package_fragments(&self, fq_name: &FqName) -> Vec<PackageFragment>;

    /// Direct sub-packages of `fq_name` that have at least one fragment
    /// somewhere below them.
    fn sub_package_names(&self, fq_name: &FqName) -> Vec<FqName>;

    /// Every fragment, in declaration order.
    fn fragments(&self) -> Vec<PackageFragment>;
}

/// The direct child of `parent` on the way to `fq_name`, if `fq_name` lies
/// strictly below `parent`.
fn direct_child(parent: &FqName, fq_name: &FqName) -> Option<FqName> {
    if fq_name == parent || !fq_name.starts_with(parent) {
        return None;
    }
    let depth = parent.segments().count();
    fq_name.segments().nth(depth).map(|segment| parent.child(segment))
}

fn push_unique(names: &mut Vec<FqName>, name: FqName) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// A fixed list of fragments.
#[derive(Debug, Clone, Default)]
pub struct FragmentListProvider {
    fragments: Vec<PackageFragment>,
    by_name: HashMap<FqName, Vec<usize>>,
}

impl FragmentListProvider {
    pub fn new(fragments: Vec<PackageFragment>) -> Self {
        let mut by_name: HashMap<FqName, Vec<usize>> = HashMap::new();
        for (index, fragment) in fragments.iter().enumerate() {
            by_name.entry(fragment.fq_name()).or_default().push(index);
        }
        FragmentListProvider { fragments, by_name }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl PackageFragmentProvider for FragmentListProvider {
    fn package_fragments(&self, fq_name: &FqName) -> Vec<PackageFragment> {
        self.by_name
            .get(fq_name)
            .map(|indices| indices.iter().map(|&i| self.fragments[i].clone()).collect())
            .unwrap_or_default()
    }

    fn sub_package_names(&self, fq_name: &FqName) -> Vec<FqName> {
        let mut names = Vec::new();
        for fragment in &self.fragments {
            if let Some(child) = direct_child(fq_name, &fragment.fq_name()) {
                push_unique(&mut names, child);
            }
        }
        names
    }

    fn fragments(&self) -> Vec<PackageFragment> {
        self.fragments.clone()
    }
}

/// Ordered composition of providers; first match wins.
#[derive(Debug, Clone, Default)]
pub struct CompositePackageFragmentProvider {
    providers: Vec<Arc<dyn PackageFragmentProvider>>,
}

impl CompositePackageFragmentProvider {
    pub fn new(providers: Vec<Arc<dyn PackageFragmentProvider>>) -> Self {
        CompositePackageFragmentProvider { providers }
    }

    pub fn providers(&self) -> &[Arc<dyn PackageFragmentProvider>] {
        &self.providers
    }
}

impl PackageFragmentProvider for CompositePackageFragmentProvider {
    fn package_fragments(&self, fq_name: &FqName) -> Vec<PackageFragment> {
        self.providers
            .iter()
            .flat_map(|provider| provider.package_fragments(fq_name))
            .collect()
    }

    fn sub_package_names(&self, fq_name: &FqName) -> Vec<FqName> {
        let mut names = Vec::new();
        for provider in &self.providers {
            for name in provider.sub_package_names(fq_name) {
                push_unique(&mut names, name);
            }
        }
        names
    }

    fn fragments(&self) -> Vec<PackageFragment> {
        self.providers
            .iter()
            .flat_map(|provider| provider.fragments())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_child() {
        let root = FqName::root();
        assert_eq!(
            direct_child(&root, &FqName::new("platform.posix")),
            Some(FqName::new("platform"))
        );
        assert_eq!(
            direct_child(&FqName::new("platform"), &FqName::new("platform.posix.time")),
            Some(FqName::new("platform.posix"))
        );
        assert_eq!(direct_child(&FqName::new("platform"), &FqName::new("platform")), None);
        assert_eq!(direct_child(&FqName::new("platform"), &FqName::new("sdl")), None);
    }
}
