//! Hash functions: the seam through which elements are mapped to slots.

use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Maps an element to an unsigned integer.
///
/// Implementations must be deterministic for the lifetime of a table: the
/// same element (and every element equal to it) must always produce the same
/// value. The table never checks this. Any `Fn(&T) -> u64` qualifies.
pub trait ElementHasher<T: ?Sized> {
    fn hash_element(&self, element: &T) -> u64;
}

impl<T: ?Sized, F> ElementHasher<T> for F
where
    F: Fn(&T) -> u64,
{
    #[inline]
    fn hash_element(&self, element: &T) -> u64 {
        self(element)
    }
}

/// Adapts a [`BuildHasher`] into an [`ElementHasher`] for `T: Hash`.
#[derive(Clone, Debug, Default)]
pub struct BuildHasherFn<S = DefaultHashBuilder>(S);

impl<S> BuildHasherFn<S> {
    pub fn new(build_hasher: S) -> Self {
        BuildHasherFn(build_hasher)
    }

    pub fn build_hasher(&self) -> &S {
        &self.0
    }
}

impl<T, S> ElementHasher<T> for BuildHasherFn<S>
where
    T: ?Sized + Hash,
    S: BuildHasher,
{
    #[inline]
    fn hash_element(&self, element: &T) -> u64 {
        self.0.hash_one(element)
    }
}
