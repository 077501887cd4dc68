//! Identity wrappers.
//!
//! [`RefId`] compares, orders and hashes a shared pointer by the address it
//! points to rather than by the pointee. This is how "is the same object"
//! checks on dynamic values are expressed.
use std::{ops::Deref, sync::Arc};

#[derive(Debug)]
pub struct RefId<U: ?Sized, T: AsRef<U>> {
    inner: T,
    _phantom: std::marker::PhantomData<fn() -> *const U>,
}

impl<U: ?Sized, T: AsRef<U>> RefId<U, T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn borrow_arc(&self) -> &T {
        &self.inner
    }

    pub fn take(self) -> T {
        self.inner
    }

    fn addr(&self) -> *const () {
        (self.inner.as_ref() as *const U).cast::<()>()
    }
}

impl<U: ?Sized, T: AsRef<U> + Clone> Clone for RefId<U, T> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<U: ?Sized, T: AsRef<U>> AsRef<U> for RefId<U, T> {
    fn as_ref(&self) -> &U {
        self.inner.as_ref()
    }
}

impl<U: ?Sized, T: AsRef<U>> Deref for RefId<U, T> {
    type Target = U;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl<U: ?Sized, T: AsRef<U>> PartialEq for RefId<U, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl<U: ?Sized, T: AsRef<U>> PartialOrd for RefId<U, T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<U: ?Sized, T: AsRef<U>> Eq for RefId<U, T> {}

impl<U: ?Sized, T: AsRef<U>> Ord for RefId<U, T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl<U: ?Sized, T: AsRef<U>> std::hash::Hash for RefId<U, T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

pub type ArcRefId<U> = RefId<U, Arc<U>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_address() {
        let a = Arc::new(5);
        let b = Arc::new(5);
        assert_eq!(ArcRefId::new(a.clone()), ArcRefId::new(a.clone()));
        assert_ne!(ArcRefId::new(a.clone()), ArcRefId::new(b.clone()));
        assert_eq!(*ArcRefId::new(b), 5);
    }

    #[test]
    fn works_for_trait_objects() {
        let a: Arc<dyn std::fmt::Debug + Send + Sync> = Arc::new("x");
        let b: Arc<dyn std::fmt::Debug + Send + Sync> = Arc::new("x");
        let id_a: ArcRefId<dyn std::fmt::Debug + Send + Sync> = ArcRefId::new(a.clone());
        assert_eq!(id_a, ArcRefId::new(a));
        assert_ne!(id_a, ArcRefId::new(b));
    }
}
