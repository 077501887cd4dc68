//! Bridge to the dynamic object runtime.
//!
//! Dynamic values are opaque to this crate. They are handled through
//! [`DynValue`], a shared handle to a [`DynObject`], which offers exactly two
//! comparison strategies:
//!
//! - identity ([`DynValue::is`]): both handles point at the same object;
//! - value equality ([`DynValue::value_eq`]): the runtime's own `==`, which may
//!   fail and therefore returns a [`DynResult`].
//!
//! Every interaction with a dynamic value must happen while holding the
//! runtime lock (see [`lock`]).
use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};
use thiserror::Error;

use crate::utils::ref_id::ArcRefId;

pub mod lock;
pub mod native;
#[cfg(feature = "pyo3")]
pub mod python;

pub use lock::{RuntimeGuard, lock};

/// An error raised inside the dynamic runtime.
///
/// `kind` is the runtime's name for the error (`TypeError`, `ValueError`,
/// ...), `message` its description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct DynError {
    pub kind: String,
    pub message: String,
}

impl DynError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new("TypeError", message)
    }
}

pub type DynResult<T> = Result<T, DynError>;

/// An object living in the dynamic runtime.
pub trait DynObject: DowncastSync + std::fmt::Debug {
    /// `self == other` with the runtime's semantics. Implementations that do
    /// not know how to compare against `other` should return `Ok(false)`.
    fn dyn_eq(&self, other: &dyn DynObject) -> DynResult<bool>;

    /// Printable representation, used for diagnostics only.
    fn repr(&self) -> String {
        format!("{:?}", self)
    }

    /// Fully qualified name of the object, for objects that are classes.
    fn qualified_name(&self) -> DynResult<String> {
        Err(DynError::type_error(format!(
            "{} is not a class and has no qualified name",
            self.repr()
        )))
    }

    /// Short name used in diagnostic listings (a class's `__name__`).
    fn display_name(&self) -> String {
        self.repr()
    }
}
impl_downcast!(sync DynObject);

/// Shared handle to a dynamic object.
#[derive(Clone)]
pub struct DynValue(Arc<dyn DynObject>);

impl DynValue {
    pub fn new(object: impl DynObject) -> Self {
        Self(Arc::new(object))
    }

    pub fn from_arc(object: Arc<dyn DynObject>) -> Self {
        Self(object)
    }

    pub fn as_object(&self) -> &dyn DynObject {
        &*self.0
    }

    /// Identity comparison: `true` iff both handles refer to the same object.
    pub fn is(&self, other: &DynValue) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    /// Identity key of this object, suitable for maps.
    pub fn identity(&self) -> ArcRefId<dyn DynObject> {
        ArcRefId::new(self.0.clone())
    }

    /// Value comparison with the runtime's `==`. Holds the runtime lock for
    /// the duration of the call.
    pub fn value_eq(&self, other: &DynValue) -> DynResult<bool> {
        let _guard = lock();
        self.0.dyn_eq(&*other.0)
    }

    pub fn repr(&self) -> String {
        let _guard = lock();
        self.0.repr()
    }

    pub fn display_name(&self) -> String {
        let _guard = lock();
        self.0.display_name()
    }

    pub fn qualified_name(&self) -> DynResult<String> {
        let _guard = lock();
        self.0.qualified_name()
    }

    pub fn downcast_ref<T: DynObject>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for DynValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DynValue({:?})", self.0)
    }
}
