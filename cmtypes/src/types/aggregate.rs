//! Aggregate types
//!
//! Composite types built from `Typeref` references stored in the central
//! `TypeRegistry`:
//! - `ListType`: homogeneous list of a single element type.
//! - `DictType`: mapping from a key type to a value type.
//! - `TupleType`: fixed, ordered sequence of element types.
//! - `OptionalType`: either a value of the element type or `None`.
//!
//! Each type carries an `internal_fmt` helper that resolves its element types
//! through the registry storage for display purposes.
use std::{collections::BTreeMap, ops::Deref};

use uuid::Uuid;

use crate::types::{AnyType, Typeref};

/// Writes the type referenced by `typeref`, or a placeholder if the registry
/// does not know it.
pub(super) fn fmt_typeref(
    f: &mut std::fmt::Formatter<'_>,
    storage: &BTreeMap<Uuid, AnyType>,
    typeref: Typeref,
) -> std::fmt::Result {
    match storage.get(&typeref.0) {
        Some(ty) => write!(f, "{}", ty.internal_fmt(storage)),
        None => write!(f, "<unknown type {}>", typeref.0),
    }
}

/// List type
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListType {
    pub elem: Typeref,
}

/// Dict type
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DictType {
    pub key: Typeref,
    pub value: Typeref,
}

/// Tuple type
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TupleType {
    pub elements: Vec<Typeref>,
}

/// Optional type
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OptionalType {
    pub elem: Typeref,
}

/// Display adaptor shared by every aggregate. `write` receives the resolved
/// registry storage.
pub(super) struct AggregateFmt<'a, T, U> {
    pub(super) r#ref: &'a T,
    pub(super) ref_object: U,
}

impl<U: Deref<Target = BTreeMap<Uuid, AnyType>>> std::fmt::Display for AggregateFmt<'_, ListType, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "List[")?;
        fmt_typeref(f, &self.ref_object, self.r#ref.elem)?;
        write!(f, "]")
    }
}

impl<U: Deref<Target = BTreeMap<Uuid, AnyType>>> std::fmt::Display for AggregateFmt<'_, DictType, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dict[")?;
        fmt_typeref(f, &self.ref_object, self.r#ref.key)?;
        write!(f, ", ")?;
        fmt_typeref(f, &self.ref_object, self.r#ref.value)?;
        write!(f, "]")
    }
}

impl<U: Deref<Target = BTreeMap<Uuid, AnyType>>> std::fmt::Display for AggregateFmt<'_, TupleType, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tuple[")?;
        for (i, typeref) in self.r#ref.elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            fmt_typeref(f, &self.ref_object, *typeref)?;
        }
        write!(f, "]")
    }
}

impl<U: Deref<Target = BTreeMap<Uuid, AnyType>>> std::fmt::Display
    for AggregateFmt<'_, OptionalType, U>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Optional[")?;
        fmt_typeref(f, &self.ref_object, self.r#ref.elem)?;
        write!(f, "]")
    }
}
