//! Types module
//!
//! This module contains the canonical representation of static types used by
//! the compiler side of the concrete module type machinery. It exposes a small
//! type system built on three layers:
//!
//! - Primary types: scalars and tensors (see `primary.rs`).
//! - Aggregate types: lists, dicts, tuples and optionals (see `aggregate.rs`).
//! - Nominal types: functions, interfaces and classes (see `nominal.rs`).
//!
//! A registry-backed [`AnyType`] wrapper and [`TypeRegistry`] deduplicate
//! types and provide stable [`Typeref`] identifiers (UUID-based). Because every
//! structurally identical type maps to the same [`Typeref`], static type
//! equality is plain [`Typeref`] equality.
use std::{
    collections::BTreeMap,
    hash::{DefaultHasher, Hash, Hasher},
    ops::Deref,
};

use log::{debug, info};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use smallvec::{SmallVec, smallvec};
use uuid::{Timestamp, Uuid};

use crate::types::{
    aggregate::{AggregateFmt, DictType, ListType, OptionalType, TupleType},
    nominal::{ClassRef, FunctionType, InterfaceType},
    primary::PrimaryType,
};
pub mod aggregate;
pub mod nominal;
pub mod primary;

/// A stable reference to a type stored inside a `TypeRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Typeref(Uuid);

impl Typeref {
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

/// A sum-type representing any type that can be stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnyType {
    /// Scalars (`int`, `float`, `bool`, `str`, ...) and tensors.
    Primary(PrimaryType),

    List(ListType),
    Dict(DictType),
    Tuple(TupleType),
    Optional(OptionalType),

    /// A function value. Function types are only comparable by name; they
    /// are never valid as plain attribute types.
    Function(FunctionType),

    /// A declared interface, possibly a module interface.
    Interface(InterfaceType),

    /// A nominal class registered in a `ClassRegistry`.
    Class(ClassRef),
}

impl<S: Into<PrimaryType>> From<S> for AnyType {
    fn from(value: S) -> Self {
        AnyType::Primary(value.into())
    }
}

macro_rules! any_type_from {
    ($typ:ty, $lbl:ident) => {
        impl From<$typ> for AnyType {
            fn from(value: $typ) -> Self {
                AnyType::$lbl(value)
            }
        }
    };
}

any_type_from! { ListType, List }
any_type_from! { DictType, Dict }
any_type_from! { TupleType, Tuple }
any_type_from! { OptionalType, Optional }
any_type_from! { FunctionType, Function }
any_type_from! { InterfaceType, Interface }
any_type_from! { ClassRef, Class }

impl AnyType {
    fn internal_fmt<U>(&self, ref_object: U) -> impl std::fmt::Display
    where
        U: Deref<Target = BTreeMap<Uuid, AnyType>> + Sized,
    {
        struct AnyTypeFmt<'a, U> {
            ty: &'a AnyType,
            ref_object: U,
        }

        impl<U: Deref<Target = BTreeMap<Uuid, AnyType>> + Sized> std::fmt::Display for AnyTypeFmt<'_, U> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let storage = self.ref_object.deref();
                match self.ty {
                    AnyType::Primary(primary) => write!(f, "{}", primary),
                    AnyType::List(list) => write!(
                        f,
                        "{}",
                        AggregateFmt {
                            r#ref: list,
                            ref_object: storage,
                        }
                    ),
                    AnyType::Dict(dict) => write!(
                        f,
                        "{}",
                        AggregateFmt {
                            r#ref: dict,
                            ref_object: storage,
                        }
                    ),
                    AnyType::Tuple(tuple) => write!(
                        f,
                        "{}",
                        AggregateFmt {
                            r#ref: tuple,
                            ref_object: storage,
                        }
                    ),
                    AnyType::Optional(optional) => write!(
                        f,
                        "{}",
                        AggregateFmt {
                            r#ref: optional,
                            ref_object: storage,
                        }
                    ),
                    AnyType::Function(function) => write!(f, "{}", function),
                    AnyType::Interface(interface) => write!(f, "{}", interface),
                    AnyType::Class(class) => write!(f, "{}", class),
                }
            }
        }

        AnyTypeFmt {
            ty: self,
            ref_object,
        }
    }

    /// Build a formatting helper that renders this type using the provided
    /// registry to resolve referenced element types.
    ///
    /// Example:
    /// ```rust
    /// # use cmtypes::types::{AnyType, TypeRegistry, primary::PrimaryType};
    /// let reg = TypeRegistry::new([0; 6]);
    /// let t = AnyType::from(PrimaryType::Int);
    /// assert_eq!(format!("{}", t.fmt(&reg)), "int");
    /// ```
    pub fn fmt<'a>(&'a self, registry: &'a TypeRegistry) -> impl std::fmt::Display {
        self.internal_fmt(registry.array.read_recursive())
    }
}

/// A central registry that stores and deduplicates `AnyType` values.
///
/// The registry provides fast lookup by `Typeref` and ensures identical type
/// descriptions map to the same stable identifier.
///
/// Example:
///
/// ```rust
/// # use cmtypes::types::{TypeRegistry, primary::PrimaryType};
/// let reg = TypeRegistry::new([0u8; 6]);
/// let typeref = reg.search_or_insert(PrimaryType::Int.into());
/// assert_eq!(reg.search_or_insert(PrimaryType::Int.into()), typeref);
/// assert_eq!(reg.get(typeref).as_deref(), Some(&PrimaryType::Int.into()));
/// ```
pub struct TypeRegistry {
    array: RwLock<BTreeMap<Uuid, AnyType>>,
    inverse_lookup: RwLock<BTreeMap<u64, SmallVec<[Uuid; 1]>>>,
    context: uuid::timestamp::context::Context,
    node_id: [u8; 6],
}

impl TypeRegistry {
    fn hash_ty(ty: &AnyType) -> u64 {
        let mut hasher = DefaultHasher::new();
        ty.hash(&mut hasher);
        hasher.finish()
    }

    fn next_uuid(&self) -> Uuid {
        let ts = Timestamp::now(&self.context);
        Uuid::new_v6(ts, &self.node_id)
    }

    /// Create a new [`TypeRegistry`] instance.
    ///
    /// `node_id` is used when allocating UUIDs for newly inserted types.
    pub fn new(node_id: [u8; 6]) -> Self {
        Self {
            array: Default::default(),
            inverse_lookup: Default::default(), // INFO: Always lock array before inverse_lookup to avoid deadlock
            context: uuid::timestamp::context::Context::new(0),
            node_id,
        }
    }

    /// Number of distinct types stored.
    pub fn len(&self) -> usize {
        self.array.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.read().is_empty()
    }

    /// Retrieve a borrowed [`AnyType`] for the given `typeref`. Returns
    /// [`None`] if the given `typeref` is not present in the registry.
    ///
    /// # A note on concurrency
    /// This method internally acquires a read lock on the type storage. You
    /// mustn't hold the returned guard while calling
    /// [`Self::search_or_insert`] (or [`Self::unshaped`], which may insert) as
    /// it may attempt to upgrade to a write lock, leading to a deadlock.
    pub fn get(&self, typeref: Typeref) -> Option<MappedRwLockReadGuard<'_, AnyType>> {
        let array_lock = self.array.read_recursive();

        // Acquire the typeref
        RwLockReadGuard::try_map(array_lock, |map| map.get(&typeref.0)).ok()
    }

    /// Insert `ty` into the registry if an equivalent type doesn't already
    /// exist and return the [`Typeref`] for it.
    ///
    /// If an identical type is already present, its existing [`Typeref`] is
    /// returned, otherwise a new UUID is allocated and the type is inserted.
    ///
    /// # A note on concurrency
    /// Read locks are upgraded to write locks only when a new type must be
    /// inserted. You **MUST NOT** hold a guard returned by [`Self::get`] while
    /// calling this method.
    ///
    /// # About hash collisions
    /// Candidates are found through a 64-bit hash inverse lookup and then
    /// confirmed by full equality, so a collision only costs an extra
    /// comparison. Collisions are logged at info level.
    pub fn search_or_insert(&self, ty: AnyType) -> Typeref {
        let h = Self::hash_ty(&ty);

        // Lock, notice that the order is critical, always lock first database first
        let mut array_lock = self.array.upgradable_read();
        let mut inverse_lookup_lock = self.inverse_lookup.upgradable_read();

        // Check if it exists in the inverse_lookup
        if let Some(typerefs) = inverse_lookup_lock.get(&h) {
            for typeref in typerefs {
                if array_lock.get(typeref) == Some(&ty) {
                    return Typeref(*typeref);
                }
            }
        }

        // NOTE: Ordering of upgrade is paramount to avoid deadlock
        array_lock.with_upgraded(|array_lock| {
            inverse_lookup_lock.with_upgraded(|inverse_lookup_lock| {
                let new_typeref = self.next_uuid();

                if let Some(list) = inverse_lookup_lock.get_mut(&h) {
                    info!(
                        "Detected an hash collision on hash 0x{:016x}. The following types collided:\n{}",
                        h,
                        list.iter()
                            .filter_map(|uuid| array_lock
                                .get(uuid)
                                .map(|elem| format!(" - {} -> {}", uuid, elem.internal_fmt(&*array_lock))))
                            .collect::<Vec<_>>()
                            .join("\n"),
                    );
                    list.push(new_typeref);
                } else {
                    debug!(
                        "New type encountered {}. Registered with UUID {}.",
                        ty.internal_fmt(&*array_lock),
                        new_typeref
                    );
                    inverse_lookup_lock.insert(h, smallvec![new_typeref]);
                }

                array_lock.insert(new_typeref, ty);
                Typeref(new_typeref)
            })
        })
    }

    /// Returns the [`Typeref`] of `typeref` with every tensor shape (and
    /// autograd refinement) erased, recursively through aggregates.
    ///
    /// Returns `typeref` itself when there is nothing to erase or when the
    /// type is unknown to this registry.
    pub fn unshaped(&self, typeref: Typeref) -> Typeref {
        let Some(ty) = self.get(typeref).map(|guard| guard.clone()) else {
            return typeref;
        };

        let rebuilt: AnyType = match ty {
            AnyType::Primary(PrimaryType::Tensor(tensor)) => {
                let unshaped = tensor.unshaped();
                if unshaped == tensor {
                    return typeref;
                }
                PrimaryType::Tensor(unshaped).into()
            }
            AnyType::List(list) => {
                let elem = self.unshaped(list.elem);
                if elem == list.elem {
                    return typeref;
                }
                ListType { elem }.into()
            }
            AnyType::Dict(dict) => {
                let key = self.unshaped(dict.key);
                let value = self.unshaped(dict.value);
                if key == dict.key && value == dict.value {
                    return typeref;
                }
                DictType { key, value }.into()
            }
            AnyType::Tuple(tuple) => {
                let elements: Vec<Typeref> =
                    tuple.elements.iter().map(|e| self.unshaped(*e)).collect();
                if elements == tuple.elements {
                    return typeref;
                }
                TupleType { elements }.into()
            }
            AnyType::Optional(optional) => {
                let elem = self.unshaped(optional.elem);
                if elem == optional.elem {
                    return typeref;
                }
                OptionalType { elem }.into()
            }
            // Nominal and scalar types carry no shape information.
            _ => return typeref,
        };

        self.search_or_insert(rebuilt)
    }

    /// `true` if `typeref` designates a function type.
    pub fn is_function(&self, typeref: Typeref) -> bool {
        matches!(self.get(typeref).as_deref(), Some(AnyType::Function(_)))
    }

    /// `true` if `typeref` designates an interface declared as a module
    /// interface.
    pub fn is_module_interface(&self, typeref: Typeref) -> bool {
        matches!(
            self.get(typeref).as_deref(),
            Some(AnyType::Interface(InterfaceType { is_module: true, .. }))
        )
    }

    /// Format a given `Typeref` using this registry.
    pub fn fmt(&self, typeref: Typeref) -> impl std::fmt::Display {
        struct Fmt<'a> {
            registry: &'a TypeRegistry,
            typeref: Typeref,
        }

        impl<'a> std::fmt::Display for Fmt<'a> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.registry.get(self.typeref) {
                    Some(ty_guard) => write!(f, "{}", ty_guard.fmt(self.registry)),
                    None => write!(f, "<unknown type {}>", self.typeref.0),
                }
            }
        }

        Fmt {
            registry: self,
            typeref,
        }
    }
}
