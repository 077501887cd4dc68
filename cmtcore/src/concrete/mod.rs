//! Concrete module types.
//!
//! A dynamic module class is a template for a family of static types: the
//! template "arguments" are its constant values, attribute types, submodule
//! types and so on. A concrete module type is one member of that family with
//! every argument fixed. Two module instances that share a concrete module
//! type can share a static type (and therefore compiled methods); instances
//! that differ in any argument cannot.
//!
//! Concrete module types have two phases:
//! 1. Creation: facts are accumulated in a [`RawConcreteModuleType`] while the
//!    module instance is converted.
//! 2. Querying: [`RawConcreteModuleType::build`] freezes the facts into a
//!    [`ConcreteModuleType`], which mints the static type and then serves
//!    attribute lookups during method compilation.
//!
//! Both phases share [`ConcreteModuleTypeData`] and its structural equality.
use std::{collections::BTreeMap, sync::Arc};

use cmtypes::Typeref;
use log::trace;
use strum::{Display, EnumIs};

use crate::{
    runtime::{self, DynValue},
    utils::error::CmtResult,
};

pub mod finalized;
pub mod raw;

pub use finalized::ConcreteModuleType;
pub use raw::RawConcreteModuleType;

/// Whether a module is a list-like or dict-like container of submodules.
///
/// For container modules the compiler may iterate the submodules, so their
/// order becomes meaningful to compiled code.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIs)]
pub enum IterableModuleKind {
    #[default]
    #[strum(serialize = "none")]
    None,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "dict")]
    Dict,
}

/// A constant value, compared with the runtime's `==`.
#[derive(Debug, Clone)]
pub struct Constant(pub DynValue);

impl Constant {
    pub fn try_eq(&self, other: &Self) -> CmtResult<bool> {
        Ok(self.0.value_eq(&other.0)?)
    }
}

/// A typed data slot.
///
/// `ty` is stored unshaped, so two attributes holding tensors of different
/// shapes compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub ty: Typeref,
    pub is_param: bool,
}

/// A function bound as a module attribute.
///
/// Function types are not comparable structurally, so equality is identity of
/// the underlying dynamic function object.
#[derive(Debug, Clone)]
pub struct FunctionAttribute {
    pub function: Typeref,
    pub py_function: DynValue,
}

impl FunctionAttribute {
    pub fn try_eq(&self, other: &Self) -> bool {
        self.py_function.is(&other.py_function)
    }
}

/// What a submodule slot holds: the concrete type of an actual submodule, or
/// a declared module interface.
#[derive(Debug, Clone)]
pub enum ModuleSlot {
    Concrete(Arc<ConcreteModuleType>),
    Interface(Typeref),
}

#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub name: String,
    pub slot: ModuleSlot,
}

impl ModuleInfo {
    /// Static type of the slot.
    pub fn jit_type(&self) -> Typeref {
        match &self.slot {
            ModuleSlot::Concrete(concrete) => concrete.jit_type(),
            ModuleSlot::Interface(interface) => *interface,
        }
    }

    pub fn concrete_type(&self) -> Option<&Arc<ConcreteModuleType>> {
        match &self.slot {
            ModuleSlot::Concrete(concrete) => Some(concrete),
            ModuleSlot::Interface(_) => None,
        }
    }

    pub fn try_eq(&self, other: &Self) -> CmtResult<bool> {
        if self.name != other.name {
            return Ok(false);
        }

        match (&self.slot, &other.slot) {
            (ModuleSlot::Concrete(lhs), ModuleSlot::Concrete(rhs)) => lhs.equals(rhs),
            (ModuleSlot::Interface(lhs), ModuleSlot::Interface(rhs)) => Ok(lhs == rhs),
            _ => Ok(false),
        }
    }
}

/// The facts that decide whether two module instances can share a type.
///
/// NOTE: any field added here must be accounted for in [`Self::try_eq`].
#[derive(Debug, Clone)]
pub struct ConcreteModuleTypeData {
    /// The dynamic class the module instance was created from.
    pub(crate) origin_class: DynValue,

    /// Never compare equal to anything, including itself (e.g. traced
    /// modules).
    pub(crate) poisoned: bool,

    pub(crate) constants: BTreeMap<String, Constant>,
    pub(crate) attributes: BTreeMap<String, Attribute>,

    /// Method name to overload names.
    pub(crate) overloads: BTreeMap<String, Vec<String>>,

    /// Attributes that could not be converted, with a hint as to why.
    /// Diagnostic only.
    pub(crate) failed_attributes: BTreeMap<String, String>,

    pub(crate) function_attributes: BTreeMap<String, FunctionAttribute>,

    /// Submodules in insertion order, which keeps compilation deterministic.
    pub(crate) modules: Vec<ModuleInfo>,

    pub(crate) iterable_kind: IterableModuleKind,
}

impl ConcreteModuleTypeData {
    pub(crate) fn new(origin_class: DynValue) -> Self {
        Self {
            origin_class,
            poisoned: false,
            constants: BTreeMap::new(),
            attributes: BTreeMap::new(),
            overloads: BTreeMap::new(),
            failed_attributes: BTreeMap::new(),
            function_attributes: BTreeMap::new(),
            modules: Vec::new(),
            iterable_kind: IterableModuleKind::None,
        }
    }

    /// Structural equality.
    ///
    /// Checks run from cheapest and most discriminating to most expensive.
    /// Failed attributes do not take part. Errors raised while comparing
    /// constants are propagated.
    pub(crate) fn try_eq(&self, other: &Self) -> CmtResult<bool> {
        if self.poisoned || other.poisoned {
            trace!("Concrete types differ: poisoned.");
            return Ok(false);
        }

        let _guard = runtime::lock();

        if !self.origin_class.is(&other.origin_class) {
            return Ok(mismatch("origin class"));
        }
        if self.iterable_kind != other.iterable_kind {
            return Ok(mismatch("iterable module kind"));
        }
        if !map_eq(&self.constants, &other.constants, Constant::try_eq)? {
            return Ok(mismatch("constants"));
        }
        if !map_eq(&self.attributes, &other.attributes, |l, r| Ok(l == r))? {
            return Ok(mismatch("attributes"));
        }
        if !map_eq(&self.overloads, &other.overloads, |l, r| Ok(l == r))? {
            return Ok(mismatch("overloads"));
        }
        if !map_eq(&self.function_attributes, &other.function_attributes, |l, r| {
            Ok(l.try_eq(r))
        })? {
            return Ok(mismatch("function attributes"));
        }

        // Insertion order does not matter for equality.
        if self.modules.len() != other.modules.len() {
            return Ok(mismatch("submodules"));
        }
        let lhs_sorted = sorted_by_name(&self.modules);
        let rhs_sorted = sorted_by_name(&other.modules);
        for (lhs, rhs) in lhs_sorted.into_iter().zip(rhs_sorted) {
            if !lhs.try_eq(rhs)? {
                return Ok(mismatch("submodules"));
            }
        }

        Ok(true)
    }
}

fn mismatch(field: &str) -> bool {
    trace!("Concrete types differ: {}.", field);
    false
}

/// Order-independent map equality: same key set, pairwise equal values.
fn map_eq<V>(
    lhs: &BTreeMap<String, V>,
    rhs: &BTreeMap<String, V>,
    mut eq: impl FnMut(&V, &V) -> CmtResult<bool>,
) -> CmtResult<bool> {
    if lhs.len() != rhs.len() {
        return Ok(false);
    }
    for (name, l) in lhs {
        let Some(r) = rhs.get(name) else {
            return Ok(false);
        };
        if !eq(l, r)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Stable sort of a borrowed copy; the stored order is left untouched.
fn sorted_by_name(modules: &[ModuleInfo]) -> Vec<&ModuleInfo> {
    let mut sorted: Vec<&ModuleInfo> = modules.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{
        DynError, DynObject, DynResult,
        native::{ClassObject, NativeValue},
    };

    #[derive(Debug)]
    struct Unorderable;

    impl DynObject for Unorderable {
        fn dyn_eq(&self, _other: &dyn DynObject) -> DynResult<bool> {
            Err(DynError::new("RuntimeError", "cannot compare"))
        }
    }

    fn int(i: i64) -> DynValue {
        DynValue::new(NativeValue::Int(i))
    }

    #[test]
    fn map_eq_ignores_insertion_order() {
        let mut a = BTreeMap::new();
        a.insert("x".to_string(), 1);
        a.insert("y".to_string(), 2);
        let mut b = BTreeMap::new();
        b.insert("y".to_string(), 2);
        b.insert("x".to_string(), 1);
        assert!(map_eq(&a, &b, |l, r| Ok(l == r)).unwrap());

        b.insert("z".to_string(), 3);
        assert!(!map_eq(&a, &b, |l, r| Ok(l == r)).unwrap());
    }

    #[test]
    fn constants_use_value_equality() {
        let class = DynValue::new(ClassObject::new("m", "M"));
        let mut lhs = ConcreteModuleTypeData::new(class.clone());
        let mut rhs = ConcreteModuleTypeData::new(class);
        lhs.constants.insert("x".into(), Constant(int(5)));
        rhs.constants.insert("x".into(), Constant(DynValue::new(NativeValue::Float(5.0))));
        assert!(lhs.try_eq(&rhs).unwrap());
    }

    #[test]
    fn constant_comparison_errors_propagate() {
        let class = DynValue::new(ClassObject::new("m", "M"));
        let mut lhs = ConcreteModuleTypeData::new(class.clone());
        let mut rhs = ConcreteModuleTypeData::new(class);
        lhs.constants.insert("x".into(), Constant(DynValue::new(Unorderable)));
        rhs.constants.insert("x".into(), Constant(int(1)));
        assert!(lhs.try_eq(&rhs).is_err());
    }

    #[test]
    fn poison_short_circuits_before_comparing_constants() {
        let class = DynValue::new(ClassObject::new("m", "M"));
        let mut lhs = ConcreteModuleTypeData::new(class.clone());
        lhs.constants.insert("x".into(), Constant(DynValue::new(Unorderable)));
        lhs.poisoned = true;
        let rhs = lhs.clone();
        assert!(!lhs.try_eq(&rhs).unwrap());
    }

    #[test]
    fn failed_attributes_do_not_participate() {
        let class = DynValue::new(ClassObject::new("m", "M"));
        let mut lhs = ConcreteModuleTypeData::new(class.clone());
        let rhs = ConcreteModuleTypeData::new(class);
        lhs.failed_attributes
            .insert("cache".into(), "unsupported type dict[object, object]".into());
        assert!(lhs.try_eq(&rhs).unwrap());
    }

    #[test]
    fn iterable_kind_participates() {
        let class = DynValue::new(ClassObject::new("m", "M"));
        let lhs = ConcreteModuleTypeData::new(class.clone());
        let mut rhs = ConcreteModuleTypeData::new(class);
        rhs.iterable_kind = IterableModuleKind::List;
        assert!(!lhs.try_eq(&rhs).unwrap());
        assert_eq!(rhs.iterable_kind.to_string(), "list");
    }
}
