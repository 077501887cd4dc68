use std::{
    collections::{BTreeMap, btree_map::Entry},
    sync::Arc,
};

use cmtypes::Typeref;
use log::debug;

use crate::{
    concrete::{
        Attribute, ConcreteModuleType, ConcreteModuleTypeData, Constant, FunctionAttribute,
        IterableModuleKind, ModuleInfo, ModuleSlot,
    },
    context::ScriptContext,
    runtime::{self, DynValue},
    utils::error::CmtResult,
};

/// Builder for a [`ConcreteModuleType`].
///
/// Facts are append-only: the first value recorded under a name wins and
/// later ones are ignored. Keeping attribute and function attribute names
/// disjoint is the caller's responsibility.
pub struct RawConcreteModuleType {
    ctx: Arc<ScriptContext>,
    data: ConcreteModuleTypeData,
}

/// Insert `value` unless `name` is already present.
fn insert_first<V>(map: &mut BTreeMap<String, V>, kind: &str, name: String, value: V) {
    match map.entry(name) {
        Entry::Vacant(entry) => {
            entry.insert(value);
        }
        Entry::Occupied(entry) => {
            debug!("Ignoring duplicate {} `{}`.", kind, entry.key());
        }
    }
}

impl RawConcreteModuleType {
    pub fn new(ctx: Arc<ScriptContext>, origin_class: DynValue) -> Self {
        Self {
            ctx,
            data: ConcreteModuleTypeData::new(origin_class),
        }
    }

    pub fn context(&self) -> &Arc<ScriptContext> {
        &self.ctx
    }

    pub fn origin_class(&self) -> &DynValue {
        &self.data.origin_class
    }

    pub fn add_constant(&mut self, name: impl Into<String>, value: DynValue) {
        let _guard = runtime::lock();
        insert_first(&mut self.data.constants, "constant", name.into(), Constant(value));
    }

    /// Record a data slot of type `ty`. The type is stored unshaped.
    ///
    /// # Panics
    /// If `ty` is a function type (use [`Self::add_function_attribute`]) or is
    /// unknown to the context's type registry.
    pub fn add_attribute(&mut self, name: impl Into<String>, ty: Typeref, is_param: bool) {
        let types = &self.ctx.unit.types;
        assert!(
            types.get(ty).is_some(),
            "attribute type {:?} is not registered in this context",
            ty
        );
        assert!(
            !types.is_function(ty),
            "function attributes must be added with add_function_attribute"
        );

        let attribute = Attribute {
            ty: types.unshaped(ty),
            is_param,
        };
        insert_first(&mut self.data.attributes, "attribute", name.into(), attribute);
    }

    /// # Panics
    /// If `ty` is not a function type.
    pub fn add_function_attribute(
        &mut self,
        name: impl Into<String>,
        ty: Typeref,
        py_function: DynValue,
    ) {
        assert!(
            self.ctx.unit.types.is_function(ty),
            "expected a function type, got {}",
            self.ctx.unit.types.fmt(ty)
        );

        let _guard = runtime::lock();
        insert_first(
            &mut self.data.function_attributes,
            "function attribute",
            name.into(),
            FunctionAttribute {
                function: ty,
                py_function,
            },
        );
    }

    pub fn add_module(&mut self, name: impl Into<String>, concrete: Arc<ConcreteModuleType>) {
        self.data.modules.push(ModuleInfo {
            name: name.into(),
            slot: ModuleSlot::Concrete(concrete),
        });
    }

    /// Record a submodule slot declared with a module interface.
    ///
    /// # Panics
    /// If `ty` is not an interface type marked as a module interface.
    pub fn add_module_interface(&mut self, name: impl Into<String>, ty: Typeref) {
        assert!(
            self.ctx.unit.types.is_module_interface(ty),
            "expected a module interface type, got {}",
            self.ctx.unit.types.fmt(ty)
        );

        self.data.modules.push(ModuleInfo {
            name: name.into(),
            slot: ModuleSlot::Interface(ty),
        });
    }

    pub fn add_overload(&mut self, method_name: impl Into<String>, overloaded_names: Vec<String>) {
        insert_first(&mut self.data.overloads, "overload", method_name.into(), overloaded_names);
    }

    pub fn add_failed_attribute(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        insert_first(
            &mut self.data.failed_attributes,
            "failed attribute",
            name.into(),
            reason.into(),
        );
    }

    pub fn set_iterable_module_kind(&mut self, kind: IterableModuleKind) {
        self.data.iterable_kind = kind;
    }

    pub fn set_poisoned(&mut self) {
        self.data.poisoned = true;
    }

    /// Freeze a copy of the facts and mint a static type for them.
    ///
    /// Each call mints a new type; reuse goes through
    /// [`crate::store::ConcreteTypeStore`].
    pub fn build(&self) -> CmtResult<Arc<ConcreteModuleType>> {
        let _guard = runtime::lock();
        ConcreteModuleType::from_data(self.ctx.clone(), self.data.clone())
    }

    pub fn equals(&self, other: &RawConcreteModuleType) -> CmtResult<bool> {
        self.data.try_eq(&other.data)
    }

    pub fn equals_concrete(&self, other: &ConcreteModuleType) -> CmtResult<bool> {
        match other.data() {
            Some(data) => self.data.try_eq(data),
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for RawConcreteModuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawConcreteModuleType")
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use cmtypes::types::primary::{PrimaryType, ScalarKind, TensorType};

    use super::*;
    use crate::runtime::native::{ClassObject, NativeValue};

    #[test]
    fn first_value_wins() {
        let ctx = ScriptContext::with_default_config();
        let int = ctx.unit.types.search_or_insert(PrimaryType::Int.into());
        let float = ctx.unit.types.search_or_insert(PrimaryType::Float.into());

        let mut raw = RawConcreteModuleType::new(ctx, DynValue::new(ClassObject::new("m", "M")));
        raw.add_constant("x", DynValue::new(NativeValue::Int(1)));
        raw.add_constant("x", DynValue::new(NativeValue::Int(2)));
        raw.add_attribute("y", int, false);
        raw.add_attribute("y", float, true);

        let constant = &raw.data.constants["x"];
        assert!(constant.0.value_eq(&DynValue::new(NativeValue::Int(1))).unwrap());
        assert_eq!(raw.data.attributes["y"], Attribute { ty: int, is_param: false });
    }

    #[test]
    fn attributes_are_stored_unshaped() {
        let ctx = ScriptContext::with_default_config();
        let shaped = ctx.unit.types.search_or_insert(
            PrimaryType::Tensor(TensorType::of(ScalarKind::Float).with_shape([3, 4])).into(),
        );
        let bare = ctx
            .unit
            .types
            .search_or_insert(PrimaryType::Tensor(TensorType::default()).into());

        let mut raw = RawConcreteModuleType::new(ctx, DynValue::new(ClassObject::new("m", "M")));
        raw.add_attribute("weight", shaped, true);
        assert_eq!(raw.data.attributes["weight"].ty, bare);
    }
}
