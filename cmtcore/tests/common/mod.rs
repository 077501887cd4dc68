#![allow(dead_code)]

use std::sync::Arc;

use cmtcore::{
    ConcreteModuleType, DynValue, RawConcreteModuleType, ScriptContext,
    cmtypes::{
        Typeref,
        types::{
            nominal::{FunctionType, InterfaceType},
            primary::{PrimaryType, ScalarKind, TensorType},
        },
    },
    runtime::native::{ClassObject, FunctionObject, NativeValue},
};

pub fn class(module: &str, qualname: &str) -> DynValue {
    DynValue::new(ClassObject::new(module, qualname))
}

pub fn function(qualname: &str) -> DynValue {
    DynValue::new(FunctionObject::new(qualname))
}

pub fn int_value(i: i64) -> DynValue {
    DynValue::new(NativeValue::Int(i))
}

pub fn int_type(ctx: &ScriptContext) -> Typeref {
    ctx.unit.types.search_or_insert(PrimaryType::Int.into())
}

pub fn float_tensor(ctx: &ScriptContext, shape: &[u64]) -> Typeref {
    let tensor = TensorType::of(ScalarKind::Float).with_shape(shape.iter().copied());
    ctx.unit.types.search_or_insert(PrimaryType::Tensor(tensor).into())
}

pub fn function_type(ctx: &ScriptContext, name: &str) -> Typeref {
    ctx.unit.types.search_or_insert(
        FunctionType {
            name: name.parse().unwrap(),
        }
        .into(),
    )
}

pub fn module_interface(ctx: &ScriptContext, name: &str) -> Typeref {
    ctx.unit
        .types
        .search_or_insert(InterfaceType::new(name.parse().unwrap(), true, ["forward"]).into())
}

/// Builder for a module of class `class` holding a single constant `x`.
pub fn leaf_raw(ctx: &Arc<ScriptContext>, class: &DynValue, x: i64) -> RawConcreteModuleType {
    let mut raw = RawConcreteModuleType::new(ctx.clone(), class.clone());
    raw.add_constant("x", int_value(x));
    raw
}

pub fn leaf(ctx: &Arc<ScriptContext>, class: &DynValue, x: i64) -> Arc<ConcreteModuleType> {
    leaf_raw(ctx, class, x).build().unwrap()
}
