mod common;

use std::sync::Arc;

use cmtcore::{
    ConcreteTypeStore, DynError, DynObject, DynResult, DynValue, RawConcreteModuleType,
    ScriptContext,
};
use common::*;

#[derive(Debug)]
struct Incomparable;

impl DynObject for Incomparable {
    fn dyn_eq(&self, _other: &dyn DynObject) -> DynResult<bool> {
        Err(DynError::type_error("unsupported comparison"))
    }
}

#[test]
fn equal_instances_share_a_type() {
    let ctx = ScriptContext::with_default_config();
    let store = ConcreteTypeStore::new(ctx.clone());
    let linear = class("models", "Linear");

    let first = store.get_or_create(&leaf_raw(&ctx, &linear, 4)).unwrap();
    let second = store.get_or_create(&leaf_raw(&ctx, &linear, 4)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.len(), 1);
    assert_eq!(ctx.unit.classes.len(), 1);

    let third = store.get_or_create(&leaf_raw(&ctx, &linear, 8)).unwrap();
    assert_ne!(first.jit_type(), third.jit_type());
    assert_eq!(store.num_types_for(&linear), 2);
    assert_eq!(
        third.class_type().unwrap().name().to_string(),
        "__jit__.models.___jit_mangle_0.Linear"
    );
}

#[test]
fn classes_are_kept_apart() {
    let ctx = ScriptContext::with_default_config();
    let store = ConcreteTypeStore::new(ctx.clone());
    let a = class("models", "A");
    let b = class("models", "B");

    store.get_or_create(&leaf_raw(&ctx, &a, 1)).unwrap();
    store.get_or_create(&leaf_raw(&ctx, &b, 1)).unwrap();
    assert_eq!(store.num_types_for(&a), 1);
    assert_eq!(store.num_types_for(&b), 1);
    assert_eq!(store.num_types_for(&class("models", "C")), 0);
    assert_eq!(store.len(), 2);
}

#[test]
fn poisoned_instances_never_share() {
    let ctx = ScriptContext::with_default_config();
    let store = ConcreteTypeStore::new(ctx.clone());
    let traced = class("models", "Traced");

    let mut raw = leaf_raw(&ctx, &traced, 1);
    raw.set_poisoned();
    let first = store.get_or_create(&raw).unwrap();
    let second = store.get_or_create(&raw).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(store.num_types_for(&traced), 2);
}

#[test]
fn comparison_failures_leave_the_store_unchanged() {
    let ctx = ScriptContext::with_default_config();
    let store = ConcreteTypeStore::new(ctx.clone());
    let origin = class("models", "Masked");

    store.get_or_create(&leaf_raw(&ctx, &origin, 0)).unwrap();

    let mut raw = RawConcreteModuleType::new(ctx.clone(), origin.clone());
    raw.add_constant("x", DynValue::new(Incomparable));
    assert!(store.get_or_create(&raw).is_err());
    assert_eq!(store.len(), 1);
    assert_eq!(ctx.unit.classes.len(), 1);
}

#[test]
fn parents_reuse_shared_children() {
    let ctx = ScriptContext::with_default_config();
    let store = ConcreteTypeStore::new(ctx.clone());
    let parent = class("models", "Parent");
    let child = class("models", "Child");

    let build_parent = || {
        let left = store.get_or_create(&leaf_raw(&ctx, &child, 1)).unwrap();
        let right = store.get_or_create(&leaf_raw(&ctx, &child, 2)).unwrap();
        let mut raw = RawConcreteModuleType::new(ctx.clone(), parent.clone());
        raw.add_module("left", left);
        raw.add_module("right", right);
        store.get_or_create(&raw).unwrap()
    };

    let first = build_parent();
    let second = build_parent();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.num_types_for(&child), 2);
    assert_eq!(store.len(), 3);

    store.clear();
    assert!(store.is_empty());
}
