use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use cmtcore::{
    ConcreteModuleType, ConcreteTypeStore, DynValue, RawConcreteModuleType, ScriptContext,
    cmtypes::types::primary::{PrimaryType, ScalarKind, TensorType},
    runtime::native::{ClassObject, NativeValue},
};
use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha20Rng;

struct Fixture {
    ctx: Arc<ScriptContext>,
    parent: DynValue,
    children: Vec<(String, Arc<ConcreteModuleType>)>,
}

/// A parent module with `width` leaf submodules, each carrying a few
/// constants and a shaped tensor attribute. Seeded for determinism.
fn fixture(width: usize) -> Fixture {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    let ctx = ScriptContext::with_default_config();
    let leaf_class = DynValue::new(ClassObject::new("bench", "Linear"));

    let children = (0..width)
        .map(|i| {
            let mut raw = RawConcreteModuleType::new(ctx.clone(), leaf_class.clone());
            for c in 0..4 {
                raw.add_constant(
                    format!("c{}", c),
                    DynValue::new(NativeValue::Int(rng.random_range(0..3))),
                );
            }
            let shape = [rng.random_range(1..64), rng.random_range(1..64)];
            let weight = ctx.unit.types.search_or_insert(
                PrimaryType::Tensor(TensorType::of(ScalarKind::Float).with_shape(shape)).into(),
            );
            raw.add_attribute("weight", weight, true);
            (format!("layer{}", i), raw.build().unwrap())
        })
        .collect();

    Fixture {
        ctx,
        parent: DynValue::new(ClassObject::new("bench", "Sequential")),
        children,
    }
}

fn parent_raw(fixture: &Fixture, rng: &mut impl Rng) -> RawConcreteModuleType {
    let mut order = fixture.children.clone();
    order.shuffle(rng);

    let mut raw = RawConcreteModuleType::new(fixture.ctx.clone(), fixture.parent.clone());
    for (name, concrete) in order {
        raw.add_module(name, concrete);
    }
    raw
}

fn bench_equality(c: &mut Criterion) {
    let fixture = fixture(32);
    let mut rng = ChaCha20Rng::seed_from_u64(0x7);
    let lhs = parent_raw(&fixture, &mut rng);
    let rhs = parent_raw(&fixture, &mut rng);

    c.bench_function("raw_equals_shuffled_32", |b| {
        b.iter(|| black_box(lhs.equals(black_box(&rhs)).unwrap()));
    });

    let built = rhs.build().unwrap();
    c.bench_function("raw_equals_concrete_32", |b| {
        b.iter(|| black_box(lhs.equals_concrete(black_box(&built)).unwrap()));
    });
}

fn bench_store(c: &mut Criterion) {
    let fixture = fixture(32);
    let store = ConcreteTypeStore::new(fixture.ctx.clone());
    let mut rng = ChaCha20Rng::seed_from_u64(0x9);
    let raw = parent_raw(&fixture, &mut rng);
    store.get_or_create(&raw).unwrap();

    c.bench_function("store_hit_32", |b| {
        b.iter(|| black_box(store.get_or_create(black_box(&raw)).unwrap()));
    });
}

criterion_group!(benches, bench_equality, bench_store);
criterion_main!(benches);
