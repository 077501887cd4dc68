//! Interning of concrete module types.
//!
//! The store remembers every descriptor it built, grouped by origin class.
//! A new builder is probed against the descriptors of its origin class and
//! reuses the first structurally equal one, so equal module instances end up
//! sharing one static type.
use std::{collections::BTreeMap, sync::Arc};

use log::debug;
use parking_lot::Mutex;

use crate::{
    concrete::{ConcreteModuleType, RawConcreteModuleType},
    context::ScriptContext,
    runtime::{self, DynObject, DynValue},
    utils::{error::CmtResult, ref_id::ArcRefId},
};

type ClassKey = ArcRefId<dyn DynObject>;

pub struct ConcreteTypeStore {
    ctx: Arc<ScriptContext>,
    types: Mutex<BTreeMap<ClassKey, Vec<Arc<ConcreteModuleType>>>>,
}

impl ConcreteTypeStore {
    pub fn new(ctx: Arc<ScriptContext>) -> Self {
        Self {
            ctx,
            types: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn context(&self) -> &Arc<ScriptContext> {
        &self.ctx
    }

    /// Descriptor for `raw`: an equal descriptor built earlier, or a new one.
    ///
    /// On error (a constant comparison failed, or minting failed) the store is
    /// left unchanged.
    pub fn get_or_create(&self, raw: &RawConcreteModuleType) -> CmtResult<Arc<ConcreteModuleType>> {
        // Lock order: runtime lock, then the table.
        let _guard = runtime::lock();
        let mut types = self.types.lock();
        let key = raw.origin_class().identity();

        if let Some(candidates) = types.get(&key) {
            for candidate in candidates {
                if raw.equals_concrete(candidate)? {
                    debug!(
                        "Reusing concrete type {} for {}.",
                        self.ctx.unit.types.fmt(candidate.jit_type()),
                        raw.origin_class().display_name()
                    );
                    return Ok(candidate.clone());
                }
            }
        }

        let concrete = raw.build()?;
        debug!(
            "No equal concrete type for {}, built {}.",
            raw.origin_class().display_name(),
            self.ctx.unit.types.fmt(concrete.jit_type())
        );
        types.entry(key).or_default().push(concrete.clone());
        Ok(concrete)
    }

    /// Number of descriptors held.
    pub fn len(&self) -> usize {
        self.types.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct descriptors held for `class`.
    pub fn num_types_for(&self, class: &DynValue) -> usize {
        self.types
            .lock()
            .get(&class.identity())
            .map_or(0, Vec::len)
    }

    pub fn clear(&self) {
        let _guard = runtime::lock();
        self.types.lock().clear();
    }
}
