//! Concrete module types.
//!
//! Decides when instances of dynamic module classes can share a static type.
//! Embedders describe each module instance with a
//! [`concrete::RawConcreteModuleType`], then either build it directly or go
//! through a [`store::ConcreteTypeStore`] that reuses the descriptor of an
//! earlier, structurally equal instance.
//!
//! All interaction with dynamic values happens through [`runtime`], under the
//! global runtime lock.

pub mod concrete;
pub mod context;
pub mod magic;
pub mod rpc;
pub mod runtime;
pub mod store;
pub mod utils;

pub use concrete::{
    Attribute, ConcreteModuleType, IterableModuleKind, ModuleInfo, ModuleSlot,
    RawConcreteModuleType,
};
pub use context::ScriptContext;
pub use runtime::{DynError, DynObject, DynResult, DynValue};
pub use store::ConcreteTypeStore;
pub use utils::{
    conf::CmtConfig,
    error::{CmtError, CmtResult},
};

pub extern crate cmtypes;
