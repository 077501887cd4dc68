//! Marshaling of remote procedure calls.
//!
//! Requests and responses travel as a [`SerializedObj`]: an opaque payload plus
//! a side table of tensors. The actual (de)serialization and function
//! invocation live in the dynamic runtime and are reached through
//! [`RpcInternals`]; [`RpcHandler`] only forwards to them under the runtime
//! lock.
use std::sync::Arc;

use log::{debug, info};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::{
    runtime::{self, DynResult, DynValue},
    utils::error::{CmtError, CmtResult},
};

#[cfg(feature = "pyo3")]
pub mod python;

/// A serialized value: payload bytes and the tensors referenced by it.
#[derive(Debug, Clone, Default)]
pub struct SerializedObj {
    pub payload: Vec<u8>,
    pub tensors: Vec<DynValue>,
}

impl SerializedObj {
    pub fn new(payload: Vec<u8>, tensors: Vec<DynValue>) -> Self {
        Self { payload, tensors }
    }
}

/// Runtime-side entry points used by [`RpcHandler`].
pub trait RpcInternals: Send + Sync {
    /// Deserialize a call from `payload` and run it.
    fn run_function(&self, payload: &[u8], tensors: &[DynValue]) -> DynResult<DynValue>;

    /// Deserialize a return value.
    fn load_return_value(&self, payload: &[u8], tensors: &[DynValue]) -> DynResult<DynValue>;

    fn serialize(&self, value: &DynValue) -> DynResult<SerializedObj>;

    /// Re-raise a remote exception carried by `value`.
    fn handle_exception(&self, value: &DynValue) -> DynResult<()>;
}

pub struct RpcHandler {
    internals: RwLock<Option<Arc<dyn RpcInternals>>>,
}

static INSTANCE: OnceCell<RpcHandler> = OnceCell::new();

impl RpcHandler {
    pub fn new(internals: Arc<dyn RpcInternals>) -> Self {
        Self {
            internals: RwLock::new(Some(internals)),
        }
    }

    /// Install the process-wide handler. Only the first installation takes
    /// effect; the installed handler is returned either way.
    pub fn install(internals: Arc<dyn RpcInternals>) -> &'static RpcHandler {
        let mut installed = false;
        let handler = INSTANCE.get_or_init(|| {
            installed = true;
            Self::new(internals)
        });
        if installed {
            info!("Installed the process-wide RPC handler.");
        } else {
            debug!("An RPC handler is already installed, keeping it.");
        }
        handler
    }

    pub fn instance() -> CmtResult<&'static RpcHandler> {
        INSTANCE.get().ok_or(CmtError::RpcHandlerMissing)
    }

    fn internals(&self) -> CmtResult<Arc<dyn RpcInternals>> {
        self.internals
            .read()
            .clone()
            .ok_or(CmtError::RpcHandlerReleased)
    }

    /// Run the call in `payload` and serialize its result.
    pub fn generate_python_udf_result(
        &self,
        payload: &[u8],
        request_tensors: &[DynValue],
    ) -> CmtResult<SerializedObj> {
        let _guard = runtime::lock();
        let internals = self.internals()?;
        let result = internals.run_function(payload, request_tensors)?;
        Ok(internals.serialize(&result)?)
    }

    pub fn load_python_udf_result(&self, payload: &[u8], tensors: &[DynValue]) -> CmtResult<DynValue> {
        let _guard = runtime::lock();
        Ok(self.internals()?.load_return_value(payload, tensors)?)
    }

    pub fn run_python_udf(&self, request: &SerializedObj) -> CmtResult<DynValue> {
        let _guard = runtime::lock();
        Ok(self
            .internals()?
            .run_function(&request.payload, &request.tensors)?)
    }

    pub fn serialize(&self, value: &DynValue) -> CmtResult<SerializedObj> {
        let _guard = runtime::lock();
        Ok(self.internals()?.serialize(value)?)
    }

    pub fn deserialize(&self, serialized: &SerializedObj) -> CmtResult<DynValue> {
        let _guard = runtime::lock();
        Ok(self
            .internals()?
            .load_return_value(&serialized.payload, &serialized.tensors)?)
    }

    pub fn handle_exception(&self, value: &DynValue) -> CmtResult<()> {
        let _guard = runtime::lock();
        Ok(self.internals()?.handle_exception(value)?)
    }

    /// Drop the runtime entry points. Every later call fails with
    /// [`CmtError::RpcHandlerReleased`].
    pub fn cleanup(&self) {
        let _guard = runtime::lock();
        if self.internals.write().take().is_some() {
            debug!("Released the RPC handler's runtime entry points.");
        }
    }

    pub fn is_released(&self) -> bool {
        self.internals.read().is_none()
    }
}
