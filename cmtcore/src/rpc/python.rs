//! [`RpcInternals`] backed by functions of a Python module.
use pyo3::{
    prelude::*,
    types::{PyBytes, PyList},
};

use crate::{
    rpc::{RpcInternals, SerializedObj},
    runtime::{
        DynError, DynResult, DynValue,
        python::{PyValue, to_dyn_error},
    },
};

/// The Python module holding the RPC entry points.
pub const DEFAULT_RPC_MODULE: &str = "torch.distributed.rpc.internal";

pub struct PyRpcInternals {
    run_function: Py<PyAny>,
    load_return_value: Py<PyAny>,
    serialize: Py<PyAny>,
    handle_exception: Py<PyAny>,
}

fn get_function(module: &Bound<'_, PyModule>, name: &str) -> DynResult<Py<PyAny>> {
    let py = module.py();
    let function = module.getattr(name).map_err(|err| to_dyn_error(py, err))?;
    if !function.is_callable() {
        return Err(DynError::type_error(format!(
            "attribute {} is not a function",
            name
        )));
    }
    Ok(function.unbind())
}

fn to_py_object(py: Python<'_>, value: &DynValue) -> DynResult<Py<PyAny>> {
    value
        .downcast_ref::<PyValue>()
        .map(|value| value.object().clone_ref(py))
        .ok_or_else(|| {
            DynError::type_error(format!("{} is not a Python object", value.as_object().repr()))
        })
}

fn tensor_list<'py>(py: Python<'py>, tensors: &[DynValue]) -> DynResult<Bound<'py, PyList>> {
    let objects = tensors
        .iter()
        .map(|tensor| to_py_object(py, tensor))
        .collect::<DynResult<Vec<_>>>()?;
    PyList::new(py, objects).map_err(|err| to_dyn_error(py, err))
}

impl PyRpcInternals {
    /// Look up `_run_function`, `_load_return_value`, `serialize` and
    /// `_handle_exception` in `module_name`.
    pub fn import(module_name: &str) -> DynResult<Self> {
        Python::attach(|py| {
            let module = PyModule::import(py, module_name).map_err(|err| to_dyn_error(py, err))?;
            Ok(Self {
                run_function: get_function(&module, "_run_function")?,
                load_return_value: get_function(&module, "_load_return_value")?,
                serialize: get_function(&module, "serialize")?,
                handle_exception: get_function(&module, "_handle_exception")?,
            })
        })
    }

    fn call_with_payload(
        &self,
        function: &Py<PyAny>,
        payload: &[u8],
        tensors: &[DynValue],
    ) -> DynResult<DynValue> {
        Python::attach(|py| {
            let tensors = tensor_list(py, tensors)?;
            let result = function
                .bind(py)
                .call1((PyBytes::new(py, payload), tensors))
                .map_err(|err| to_dyn_error(py, err))?;
            Ok(PyValue::wrap(&result))
        })
    }
}

impl RpcInternals for PyRpcInternals {
    fn run_function(&self, payload: &[u8], tensors: &[DynValue]) -> DynResult<DynValue> {
        self.call_with_payload(&self.run_function, payload, tensors)
    }

    fn load_return_value(&self, payload: &[u8], tensors: &[DynValue]) -> DynResult<DynValue> {
        self.call_with_payload(&self.load_return_value, payload, tensors)
    }

    fn serialize(&self, value: &DynValue) -> DynResult<SerializedObj> {
        Python::attach(|py| {
            let object = to_py_object(py, value)?;
            let unpack = || -> PyResult<SerializedObj> {
                let pair = self.serialize.bind(py).call1((object,))?;
                let payload: Vec<u8> = pair.get_item(0)?.extract()?;
                let tensors = pair
                    .get_item(1)?
                    .try_iter()?
                    .map(|tensor| tensor.map(|tensor| PyValue::wrap(&tensor)))
                    .collect::<PyResult<Vec<_>>>()?;
                Ok(SerializedObj::new(payload, tensors))
            };
            unpack().map_err(|err| to_dyn_error(py, err))
        })
    }

    fn handle_exception(&self, value: &DynValue) -> DynResult<()> {
        Python::attach(|py| {
            let object = to_py_object(py, value)?;
            self.handle_exception
                .bind(py)
                .call1((object,))
                .map(|_| ())
                .map_err(|err| to_dyn_error(py, err))
        })
    }
}
