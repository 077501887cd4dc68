//! Python objects as dynamic values.
//!
//! Every method attaches to the interpreter for its duration. Callers take the
//! runtime lock first (see [`DynValue`] methods), so the lock order is always
//! runtime lock, then interpreter.
use pyo3::{intern, prelude::*};

use crate::runtime::{DynError, DynObject, DynResult, DynValue};

/// A Python object.
pub struct PyValue(Py<PyAny>);

impl PyValue {
    pub fn new(object: Py<PyAny>) -> Self {
        Self(object)
    }

    /// Wrap a bound Python object into a [`DynValue`].
    pub fn wrap(object: &Bound<'_, PyAny>) -> DynValue {
        DynValue::new(Self(object.clone().unbind()))
    }

    pub fn object(&self) -> &Py<PyAny> {
        &self.0
    }
}

pub(crate) fn to_dyn_error(py: Python<'_>, err: PyErr) -> DynError {
    let kind = err
        .get_type(py)
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|_| "Exception".to_string());
    DynError::new(kind, err.value(py).to_string())
}

impl std::fmt::Debug for PyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PyValue({})", self.repr())
    }
}

impl DynObject for PyValue {
    fn dyn_eq(&self, other: &dyn DynObject) -> DynResult<bool> {
        let Some(other) = other.downcast_ref::<PyValue>() else {
            return Ok(false);
        };

        Python::attach(|py| {
            self.0
                .bind(py)
                .eq(other.0.bind(py))
                .map_err(|err| to_dyn_error(py, err))
        })
    }

    fn repr(&self) -> String {
        Python::attach(|py| {
            self.0
                .bind(py)
                .repr()
                .map(|repr| repr.to_string())
                .unwrap_or_else(|_| "<unrepresentable object>".to_string())
        })
    }

    fn qualified_name(&self) -> DynResult<String> {
        Python::attach(|py| {
            let object = self.0.bind(py);
            let lookup = || -> PyResult<String> {
                let module: String = object.getattr(intern!(py, "__module__"))?.extract()?;
                let qualname: String = object.getattr(intern!(py, "__qualname__"))?.extract()?;
                if module == "__main__" || module == "builtins" {
                    Ok(qualname)
                } else {
                    Ok(format!("{}.{}", module, qualname))
                }
            };
            lookup().map_err(|err| to_dyn_error(py, err))
        })
    }

    fn display_name(&self) -> String {
        Python::attach(|py| {
            self.0
                .bind(py)
                .getattr(intern!(py, "__name__"))
                .and_then(|name| name.extract::<String>())
                .unwrap_or_else(|_| self.repr())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_equality_and_failures() {
        let eval = |code: &std::ffi::CStr| {
            Python::attach(|py| PyValue::wrap(&py.eval(code, None, None).unwrap()))
        };

        let five = eval(c"5");
        assert!(five.value_eq(&eval(c"5.0")).unwrap());
        assert!(!five.value_eq(&eval(c"6")).unwrap());

        let bad = eval(c"type('Bad', (), {'__eq__': lambda self, other: 1 // 0})()");
        let err = bad.value_eq(&five).unwrap_err();
        assert_eq!(err.kind, "ZeroDivisionError");

        let class = eval(c"type('Encoder', (), {})");
        assert_eq!(class.display_name(), "Encoder");
        assert!(class.qualified_name().unwrap().ends_with("Encoder"));
    }
}
