//! CPython as an [`EmbeddedRuntime`].
//!
//! Exclusive entry is the GIL. Protocol records cross as JSON: `json.loads`
//! produces a `dict`, which is handed to the message class of the same name
//! when a message module is configured. Raw payloads become `bytes` of the
//! exact length, NUL bytes included.

use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict, PyModule, PyTuple};

use taskbridge_executor::EmbeddedRuntime;

/// The interpreter seen through the bridge.
#[derive(Default)]
pub struct PythonRuntime {
    message_module: Option<Py<PyModule>>,
}

impl PythonRuntime {
    /// Records become plain `dict`s.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records become instances of `module.<TypeName>(**fields)`.
    pub fn with_message_module(py: Python<'_>, module: &str) -> PyResult<Self> {
        let module = py.import(module)?;
        Ok(Self {
            message_module: Some(module.unbind()),
        })
    }

    pub fn has_message_module(&self) -> bool {
        self.message_module.is_some()
    }
}

/// Encode any JSON-able object, falling back to `vars()` for plain classes.
pub(crate) fn py_to_json(py: Python<'_>, obj: &PyObject) -> PyResult<String> {
    let json_mod = py.import("json")?;
    let kwargs = PyDict::new(py);
    kwargs.set_item("default", py.import("builtins")?.getattr("vars")?)?;
    json_mod
        .call_method("dumps", (obj,), Some(&kwargs))?
        .extract()
}

impl EmbeddedRuntime for PythonRuntime {
    type Scope<'s> = Python<'s>;
    type Object = PyObject;
    type Error = PyErr;

    fn exclusive<T, F>(&self, f: F) -> T
    where
        F: for<'s> FnOnce(Self::Scope<'s>) -> T,
    {
        Python::with_gil(|py| f(py))
    }

    fn decode_message(
        &self,
        py: Python<'_>,
        type_name: &str,
        json: &str,
    ) -> PyResult<PyObject> {
        let fields = py.import("json")?.call_method1("loads", (json,))?;
        let Some(module) = &self.message_module else {
            return Ok(fields.unbind());
        };
        let class = module.bind(py).getattr(type_name)?;
        let kwargs = fields.downcast_into::<PyDict>()?;
        Ok(class.call((), Some(&kwargs))?.unbind())
    }

    fn encode_message(&self, py: Python<'_>, object: &PyObject) -> PyResult<String> {
        py_to_json(py, object)
    }

    fn bytes(&self, py: Python<'_>, data: &[u8]) -> PyResult<PyObject> {
        Ok(PyBytes::new(py, data).into_any().unbind())
    }

    fn method(&self, py: Python<'_>, target: &PyObject, name: &str) -> PyResult<PyObject> {
        target.bind(py).getattr(name).map(Bound::unbind)
    }

    fn call(&self, py: Python<'_>, callable: &PyObject, args: &[&PyObject]) -> PyResult<PyObject> {
        let args = PyTuple::new(py, args.iter().map(|arg| arg.bind(py)))?;
        callable.bind(py).call1(args).map(Bound::unbind)
    }

    fn print_error(&self, py: Python<'_>, error: PyErr) {
        // PyErr_Display rather than PyErr_Print: a SystemExit raised by the
        // handler must not terminate the driver's process.
        error.display(py);
    }
}
