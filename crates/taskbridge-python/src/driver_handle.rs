//! The bridge identity as seen from Python.
//!
//! Every handler method receives this object as its first argument and uses
//! it to reply through the native driver:
//!
//! ```python
//! class MyExecutor:
//!     def launchTask(self, driver, task):
//!         driver.sendStatusUpdate({"task_id": task["task_id"], "state": "TASK_RUNNING"})
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use taskbridge_executor::{BridgeFault, DriverStatus, ExecutorDriver, PayloadConverter, TaskStatus};

use crate::runtime::PythonRuntime;

/// Late-bound slot for the native driver.
///
/// The driver is usually constructed with the bridge as its executor, so the
/// identity exists before the driver does and is attached afterwards.
#[derive(Default)]
pub struct DriverSlot {
    driver: RwLock<Option<Arc<dyn ExecutorDriver>>>,
}

impl DriverSlot {
    pub fn attach(&self, driver: Arc<dyn ExecutorDriver>) {
        *self.driver.write() = Some(driver);
    }

    pub fn detach(&self) -> Option<Arc<dyn ExecutorDriver>> {
        self.driver.write().take()
    }

    pub fn get(&self) -> Option<Arc<dyn ExecutorDriver>> {
        self.driver.read().clone()
    }
}

/// Python-facing handle on the executor driver.
#[pyclass(name = "ExecutorDriver", module = "taskbridge._native", frozen)]
pub struct PyDriverHandle {
    slot: Arc<DriverSlot>,
}

impl PyDriverHandle {
    pub fn new(slot: Arc<DriverSlot>) -> Self {
        Self { slot }
    }

    fn driver(&self) -> PyResult<Arc<dyn ExecutorDriver>> {
        self.slot
            .get()
            .ok_or_else(|| PyRuntimeError::new_err("executor driver is not attached"))
    }

    /// Run a driver call with the GIL released.
    fn with_driver<F>(&self, py: Python<'_>, f: F) -> PyResult<&'static str>
    where
        F: FnOnce(&dyn ExecutorDriver) -> DriverStatus + Send,
    {
        let driver = self.driver()?;
        let status = py.allow_threads(move || f(driver.as_ref()));
        Ok(status.as_str())
    }
}

fn fault_to_py(fault: BridgeFault<PyErr>) -> PyErr {
    let message = fault.to_string();
    fault
        .into_runtime_error()
        .unwrap_or_else(|| PyValueError::new_err(message))
}

#[pymethods]
impl PyDriverHandle {
    /// Send a `TaskStatus` (a dict or a message object) to the driver.
    #[pyo3(name = "sendStatusUpdate")]
    fn send_status_update(&self, py: Python<'_>, status: PyObject) -> PyResult<&'static str> {
        let runtime = PythonRuntime::new();
        let status: TaskStatus = PayloadConverter::new(&runtime)
            .to_native(py, &status)
            .map_err(fault_to_py)?;
        tracing::debug!(
            task_id = %status.task_id.value,
            state = ?status.state,
            terminal = status.state.is_terminal(),
            "status update from handler"
        );
        self.with_driver(py, move |driver| driver.send_status_update(&status))
    }

    #[pyo3(name = "sendFrameworkMessage")]
    fn send_framework_message(&self, py: Python<'_>, data: &[u8]) -> PyResult<&'static str> {
        let data = data.to_vec();
        self.with_driver(py, move |driver| driver.send_framework_message(&data))
    }

    fn abort(&self, py: Python<'_>) -> PyResult<&'static str> {
        self.with_driver(py, |driver| driver.abort())
    }

    fn stop(&self, py: Python<'_>) -> PyResult<&'static str> {
        self.with_driver(py, |driver| driver.stop())
    }

    #[getter]
    fn attached(&self) -> bool {
        self.slot.get().is_some()
    }

    fn __repr__(&self) -> String {
        format!("ExecutorDriver(attached={})", self.attached())
    }
}
