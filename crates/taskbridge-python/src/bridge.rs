//! Bridge between a Python executor handler and the Rust `Executor` trait.
//!
//! A Python handler implements any of:
//! - `registered(driver, executor_info, framework_info, slave_info)`
//! - `reregistered(driver, slave_info)`
//! - `disconnected(driver)`
//! - `launchTask(driver, task)`
//! - `killTask(driver, task_id)`
//! - `frameworkMessage(driver, data: bytes)`
//! - `shutdown(driver)`
//! - `error(driver, message: bytes)`
//!
//! A missing method is only reported when its event arrives, and aborts the
//! driver like any other handler fault.

use std::sync::Arc;

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use taskbridge_executor::{
    Callback, CallbackProxy, Executor, ExecutorDriver, ExecutorInfo, FrameworkInfo, GuardScope,
    SlaveInfo, TaskId, TaskInfo,
};

use crate::driver_handle::{DriverSlot, PyDriverHandle};
use crate::runtime::PythonRuntime;

/// Settings for a [`PythonExecutorBridge`].
#[derive(Debug, Clone, Default)]
pub struct PythonBridgeConfig {
    /// Python module whose classes wrap protocol records. `None` hands
    /// handlers plain `dict`s.
    pub message_module: Option<String>,
    pub guard_scope: GuardScope,
    /// Label used in log spans. Defaults to `executor`.
    pub name: Option<String>,
}

impl PythonBridgeConfig {
    pub fn message_module(mut self, module: impl Into<String>) -> Self {
        self.message_module = Some(module.into());
        self
    }

    pub fn guard_scope(mut self, scope: GuardScope) -> Self {
        self.guard_scope = scope;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Rust-side bridge holding a Python handler. Hand it to the driver as its
/// executor, then [`attach`](Self::attach) the driver so handlers can reply.
pub struct PythonExecutorBridge {
    proxy: CallbackProxy<PythonRuntime>,
    slot: Arc<DriverSlot>,
}

impl PythonExecutorBridge {
    pub fn new(handler: PyObject, config: PythonBridgeConfig) -> PyResult<Self> {
        Python::with_gil(|py| {
            let runtime = match &config.message_module {
                Some(module) => PythonRuntime::with_message_module(py, module)?,
                None => PythonRuntime::new(),
            };

            let missing: Vec<&str> = Callback::ALL
                .iter()
                .map(Callback::method_name)
                .filter(|name| !handler.bind(py).hasattr(*name).unwrap_or(false))
                .collect();
            if !missing.is_empty() {
                tracing::warn!(?missing, "executor handler does not implement every callback");
            }

            let slot = Arc::new(DriverSlot::default());
            let identity = Py::new(py, PyDriverHandle::new(Arc::clone(&slot)))?.into_any();

            let mut builder = CallbackProxy::builder()
                .runtime(runtime)
                .handler(handler)
                .identity(identity)
                .guard_scope(config.guard_scope);
            if let Some(name) = config.name {
                builder = builder.name(name);
            }
            let proxy = builder
                .build()
                .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;

            Ok(Self { proxy, slot })
        })
    }

    /// Make `driver` reachable from the handler's `driver` argument.
    pub fn attach(&self, driver: Arc<dyn ExecutorDriver>) {
        tracing::debug!(bridge = self.proxy.name(), "driver attached");
        self.slot.attach(driver);
    }

    pub fn detach(&self) -> Option<Arc<dyn ExecutorDriver>> {
        self.slot.detach()
    }

    pub fn proxy(&self) -> &CallbackProxy<PythonRuntime> {
        &self.proxy
    }
}

impl Executor for PythonExecutorBridge {
    fn registered(
        &self,
        driver: &dyn ExecutorDriver,
        executor_info: &ExecutorInfo,
        framework_info: &FrameworkInfo,
        slave_info: &SlaveInfo,
    ) {
        self.proxy
            .registered(driver, executor_info, framework_info, slave_info);
    }

    fn reregistered(&self, driver: &dyn ExecutorDriver, slave_info: &SlaveInfo) {
        self.proxy.reregistered(driver, slave_info);
    }

    fn disconnected(&self, driver: &dyn ExecutorDriver) {
        self.proxy.disconnected(driver);
    }

    fn launch_task(&self, driver: &dyn ExecutorDriver, task: &TaskInfo) {
        self.proxy.launch_task(driver, task);
    }

    fn kill_task(&self, driver: &dyn ExecutorDriver, task_id: &TaskId) {
        self.proxy.kill_task(driver, task_id);
    }

    fn framework_message(&self, driver: &dyn ExecutorDriver, data: &[u8]) {
        self.proxy.framework_message(driver, data);
    }

    fn shutdown(&self, driver: &dyn ExecutorDriver) {
        self.proxy.shutdown(driver);
    }

    fn error(&self, driver: &dyn ExecutorDriver, message: &[u8]) {
        self.proxy.error(driver, message);
    }
}
