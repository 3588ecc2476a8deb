//! Taskbridge CPython binding via PyO3.
//!
//! [`PythonExecutorBridge`] implements the executor callbacks on top of a
//! Python handler object. The handler's first argument on every call is an
//! `ExecutorDriver` object for replying to the driver.

use pyo3::prelude::*;

mod bridge;
mod driver_handle;
mod runtime;

pub use bridge::{PythonBridgeConfig, PythonExecutorBridge};
pub use driver_handle::{DriverSlot, PyDriverHandle};
pub use runtime::PythonRuntime;

/// The native Rust module exposed to Python as `taskbridge._native`.
#[pymodule]
fn _native(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDriverHandle>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
