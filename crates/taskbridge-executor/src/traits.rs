//! Trait interfaces at the bridge's three seams.
//!
//! - [`Executor`] is what the driver calls into: one method per lifecycle or
//!   work event.
//! - [`ExecutorDriver`] is the driver itself, as seen from the bridge and the
//!   handler's reply path.
//! - [`EmbeddedRuntime`] is the managed runtime the handler lives in.

use crate::types::{
    DriverStatus, ExecutorInfo, FrameworkInfo, SlaveInfo, TaskId, TaskInfo, TaskStatus,
};

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// The fixed callback capability set the driver fires into.
///
/// Implementations are invoked on driver-owned native threads, possibly
/// several at once, and must return only after the event has been fully
/// handled. They never unwind or return errors into the driver: the only
/// failure channel is asking the driver to [`abort`](ExecutorDriver::abort).
pub trait Executor: Send + Sync {
    /// The executor registered with its slave.
    fn registered(
        &self,
        driver: &dyn ExecutorDriver,
        executor_info: &ExecutorInfo,
        framework_info: &FrameworkInfo,
        slave_info: &SlaveInfo,
    );

    /// The executor re-registered with a restarted slave.
    fn reregistered(&self, driver: &dyn ExecutorDriver, slave_info: &SlaveInfo);

    /// The executor lost its connection to the slave.
    fn disconnected(&self, driver: &dyn ExecutorDriver);

    fn launch_task(&self, driver: &dyn ExecutorDriver, task: &TaskInfo);

    fn kill_task(&self, driver: &dyn ExecutorDriver, task_id: &TaskId);

    /// An opaque message from the framework. `data` may contain NUL bytes.
    fn framework_message(&self, driver: &dyn ExecutorDriver, data: &[u8]);

    fn shutdown(&self, driver: &dyn ExecutorDriver);

    /// The driver hit an unrecoverable error and is already aborting.
    fn error(&self, driver: &dyn ExecutorDriver, message: &[u8]);
}

// ---------------------------------------------------------------------------
// ExecutorDriver
// ---------------------------------------------------------------------------

/// The driver managing the executor lifecycle.
///
/// The bridge only ever calls [`abort`](Self::abort). The remaining methods
/// are the reply path a handler reaches through the bridge identity.
pub trait ExecutorDriver: Send + Sync {
    fn abort(&self) -> DriverStatus;

    fn stop(&self) -> DriverStatus;

    fn send_status_update(&self, status: &TaskStatus) -> DriverStatus;

    fn send_framework_message(&self, data: &[u8]) -> DriverStatus;
}

// ---------------------------------------------------------------------------
// EmbeddedRuntime
// ---------------------------------------------------------------------------

/// A managed runtime hosting the handler object.
///
/// Objects are owned values: dropping one releases the runtime-side
/// reference, so every object is released exactly once however the owning
/// scope is left. Every method other than [`exclusive`](Self::exclusive)
/// takes a `Scope`, which can only be obtained inside `exclusive`; runtime
/// state is never touched outside that scope.
pub trait EmbeddedRuntime: Send + Sync {
    /// Proof of exclusive entry, valid for the duration of one `exclusive` call.
    type Scope<'s>: Copy;
    /// An owned reference to a runtime object.
    type Object: Send + Sync;
    /// A pending fault raised inside the runtime.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run `f` with the runtime's global execution right held.
    fn exclusive<T, F>(&self, f: F) -> T
    where
        F: for<'s> FnOnce(Self::Scope<'s>) -> T;

    /// Build the runtime object for a protocol record given as JSON.
    fn decode_message(
        &self,
        scope: Self::Scope<'_>,
        type_name: &str,
        json: &str,
    ) -> Result<Self::Object, Self::Error>;

    /// Encode a runtime object back to JSON.
    fn encode_message(
        &self,
        scope: Self::Scope<'_>,
        object: &Self::Object,
    ) -> Result<String, Self::Error>;

    /// Build a length-exact byte buffer object.
    fn bytes(&self, scope: Self::Scope<'_>, data: &[u8]) -> Result<Self::Object, Self::Error>;

    /// Resolve the attribute `name` on `target`.
    fn method(
        &self,
        scope: Self::Scope<'_>,
        target: &Self::Object,
        name: &str,
    ) -> Result<Self::Object, Self::Error>;

    /// Call `callable` with positional `args`.
    fn call(
        &self,
        scope: Self::Scope<'_>,
        callable: &Self::Object,
        args: &[&Self::Object],
    ) -> Result<Self::Object, Self::Error>;

    /// Emit `error` on the operator-facing error stream and clear it.
    fn print_error(&self, scope: Self::Scope<'_>, error: Self::Error);
}
