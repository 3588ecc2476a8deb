//! The callback proxy: forwards driver events into the embedded handler.
//!
//! Every callback runs the same template:
//!
//! 1. enter the [`ExclusivityGuard`];
//! 2. convert each payload, stopping at the first failure;
//! 3. call the handler method with the bridge identity prepended;
//! 4. on any fault, print it and ask the driver to abort (never for `error`);
//! 5. release every object created along the way.
//!
//! Step 5 is ownership: payload objects and the call result are locals of the
//! guarded closure and drop before the guard is released, on every path.
//! Nothing unwinds into the driver's frame.

mod builder;

pub use builder::CallbackProxyBuilder;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::convert::PayloadConverter;
use crate::errors::BridgeFault;
use crate::guard::ExclusivityGuard;
use crate::invoke::HandlerInvoker;
use crate::traits::{EmbeddedRuntime, Executor, ExecutorDriver};
use crate::types::{ExecutorInfo, FrameworkInfo, SlaveInfo, TaskId, TaskInfo};

// ---------------------------------------------------------------------------
// Callback
// ---------------------------------------------------------------------------

/// The driver events the proxy forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Callback {
    Registered,
    Reregistered,
    Disconnected,
    LaunchTask,
    KillTask,
    FrameworkMessage,
    Shutdown,
    Error,
}

impl Callback {
    pub const ALL: [Callback; 8] = [
        Callback::Registered,
        Callback::Reregistered,
        Callback::Disconnected,
        Callback::LaunchTask,
        Callback::KillTask,
        Callback::FrameworkMessage,
        Callback::Shutdown,
        Callback::Error,
    ];

    /// Name of the handler method this event is delivered to.
    pub fn method_name(&self) -> &'static str {
        match self {
            Callback::Registered => "registered",
            Callback::Reregistered => "reregistered",
            Callback::Disconnected => "disconnected",
            Callback::LaunchTask => "launchTask",
            Callback::KillTask => "killTask",
            Callback::FrameworkMessage => "frameworkMessage",
            Callback::Shutdown => "shutdown",
            Callback::Error => "error",
        }
    }

    /// Whether a fault while handling this event aborts the driver.
    ///
    /// `error` is only fired once the driver is already aborting.
    pub fn aborts_on_fault(&self) -> bool {
        !matches!(self, Callback::Error)
    }
}

impl std::fmt::Display for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method_name())
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// One incoming value, borrowed from the driver for the duration of a call.
enum Payload<'a> {
    ExecutorInfo(&'a ExecutorInfo),
    FrameworkInfo(&'a FrameworkInfo),
    SlaveInfo(&'a SlaveInfo),
    TaskInfo(&'a TaskInfo),
    TaskId(&'a TaskId),
    Bytes(&'a [u8]),
}

impl Payload<'_> {
    fn convert<R: EmbeddedRuntime>(
        &self,
        converter: &PayloadConverter<'_, R>,
        scope: R::Scope<'_>,
    ) -> Result<R::Object, BridgeFault<R::Error>> {
        match self {
            Payload::ExecutorInfo(v) => converter.to_embedded(scope, *v),
            Payload::FrameworkInfo(v) => converter.to_embedded(scope, *v),
            Payload::SlaveInfo(v) => converter.to_embedded(scope, *v),
            Payload::TaskInfo(v) => converter.to_embedded(scope, *v),
            Payload::TaskId(v) => converter.to_embedded(scope, *v),
            Payload::Bytes(data) => converter.bytes_to_embedded(scope, data),
        }
    }
}

// ---------------------------------------------------------------------------
// CallbackProxy
// ---------------------------------------------------------------------------

/// Implements [`Executor`] by delegating every event to a handler object
/// living in an embedded runtime.
///
/// The proxy is stateless between callbacks. It owns the bridge identity and
/// the handler reference for its whole lifetime.
pub struct CallbackProxy<R: EmbeddedRuntime> {
    runtime: R,
    handler: R::Object,
    identity: R::Object,
    guard: ExclusivityGuard,
    name: String,
}

impl<R: EmbeddedRuntime> CallbackProxy<R> {
    /// Create a proxy with a private guard.
    pub fn new(runtime: R, handler: R::Object, identity: R::Object) -> Self {
        Self {
            runtime,
            handler,
            identity,
            guard: ExclusivityGuard::default(),
            name: builder::DEFAULT_NAME.to_string(),
        }
    }

    pub fn builder() -> CallbackProxyBuilder<R> {
        CallbackProxyBuilder::new()
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// The object passed as the first argument of every handler call.
    pub fn identity(&self) -> &R::Object {
        &self.identity
    }

    pub fn guard(&self) -> &ExclusivityGuard {
        &self.guard
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn dispatch(&self, driver: &dyn ExecutorDriver, callback: Callback, payloads: &[Payload<'_>]) {
        let span = tracing::debug_span!(
            "executor_callback",
            bridge = %self.name,
            callback = callback.method_name(),
        );
        let _entered = span.enter();

        let faulted = self.guard.enter(&self.runtime, |scope| {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| self.deliver(scope, callback, payloads)));
            let fault = match outcome {
                Ok(Ok(())) => return false,
                Ok(Err(fault)) => fault,
                Err(payload) => BridgeFault::Panic {
                    method: callback.method_name(),
                    message: panic_message(payload.as_ref()),
                },
            };

            tracing::error!(
                kind = ?fault.kind(),
                error = %fault,
                "executor callback failed"
            );
            if let Some(error) = fault.into_runtime_error() {
                self.runtime.print_error(scope, error);
            }

            if callback.aborts_on_fault() {
                let status = driver.abort();
                tracing::warn!(%status, "requested driver abort");
            } else {
                tracing::warn!("driver is already aborting, not requesting abort");
            }
            true
        });

        if !faulted {
            tracing::debug!("executor callback handled");
        }
    }

    /// Convert the payloads and call the handler. Every object created here
    /// is released before this returns.
    fn deliver(
        &self,
        scope: R::Scope<'_>,
        callback: Callback,
        payloads: &[Payload<'_>],
    ) -> Result<(), BridgeFault<R::Error>> {
        let converter = PayloadConverter::new(&self.runtime);
        let args = payloads
            .iter()
            .map(|payload| payload.convert(&converter, scope))
            .collect::<Result<Vec<_>, _>>()?;

        let result = HandlerInvoker::new(&self.runtime).invoke(
            scope,
            &self.handler,
            &self.identity,
            callback.method_name(),
            &args,
        )?;
        drop(result);
        drop(args);
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<R: EmbeddedRuntime> Executor for CallbackProxy<R> {
    fn registered(
        &self,
        driver: &dyn ExecutorDriver,
        executor_info: &ExecutorInfo,
        framework_info: &FrameworkInfo,
        slave_info: &SlaveInfo,
    ) {
        self.dispatch(
            driver,
            Callback::Registered,
            &[
                Payload::ExecutorInfo(executor_info),
                Payload::FrameworkInfo(framework_info),
                Payload::SlaveInfo(slave_info),
            ],
        );
    }

    fn reregistered(&self, driver: &dyn ExecutorDriver, slave_info: &SlaveInfo) {
        self.dispatch(driver, Callback::Reregistered, &[Payload::SlaveInfo(slave_info)]);
    }

    fn disconnected(&self, driver: &dyn ExecutorDriver) {
        self.dispatch(driver, Callback::Disconnected, &[]);
    }

    fn launch_task(&self, driver: &dyn ExecutorDriver, task: &TaskInfo) {
        self.dispatch(driver, Callback::LaunchTask, &[Payload::TaskInfo(task)]);
    }

    fn kill_task(&self, driver: &dyn ExecutorDriver, task_id: &TaskId) {
        self.dispatch(driver, Callback::KillTask, &[Payload::TaskId(task_id)]);
    }

    fn framework_message(&self, driver: &dyn ExecutorDriver, data: &[u8]) {
        self.dispatch(driver, Callback::FrameworkMessage, &[Payload::Bytes(data)]);
    }

    fn shutdown(&self, driver: &dyn ExecutorDriver) {
        self.dispatch(driver, Callback::Shutdown, &[]);
    }

    fn error(&self, driver: &dyn ExecutorDriver, message: &[u8]) {
        self.dispatch(driver, Callback::Error, &[Payload::Bytes(message)]);
    }
}
