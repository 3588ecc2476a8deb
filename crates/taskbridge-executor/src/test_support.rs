//! In-memory doubles for exercising the bridge without a real runtime.
//!
//! ```ignore
//! let runtime = FakeRuntime::new();
//! let handler = FakeHandler::new().raising("launchTask");
//! let handler_obj = runtime.handler_object(handler.clone());
//! let identity = runtime.identity_object();
//! let proxy = CallbackProxy::new(runtime, handler_obj, identity);
//!
//! let driver = RecordingDriver::new();
//! proxy.launch_task(&driver, &task);
//!
//! assert_eq!(driver.aborts(), 1);
//! assert_eq!(proxy.runtime().ledger().live(), 2);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::convert::BYTES_TYPE_NAME;
use crate::traits::{EmbeddedRuntime, ExecutorDriver};
use crate::types::{DriverStatus, TaskStatus};

// -- Ledger -----------------------------------------------------------------

/// Counts objects created and released by a [`FakeRuntime`].
#[derive(Debug, Default)]
pub struct Ledger {
    created: AtomicUsize,
    released: AtomicUsize,
}

impl Ledger {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Objects created and not yet released.
    pub fn live(&self) -> usize {
        self.created() - self.released()
    }
}

// -- Objects ----------------------------------------------------------------

/// What a [`FakeObject`] stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum FakeValue {
    Message { type_name: String, json: Value },
    Bytes(Vec<u8>),
    Identity,
    Handler,
    Method(String),
    Unit,
}

/// An object owned by the bridge. Dropping it records a release.
#[derive(Debug)]
pub struct FakeObject {
    value: FakeValue,
    target: Option<FakeHandler>,
    ledger: Arc<Ledger>,
}

impl FakeObject {
    pub fn value(&self) -> &FakeValue {
        &self.value
    }
}

impl Drop for FakeObject {
    fn drop(&mut self) {
        self.ledger.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Faults raised inside the fake runtime.
#[derive(Debug, thiserror::Error)]
pub enum FakeError {
    #[error("conversion of {0} rejected")]
    Rejected(String),
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("object has no attribute `{0}`")]
    NoAttribute(String),
    #[error("`{0}` raised")]
    Raised(String),
    #[error("object is not callable")]
    NotCallable,
}

// -- FakeHandler ------------------------------------------------------------

/// One recorded handler call.
#[derive(Debug, Clone, PartialEq)]
pub struct FakeCall {
    pub method: String,
    pub args: Vec<FakeValue>,
}

#[derive(Debug, Default)]
struct HandlerInner {
    calls: Mutex<Vec<FakeCall>>,
    missing: Mutex<HashSet<String>>,
    raising: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

/// A scriptable handler that records every call and tracks how many calls
/// were in flight at once.
#[derive(Debug, Clone, Default)]
pub struct FakeHandler {
    inner: Arc<HandlerInner>,
}

impl FakeHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not expose `method`.
    pub fn without(self, method: &str) -> Self {
        self.inner.missing.lock().insert(method.to_string());
        self
    }

    /// Raise from `method`.
    pub fn raising(self, method: &str) -> Self {
        self.inner.raising.lock().insert(method.to_string());
        self
    }

    /// Panic from `method`.
    pub fn panicking(self, method: &str) -> Self {
        self.inner.panicking.lock().insert(method.to_string());
        self
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.delay.lock() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.inner.calls.lock().clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.inner
            .calls
            .lock()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.inner.max_active.load(Ordering::SeqCst)
    }

    fn exposes(&self, method: &str) -> bool {
        !self.inner.missing.lock().contains(method)
    }

    fn run(&self, method: &str, args: Vec<FakeValue>) -> Result<(), FakeError> {
        let now = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_active.fetch_max(now, Ordering::SeqCst);
        self.inner.calls.lock().push(FakeCall {
            method: method.to_string(),
            args,
        });

        let delay = *self.inner.delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.inner.active.fetch_sub(1, Ordering::SeqCst);

        if self.inner.panicking.lock().contains(method) {
            panic!("{method} panicked");
        }
        if self.inner.raising.lock().contains(method) {
            return Err(FakeError::Raised(method.to_string()));
        }
        Ok(())
    }
}

// -- FakeRuntime ------------------------------------------------------------

/// An [`EmbeddedRuntime`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    ledger: Arc<Ledger>,
    failing: Mutex<HashSet<String>>,
    printed: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every conversion of records with this protocol type name.
    /// [`BYTES_TYPE_NAME`] rejects raw buffers.
    pub fn fail_conversion_of(&self, type_name: &str) {
        self.failing.lock().insert(type_name.to_string());
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Diagnostics passed to [`print_error`](EmbeddedRuntime::print_error).
    pub fn printed(&self) -> Vec<String> {
        self.printed.lock().clone()
    }

    pub fn handler_object(&self, handler: FakeHandler) -> FakeObject {
        self.object(FakeValue::Handler, Some(handler))
    }

    pub fn identity_object(&self) -> FakeObject {
        self.object(FakeValue::Identity, None)
    }

    fn object(&self, value: FakeValue, target: Option<FakeHandler>) -> FakeObject {
        self.ledger.created.fetch_add(1, Ordering::SeqCst);
        FakeObject {
            value,
            target,
            ledger: self.ledger.clone(),
        }
    }
}

impl EmbeddedRuntime for FakeRuntime {
    type Scope<'s> = &'s FakeRuntime;
    type Object = FakeObject;
    type Error = FakeError;

    fn exclusive<T, F>(&self, f: F) -> T
    where
        F: for<'s> FnOnce(Self::Scope<'s>) -> T,
    {
        f(self)
    }

    fn decode_message(
        &self,
        _scope: Self::Scope<'_>,
        type_name: &str,
        json: &str,
    ) -> Result<FakeObject, FakeError> {
        if self.failing.lock().contains(type_name) {
            return Err(FakeError::Rejected(type_name.to_string()));
        }
        let json: Value =
            serde_json::from_str(json).map_err(|e| FakeError::Malformed(e.to_string()))?;
        Ok(self.object(
            FakeValue::Message {
                type_name: type_name.to_string(),
                json,
            },
            None,
        ))
    }

    fn encode_message(
        &self,
        _scope: Self::Scope<'_>,
        object: &FakeObject,
    ) -> Result<String, FakeError> {
        match &object.value {
            FakeValue::Message { json, .. } => Ok(json.to_string()),
            other => Err(FakeError::Malformed(format!("{other:?} is not a message"))),
        }
    }

    fn bytes(&self, _scope: Self::Scope<'_>, data: &[u8]) -> Result<FakeObject, FakeError> {
        if self.failing.lock().contains(BYTES_TYPE_NAME) {
            return Err(FakeError::Rejected(BYTES_TYPE_NAME.to_string()));
        }
        Ok(self.object(FakeValue::Bytes(data.to_vec()), None))
    }

    fn method(
        &self,
        _scope: Self::Scope<'_>,
        target: &FakeObject,
        name: &str,
    ) -> Result<FakeObject, FakeError> {
        match &target.target {
            Some(handler) if handler.exposes(name) => Ok(self.object(
                FakeValue::Method(name.to_string()),
                Some(handler.clone()),
            )),
            _ => Err(FakeError::NoAttribute(name.to_string())),
        }
    }

    fn call(
        &self,
        _scope: Self::Scope<'_>,
        callable: &FakeObject,
        args: &[&FakeObject],
    ) -> Result<FakeObject, FakeError> {
        let (FakeValue::Method(name), Some(handler)) = (&callable.value, &callable.target) else {
            return Err(FakeError::NotCallable);
        };
        let args = args.iter().map(|a| a.value.clone()).collect();
        handler.run(name, args)?;
        Ok(self.object(FakeValue::Unit, None))
    }

    fn print_error(&self, _scope: Self::Scope<'_>, error: FakeError) {
        self.printed.lock().push(error.to_string());
    }
}

// -- RecordingDriver --------------------------------------------------------

/// An [`ExecutorDriver`] that records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    aborts: AtomicUsize,
    stops: AtomicUsize,
    status_updates: Mutex<Vec<TaskStatus>>,
    messages: Mutex<Vec<Vec<u8>>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn status_updates(&self) -> Vec<TaskStatus> {
        self.status_updates.lock().clone()
    }

    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.messages.lock().clone()
    }
}

impl ExecutorDriver for RecordingDriver {
    fn abort(&self) -> DriverStatus {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        DriverStatus::DriverAborted
    }

    fn stop(&self) -> DriverStatus {
        self.stops.fetch_add(1, Ordering::SeqCst);
        DriverStatus::DriverStopped
    }

    fn send_status_update(&self, status: &TaskStatus) -> DriverStatus {
        self.status_updates.lock().push(status.clone());
        DriverStatus::DriverRunning
    }

    fn send_framework_message(&self, data: &[u8]) -> DriverStatus {
        self.messages.lock().push(data.to_vec());
        DriverStatus::DriverRunning
    }
}
