//! Taskbridge executor — forwards executor driver callbacks into a handler
//! object hosted by an embedded managed runtime.
//!
//! The driver fires lifecycle and work events on its own native threads. For
//! each one the [`CallbackProxy`] takes the [`ExclusivityGuard`], converts the
//! event's protocol records with the [`PayloadConverter`], calls the matching
//! handler method through the [`HandlerInvoker`], and turns any fault into a
//! driver abort. The crate has no dependency on a particular runtime; bindings
//! implement [`EmbeddedRuntime`].

pub mod convert;
pub mod errors;
pub mod guard;
pub mod invoke;
pub mod proxy;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod traits;
pub mod types;

// Re-export public types at the crate level.

pub use convert::{PayloadConverter, BYTES_TYPE_NAME};
pub use errors::{BridgeFault, BuildError, FaultKind};
pub use guard::{ExclusivityGuard, GuardScope};
pub use invoke::HandlerInvoker;
pub use proxy::{Callback, CallbackProxy, CallbackProxyBuilder};
pub use traits::{EmbeddedRuntime, Executor, ExecutorDriver};
pub use types::{
    CommandInfo, DriverStatus, ExecutorId, ExecutorInfo, FrameworkId, FrameworkInfo,
    ProtocolMessage, Resource, SlaveId, SlaveInfo, TaskId, TaskInfo, TaskState, TaskStatus,
};
