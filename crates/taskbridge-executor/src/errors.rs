//! Error types for the executor bridge.

use thiserror::Error;

/// A fault raised while servicing one callback.
///
/// `E` is the embedded runtime's own error type (a pending exception for
/// CPython). Faults carrying one must be handed back to the runtime exactly
/// once via [`into_runtime_error`](Self::into_runtime_error) so it can print
/// and clear it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BridgeFault<E: std::error::Error + 'static> {
    /// The native record could not be encoded for conversion.
    #[error("failed to encode {type_name}: {source}")]
    Encode {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The embedded runtime rejected a protocol value or raw buffer.
    #[error("failed to convert {type_name}: {error}")]
    Conversion {
        type_name: &'static str,
        #[source]
        error: E,
    },
    /// An embedded object could not be decoded into a native record.
    #[error("failed to decode {type_name}: {source}")]
    Decode {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The handler does not expose the callback method.
    #[error("handler has no usable method `{method}`: {error}")]
    Lookup {
        method: &'static str,
        #[source]
        error: E,
    },
    /// The handler method raised while running.
    #[error("handler method `{method}` failed: {error}")]
    Handler {
        method: &'static str,
        #[source]
        error: E,
    },
    /// A panic unwound out of the guarded section.
    #[error("panic during `{method}`: {message}")]
    Panic {
        method: &'static str,
        message: String,
    },
}

/// Coarse classification of a [`BridgeFault`], used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Conversion,
    Lookup,
    Handler,
}

impl<E: std::error::Error + 'static> BridgeFault<E> {
    pub fn kind(&self) -> FaultKind {
        match self {
            BridgeFault::Encode { .. }
            | BridgeFault::Conversion { .. }
            | BridgeFault::Decode { .. } => FaultKind::Conversion,
            BridgeFault::Lookup { .. } => FaultKind::Lookup,
            BridgeFault::Handler { .. } | BridgeFault::Panic { .. } => FaultKind::Handler,
        }
    }

    /// Take the runtime error out of the fault, if it carries one.
    pub fn into_runtime_error(self) -> Option<E> {
        match self {
            BridgeFault::Conversion { error, .. }
            | BridgeFault::Lookup { error, .. }
            | BridgeFault::Handler { error, .. } => Some(error),
            BridgeFault::Encode { .. } | BridgeFault::Decode { .. } | BridgeFault::Panic { .. } => {
                None
            }
        }
    }
}

/// Errors from [`CallbackProxyBuilder::build`](crate::proxy::CallbackProxyBuilder::build).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("callback proxy is missing its {part}")]
    Missing { part: &'static str },
}
