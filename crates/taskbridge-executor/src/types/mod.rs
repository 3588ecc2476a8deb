//! Structured protocol values exchanged between the executor driver and the
//! bridge.
//!
//! Every record here is `Serialize + Deserialize + Debug + Clone`. The bridge
//! treats them as read-only, call-scoped inputs: it encodes them for the
//! embedded runtime and never retains them past the callback that received
//! them.

pub mod protocol;

pub use protocol::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProtocolMessage
// ---------------------------------------------------------------------------

/// A record with a declared protocol type name.
///
/// The type name is the key the payload converter hands to the embedded
/// runtime so it can build the matching native object (for example a message
/// class of the same name).
pub trait ProtocolMessage: Serialize + DeserializeOwned {
    /// Declared protocol type name, e.g. `"TaskInfo"`.
    const TYPE_NAME: &'static str;
}

// ---------------------------------------------------------------------------
// DriverStatus
// ---------------------------------------------------------------------------

/// Lifecycle status reported by every [`ExecutorDriver`](crate::traits::ExecutorDriver) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    DriverNotStarted,
    DriverRunning,
    DriverAborted,
    DriverStopped,
}

impl DriverStatus {
    /// Wire name of the status, e.g. `"DRIVER_RUNNING"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::DriverNotStarted => "DRIVER_NOT_STARTED",
            DriverStatus::DriverRunning => "DRIVER_RUNNING",
            DriverStatus::DriverAborted => "DRIVER_ABORTED",
            DriverStatus::DriverStopped => "DRIVER_STOPPED",
        }
    }
}

impl std::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_status_wire_name_matches_serde() {
        for status in [
            DriverStatus::DriverNotStarted,
            DriverStatus::DriverRunning,
            DriverStatus::DriverAborted,
            DriverStatus::DriverStopped,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
