//! Payload conversion between native protocol records and embedded objects.
//!
//! Records cross the boundary as JSON keyed by their declared protocol type
//! name; the runtime decides what object that becomes. Raw buffers are copied
//! length-exact with no text decoding, so embedded NUL bytes survive.

use crate::errors::BridgeFault;
use crate::traits::EmbeddedRuntime;
use crate::types::ProtocolMessage;

/// Type name reported for raw byte payloads.
pub const BYTES_TYPE_NAME: &str = "bytes";

/// Converts payloads for one runtime. Borrowed per call; holds no state.
pub struct PayloadConverter<'r, R: EmbeddedRuntime> {
    runtime: &'r R,
}

impl<'r, R: EmbeddedRuntime> PayloadConverter<'r, R> {
    pub fn new(runtime: &'r R) -> Self {
        Self { runtime }
    }

    /// Convert a protocol record into a runtime object.
    ///
    /// On failure no object exists and the caller must not call the handler.
    pub fn to_embedded<M: ProtocolMessage>(
        &self,
        scope: R::Scope<'_>,
        value: &M,
    ) -> Result<R::Object, BridgeFault<R::Error>> {
        let json = serde_json::to_string(value).map_err(|source| BridgeFault::Encode {
            type_name: M::TYPE_NAME,
            source,
        })?;
        self.runtime
            .decode_message(scope, M::TYPE_NAME, &json)
            .map_err(|error| BridgeFault::Conversion {
                type_name: M::TYPE_NAME,
                error,
            })
    }

    /// Convert a raw buffer into a runtime byte buffer of the same length.
    pub fn bytes_to_embedded(
        &self,
        scope: R::Scope<'_>,
        data: &[u8],
    ) -> Result<R::Object, BridgeFault<R::Error>> {
        self.runtime
            .bytes(scope, data)
            .map_err(|error| BridgeFault::Conversion {
                type_name: BYTES_TYPE_NAME,
                error,
            })
    }

    /// Convert a runtime object back into a protocol record.
    pub fn to_native<M: ProtocolMessage>(
        &self,
        scope: R::Scope<'_>,
        object: &R::Object,
    ) -> Result<M, BridgeFault<R::Error>> {
        let json = self
            .runtime
            .encode_message(scope, object)
            .map_err(|error| BridgeFault::Conversion {
                type_name: M::TYPE_NAME,
                error,
            })?;
        serde_json::from_str(&json).map_err(|source| BridgeFault::Decode {
            type_name: M::TYPE_NAME,
            source,
        })
    }
}
