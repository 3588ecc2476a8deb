//! Fluent builder for [`CallbackProxy`].

use crate::errors::BuildError;
use crate::guard::{ExclusivityGuard, GuardScope};
use crate::traits::EmbeddedRuntime;

use super::CallbackProxy;

pub(super) const DEFAULT_NAME: &str = "executor";

/// Builder for a [`CallbackProxy`].
///
/// ```ignore
/// let proxy = CallbackProxy::builder()
///     .runtime(runtime)
///     .handler(handler)
///     .identity(identity)
///     .guard_scope(GuardScope::ProcessWide)
///     .name("my-executor")
///     .build()?;
/// ```
pub struct CallbackProxyBuilder<R: EmbeddedRuntime> {
    runtime: Option<R>,
    handler: Option<R::Object>,
    identity: Option<R::Object>,
    guard_scope: GuardScope,
    guard: Option<ExclusivityGuard>,
    name: Option<String>,
}

impl<R: EmbeddedRuntime> CallbackProxyBuilder<R> {
    pub(crate) fn new() -> Self {
        Self {
            runtime: None,
            handler: None,
            identity: None,
            guard_scope: GuardScope::default(),
            guard: None,
            name: None,
        }
    }

    pub fn runtime(mut self, runtime: R) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// The registered handler object. Resolved once; referenced for the
    /// proxy's lifetime.
    pub fn handler(mut self, handler: R::Object) -> Self {
        self.handler = Some(handler);
        self
    }

    /// The bridge identity passed as the first argument of every call.
    pub fn identity(mut self, identity: R::Object) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn guard_scope(mut self, scope: GuardScope) -> Self {
        self.guard_scope = scope;
        self
    }

    /// Share an existing guard instead of creating one. Overrides
    /// [`guard_scope`](Self::guard_scope).
    pub fn guard(mut self, guard: ExclusivityGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Label used in log spans.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> Result<CallbackProxy<R>, BuildError> {
        let runtime = self.runtime.ok_or(BuildError::Missing { part: "runtime" })?;
        let handler = self.handler.ok_or(BuildError::Missing { part: "handler" })?;
        let identity = self.identity.ok_or(BuildError::Missing { part: "identity" })?;
        let guard = self
            .guard
            .unwrap_or_else(|| ExclusivityGuard::new(self.guard_scope));

        Ok(CallbackProxy {
            runtime,
            handler,
            identity,
            guard,
            name: self.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
        })
    }
}

impl<R: EmbeddedRuntime> Default for CallbackProxyBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}
