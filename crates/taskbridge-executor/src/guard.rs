//! Runtime exclusivity guard.
//!
//! Serializes every entry into the embedded runtime across driver threads.
//! The bridge mutex is always taken before the runtime's own exclusive scope
//! (the GIL for CPython), and both are released when [`ExclusivityGuard::enter`]
//! returns or unwinds. The mutex is reentrant so a handler that synchronously
//! triggers another callback on its own thread does not deadlock.

use std::sync::{Arc, OnceLock};

use parking_lot::ReentrantMutex;

use crate::traits::EmbeddedRuntime;

/// How widely a guard's mutex is shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GuardScope {
    /// One mutex per bridge instance.
    #[default]
    PerBridge,
    /// One mutex shared by every bridge in the process.
    ProcessWide,
}

fn process_lock() -> Arc<ReentrantMutex<()>> {
    static LOCK: OnceLock<Arc<ReentrantMutex<()>>> = OnceLock::new();
    LOCK.get_or_init(|| Arc::new(ReentrantMutex::new(()))).clone()
}

/// Scoped acquisition of the embedded runtime's execution right.
#[derive(Clone)]
pub struct ExclusivityGuard {
    lock: Arc<ReentrantMutex<()>>,
    scope: GuardScope,
}

impl ExclusivityGuard {
    pub fn new(scope: GuardScope) -> Self {
        let lock = match scope {
            GuardScope::PerBridge => Arc::new(ReentrantMutex::new(())),
            GuardScope::ProcessWide => process_lock(),
        };
        Self { lock, scope }
    }

    pub fn scope(&self) -> GuardScope {
        self.scope
    }

    /// Run `f` holding the bridge mutex and the runtime's exclusive scope.
    pub fn enter<R, T, F>(&self, runtime: &R, f: F) -> T
    where
        R: EmbeddedRuntime,
        F: for<'s> FnOnce(R::Scope<'s>) -> T,
    {
        let _held = self.lock.lock();
        runtime.exclusive(f)
    }

    /// Whether any thread currently holds this guard.
    pub fn is_held(&self) -> bool {
        self.lock.is_locked()
    }
}

impl Default for ExclusivityGuard {
    fn default() -> Self {
        Self::new(GuardScope::default())
    }
}

impl std::fmt::Debug for ExclusivityGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusivityGuard")
            .field("scope", &self.scope)
            .field("held", &self.is_held())
            .finish()
    }
}
