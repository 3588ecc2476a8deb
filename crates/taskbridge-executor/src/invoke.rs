//! Named-method invocation on the registered handler object.

use crate::errors::BridgeFault;
use crate::traits::EmbeddedRuntime;

/// Calls handler methods with the bridge identity prepended to the arguments.
pub struct HandlerInvoker<'r, R: EmbeddedRuntime> {
    runtime: &'r R,
}

impl<'r, R: EmbeddedRuntime> HandlerInvoker<'r, R> {
    pub fn new(runtime: &'r R) -> Self {
        Self { runtime }
    }

    /// Look up `method` on `handler` and call it as
    /// `handler.method(identity, *args)`.
    ///
    /// A failed lookup is a [`BridgeFault::Lookup`]; anything the method
    /// raises is a [`BridgeFault::Handler`]. The returned object is the
    /// call's result and is released when the caller drops it.
    pub fn invoke(
        &self,
        scope: R::Scope<'_>,
        handler: &R::Object,
        identity: &R::Object,
        method: &'static str,
        args: &[R::Object],
    ) -> Result<R::Object, BridgeFault<R::Error>> {
        let bound = self
            .runtime
            .method(scope, handler, method)
            .map_err(|error| BridgeFault::Lookup { method, error })?;

        let mut call_args: Vec<&R::Object> = Vec::with_capacity(args.len() + 1);
        call_args.push(identity);
        call_args.extend(args);

        self.runtime
            .call(scope, &bound, &call_args)
            .map_err(|error| BridgeFault::Handler { method, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FaultKind;
    use crate::test_support::{FakeHandler, FakeRuntime, FakeValue};

    #[test]
    fn identity_is_first_argument() {
        let runtime = FakeRuntime::new();
        let handler = FakeHandler::new();
        let handler_obj = runtime.handler_object(handler.clone());
        let identity = runtime.identity_object();
        let invoker = HandlerInvoker::new(&runtime);

        runtime
            .exclusive(|scope| {
                let arg = runtime.bytes(scope, b"hi").unwrap();
                invoker
                    .invoke(scope, &handler_obj, &identity, "frameworkMessage", &[arg])
                    .map(drop)
            })
            .unwrap();

        let calls = handler.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "frameworkMessage");
        assert_eq!(
            calls[0].args,
            vec![FakeValue::Identity, FakeValue::Bytes(b"hi".to_vec())]
        );
    }

    #[test]
    fn missing_method_is_a_lookup_fault() {
        let runtime = FakeRuntime::new();
        let handler = FakeHandler::new().without("shutdown");
        let handler_obj = runtime.handler_object(handler.clone());
        let identity = runtime.identity_object();
        let invoker = HandlerInvoker::new(&runtime);

        let fault = runtime
            .exclusive(|scope| {
                invoker
                    .invoke(scope, &handler_obj, &identity, "shutdown", &[])
                    .map(drop)
            })
            .unwrap_err();
        assert_eq!(fault.kind(), FaultKind::Lookup);
        assert!(handler.calls().is_empty());
    }

    #[test]
    fn raising_method_is_a_handler_fault() {
        let runtime = FakeRuntime::new();
        let handler = FakeHandler::new().raising("disconnected");
        let handler_obj = runtime.handler_object(handler.clone());
        let identity = runtime.identity_object();
        let invoker = HandlerInvoker::new(&runtime);
        let baseline = runtime.ledger().live();

        let fault = runtime
            .exclusive(|scope| {
                invoker
                    .invoke(scope, &handler_obj, &identity, "disconnected", &[])
                    .map(drop)
            })
            .unwrap_err();
        assert_eq!(fault.kind(), FaultKind::Handler);
        assert_eq!(handler.calls().len(), 1);
        assert_eq!(runtime.ledger().live(), baseline);
    }
}
