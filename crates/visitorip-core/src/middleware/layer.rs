//! Handler chain
//!
//! Each [`MiddlewareHandler`] sees the request, may act on it, and hands it to
//! the rest of the chain through a [`BoxedNext`]. Whatever the rest of the
//! chain returns, success or error, flows back out through every handler.

use crate::error::Result;
use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future produced by a handler in the chain
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// A boxed next function for middleware chains
pub type BoxedNext = Arc<dyn Fn(Request) -> HandlerFuture + Send + Sync>;

/// A request handler that sits in the chain and delegates to `next`
pub trait MiddlewareHandler: Send + Sync + 'static {
    /// Handle `req`, calling `next` to continue the chain
    fn call(&self, req: Request, next: BoxedNext) -> HandlerFuture;

    /// Clone this handler into a boxed trait object
    fn clone_box(&self) -> Box<dyn MiddlewareHandler>;
}

impl Clone for Box<dyn MiddlewareHandler> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Wrap an async closure as a terminal handler
pub fn handler_fn<F, Fut>(f: F) -> BoxedNext
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    Arc::new(move |req: Request| Box::pin(f(req)) as HandlerFuture)
}

/// An ordered stack of middleware handlers
#[derive(Clone, Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn MiddlewareHandler>>,
}

impl LayerStack {
    /// Create a new empty layer stack
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add a handler to the stack
    ///
    /// Handlers run in the order they are added (outermost first).
    pub fn push(&mut self, layer: Box<dyn MiddlewareHandler>) {
        self.layers.push(layer);
    }

    /// Add a handler to the beginning of the stack
    pub fn prepend(&mut self, layer: Box<dyn MiddlewareHandler>) {
        self.layers.insert(0, layer);
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Get the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Execute the stack with a final handler
    pub fn execute(&self, req: Request, handler: BoxedNext) -> HandlerFuture {
        if self.layers.is_empty() {
            return handler(req);
        }

        // Build from the inside out so the first layer runs first
        let mut next = handler;

        for layer in self.layers.iter().rev() {
            let layer = layer.clone_box();
            let current_next = next;
            next = Arc::new(move |req: Request| {
                let layer = layer.clone_box();
                let next = current_next.clone();
                Box::pin(async move { layer.call(req, next).await }) as HandlerFuture
            });
        }

        next(req)
    }
}

impl std::fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerStack")
            .field("len", &self.layers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::response::IntoResponse;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;
    use std::sync::Mutex;

    fn create_test_request(method: Method, path: &str) -> Request {
        let req = http::Request::builder()
            .method(method)
            .uri(path)
            .body(())
            .unwrap();
        Request::from_http_request(req, Bytes::new())
    }

    fn ok_handler() -> BoxedNext {
        handler_fn(|_req: Request| async { Ok("ok".into_response()) })
    }

    /// Records pre/post execution order
    #[derive(Clone)]
    struct OrderTracking {
        id: usize,
        order: Arc<Mutex<Vec<(usize, &'static str)>>>,
    }

    impl MiddlewareHandler for OrderTracking {
        fn call(&self, req: Request, next: BoxedNext) -> HandlerFuture {
            let id = self.id;
            let order = self.order.clone();

            Box::pin(async move {
                order.lock().unwrap().push((id, "pre"));
                let result = next(req).await;
                order.lock().unwrap().push((id, "post"));
                result
            })
        }

        fn clone_box(&self) -> Box<dyn MiddlewareHandler> {
            Box::new(self.clone())
        }
    }

    #[tokio::test]
    async fn empty_stack_calls_handler_directly() {
        let stack = LayerStack::new();
        let response = stack
            .execute(create_test_request(Method::GET, "/"), ok_handler())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn handler_error_propagates_through_layers() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut stack = LayerStack::new();
        stack.push(Box::new(OrderTracking { id: 0, order: order.clone() }));

        let failing = handler_fn(|_req: Request| async { Err(ApiError::bad_request("nope")) });
        let err = stack
            .execute(create_test_request(Method::POST, "/x"), failing)
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(*order.lock().unwrap(), vec![(0, "pre"), (0, "post")]);
    }

    // Requests enter layers outermost first and leave innermost first.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_middleware_execution_order(num_layers in 1usize..10usize) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: std::result::Result<(), TestCaseError> = rt.block_on(async {
                let order = Arc::new(Mutex::new(Vec::new()));

                let mut stack = LayerStack::new();
                for i in 0..num_layers {
                    stack.push(Box::new(OrderTracking { id: i, order: order.clone() }));
                }

                let request = create_test_request(Method::GET, "/test");
                let _ = stack.execute(request, ok_handler()).await;

                let execution_order = order.lock().unwrap();
                prop_assert_eq!(execution_order.len(), num_layers * 2);

                for i in 0..num_layers {
                    prop_assert_eq!(execution_order[i], (i, "pre"));
                    prop_assert_eq!(execution_order[num_layers + i], (num_layers - 1 - i, "post"));
                }

                Ok(())
            });
            result?;
        }
    }
}
