//! Middleware infrastructure
//!
//! Handler modules implement [`MiddlewareHandler`] and are chained by a
//! [`LayerStack`] in front of a terminal handler.
//!
//! # Example
//!
//! ```rust,ignore
//! use visitorip_core::middleware::{handler_fn, LayerStack};
//!
//! let mut stack = LayerStack::new();
//! stack.push(Box::new(my_handler));
//! let response = stack
//!     .execute(request, handler_fn(|_req| async { Ok("hello".into_response()) }))
//!     .await?;
//! ```

mod layer;

pub use layer::{handler_fn, BoxedNext, HandlerFuture, LayerStack, MiddlewareHandler};
