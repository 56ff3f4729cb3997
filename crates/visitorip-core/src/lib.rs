//! # visitorip-core
//!
//! Host-side contracts for visitorip handler modules: the request/response
//! types, the handler chain, the lifecycle capability traits, the module and
//! directive registry, and the textual configuration dispenser.
//!
//! Handler modules live in their own crates and register themselves through
//! an explicit function taking a [`Registry`].

pub mod dispenser;
mod error;
pub mod middleware;
mod module;
mod registry;
mod request;
mod response;
mod server;
pub mod sink;

// Public API
pub use dispenser::{Dispenser, Helper};
pub use error::{ApiError, ConfigError, Result};
pub use middleware::{handler_fn, BoxedNext, HandlerFuture, LayerStack, MiddlewareHandler};
pub use module::{
    Context, HandlerModule, Module, ModuleId, ModuleInfo, Provisioner, Unmarshaler, Validator,
};
pub use registry::{DirectiveParser, Registry};
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use server::Server;
pub use sink::{MemorySink, OutputSink, SharedSink};
