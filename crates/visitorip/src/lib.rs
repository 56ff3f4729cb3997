//! # visitorip
//!
//! HTTP handler module that writes the remote address of every request to
//! standard output or standard error and forwards the request unchanged.
//!
//! ## Example
//!
//! ```rust,no_run
//! use visitorip_core::{Context, Registry};
//!
//! let mut registry = Registry::new();
//! visitorip::register(&mut registry).unwrap();
//!
//! let chain = registry
//!     .load_config("Caddyfile", "visitor_ip stdout\n", &Context::new())
//!     .unwrap();
//! assert_eq!(chain.len(), 1);
//! ```

mod visitor_ip;

pub use visitor_ip::{parse_directive, OutputStream, VisitorIp, DIRECTIVE, MODULE_ID};

use visitorip_core::{ConfigError, Module, Registry};

/// Register the module and its `visitor_ip` directive
///
/// Call once while building the host's registry.
pub fn register(registry: &mut Registry) -> Result<(), ConfigError> {
    registry.register_module(VisitorIp::module_info())?;
    registry.register_handler_directive(DIRECTIVE, parse_directive)
}
