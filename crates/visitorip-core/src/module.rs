//! Handler module contracts
//!
//! A handler module is created zero-valued by its factory, filled in from
//! JSON or textual configuration, then provisioned and validated once
//! before it sees any traffic:
//!
//! ```text
//! new -> configure -> Provisioner::provision -> Validator::validate -> MiddlewareHandler::call ...
//! ```
//!
//! The host only ever holds a `Box<dyn HandlerModule>`. Any type that
//! implements the four capability traits below, plus serde decoding, is a
//! [`HandlerModule`] automatically.

use crate::dispenser::Dispenser;
use crate::error::ConfigError;
use crate::middleware::MiddlewareHandler;
use crate::sink::{ProcessStderr, ProcessStdout, SharedSink};
use serde::de::DeserializeOwned;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Dotted module identifier, e.g. `http.handlers.visitor_ip`
///
/// The last label is the module name; everything before it is the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    /// Parse and check an identifier
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("module ID is required")
        } else if id.split('.').any(str::is_empty) {
            Some("module ID has an empty label")
        } else if id.chars().any(char::is_whitespace) {
            Some("module ID contains whitespace")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ConfigError::InvalidModuleId { id, reason }),
            None => Ok(Self(id)),
        }
    }

    /// The full identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last label, e.g. `http.handlers`
    pub fn namespace(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(ns, _)| ns)
    }

    /// The last label, e.g. `visitor_ip`
    pub fn name(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a handler module: its id and a factory for fresh instances
///
/// The id is checked when the module is registered.
#[derive(Clone)]
pub struct ModuleInfo {
    pub id: &'static str,
    pub new: fn() -> Box<dyn HandlerModule>,
}

impl fmt::Debug for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInfo").field("id", &self.id).finish()
    }
}

/// Resources the host lends to a module while provisioning
#[derive(Debug, Clone)]
pub struct Context {
    stdout: SharedSink,
    stderr: SharedSink,
}

impl Context {
    /// Context bound to the process's own standard streams
    pub fn new() -> Self {
        Self::with_stdio(Arc::new(ProcessStdout), Arc::new(ProcessStderr))
    }

    /// Context with substitute standard streams
    pub fn with_stdio(stdout: SharedSink, stderr: SharedSink) -> Self {
        Self { stdout, stderr }
    }

    /// The standard output stream
    pub fn stdout(&self) -> SharedSink {
        self.stdout.clone()
    }

    /// The standard error stream
    pub fn stderr(&self) -> SharedSink {
        self.stderr.clone()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// A module that resolves its configuration into runtime state
pub trait Provisioner {
    fn provision(&mut self, ctx: &Context) -> Result<(), ConfigError>;
}

/// A module that can confirm it is ready to serve
pub trait Validator {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// A module that reads its settings from textual configuration
pub trait Unmarshaler {
    fn unmarshal_config(&mut self, d: &mut Dispenser) -> Result<(), ConfigError>;
}

/// A module the host can look up by id and construct on demand
pub trait Module {
    fn module_info() -> ModuleInfo
    where
        Self: Sized;
}

/// Object-safe union of every capability a handler module has
pub trait HandlerModule: Provisioner + Validator + Unmarshaler + MiddlewareHandler {
    /// Overwrite this instance's configuration from JSON
    fn load_json(&mut self, raw: &serde_json::Value) -> Result<(), ConfigError>;

    /// Hand the instance to a handler chain
    fn into_handler(self: Box<Self>) -> Box<dyn MiddlewareHandler>;
}

impl<T> HandlerModule for T
where
    T: Module + Provisioner + Validator + Unmarshaler + MiddlewareHandler + DeserializeOwned,
{
    fn load_json(&mut self, raw: &serde_json::Value) -> Result<(), ConfigError> {
        *self = T::deserialize(raw)?;
        Ok(())
    }

    fn into_handler(self: Box<Self>) -> Box<dyn MiddlewareHandler> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_id_splits_namespace_and_name() {
        let id = ModuleId::new("http.handlers.visitor_ip").unwrap();
        assert_eq!(id.namespace(), "http.handlers");
        assert_eq!(id.name(), "visitor_ip");
        assert_eq!(id.to_string(), "http.handlers.visitor_ip");
    }

    #[test]
    fn single_label_id_has_empty_namespace() {
        let id = ModuleId::new("visitor_ip").unwrap();
        assert_eq!(id.namespace(), "");
        assert_eq!(id.name(), "visitor_ip");
    }

    #[test]
    fn malformed_ids_are_rejected() {
        for bad in ["", "http..visitor_ip", "http.handlers.", "http.handlers.visitor ip"] {
            assert!(
                matches!(ModuleId::new(bad), Err(ConfigError::InvalidModuleId { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
