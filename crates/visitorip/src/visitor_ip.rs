//! Visitor address middleware
//!
//! Writes the remote address of every request, as raw bytes with no
//! separator, to the process's standard output or standard error, then
//! passes the request on untouched.
//!
//! # Configuration
//!
//! ```text
//! visitor_ip stdout
//! ```
//!
//! or, as JSON handed to [`Registry::load_module`](visitorip_core::Registry::load_module):
//!
//! ```json
//! {"output": "stderr"}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use visitorip_core::{
    BoxedNext, ConfigError, Context, Dispenser, HandlerFuture, HandlerModule, Helper,
    MiddlewareHandler, Module, ModuleInfo, Provisioner, Request, SharedSink, Unmarshaler,
    Validator,
};

/// Module id under which the middleware is registered
pub const MODULE_ID: &str = "http.handlers.visitor_ip";

/// Textual configuration keyword
pub const DIRECTIVE: &str = "visitor_ip";

const OUTPUT_REQUIRED: &str = "an output stream is required";
const NO_WRITER: &str = "no writer";

/// Standard stream the addresses are written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl FromStr for OutputStream {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            _ => Err(ConfigError::provision(OUTPUT_REQUIRED)),
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct Destination {
    stream: OutputStream,
    sink: SharedSink,
}

/// Middleware that records each visitor's remote address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitorIp {
    /// The stream to write to. Either `"stdout"` or `"stderr"`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,

    #[serde(skip)]
    destination: Option<Destination>,
}

impl VisitorIp {
    /// Unconfigured instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance with its output selector set, not yet provisioned
    pub fn with_output(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            destination: None,
        }
    }

    /// The stream bound by the last successful provisioning
    pub fn output_stream(&self) -> Option<OutputStream> {
        self.destination.as_ref().map(|d| d.stream)
    }
}

impl Module for VisitorIp {
    fn module_info() -> ModuleInfo {
        ModuleInfo {
            id: MODULE_ID,
            new: || -> Box<dyn HandlerModule> { Box::new(VisitorIp::new()) },
        }
    }
}

impl Provisioner for VisitorIp {
    fn provision(&mut self, ctx: &Context) -> Result<(), ConfigError> {
        let stream: OutputStream = self.output.parse()?;
        let sink = match stream {
            OutputStream::Stdout => ctx.stdout(),
            OutputStream::Stderr => ctx.stderr(),
        };
        debug!(module = MODULE_ID, output = %stream, sink = sink.id(), "provisioned");
        self.destination = Some(Destination { stream, sink });
        Ok(())
    }
}

impl Validator for VisitorIp {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.destination.is_none() {
            return Err(ConfigError::validation(NO_WRITER));
        }
        Ok(())
    }
}

impl MiddlewareHandler for VisitorIp {
    fn call(&self, req: Request, next: BoxedNext) -> HandlerFuture {
        if let Some(destination) = &self.destination {
            // Best effort: a failed write must never affect the request.
            let _ = destination.sink.write_raw(req.remote_addr().as_bytes());
        }
        next(req)
    }

    fn clone_box(&self) -> Box<dyn MiddlewareHandler> {
        Box::new(self.clone())
    }
}

impl Unmarshaler for VisitorIp {
    /// Reads `visitor_ip <output>`; a later occurrence overrides an earlier one.
    fn unmarshal_config(&mut self, d: &mut Dispenser) -> Result<(), ConfigError> {
        while d.next_token() {
            let mut output = String::new();
            if !d.args(&mut [&mut output]) || d.next_arg() {
                return Err(d.arg_err());
            }
            self.output = output;
        }
        Ok(())
    }
}

/// Directive parser: builds a fresh instance from the helper's tokens
pub fn parse_directive(h: &mut Helper) -> Result<Box<dyn HandlerModule>, ConfigError> {
    let mut m = VisitorIp::new();
    m.unmarshal_config(h.dispenser())?;
    Ok(Box::new(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use visitorip_core::MemorySink;

    fn stdio() -> (MemorySink, MemorySink, Context) {
        let out = MemorySink::new("stdout");
        let err = MemorySink::new("stderr");
        let ctx = Context::with_stdio(Arc::new(out.clone()), Arc::new(err.clone()));
        (out, err, ctx)
    }

    #[test]
    fn output_stream_parses_closed_set() {
        assert_eq!("stdout".parse::<OutputStream>().unwrap(), OutputStream::Stdout);
        assert_eq!("stderr".parse::<OutputStream>().unwrap(), OutputStream::Stderr);
        for bad in ["", "STDOUT", "stdout ", "file", "-"] {
            let err = bad.parse::<OutputStream>().unwrap_err();
            assert_eq!(err.to_string(), "an output stream is required");
        }
    }

    #[test]
    fn failed_provision_leaves_instance_unservable() {
        let (_, _, ctx) = stdio();
        let mut m = VisitorIp::with_output("syslog");

        assert!(m.provision(&ctx).is_err());
        assert_eq!(m.output_stream(), None);
        assert_eq!(m.validate().unwrap_err().to_string(), "no writer");
    }

    #[test]
    fn provision_binds_matching_stream() {
        let (out, err, ctx) = stdio();
        let mut m = VisitorIp::with_output("stderr");
        m.provision(&ctx).unwrap();

        let dest = m.destination.as_ref().unwrap();
        dest.sink.write_raw(b"x").unwrap();
        assert_eq!(err.contents(), b"x");
        assert!(out.contents().is_empty());
    }

    #[test]
    fn json_round_trip_skips_destination() {
        let (_, _, ctx) = stdio();
        let mut m = VisitorIp::with_output("stdout");
        m.provision(&ctx).unwrap();

        assert_eq!(serde_json::to_value(&m).unwrap(), serde_json::json!({"output": "stdout"}));
        assert_eq!(serde_json::to_value(VisitorIp::new()).unwrap(), serde_json::json!({}));

        let decoded: VisitorIp = serde_json::from_value(serde_json::json!({"output": "stderr"})).unwrap();
        assert_eq!(decoded.output, "stderr");
        assert_eq!(decoded.output_stream(), None);
    }
}
