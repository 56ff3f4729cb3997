//! Request types for visitorip handlers

use bytes::Bytes;
use http::{request::Parts, Extensions, HeaderMap, Method, Uri, Version};

/// HTTP Request wrapper
///
/// Carries the request head, the buffered body and the network address of
/// the peer that sent it, as reported by the host.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Option<Bytes>,
    pub(crate) remote_addr: String,
}

impl Request {
    /// Create a new request from parts
    pub fn new(parts: Parts, body: Bytes, remote_addr: impl Into<String>) -> Self {
        Self {
            parts,
            body: Some(body),
            remote_addr: remote_addr.into(),
        }
    }

    /// Create a request from an `http::Request` with no remote address
    pub fn from_http_request<B>(req: http::Request<B>, body: Bytes) -> Self {
        let (parts, _) = req.into_parts();
        Self::new(parts, body, String::new())
    }

    /// Replace the remote address
    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    /// Remote address of the peer, usually `ip:port`
    ///
    /// The value is whatever the host recorded for the connection; it is
    /// not parsed or normalized.
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get request extensions
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Get mutable extensions
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Take the body bytes (can only be called once)
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("version", &self.parts.version)
            .field("remote_addr", &self.remote_addr)
            .finish()
    }
}
