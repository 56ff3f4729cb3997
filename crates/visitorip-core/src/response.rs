//! Response types for visitorip handlers
//!
//! The core trait is [`IntoResponse`], which lets terminal handlers return
//! plain values instead of building an [`http::Response`] by hand.

use crate::error::{ApiError, ErrorResponse};
use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;

/// HTTP Response type
pub type Response = http::Response<Full<Bytes>>;

/// Trait for types that can be converted into an HTTP response
pub trait IntoResponse {
    /// Convert self into a Response
    fn into_response(self) -> Response;
}

fn with_body(status: StatusCode, content_type: Option<&'static str>, body: Bytes) -> Response {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

// 200 OK with empty body
impl IntoResponse for () {
    fn into_response(self) -> Response {
        with_body(StatusCode::OK, None, Bytes::new())
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        with_body(
            StatusCode::OK,
            Some("text/plain; charset=utf-8"),
            Bytes::from_static(self.as_bytes()),
        )
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        with_body(StatusCode::OK, Some("text/plain; charset=utf-8"), Bytes::from(self))
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        with_body(self, None, Bytes::new())
    }
}

impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;
        response
    }
}

impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let error_response = ErrorResponse::from(self);
        let body = serde_json::to_vec(&error_response).unwrap_or_else(|_| {
            br#"{"error":{"type":"internal_error","message":"Failed to serialize error"}}"#.to_vec()
        });

        with_body(status, Some("application/json"), Bytes::from(body))
    }
}
