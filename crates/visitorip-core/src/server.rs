//! HTTP server that feeds accepted connections through a handler chain

use crate::middleware::{BoxedNext, LayerStack};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Accept loop around a handler chain and its terminal handler
pub struct Server {
    layers: Arc<LayerStack>,
    handler: BoxedNext,
}

impl Server {
    pub fn new(layers: LayerStack, handler: BoxedNext) -> Self {
        Self {
            layers: Arc::new(layers),
            handler,
        }
    }

    /// Run the server
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(addr = %listener.local_addr()?, layers = self.layers.len(), "server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let layers = self.layers.clone();
            let handler = self.handler.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let layers = layers.clone();
                    let handler = handler.clone();
                    async move {
                        let response = handle_request(layers, handler, req, remote_addr).await;
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Connection error: {}", err);
                }
            });
        }
    }
}

/// Handle a single HTTP request
async fn handle_request(
    layers: Arc<LayerStack>,
    handler: BoxedNext,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Response {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            error!(error = %err, "failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let request = Request::new(parts, body, remote_addr.to_string());

    match layers.execute(request, handler).await {
        Ok(response) => response,
        Err(err) => {
            if let Some(details) = err.internal_details() {
                error!(status = %err.status.as_u16(), details = %details, "handler error");
            }
            err.into_response()
        }
    }
}
