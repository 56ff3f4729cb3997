use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use visitorip_core::{handler_fn, ApiError, IntoResponse, LayerStack, Request, Server};

async fn send(addr: std::net::SocketAddr, path: &str) -> (String, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let local = stream.local_addr().unwrap().to_string();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    (local, raw)
}

#[tokio::test]
async fn peer_address_reaches_the_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handler = handler_fn(|req: Request| async move {
        if req.path() == "/fail" {
            return Err(ApiError::internal("boom"));
        }
        Ok(req.remote_addr().to_string().into_response())
    });
    tokio::spawn(Server::new(LayerStack::new(), handler).serve(listener));

    let (local, raw) = send(addr, "/").await;
    assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
    assert!(raw.ends_with(&local), "{raw} should end with {local}");

    let (_, raw) = send(addr, "/fail").await;
    assert!(raw.starts_with("HTTP/1.1 500"), "{raw}");
    assert!(raw.contains("internal_error"));
}
