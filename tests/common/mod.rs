//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use tower::ServiceExt;

use trellis::config::ServerConfig;
use trellis::{Context, Engine, HttpServer, Shutdown};

/// Ordered record of chain events.
pub type Trace = Arc<Mutex<Vec<String>>>;

pub fn trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

#[allow(dead_code)]
pub fn events(trace: &Trace) -> Vec<String> {
    trace.lock().unwrap().clone()
}

/// Middleware recording `<name>-before` and `<name>-after` around `next()`.
#[allow(dead_code)]
pub fn onion(trace: &Trace, name: &'static str) -> impl Fn(&mut Context) + Send + Sync + 'static {
    let trace = Arc::clone(trace);
    move |c: &mut Context| {
        trace.lock().unwrap().push(format!("{name}-before"));
        c.next();
        trace.lock().unwrap().push(format!("{name}-after"));
    }
}

/// Send one request through the server's router without a socket.
#[allow(dead_code)]
pub async fn send(
    engine: Engine,
    method: Method,
    uri: &str,
    body: Option<(&str, &'static str)>,
) -> (StatusCode, axum::http::HeaderMap, String) {
    let server = HttpServer::new(engine, ServerConfig::default());
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some((content_type, body)) => {
            builder = builder.header("content-type", content_type);
            Body::from(body)
        }
        None => Body::empty(),
    };

    let response = server
        .router()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8_lossy(&bytes).into_owned())
}

/// Serve `engine` on an ephemeral local port.
#[allow(dead_code)]
pub async fn spawn_server(engine: Engine) -> (SocketAddr, Shutdown) {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();

    let server = HttpServer::new(engine, config);
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let stop = shutdown.wait();
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });

    (addr, shutdown)
}
