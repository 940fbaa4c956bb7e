//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router forwarding every request to the engine
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Buffer the request body and run the chain on a blocking worker
//! - Bind server to listener and shut down gracefully

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request as HttpRequest, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::error::ServerError;
use crate::http::middleware::recovery::panic_message;
use crate::http::request::{MakeRequestUuid, Request, X_REQUEST_ID};

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub max_body_bytes: usize,
}

/// HTTP host for a frozen [`Engine`].
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Freeze `engine` and build the server around it.
    pub fn new(engine: Engine, config: ServerConfig) -> Self {
        let state = AppState {
            engine: Arc::new(engine),
            max_body_bytes: config.limits.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);
        // Outermost first: the request id must exist before the trace span opens.
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(x_request_id))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(layers)
    }

    /// The router, for in-process use (e.g. `tower::ServiceExt::oneshot`).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = &self.config.listener.bind_address;
        TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forward a request to the engine.
async fn dispatch(State(state): State<AppState>, request: HttpRequest<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };
    let request = Request::from_parts(parts, body);

    let engine = Arc::clone(&state.engine);
    match tokio::task::spawn_blocking(move || engine.handle(request)).await {
        Ok(response) => response.into_response(),
        Err(e) if e.is_panic() => {
            let payload = e.into_panic();
            tracing::error!(
                panic = %panic_message(payload.as_ref()),
                "Unrecovered handler panic, dropping connection"
            );
            std::panic::resume_unwind(payload)
        }
        Err(e) => {
            tracing::error!(error = %e, "Request worker cancelled");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
