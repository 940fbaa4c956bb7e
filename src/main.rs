//! Trellis demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum, request ID, timeout, body limit)
//!                          │
//!                          ▼
//!                     engine.handle
//!                     ├─ routing::group   → middleware by path prefix
//!                     ├─ routing::table   → handler + params (trie search)
//!                     └─ http::context    → chain: [logger, recovery, .., handler]
//!                          │
//!     Client Response      ▼
//!     ◀────────────── http::response
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use clap::Parser;
use serde_json::json;

use trellis::config::{load_config, ServerConfig};
use trellis::engine::Engine;
use trellis::http::middleware::cors;
use trellis::http::{Context, HttpServer, Templates};
use trellis::lifecycle::shutdown_signal;
use trellis::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Trellis demo web server", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("trellis v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let engine = build_app(&config)?;
    let server = HttpServer::new(engine, config);
    let listener = server.bind().await?;
    server.run(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// The demo application: a few plain routes, a v1 group and a v2 group with
/// its own middleware.
fn build_app(config: &ServerConfig) -> Result<Engine, Box<dyn std::error::Error>> {
    let mut engine = Engine::standard();

    if config.cors.enabled {
        engine.use_middleware(cors(config.cors.clone()));
    }
    if let Some(dir) = &config.assets.templates_dir {
        engine.set_renderer(Templates::load_dir(Path::new(dir))?);
    }
    if let (Some(prefix), Some(dir)) = (&config.assets.static_prefix, &config.assets.static_dir) {
        engine.static_files(prefix, dir);
    }

    engine.get("/", |c: &mut Context| {
        c.string(StatusCode::OK, "Welcome to trellis\n");
    });
    engine.get("/panic", |c: &mut Context| {
        let names = vec!["xxx".to_string()];
        let index = names.len() + 99;
        c.string(StatusCode::OK, &names[index]);
    });

    {
        let mut v1 = engine.group("/v1");
        v1.get("/hello", |c: &mut Context| {
            // expect /v1/hello?name=tom
            let name = c.query("name").unwrap_or_default();
            let body = format!("hello {}, you're at {}\n", name, c.path());
            c.string(StatusCode::OK, body);
        });
    }

    {
        let mut v2 = engine.group("/v2");
        v2.use_middleware(|c: &mut Context| {
            let start = std::time::Instant::now();
            c.next();
            tracing::info!(
                status = c.status_code().as_u16(),
                uri = %c.request().uri(),
                elapsed = ?start.elapsed(),
                "v2 group request"
            );
        });
        v2.get("/hello/:name", |c: &mut Context| {
            // expect /v2/hello/jack
            let name = c.param("name").unwrap_or_default();
            let body = format!("hello {}, you're at {}\n", name, c.path());
            c.string(StatusCode::OK, body);
        });
        v2.post("/login", |c: &mut Context| {
            let body = json!({
                "username": c.post_form("username"),
                "password": c.post_form("password"),
            });
            c.json(StatusCode::OK, &body);
        });
    }

    Ok(engine)
}
