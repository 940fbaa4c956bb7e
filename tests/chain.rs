//! Middleware chain behavior through the engine.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use trellis::http::Request;
use trellis::{Context, Engine};

mod common;
use common::{events, onion, trace};

fn get(engine: &Engine, uri: &str) -> trellis::http::Response {
    engine.handle(Request::new(Method::GET, uri.parse().unwrap()))
}

#[test]
fn test_onion_ordering() {
    let log = trace();
    let mut engine = Engine::new();
    engine.use_middleware(onion(&log, "A"));
    engine.use_middleware(onion(&log, "B"));
    let handler_log = Arc::clone(&log);
    engine.get("/", move |c: &mut Context| {
        handler_log.lock().unwrap().push("handler".into());
        c.string(StatusCode::OK, "ok");
    });

    let response = get(&engine, "/");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        events(&log),
        vec!["A-before", "B-before", "handler", "B-after", "A-after"]
    );
}

#[test]
fn test_abort_short_circuits_the_chain() {
    let log = trace();
    let mut engine = Engine::new();
    let first = Arc::clone(&log);
    engine.use_middleware(move |c: &mut Context| {
        first.lock().unwrap().push("first-before".into());
        c.abort();
        c.next();
    });
    engine.use_middleware(onion(&log, "second"));
    engine.use_middleware(onion(&log, "third"));
    let handler_log = Arc::clone(&log);
    engine.get("/", move |_: &mut Context| {
        handler_log.lock().unwrap().push("handler".into());
    });

    get(&engine, "/");
    assert_eq!(events(&log), vec!["first-before"]);
}

#[test]
fn test_fail_unwinds_outer_middleware() {
    let log = trace();
    let mut engine = Engine::new();
    engine.use_middleware(onion(&log, "outer"));
    {
        let mut admin = engine.group("/admin");
        let guard = Arc::clone(&log);
        admin.use_middleware(move |c: &mut Context| {
            guard.lock().unwrap().push("guard".into());
            if c.header("authorization").is_none() {
                c.fail(StatusCode::UNAUTHORIZED, "missing credentials");
            }
            c.next();
        });
        let handler_log = Arc::clone(&log);
        admin.get("/panel", move |c: &mut Context| {
            handler_log.lock().unwrap().push("handler".into());
            c.string(StatusCode::OK, "panel");
        });
    }

    let response = get(&engine, "/admin/panel");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(String::from_utf8_lossy(response.body()).contains("missing credentials"));
    assert_eq!(events(&log), vec!["outer-before", "guard", "outer-after"]);
}

#[test]
fn test_group_scoping() {
    let log = trace();
    let mut engine = Engine::new();
    {
        let mut v1 = engine.group("/v1");
        v1.get("/hello", |c: &mut Context| c.string(StatusCode::OK, "v1"));
    }
    {
        let mut v2 = engine.group("/v2");
        v2.use_middleware(onion(&log, "v2"));
        v2.get("/hello/:name", |c: &mut Context| c.string(StatusCode::OK, "v2"));
    }

    get(&engine, "/v1/hello");
    assert!(events(&log).is_empty());

    get(&engine, "/v2/hello/jack");
    assert_eq!(events(&log), vec!["v2-before", "v2-after"]);
}

#[test]
fn test_group_middleware_runs_for_unmatched_paths_under_prefix() {
    let log = trace();
    let mut engine = Engine::new();
    engine.group("/v2").use_middleware(onion(&log, "v2"));

    let response = get(&engine, "/v2/nothing");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(events(&log), vec!["v2-before", "v2-after"]);
}

#[test]
fn test_group_middleware_registered_first_runs_first() {
    let log = trace();
    let mut engine = Engine::new();
    engine.group("/v2").use_middleware(onion(&log, "v2"));
    engine.use_middleware(onion(&log, "global"));
    engine.get("/v2/x", |_: &mut Context| {});

    get(&engine, "/v2/x");
    // Root group is registered before any other group, whatever the `use` order.
    assert_eq!(
        events(&log),
        vec!["global-before", "v2-before", "v2-after", "global-after"]
    );
}

#[test]
fn test_insertion_order_tie_break() {
    let mut literal_first = Engine::new();
    literal_first.get("/a/b", |c: &mut Context| c.string(StatusCode::OK, "literal"));
    literal_first.get("/a/:x", |c: &mut Context| c.string(StatusCode::OK, "param"));
    assert_eq!(get(&literal_first, "/a/b").body(), b"literal");
    assert_eq!(get(&literal_first, "/a/z").body(), b"param");

    let mut param_first = Engine::new();
    param_first.get("/a/:x", |c: &mut Context| c.string(StatusCode::OK, "param"));
    param_first.get("/a/b", |c: &mut Context| c.string(StatusCode::OK, "literal"));
    assert_eq!(get(&param_first, "/a/b").body(), b"param");
}

#[test]
fn test_recovery_in_standard_engine() {
    let mut engine = Engine::standard();
    engine.get("/panic", |_: &mut Context| panic!("handler exploded"));

    let response = get(&engine, "/panic");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = String::from_utf8_lossy(response.body()).into_owned();
    assert!(body.contains("Internal Server Error"));
    assert!(!body.contains("handler exploded"));
}
