//! Route registration and per-request dispatch.
//!
//! # Data Flow
//! ```text
//! Startup (&mut Engine):
//!     engine.group("/v2") → RouterGroup
//!     group.use_middleware(..) → GroupRegistry
//!     group.get("/hello/:name", ..) → RouteTable ("/v2/hello/:name")
//!
//! Serving (&Engine, shared via Arc):
//!     Request
//!     → GroupRegistry::middlewares_for(path)
//!     → RouteTable::get_route(method, path) → handler + params
//!     → Context { chain: [middlewares.., handler] }.next()
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Registration needs `&mut Engine`; once the engine is shared for serving it is
//!   read-only, so routes cannot change while requests are in flight
//! - The route handler is always the last chain entry; unmatched requests get the
//!   not-found handler with empty params

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::http::context::{Context, HandlerFunc};
use crate::http::middleware::{logger, recovery};
use crate::http::render::{HtmlRenderer, Templates, NOT_FOUND_TEMPLATE};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::static_files::{static_handler, FILEPATH_PARAM};
use crate::routing::{GroupId, GroupRegistry, RouteTable, ROOT_GROUP};

/// Default not-found handler: renders `404.html` with the request path.
pub fn not_found(c: &mut Context) {
    let path = c.path().to_string();
    c.html(StatusCode::NOT_FOUND, NOT_FOUND_TEMPLATE, &json!({ "path": path }));
}

/// Routes, groups and renderer for one application.
pub struct Engine {
    table: RouteTable<HandlerFunc>,
    groups: GroupRegistry<HandlerFunc>,
    renderer: Arc<dyn HtmlRenderer>,
    not_found: HandlerFunc,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("routes", &self.routes())
            .field("groups", &self.groups.len())
            .finish_non_exhaustive()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with no middleware and the built-in templates.
    pub fn new() -> Self {
        Self {
            table: RouteTable::new(),
            groups: GroupRegistry::new(),
            renderer: Arc::new(Templates::new()),
            not_found: Arc::new(not_found),
        }
    }

    /// An engine with [`logger`] and [`recovery`] installed on the root group.
    pub fn standard() -> Self {
        let mut engine = Self::new();
        engine.use_middleware(logger()).use_middleware(recovery());
        engine
    }

    // ---- registration ----

    /// Handle on the root group.
    pub fn root(&mut self) -> RouterGroup<'_> {
        RouterGroup {
            engine: self,
            id: ROOT_GROUP,
        }
    }

    /// Create a group whose prefix is `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        let id = self.groups.add_group(ROOT_GROUP, prefix);
        RouterGroup { engine: self, id }
    }

    pub fn use_middleware<H>(&mut self, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.groups.add_middleware(ROOT_GROUP, Arc::new(handler));
        self
    }

    pub fn add_route<H>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.register(method, pattern.to_string(), Arc::new(handler));
        self
    }

    pub fn get<H>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::GET, pattern, handler)
    }

    pub fn post<H>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::POST, pattern, handler)
    }

    /// Serve files under `root` at `relative/*filepath`.
    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> &mut Self {
        self.root().static_files(relative, root);
        self
    }

    /// Replace the renderer used by `html` and `fail`.
    pub fn set_renderer(&mut self, renderer: impl HtmlRenderer + 'static) -> &mut Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Replace the handler run when no route matches.
    pub fn set_not_found<H>(&mut self, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.not_found = Arc::new(handler);
        self
    }

    fn register(&mut self, method: Method, pattern: String, handler: HandlerFunc) {
        tracing::info!(method = %method, pattern = %pattern, "Route registered");
        self.table.add_route(method.as_str(), &pattern, handler);
    }

    // ---- introspection ----

    pub fn table(&self) -> &RouteTable<HandlerFunc> {
        &self.table
    }

    pub fn groups(&self) -> &GroupRegistry<HandlerFunc> {
        &self.groups
    }

    /// Every registered `(method, pattern)`, methods sorted.
    pub fn routes(&self) -> Vec<(String, String)> {
        self.table
            .methods()
            .into_iter()
            .flat_map(|method| {
                self.table
                    .routes(method)
                    .into_iter()
                    .filter_map(move |node| node.pattern().map(|p| (method.to_string(), p.to_string())))
            })
            .collect()
    }

    // ---- serving ----

    /// Run the chain for `request` and return the response it produced.
    pub fn handle(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.path().to_string();

        let mut chain = self.groups.middlewares_for(&path);
        let mut ctx = Context::new(request, Arc::clone(&self.renderer));

        let handler = match self.table.get_route(method.as_str(), &path) {
            Some(matched) => {
                tracing::debug!(method = %method, path = %path, pattern = matched.pattern, "Route matched");
                let handler = self.table.handler(method.as_str(), matched.pattern).cloned();
                ctx.set_params(matched.params);
                handler.unwrap_or_else(|| Arc::clone(&self.not_found))
            }
            None => {
                tracing::debug!(method = %method, path = %path, "No route matched");
                Arc::clone(&self.not_found)
            }
        };

        chain.push(handler);
        ctx.set_handlers(chain);
        ctx.next();
        ctx.into_response()
    }
}

/// Registration handle for one group.
///
/// Routes registered through it are prefixed with the group's prefix;
/// middleware added to it runs for every path starting with that prefix.
pub struct RouterGroup<'a> {
    engine: &'a mut Engine,
    id: GroupId,
}

impl RouterGroup<'_> {
    pub fn prefix(&self) -> &str {
        self.engine
            .groups
            .get(self.id)
            .map(|group| group.prefix())
            .unwrap_or_default()
    }

    /// Prefix of the group this one was created from.
    pub fn parent_prefix(&self) -> Option<&str> {
        let parent = self.engine.groups.get(self.id)?.parent()?;
        self.engine.groups.get(parent).map(|group| group.prefix())
    }

    /// Create a nested group; its prefix is this group's prefix followed by `prefix`.
    pub fn group(&mut self, prefix: &str) -> RouterGroup<'_> {
        let id = self.engine.groups.add_group(self.id, prefix);
        RouterGroup {
            engine: &mut *self.engine,
            id,
        }
    }

    pub fn use_middleware<H>(&mut self, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.engine.groups.add_middleware(self.id, Arc::new(handler));
        self
    }

    pub fn add_route<H>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        let pattern = format!("{}{}", self.prefix(), pattern);
        self.engine.register(method, pattern, Arc::new(handler));
        self
    }

    pub fn get<H>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::GET, pattern, handler)
    }

    pub fn post<H>(&mut self, pattern: &str, handler: H) -> &mut Self
    where
        H: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.add_route(Method::POST, pattern, handler)
    }

    /// Serve files under `root` at `relative/*filepath` within this group.
    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> &mut Self {
        let root = root.into();
        let pattern = format!("{}/*{}", relative.trim_end_matches('/'), FILEPATH_PARAM);
        tracing::info!(prefix = %self.prefix(), relative, root = %root.display(), "Serving static files");
        self.get(&pattern, static_handler(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn get(engine: &Engine, uri: &str) -> Response {
        engine.handle(Request::new(Method::GET, uri.parse().unwrap()))
    }

    fn body(response: &Response) -> String {
        String::from_utf8_lossy(response.body()).into_owned()
    }

    #[test]
    fn test_group_prefixes_routes() {
        let mut engine = Engine::new();
        {
            let mut v2 = engine.group("/v2");
            v2.get("/hello/:name", |c: &mut Context| {
                let name = c.param("name").unwrap_or_default().to_string();
                c.string(StatusCode::OK, format!("hello {name}"));
            });
            assert_eq!(v2.prefix(), "/v2");
            assert_eq!(v2.parent_prefix(), Some(""));
        }

        let response = get(&engine, "/v2/hello/jack");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response), "hello jack");
        assert_eq!(engine.routes(), vec![("GET".to_string(), "/v2/hello/:name".to_string())]);
    }

    #[test]
    fn test_nested_groups() {
        let mut engine = Engine::new();
        let mut api = engine.group("/api");
        let mut admin = api.group("/admin");
        admin.get("/users", |c: &mut Context| c.string(StatusCode::OK, "users"));
        assert_eq!(admin.prefix(), "/api/admin");
        assert_eq!(admin.parent_prefix(), Some("/api"));

        assert_eq!(body(&get(&engine, "/api/admin/users")), "users");
    }

    #[test]
    fn test_not_found() {
        let engine = Engine::new();
        let response = get(&engine, "/missing");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body(&response).contains("/missing"));
    }

    #[test]
    fn test_custom_not_found_runs_after_middleware() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut engine = Engine::new();
        let log = Arc::clone(&seen);
        engine.use_middleware(move |c: &mut Context| {
            log.lock().unwrap().push(c.params().len());
            c.next();
        });
        engine.set_not_found(|c: &mut Context| c.string(StatusCode::NOT_FOUND, "nothing here"));

        let response = get(&engine, "/missing");
        assert_eq!(body(&response), "nothing here");
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn test_method_isolation() {
        let mut engine = Engine::new();
        engine.get("/only-get", |c: &mut Context| c.string(StatusCode::OK, "ok"));

        let post = engine.handle(Request::new(Method::POST, "/only-get".parse().unwrap()));
        assert_eq!(post.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(&engine, "/only-get").status(), StatusCode::OK);
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let mut engine = Engine::new();
        engine.get("/hello/:name", |c: &mut Context| {
            let name = c.param("name").unwrap_or_default().to_string();
            c.string(StatusCode::OK, name);
        });
        engine.get("/files/*path", |c: &mut Context| {
            let path = c.param("path").unwrap_or_default().to_string();
            c.string(StatusCode::OK, path);
        });

        assert_eq!(body(&get(&engine, "/hello/j%20ack")), "j ack");
        assert_eq!(body(&get(&engine, "/files/my%20docs/a+b.txt")), "my docs/a+b.txt");
    }

    #[test]
    fn test_reregistration_replaces_handler() {
        let mut engine = Engine::new();
        engine.get("/a", |c: &mut Context| c.string(StatusCode::OK, "first"));
        engine.get("/a", |c: &mut Context| c.string(StatusCode::OK, "second"));

        assert_eq!(body(&get(&engine, "/a")), "second");
    }

    #[test]
    fn test_static_files() {
        let dir = std::env::temp_dir().join(format!("trellis-static-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("css")).unwrap();
        std::fs::write(dir.join("css/a.css"), "body{}").unwrap();

        let mut engine = Engine::new();
        engine.static_files("/assets", &dir);
        assert_eq!(
            engine.routes(),
            vec![("GET".to_string(), "/assets/*filepath".to_string())]
        );

        let response = get(&engine, "/assets/css/a.css");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(&response), "body{}");
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "text/css"
        );
        assert_eq!(get(&engine, "/assets/css/missing.css").status(), StatusCode::NOT_FOUND);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
