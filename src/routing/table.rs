//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Keep one trie per HTTP method
//! - Store handlers under `METHOD-pattern` keys
//! - Resolve a (method, path) pair into a pattern and its parameter bindings
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Methods are independent namespaces
//! - Re-registering a (method, pattern) pair replaces the handler
//! - Explicit no-match rather than an error

use std::collections::HashMap;

use crate::routing::trie::{parse_pattern, Node};

/// Path parameters bound by a route match, keyed by parameter name.
pub type Params = HashMap<String, String>;

/// A successful route lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The registered pattern that matched.
    pub pattern: &'a str,
    /// Values bound to the pattern's `:name` and `*name` segments.
    pub params: Params,
}

/// Method-partitioned route table.
#[derive(Debug)]
pub struct RouteTable<H> {
    roots: HashMap<String, Node>,
    handlers: HashMap<String, H>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            roots: HashMap::new(),
            handlers: HashMap::new(),
        }
    }
}

fn handler_key(method: &str, pattern: &str) -> String {
    format!("{method}-{pattern}")
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `pattern`.
    pub fn add_route(&mut self, method: &str, pattern: &str, handler: H) {
        let parts = parse_pattern(pattern);
        self.roots
            .entry(method.to_string())
            .or_insert_with(Node::root)
            .insert(pattern, &parts, 0);

        if self
            .handlers
            .insert(handler_key(method, pattern), handler)
            .is_some()
        {
            tracing::warn!(method, pattern, "Route re-registered, previous handler replaced");
        }
    }

    /// Resolve `path` against the routes registered for `method`.
    pub fn get_route(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        let root = self.roots.get(method)?;
        let search_parts = parse_pattern(path);
        let node = root.search(&search_parts, 0)?;
        let pattern = node.pattern()?;

        let mut params = Params::new();
        for (index, part) in parse_pattern(pattern).into_iter().enumerate() {
            if let Some(name) = part.strip_prefix(':') {
                if let Some(value) = search_parts.get(index) {
                    params.insert(name.to_string(), (*value).to_string());
                }
            } else if let Some(name) = part.strip_prefix('*') {
                if !name.is_empty() {
                    let rest = search_parts.get(index..).unwrap_or_default();
                    params.insert(name.to_string(), rest.join("/"));
                }
                break;
            }
        }

        Some(RouteMatch { pattern, params })
    }

    /// Handler registered for an exact (method, pattern) pair.
    pub fn handler(&self, method: &str, pattern: &str) -> Option<&H> {
        self.handlers.get(&handler_key(method, pattern))
    }

    /// Every node terminating a route registered for `method`, depth-first.
    pub fn routes(&self, method: &str) -> Vec<&Node> {
        let mut nodes = Vec::new();
        if let Some(root) = self.roots.get(method) {
            root.travel(&mut nodes);
        }
        nodes
    }

    /// Methods with at least one registered route, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.roots.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }
}
