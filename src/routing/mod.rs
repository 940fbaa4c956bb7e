//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     (method, pattern, handler)
//!     → table.rs (per-method trie + handler map)
//!     → trie.rs (insert pattern segments)
//!     group prefix + middleware
//!     → group.rs (flat registry, prefix composition)
//!
//! Incoming Request (method, path):
//!     → group.rs (collect middleware by prefix)
//!     → table.rs (trie search, parameter binding)
//!     → Return: matched pattern + params, or no match
//! ```
//!
//! # Design Decisions
//! - Routes and groups are built once, immutable while serving
//! - No regex: literal, `:name` and trailing `*name` segments only
//! - Deterministic: first candidate in insertion order wins

pub mod group;
pub mod table;
pub mod trie;

pub use group::{Group, GroupId, GroupRegistry, ROOT_GROUP};
pub use table::{Params, RouteMatch, RouteTable};
pub use trie::{parse_pattern, Node};
