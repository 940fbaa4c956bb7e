//! Built-in middleware.
//!
//! Each constructor returns a chain entry that brackets `Context::next()`:
//! work before the call runs on the way in, work after it on the way out.

pub mod cors;
pub mod logger;
pub mod recovery;

pub use cors::cors;
pub use logger::logger;
pub use recovery::recovery;
