//! Registration-time error types.

use thiserror::Error;

/// Errors surfaced while the route table is being built.
///
/// These are setup-time conditions. They can only occur while routes are
/// registered, never while a request is served: lookups on a populated
/// table are infallible apart from the not-found case.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// A dynamic segment was registered at a position already claimed by a
    /// different dynamic segment (`/p/:id` vs `/p/:name`, or `:file` vs
    /// `*file`). The first registration stays in effect.
    #[error("conflicting parameter `{segment}` in `{pattern}`: position already taken by `{existing}`")]
    Conflict {
        /// The pattern whose registration was rejected.
        pattern: String,
        /// The offending segment of the rejected pattern.
        segment: String,
        /// The dynamic segment already registered at this position.
        existing: String,
    },

    /// Route patterns must begin with `/`.
    #[error("pattern must begin with '/', got `{0}`")]
    InvalidPattern(String),
}
