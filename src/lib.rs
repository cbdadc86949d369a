//! Gust is a small, pragmatic web framework with a trie-based router and
//! chainable middleware.
//!
//! Routes are `/`-delimited patterns. A `:name` segment matches exactly one
//! path segment and binds it as a parameter; a trailing `*name` segment
//! matches the whole remainder. Static segments always win over dynamic
//! ones, no matter the registration order.
//!
//! Handlers run as an onion around the matched route: each middleware may
//! do work, call [`Context::next`] to run the rest of the chain, then do
//! more work on the way back out. Not calling `next` stops the chain;
//! [`Context::fail`] short-circuits it with an error response.
//!
//! ```no_run
//! use gust_web::{BoxFut, Context, StatusCode};
//!
//! fn hello(c: &mut Context) -> BoxFut<'_> {
//!     Box::pin(async move {
//!         let name = c.param("name").unwrap_or("world").to_string();
//!         c.string(StatusCode::Ok, format!("hello {}\n", name))
//!     })
//! }
//!
//! #[async_std::main]
//! async fn main() -> std::io::Result<()> {
//!     let mut app = gust_web::default();
//!     app.get("/hello/:name", hello);
//!     app.listen("127.0.0.1:9999").await
//! }
//! ```

pub mod context;
pub mod error;
pub mod gust;
pub mod middleware;
pub mod router;

mod server;

pub use crate::context::{BoxFut, Context, Handle};
pub use crate::error::RouteError;
pub use crate::gust::{Application, Group};
pub use crate::router::{Param, Params, Router};

pub use http_types::{Body, Method, Request, Response, StatusCode, Url};

pub use http_types::Result;

/// An application with no middleware installed.
pub fn new() -> Application {
    Application::new()
}

/// An application with [`middleware::Logger`] and [`middleware::Recovery`]
/// pre-installed.
pub fn default() -> Application {
    let mut app = Application::new();
    app.with(middleware::Logger);
    app.with(middleware::Recovery);
    app
}
