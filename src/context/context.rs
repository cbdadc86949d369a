//! The request context and the middleware chain it drives.
//!
//! Every inbound request gets a fresh [`Context`] carrying the request, the
//! response under construction, the route parameters and the resolved
//! handler chain. Handlers run as an onion: each one may do work, call
//! [`Context::next`] to run the rest of the chain, then do more work on the
//! way back out.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http_types::{mime, Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use serde_json::json;

use crate::router::Params;

/// Boxed future returned by handlers.
pub type BoxFut<'a> = Pin<Box<dyn Future<Output = crate::Result<()>> + Send + 'a>>;

/// A request handler or middleware.
///
/// Handlers receive the mutable [`Context`] and decide whether the rest of
/// the chain runs: call [`Context::next`] to continue, return without it to
/// stop after yourself, or [`Context::fail`] to short-circuit with an error
/// response. Plain `fn` items with the matching signature implement
/// `Handle` out of the box:
///
/// ```ignore
/// fn hello(c: &mut Context) -> BoxFut<'_> {
///     Box::pin(async move { c.string(StatusCode::Ok, "hello\n") })
/// }
/// ```
pub trait Handle: Send + Sync {
    fn call<'a>(&'a self, c: &'a mut Context) -> BoxFut<'a>;
}

impl<F> Handle for F
where
    F: Send + Sync,
    F: for<'a> Fn(&'a mut Context) -> BoxFut<'a>,
{
    fn call<'a>(&'a self, c: &'a mut Context) -> BoxFut<'a> {
        (self)(c)
    }
}

/// Per-request state threaded through the handler chain.
///
/// A `Context` is created for one inbound request and dropped once the
/// response is handed to the transport. It is never shared between
/// requests, so handlers get `&mut` access without any locking.
pub struct Context {
    request: Request,
    response: Response,
    method: Method,
    path: String,
    params: Params,
    status: StatusCode,
    /// Whether a status has been written. The first write wins.
    committed: bool,
    /// Parsed form body, cached by `post_form`.
    form: Option<HashMap<String, String>>,
    /// The resolved chain: applicable middleware, then the route handler.
    handlers: Vec<Arc<dyn Handle>>,
    /// Index of the next handler to run. It only ever moves forward; once
    /// it reaches `handlers.len()` the chain is over.
    cursor: usize,
}

impl Context {
    pub(crate) fn new(request: Request) -> Context {
        let method = request.method();
        let path = request.url().path().to_string();
        Context {
            request,
            response: Response::new(StatusCode::Ok),
            method,
            path,
            params: Params::new(),
            status: StatusCode::Ok,
            committed: false,
            form: None,
            handlers: Vec::new(),
            cursor: 0,
        }
    }

    /// HTTP method of the request.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Path component of the request URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Status most recently committed to the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The value bound by the dynamic route segment `name`.
    ///
    /// For `/hello/:name` resolved against `/hello/ada`, `param("name")` is
    /// `Some("ada")`. Wildcard segments bind the joined remainder of the
    /// path.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.by_name(name)
    }

    /// All parameters extracted by the route lookup.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// First query-string value under `key`.
    pub fn query(&self, key: &str) -> Option<String> {
        self.request
            .url()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.into_owned())
    }

    /// First urlencoded form value under `key`.
    ///
    /// The body is read and parsed on first use, then cached for the rest
    /// of the request. A missing or malformed body reads as empty.
    pub async fn post_form(&mut self, key: &str) -> Option<String> {
        if self.form.is_none() {
            let parsed = self
                .request
                .body_form::<HashMap<String, String>>()
                .await
                .unwrap_or_default();
            self.form = Some(parsed);
        }
        self.form.as_ref().and_then(|form| form.get(key).cloned())
    }

    /// The underlying request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Mutable access to the underlying request, for direct body reads.
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Run the next handler in the chain.
    ///
    /// Downstream handlers execute entirely inside this call, so code after
    /// the `.await` is the unwind phase and runs in reverse registration
    /// order. A handler that never calls `next` ends the chain after
    /// itself. The cursor never rewinds, so calling it again once the chain
    /// has finished is a no-op.
    pub async fn next(&mut self) -> crate::Result<()> {
        if self.cursor < self.handlers.len() {
            let handler = self.handlers[self.cursor].clone();
            self.cursor += 1;
            handler.call(self).await?;
        }
        Ok(())
    }

    /// Short-circuit the chain with an error response.
    ///
    /// The cursor jumps past every handler not yet started; handlers
    /// already on the stack still get their unwind phase. The response body
    /// becomes `{"message": ...}`.
    pub fn fail(&mut self, status: StatusCode, message: impl AsRef<str>) -> crate::Result<()> {
        self.cursor = self.handlers.len();
        self.set_status(status);
        let message = message.as_ref();
        let body = Body::from_json(&json!({ "message": message }))
            .unwrap_or_else(|_| Body::from(message));
        self.response.set_body(body);
        Ok(())
    }

    /// Commit a response status. The first write wins; later writes are
    /// ignored.
    pub fn set_status(&mut self, status: StatusCode) {
        if self.committed {
            return;
        }
        self.committed = true;
        self.status = status;
        self.response.set_status(status);
    }

    /// Set a response header.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.response.insert_header(name, value);
    }

    /// Respond with a prepared body. The content type follows the body's
    /// mime.
    pub fn body(&mut self, status: StatusCode, body: Body) -> crate::Result<()> {
        self.set_status(status);
        self.response.set_body(body);
        Ok(())
    }

    /// Respond with a plain-text body.
    pub fn string(&mut self, status: StatusCode, body: impl Into<String>) -> crate::Result<()> {
        self.body(status, Body::from_string(body.into()))
    }

    /// Respond with `value` serialized as JSON.
    ///
    /// A value that fails to serialize becomes a 500 via [`fail`] and the
    /// chain goes no further; nothing of the broken payload is written.
    ///
    /// [`fail`]: Context::fail
    pub fn json(&mut self, status: StatusCode, value: &impl Serialize) -> crate::Result<()> {
        match Body::from_json(value) {
            Ok(body) => self.body(status, body),
            Err(err) => self.fail(StatusCode::InternalServerError, err.to_string()),
        }
    }

    /// Respond with raw bytes.
    pub fn data(&mut self, status: StatusCode, data: Vec<u8>) -> crate::Result<()> {
        self.body(status, Body::from_bytes(data))
    }

    /// Respond with an HTML body.
    pub fn html(&mut self, status: StatusCode, body: impl Into<String>) -> crate::Result<()> {
        self.body(status, Body::from_string(body.into()))?;
        self.response.set_content_type(mime::HTML);
        Ok(())
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub(crate) fn append_handler(&mut self, handler: Arc<dyn Handle>) {
        self.handlers.push(handler);
    }

    pub(crate) fn committed(&self) -> bool {
        self.committed
    }

    /// Consume the context, yielding the response for the transport.
    pub(crate) fn into_response(self) -> Response {
        self.response
    }
}
