//! The application: registration surface, grouping and dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use http_types::{Method, Request, Response};

use crate::context::{Context, Handle};
use crate::middleware::StaticDir;
use crate::router::Router;
use crate::server;

/// State shared by a group of routes: a path prefix plus the middleware
/// applied to every request under that prefix.
struct Scope {
    prefix: String,
    middleware: Vec<Arc<dyn Handle>>,
}

/// The engine. Owns the route table and the group scopes.
///
/// Routes and middleware are registered up front; [`listen`] then consumes
/// the application, so the table provably cannot change once traffic is
/// flowing and lookups run without locks.
///
/// [`listen`]: Application::listen
pub struct Application {
    router: Router,
    /// Scopes in declaration order. Index 0 is the root scope with the
    /// empty prefix, which matches every request.
    groups: Vec<Scope>,
}

impl Application {
    pub fn new() -> Application {
        Application {
            router: Router::new(),
            groups: vec![Scope {
                prefix: String::new(),
                middleware: Vec::new(),
            }],
        }
    }

    /// Create a routing group under `prefix`. Routes registered through
    /// the group get the prefix prepended; middleware attached to it runs
    /// for every request whose path starts with the prefix.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        let scope = self.push_scope(prefix.to_string());
        Group { app: self, scope }
    }

    /// Attach middleware to every request.
    pub fn with(&mut self, middleware: impl Handle + 'static) {
        self.groups[0].middleware.push(Arc::new(middleware));
    }

    /// Register `handler` for `method` on `pattern`.
    pub fn handle(&mut self, method: Method, pattern: &str, handler: impl Handle + 'static) {
        self.register(0, method, pattern, Arc::new(handler));
    }

    /// Register `handler` for GET requests on `pattern`.
    pub fn get(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Get, pattern, handler);
    }

    /// Register `handler` for HEAD requests on `pattern`.
    pub fn head(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Head, pattern, handler);
    }

    /// Register `handler` for OPTIONS requests on `pattern`.
    pub fn options(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Options, pattern, handler);
    }

    /// Register `handler` for POST requests on `pattern`.
    pub fn post(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Post, pattern, handler);
    }

    /// Register `handler` for PUT requests on `pattern`.
    pub fn put(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Put, pattern, handler);
    }

    /// Register `handler` for PATCH requests on `pattern`.
    pub fn patch(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Patch, pattern, handler);
    }

    /// Register `handler` for DELETE requests on `pattern`.
    pub fn delete(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Delete, pattern, handler);
    }

    /// Serve the files under `root` at `GET {path}/*filepath`.
    pub fn static_dir(&mut self, path: &str, root: impl Into<PathBuf>) {
        let pattern = static_pattern(path);
        self.get(&pattern, StaticDir::new(root));
    }

    /// Registered patterns for `method`, in trie order.
    pub fn routes(&self, method: Method) -> Vec<&str> {
        self.router.routes(method)
    }

    /// The underlying route table, for manual lookups.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Dispatch one request through the middleware chain and the route
    /// table, yielding the response.
    ///
    /// Public so embedders and tests can drive an application without a
    /// TCP listener.
    pub async fn respond(&self, request: Request) -> Response {
        let mut ctx = Context::new(request);
        for scope in &self.groups {
            if ctx.path().starts_with(scope.prefix.as_str()) {
                for middleware in &scope.middleware {
                    ctx.append_handler(middleware.clone());
                }
            }
        }

        if let Err(err) = self.router.dispatch(&mut ctx).await {
            log::error!("uncaught error on {} {}: {}", ctx.method(), ctx.path(), err);
            if !ctx.committed() {
                let mut response = Response::new(err.status());
                response.set_body(err.status().canonical_reason());
                return response;
            }
        }
        ctx.into_response()
    }

    /// Bind `addr` and serve until the listener fails.
    ///
    /// Takes the application by value: registration ends where serving
    /// begins.
    pub async fn listen(self, addr: impl Into<String>) -> std::io::Result<()> {
        server::serve(self, addr.into()).await
    }

    fn push_scope(&mut self, prefix: String) -> usize {
        self.groups.push(Scope {
            prefix,
            middleware: Vec::new(),
        });
        self.groups.len() - 1
    }

    fn register(&mut self, scope: usize, method: Method, pattern: &str, handler: Arc<dyn Handle>) {
        let pattern = format!("{}{}", self.groups[scope].prefix, pattern);
        if let Err(err) = self.router.add_route(method, &pattern, handler) {
            panic!("route registration failed: {}", err);
        }
        log::info!("route {:>6} - {}", method, pattern);
    }
}

impl Default for Application {
    fn default() -> Application {
        Application::new()
    }
}

/// A registration view over one scope.
///
/// Groups borrow the application, so every registration still lands in the
/// one shared route table; dropping a group loses nothing.
pub struct Group<'a> {
    app: &'a mut Application,
    scope: usize,
}

impl<'a> Group<'a> {
    /// Create a nested group. Its prefix is appended to this group's.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        let prefix = format!("{}{}", self.app.groups[self.scope].prefix, prefix);
        let scope = self.app.push_scope(prefix);
        Group {
            app: &mut *self.app,
            scope,
        }
    }

    /// Attach middleware to this group, in registration order.
    pub fn with(&mut self, middleware: impl Handle + 'static) {
        self.app.groups[self.scope]
            .middleware
            .push(Arc::new(middleware));
    }

    /// Register `handler` for `method` on this group's `pattern`.
    pub fn handle(&mut self, method: Method, pattern: &str, handler: impl Handle + 'static) {
        self.app.register(self.scope, method, pattern, Arc::new(handler));
    }

    /// Register `handler` for GET requests on `pattern`.
    pub fn get(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Get, pattern, handler);
    }

    /// Register `handler` for HEAD requests on `pattern`.
    pub fn head(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Head, pattern, handler);
    }

    /// Register `handler` for OPTIONS requests on `pattern`.
    pub fn options(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Options, pattern, handler);
    }

    /// Register `handler` for POST requests on `pattern`.
    pub fn post(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Post, pattern, handler);
    }

    /// Register `handler` for PUT requests on `pattern`.
    pub fn put(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Put, pattern, handler);
    }

    /// Register `handler` for PATCH requests on `pattern`.
    pub fn patch(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Patch, pattern, handler);
    }

    /// Register `handler` for DELETE requests on `pattern`.
    pub fn delete(&mut self, pattern: &str, handler: impl Handle + 'static) {
        self.handle(Method::Delete, pattern, handler);
    }

    /// Serve the files under `root` at `GET {prefix}{path}/*filepath`.
    pub fn static_dir(&mut self, path: &str, root: impl Into<PathBuf>) {
        let pattern = static_pattern(path);
        self.get(&pattern, StaticDir::new(root));
    }
}

fn static_pattern(path: &str) -> String {
    format!("{}/*filepath", path.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(c: &mut Context) -> crate::BoxFut<'_> {
        Box::pin(async move { c.string(http_types::StatusCode::Ok, "ok") })
    }

    #[test]
    fn nested_groups_compose_prefixes() {
        let mut app = Application::new();
        let mut v1 = app.group("/v1");
        let mut admin = v1.group("/admin");
        admin.get("/users", ok);

        assert_eq!(app.routes(Method::Get), vec!["/v1/admin/users"]);
    }

    #[test]
    #[should_panic(expected = "route registration failed")]
    fn conflicting_dynamic_segments_panic_at_registration() {
        let mut app = Application::new();
        app.get("/p/:id", ok);
        app.get("/p/:name", ok);
    }
}
