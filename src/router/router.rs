//! Method-indexed route table and request dispatch.

use std::collections::HashMap;
use std::ops::Index;
use std::sync::Arc;

use http_types::{Method, StatusCode};

use crate::context::{BoxFut, Context, Handle};
use crate::error::RouteError;

use super::trie::Node;

/// A single URL parameter, consisting of a key and a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

impl Param {
    pub fn new(key: &str, value: &str) -> Param {
        Param {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// The parameters extracted by a route lookup, in pattern order.
#[derive(Debug, Default, PartialEq)]
pub struct Params(pub Vec<Param>);

impl Params {
    /// The value of the first `Param` whose key matches `name`.
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|param| param.key == name)
            .map(|param| param.value.as_str())
    }

    /// Empty `Params`.
    pub fn new() -> Params {
        Params(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, p: Param) {
        self.0.push(p);
    }
}

impl Index<usize> for Params {
    type Output = str;

    fn index(&self, i: usize) -> &Self::Output {
        &(self.0)[i].value
    }
}

/// Split a pattern or request path into its non-empty segments.
///
/// Empty segments from leading, trailing or doubled slashes are dropped, so
/// `/hello//doc/` reads the same as `/hello/doc`. Parsing stops at (and
/// includes) the first `*` segment: a catch-all is always terminal.
pub(crate) fn parse_pattern(pattern: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for part in pattern.split('/') {
        if part.is_empty() {
            continue;
        }
        parts.push(part);
        if part.starts_with('*') {
            break;
        }
    }
    parts
}

fn route_key(method: Method, pattern: &str) -> String {
    format!("{}-{}", method, pattern)
}

/// The route table: one trie per HTTP method plus a flat pattern-to-handler
/// map keyed by `"{method}-{pattern}"`.
///
/// The table is append-only and meant to be populated before traffic
/// starts. Lookups take `&self` and never lock; [`Application::listen`]
/// enforces the freeze by consuming the application.
///
/// [`Application::listen`]: crate::Application::listen
pub struct Router {
    roots: HashMap<Method, Node>,
    handlers: HashMap<String, Arc<dyn Handle>>,
}

impl Router {
    pub fn new() -> Router {
        Router {
            roots: HashMap::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `method` on `pattern`.
    ///
    /// Re-registering the same pattern replaces its handler. A dynamic
    /// segment that collides with a different dynamic segment already in
    /// the tree is rejected and the existing routes stay as they were.
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Arc<dyn Handle>,
    ) -> Result<(), RouteError> {
        if !pattern.starts_with('/') {
            return Err(RouteError::InvalidPattern(pattern.to_string()));
        }

        let parts = parse_pattern(pattern);
        self.roots
            .entry(method)
            .or_insert_with(Node::root)
            .insert(pattern, &parts, 0)?;
        self.handlers.insert(route_key(method, pattern), handler);
        Ok(())
    }

    /// Resolve `path` for `method`, returning the registered pattern and
    /// the parameters it binds, or `None` when nothing matches.
    ///
    /// A `:name` segment binds the request segment at its position; a
    /// `*name` segment binds the joined remainder of the path.
    pub fn get_route(&self, method: Method, path: &str) -> Option<(&str, Params)> {
        let search_parts = parse_pattern(path);
        let node = self.roots.get(&method)?.search(&search_parts, 0)?;
        let pattern = node.pattern()?;

        let mut params = Params::new();
        for (index, part) in parse_pattern(pattern).into_iter().enumerate() {
            if let Some(name) = part.strip_prefix(':') {
                params.push(Param::new(name, search_parts[index]));
            } else if let Some(name) = part.strip_prefix('*') {
                if !name.is_empty() {
                    params.push(Param::new(name, &search_parts[index..].join("/")));
                }
                break;
            }
        }
        Some((pattern, params))
    }

    /// Every pattern registered for `method`, in trie order. Introspection
    /// only; not used on the request path.
    pub fn routes(&self, method: Method) -> Vec<&str> {
        let mut out = Vec::new();
        if let Some(root) = self.roots.get(&method) {
            root.collect(&mut out);
        }
        out
    }

    /// Resolve `ctx` and run its chain: the matched handler (or the
    /// not-found fallback) is appended after the middleware already queued
    /// on the context, then the chain is started.
    pub(crate) async fn dispatch(&self, ctx: &mut Context) -> crate::Result<()> {
        let method = ctx.method();
        let path = ctx.path().to_string();

        let handler = match self.get_route(method, &path) {
            Some((pattern, params)) => {
                let key = route_key(method, pattern);
                ctx.set_params(params);
                self.handlers.get(&key).cloned()
            }
            None => None,
        };

        match handler {
            Some(handler) => ctx.append_handler(handler),
            None => ctx.append_handler(Arc::new(NotFound)),
        }
        ctx.next().await
    }
}

impl Default for Router {
    fn default() -> Router {
        Router::new()
    }
}

/// Terminal handler appended when resolution fails.
struct NotFound;

impl Handle for NotFound {
    fn call<'a>(&'a self, c: &'a mut Context) -> BoxFut<'a> {
        Box::pin(async move {
            let path = c.path().to_string();
            c.string(StatusCode::NotFound, format!("404 NOT FOUND: {}\n", path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_c: &mut Context) -> BoxFut<'_> {
        Box::pin(async { Ok(()) })
    }

    fn test_router() -> Router {
        let mut router = Router::new();
        router.add_route(Method::Get, "/", Arc::new(noop)).unwrap();
        router
            .add_route(Method::Get, "/hello/:name", Arc::new(noop))
            .unwrap();
        router
            .add_route(Method::Get, "/hello/b/c", Arc::new(noop))
            .unwrap();
        router
            .add_route(Method::Get, "/hi/:name", Arc::new(noop))
            .unwrap();
        router
            .add_route(Method::Get, "/assets/*filepath", Arc::new(noop))
            .unwrap();
        router
    }

    #[test]
    fn parse_pattern_splits_segments() {
        assert_eq!(parse_pattern("/p/:name"), vec!["p", ":name"]);
        assert_eq!(parse_pattern("/p/*"), vec!["p", "*"]);
        assert_eq!(parse_pattern("/p/*name/*"), vec!["p", "*name"]);
        assert_eq!(parse_pattern("/"), Vec::<&str>::new());
        assert_eq!(parse_pattern("//p//doc/"), vec!["p", "doc"]);
    }

    #[test]
    fn resolves_root() {
        let router = test_router();
        let (pattern, params) = router.get_route(Method::Get, "/").unwrap();
        assert_eq!(pattern, "/");
        assert!(params.is_empty());
    }

    #[test]
    fn resolves_named_param() {
        let router = test_router();
        let (pattern, params) = router.get_route(Method::Get, "/hello/ada").unwrap();
        assert_eq!(pattern, "/hello/:name");
        assert_eq!(params.by_name("name"), Some("ada"));
        assert_eq!(&params[0], "ada");
    }

    #[test]
    fn resolves_wildcard_remainder() {
        let router = test_router();
        let (pattern, params) = router
            .get_route(Method::Get, "/assets/css/site.css")
            .unwrap();
        assert_eq!(pattern, "/assets/*filepath");
        assert_eq!(params.by_name("filepath"), Some("css/site.css"));
    }

    #[test]
    fn static_wins_over_param_regardless_of_order() {
        for patterns in [
            ["/users/new", "/users/:id"],
            ["/users/:id", "/users/new"],
        ] {
            let mut router = Router::new();
            for pattern in patterns {
                router.add_route(Method::Get, pattern, Arc::new(noop)).unwrap();
            }
            let (pattern, _) = router.get_route(Method::Get, "/users/new").unwrap();
            assert_eq!(pattern, "/users/new");
            let (pattern, params) = router.get_route(Method::Get, "/users/7").unwrap();
            assert_eq!(pattern, "/users/:id");
            assert_eq!(params.by_name("id"), Some("7"));
        }
    }

    #[test]
    fn methods_are_isolated() {
        let mut router = Router::new();
        router
            .add_route(Method::Post, "/login", Arc::new(noop))
            .unwrap();
        assert!(router.get_route(Method::Get, "/login").is_none());
        assert!(router.get_route(Method::Post, "/login").is_some());
    }

    #[test]
    fn equivalent_slash_forms_resolve_alike() {
        let router = test_router();
        let (pattern, _) = router.get_route(Method::Get, "/hello//b/c/").unwrap();
        assert_eq!(pattern, "/hello/b/c");
    }

    #[test]
    fn missing_routes_are_none() {
        let router = test_router();
        assert!(router.get_route(Method::Get, "/hello/b/d").is_none());
        assert!(router.get_route(Method::Get, "/hello").is_none());
        assert!(router.get_route(Method::Delete, "/").is_none());
    }

    #[test]
    fn conflicting_registration_keeps_first_route() {
        let mut router = Router::new();
        router
            .add_route(Method::Get, "/p/:id", Arc::new(noop))
            .unwrap();

        let err = router
            .add_route(Method::Get, "/p/:name", Arc::new(noop))
            .unwrap_err();
        assert!(matches!(err, RouteError::Conflict { .. }));

        let (pattern, params) = router.get_route(Method::Get, "/p/42").unwrap();
        assert_eq!(pattern, "/p/:id");
        assert_eq!(params.by_name("id"), Some("42"));
        assert_eq!(router.handlers.len(), 1);
    }

    #[test]
    fn patterns_must_start_with_slash() {
        let mut router = Router::new();
        let err = router
            .add_route(Method::Get, "hello", Arc::new(noop))
            .unwrap_err();
        assert_eq!(err, RouteError::InvalidPattern("hello".to_string()));
    }

    #[test]
    fn reregistration_replaces_handler_without_duplicates() {
        let mut router = Router::new();
        router.add_route(Method::Get, "/x", Arc::new(noop)).unwrap();
        router.add_route(Method::Get, "/x", Arc::new(noop)).unwrap();
        assert_eq!(router.handlers.len(), 1);
        assert_eq!(router.routes(Method::Get), vec!["/x"]);
    }

    #[test]
    fn routes_lists_registered_patterns() {
        let router = test_router();
        let routes = router.routes(Method::Get);
        assert_eq!(routes.len(), 5);
        assert!(routes.contains(&"/hello/:name"));
        assert!(routes.contains(&"/assets/*filepath"));
        assert!(router.routes(Method::Put).is_empty());
    }
}
