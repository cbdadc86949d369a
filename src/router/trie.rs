//! Prefix tree over `/`-delimited path segments, one tree per HTTP method.

use crate::error::RouteError;

/// A node in the routing trie.
///
/// Each level of the tree consumes one path segment. A node terminates a
/// registered route iff `pattern` is `Some`; nodes with no pattern are
/// reachable prefixes only and never count as a match on their own.
#[derive(Debug, Default)]
pub(crate) struct Node {
    /// Full registered pattern when this node terminates a route.
    pattern: Option<String>,
    /// The single segment this node matches (`doc`, `:lang`, `*filepath`).
    segment: String,
    /// Child nodes in registration order.
    children: Vec<Node>,
    /// True for `:name` and `*name` segments.
    is_wild: bool,
}

impl Node {
    /// Root of a method tree. The root matches the empty prefix before the
    /// first segment.
    pub(crate) fn root() -> Node {
        Node::default()
    }

    fn new(segment: &str) -> Node {
        Node {
            pattern: None,
            segment: segment.to_string(),
            children: Vec::new(),
            is_wild: segment.starts_with(':') || segment.starts_with('*'),
        }
    }

    /// The pattern registered at this node, if it terminates a route.
    pub(crate) fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Insert `pattern` along `parts[depth..]`, creating nodes as needed.
    ///
    /// Re-inserting an existing pattern is idempotent. A dynamic segment
    /// that lands on a position held by a *different* dynamic segment is
    /// rejected and the tree is left exactly as it was: letting `:name`
    /// silently reuse an existing `:id` node (or grow a second wildcard
    /// sibling) would corrupt routes registered through the first one.
    pub(crate) fn insert(
        &mut self,
        pattern: &str,
        parts: &[&str],
        depth: usize,
    ) -> Result<(), RouteError> {
        if depth == parts.len() {
            self.pattern = Some(pattern.to_string());
            return Ok(());
        }

        let part = parts[depth];
        let dynamic = part.starts_with(':') || part.starts_with('*');

        let mut index = None;
        for (i, child) in self.children.iter().enumerate() {
            if child.segment == part {
                index = Some(i);
                break;
            }
            if dynamic && child.is_wild {
                return Err(RouteError::Conflict {
                    pattern: pattern.to_string(),
                    segment: part.to_string(),
                    existing: child.segment.clone(),
                });
            }
        }

        let index = match index {
            Some(index) => index,
            None => {
                self.children.push(Node::new(part));
                self.children.len() - 1
            }
        };
        self.children[index].insert(pattern, parts, depth + 1)
    }

    /// Depth-first search for a registered pattern along `parts[depth..]`.
    ///
    /// Statically matching children are tried before wildcard children, so
    /// `/users/new` wins over `/users/:id` for the same concrete path no
    /// matter which was registered first. A `*` segment is terminal and
    /// matches everything that remains.
    pub(crate) fn search(&self, parts: &[&str], depth: usize) -> Option<&Node> {
        if depth == parts.len() || self.segment.starts_with('*') {
            // Prefix nodes carry no pattern and are not a match.
            self.pattern.as_ref()?;
            return Some(self);
        }

        let part = parts[depth];
        for child in self.candidates(part) {
            if let Some(found) = child.search(parts, depth + 1) {
                return Some(found);
            }
        }
        None
    }

    /// Children able to match `part` during lookup: exact static matches
    /// first, wildcard children after.
    fn candidates(&self, part: &str) -> Vec<&Node> {
        let mut nodes = Vec::new();
        let mut wild = Vec::new();
        for child in &self.children {
            if child.segment == part {
                nodes.push(child);
            } else if child.is_wild {
                wild.push(child);
            }
        }
        nodes.extend(wild);
        nodes
    }

    /// Collect every pattern registered under this node, depth-first.
    pub(crate) fn collect<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(pattern) = self.pattern.as_deref() {
            out.push(pattern);
        }
        for child in &self.children {
            child.collect(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(patterns: &[&str]) -> Node {
        let mut root = Node::root();
        for pattern in patterns {
            let parts: Vec<&str> = pattern.split('/').filter(|p| !p.is_empty()).collect();
            root.insert(pattern, &parts, 0).unwrap();
        }
        root
    }

    fn found<'a>(root: &'a Node, path: &str) -> Option<&'a str> {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        root.search(&parts, 0).and_then(|node| node.pattern())
    }

    #[test]
    fn static_lookup() {
        let root = tree(&["/", "/hello/doc", "/about"]);
        assert_eq!(found(&root, "/"), Some("/"));
        assert_eq!(found(&root, "/hello/doc"), Some("/hello/doc"));
        assert_eq!(found(&root, "/about"), Some("/about"));
        assert_eq!(found(&root, "/missing"), None);
    }

    #[test]
    fn prefix_without_registration_is_not_a_match() {
        let root = tree(&["/hello/doc"]);
        assert_eq!(found(&root, "/hello"), None);
    }

    #[test]
    fn named_segment_matches_exactly_one_part() {
        let root = tree(&["/hello/:name"]);
        assert_eq!(found(&root, "/hello/ada"), Some("/hello/:name"));
        assert_eq!(found(&root, "/hello"), None);
        assert_eq!(found(&root, "/hello/ada/extra"), None);
    }

    #[test]
    fn wildcard_is_terminal() {
        let root = tree(&["/assets/*filepath"]);
        assert_eq!(found(&root, "/assets/css/site.css"), Some("/assets/*filepath"));
        assert_eq!(found(&root, "/assets/one"), Some("/assets/*filepath"));
        assert_eq!(found(&root, "/assets"), None);
    }

    #[test]
    fn static_children_win_over_wild_siblings() {
        // Registration order must not matter.
        let a = tree(&["/users/new", "/users/:id"]);
        let b = tree(&["/users/:id", "/users/new"]);
        assert_eq!(found(&a, "/users/new"), Some("/users/new"));
        assert_eq!(found(&b, "/users/new"), Some("/users/new"));
        assert_eq!(found(&a, "/users/7"), Some("/users/:id"));
        assert_eq!(found(&b, "/users/7"), Some("/users/:id"));
    }

    #[test]
    fn backtracks_out_of_dead_static_branches() {
        let root = tree(&["/a/b/c", "/a/:x/d"]);
        // `/a/b/d` walks into the static `b` branch, dead-ends, and must
        // come back out to try `:x`.
        assert_eq!(found(&root, "/a/b/d"), Some("/a/:x/d"));
    }

    #[test]
    fn reinserting_a_pattern_does_not_duplicate_nodes() {
        let mut root = Node::root();
        root.insert("/hello/doc", &["hello", "doc"], 0).unwrap();
        root.insert("/hello/doc", &["hello", "doc"], 0).unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children.len(), 1);
    }

    #[test]
    fn conflicting_parameter_names_are_rejected() {
        let mut root = Node::root();
        root.insert("/p/:id/profile", &["p", ":id", "profile"], 0).unwrap();

        let err = root
            .insert("/p/:name", &["p", ":name"], 0)
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::Conflict {
                pattern: "/p/:name".to_string(),
                segment: ":name".to_string(),
                existing: ":id".to_string(),
            }
        );

        // The first registration survives untouched.
        assert_eq!(found(&root, "/p/9/profile"), Some("/p/:id/profile"));
        let p = &root.children[0];
        assert_eq!(p.children.len(), 1);
    }

    #[test]
    fn named_and_wildcard_conflict_both_ways() {
        let mut root = Node::root();
        root.insert("/f/*path", &["f", "*path"], 0).unwrap();
        assert!(root.insert("/f/:name", &["f", ":name"], 0).is_err());

        let mut root = Node::root();
        root.insert("/f/:name", &["f", ":name"], 0).unwrap();
        assert!(root.insert("/f/*path", &["f", "*path"], 0).is_err());
    }

    #[test]
    fn at_most_one_static_candidate_per_segment() {
        let root = tree(&["/a/b", "/a/b/c", "/a/c", "/a/:x"]);
        let a = &root.children[0];
        let statics = a
            .candidates("b")
            .into_iter()
            .filter(|n| !n.is_wild)
            .count();
        assert_eq!(statics, 1);
    }
}
