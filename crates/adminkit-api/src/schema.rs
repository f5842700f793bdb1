// ── Route schema ──
//
// Static description of the server's route tree. Internal nodes map path
// segments to children; a node may carry a concrete path template and the
// set of verbs it serves. Defined once at startup and immutable after.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::Error;
use crate::request::Verb;

/// Names with a fixed meaning in a proxy chain. A route segment may not use
/// any of them.
pub const RESERVED_SEGMENTS: &[&str] = &[
    "url", "query", "params", "body", "then", "catch", "finally", "get", "post", "put", "delete",
];

/// Returns `true` if `segment` collides with a chain or verb name.
pub fn is_reserved(segment: &str) -> bool {
    RESERVED_SEGMENTS
        .iter()
        .any(|r| r.eq_ignore_ascii_case(segment))
}

/// One node of the route tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteNode {
    template: Option<String>,
    operations: BTreeSet<Verb>,
    children: BTreeMap<String, RouteNode>,
}

impl RouteNode {
    /// Concrete path template for this node (e.g. `/jaq/api/posts/:id`).
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Verbs this node serves.
    pub fn operations(&self) -> &BTreeSet<Verb> {
        &self.operations
    }

    pub fn supports(&self, verb: Verb) -> bool {
        self.operations.contains(&verb)
    }

    pub fn child(&self, segment: &str) -> Option<&RouteNode> {
        self.children.get(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &RouteNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The server's route tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSchema {
    root: RouteNode,
}

impl RouteSchema {
    pub fn builder() -> RouteSchemaBuilder {
        RouteSchemaBuilder::default()
    }

    /// An empty schema: every lookup falls back to literal segment joining.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Walk `segments` from the root.
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Option<&RouteNode> {
        segments
            .iter()
            .try_fold(&self.root, |node, seg| node.child(seg.as_ref()))
    }

    /// The path template for `segments`, or `/` + segments joined by `/`
    /// when the schema has no template for them.
    pub fn path_for<S: AsRef<str>>(&self, segments: &[S]) -> String {
        self.resolve(segments)
            .and_then(RouteNode::template)
            .map_or_else(
                || {
                    let joined: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
                    format!("/{}", joined.join("/"))
                },
                str::to_owned,
            )
    }

    /// Every declared route as `(segments, node)`, depth-first.
    pub fn routes(&self) -> Vec<(Vec<String>, &RouteNode)> {
        fn walk<'a>(
            node: &'a RouteNode,
            prefix: &mut Vec<String>,
            out: &mut Vec<(Vec<String>, &'a RouteNode)>,
        ) {
            for (seg, child) in &node.children {
                prefix.push(seg.clone());
                if child.template.is_some() {
                    out.push((prefix.clone(), child));
                }
                walk(child, prefix, out);
                prefix.pop();
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut Vec::new(), &mut out);
        out
    }
}

struct PendingRoute {
    segments: Vec<String>,
    template: String,
    operations: BTreeSet<Verb>,
}

/// Collects route declarations; validation happens in [`build`](Self::build).
#[derive(Default)]
pub struct RouteSchemaBuilder {
    routes: Vec<PendingRoute>,
}

impl RouteSchemaBuilder {
    /// Declare a route at `segments` served at `template` for `verbs`.
    pub fn route<S, V>(mut self, segments: &[S], template: impl Into<String>, verbs: V) -> Self
    where
        S: AsRef<str>,
        V: IntoIterator<Item = Verb>,
    {
        self.routes.push(PendingRoute {
            segments: segments.iter().map(|s| s.as_ref().to_owned()).collect(),
            template: template.into(),
            operations: verbs.into_iter().collect(),
        });
        self
    }

    /// Validate every declaration and assemble the tree.
    ///
    /// Fails on reserved or empty segments, templates that are not absolute
    /// paths, and duplicate declarations of the same segment path.
    pub fn build(self) -> Result<RouteSchema, Error> {
        let mut root = RouteNode::default();

        for route in self.routes {
            let name = route.segments.join(".");
            if route.segments.is_empty() {
                return Err(Error::InvalidRoute {
                    route: name,
                    reason: "a route needs at least one segment".into(),
                });
            }
            if let Some(seg) = route.segments.iter().find(|s| is_reserved(s)) {
                return Err(Error::ReservedSegment {
                    segment: seg.clone(),
                });
            }
            if route.segments.iter().any(|s| s.is_empty() || s.contains('/')) {
                return Err(Error::InvalidRoute {
                    route: name,
                    reason: "segments must be non-empty and contain no '/'".into(),
                });
            }
            if !route.template.starts_with('/') {
                return Err(Error::InvalidRoute {
                    route: name,
                    reason: format!("template '{}' must start with '/'", route.template),
                });
            }

            let node = route
                .segments
                .iter()
                .fold(&mut root, |node, seg| node.children.entry(seg.clone()).or_default());
            if node.template.is_some() {
                return Err(Error::InvalidRoute {
                    route: name,
                    reason: "declared more than once".into(),
                });
            }
            node.template = Some(route.template);
            node.operations = route.operations;
        }

        Ok(RouteSchema { root })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn schema() -> RouteSchema {
        RouteSchema::builder()
            .route(&["posts"], "/jaq/api/posts", [Verb::Get, Verb::Post])
            .route(
                &["posts", "item"],
                "/jaq/api/posts/:id",
                [Verb::Get, Verb::Put, Verb::Delete],
            )
            .build()
            .unwrap()
    }

    #[test]
    fn resolves_declared_templates() {
        let s = schema();
        assert_eq!(s.path_for(&["posts"]), "/jaq/api/posts");
        assert_eq!(s.path_for(&["posts", "item"]), "/jaq/api/posts/:id");
        assert!(s.resolve(&["posts"]).unwrap().supports(Verb::Post));
        assert!(!s.resolve(&["posts"]).unwrap().supports(Verb::Delete));
    }

    #[test]
    fn unknown_segments_fall_back_to_joining() {
        let s = schema();
        assert_eq!(s.path_for(&["posts", "archive", "2024"]), "/posts/archive/2024");
        assert_eq!(RouteSchema::empty().path_for(&["a", "b"]), "/a/b");
    }

    #[test]
    fn reserved_segments_fail_fast() {
        for bad in ["then", "URL", "delete", "Params"] {
            let err = RouteSchema::builder()
                .route(&["posts", bad], "/x", [Verb::Get])
                .build()
                .unwrap_err();
            assert!(matches!(err, Error::ReservedSegment { .. }), "{bad}: {err:?}");
        }
    }

    #[test]
    fn malformed_routes_are_rejected() {
        let empty: [&str; 0] = [];
        assert!(RouteSchema::builder().route(&empty, "/x", [Verb::Get]).build().is_err());
        assert!(RouteSchema::builder().route(&["a/b"], "/x", [Verb::Get]).build().is_err());
        assert!(RouteSchema::builder().route(&["a"], "x", [Verb::Get]).build().is_err());
        assert!(
            RouteSchema::builder()
                .route(&["a"], "/x", [Verb::Get])
                .route(&["a"], "/y", [Verb::Post])
                .build()
                .is_err()
        );
    }

    #[test]
    fn routes_lists_declared_nodes() {
        let s = schema();
        let names: Vec<String> = s.routes().into_iter().map(|(segs, _)| segs.join(".")).collect();
        assert_eq!(names, vec!["posts".to_owned(), "posts.item".to_owned()]);
    }
}
