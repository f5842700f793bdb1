//! Route tree of the admin server (`/jaq` base path).

use crate::error::Error;
use crate::request::Verb;
use crate::schema::RouteSchema;

/// Segment under a collection that addresses one record (`/:id`).
pub const ITEM: &str = "item";
/// Segment under a collection that accepts drag-reorder requests.
pub const SORT: &str = "sort";

pub fn admin_schema() -> Result<RouteSchema, Error> {
    use Verb::{Delete, Get, Post, Put};

    RouteSchema::builder()
        .route(&["hello"], "/jaq/hello", [Get, Post])
        .route(&["users"], "/jaq/api/users", [Get, Post])
        .route(&["users", ITEM], "/jaq/api/users/:id", [Get, Put, Delete])
        .route(&["posts"], "/jaq/api/posts", [Get, Post])
        .route(&["posts", ITEM], "/jaq/api/posts/:id", [Get, Put, Delete])
        .route(&["posts", SORT], "/jaq/api/posts/sort", [Post])
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn admin_schema_is_valid() {
        let schema = admin_schema().unwrap();
        assert_eq!(schema.path_for(&["users", ITEM]), "/jaq/api/users/:id");
        assert_eq!(schema.routes().len(), 6);
    }
}
