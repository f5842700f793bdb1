// ── Wire models for the admin server ──
//
// Users own posts; a post carries its author when the server loads the
// relation. Timestamps are optional because list endpoints may omit them.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub posts: Vec<Post>,
}

/// Body for `POST /users`. The server requires `name` and `email`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Body for `PUT /users/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for `POST /posts`. All three fields are required by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: i64,
}

/// Body for `PUT /posts/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ── Envelopes ───────────────────────────────────────────────────────

/// `{ code, data, message, total? }` wrapper used by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    pub total: u64,
}

impl<T> Default for ListPage<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
        }
    }
}

impl<T: DeserializeOwned> ListPage<T> {
    /// Accept `{data, total}`, an envelope without `total` (total is then
    /// the row count) or a bare JSON array.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let body = value.to_string();
        let deser = |e: serde_json::Error| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        };

        let (rows, total) = match value {
            Value::Array(rows) => (rows, None),
            Value::Object(mut map) => {
                let total = map.get("total").and_then(Value::as_u64);
                let rows = match map.remove("data") {
                    Some(Value::Array(rows)) => rows,
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => {
                        return Err(Error::Deserialization {
                            message: format!("expected `data` to be an array, got {other}"),
                            body,
                        });
                    }
                };
                (rows, total)
            }
            other => {
                return Err(Error::Deserialization {
                    message: format!("expected a list response, got {other}"),
                    body,
                });
            }
        };

        let data = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(deser)?;
        let total = total.unwrap_or_else(|| u64::try_from(data.len()).unwrap_or(u64::MAX));
        Ok(Self { data, total })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn post_uses_camel_case_wire_names() {
        let post: Post = serde_json::from_value(json!({
            "id": 1,
            "title": "Hello",
            "content": "World",
            "authorId": 9,
            "author": {"id": 9, "name": "Ann", "email": "ann@example.com", "avatar": null},
            "createdAt": "2024-06-15T10:30:00.000Z"
        }))
        .unwrap();
        assert_eq!(post.author_id, 9);
        assert_eq!(post.author.unwrap().name, "Ann");
        assert!(post.created_at.is_some());
        assert!(post.updated_at.is_none());
    }

    #[test]
    fn new_post_serializes_author_id() {
        let body = serde_json::to_value(NewPost {
            title: "t".into(),
            content: "c".into(),
            author_id: 3,
        })
        .unwrap();
        assert_eq!(body, json!({"title": "t", "content": "c", "authorId": 3}));
    }

    #[test]
    fn patch_omits_unset_fields() {
        let body = serde_json::to_value(UserPatch {
            email: Some("x@example.com".into()),
            ..UserPatch::default()
        })
        .unwrap();
        assert_eq!(body, json!({"email": "x@example.com"}));
    }

    #[test]
    fn list_page_accepts_envelope_without_total() {
        let page: ListPage<User> = ListPage::from_value(json!({
            "code": 200,
            "message": "Success",
            "data": [
                {"id": 1, "name": "a", "email": "a@x"},
                {"id": 2, "name": "b", "email": "b@x"}
            ]
        }))
        .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[1].name, "b");
    }

    #[test]
    fn list_page_prefers_server_total() {
        let page: ListPage<Value> =
            ListPage::from_value(json!({"data": [{"id": 1}], "total": 40})).unwrap();
        assert_eq!(page.total, 40);
    }

    #[test]
    fn list_page_rejects_scalars() {
        assert!(ListPage::<Value>::from_value(json!("nope")).is_err());
    }

    #[test]
    fn envelope_tolerates_missing_data() {
        let env: Envelope<User> =
            serde_json::from_value(json!({"code": 200, "message": "Post deleted successfully"}))
                .unwrap();
        assert!(env.data.is_none());
        assert_eq!(env.message.as_deref(), Some("Post deleted successfully"));
    }
}
