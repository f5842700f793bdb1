// ── Typed CRUD resources ──
//
// Thin typed layer over the route proxy for collections that follow the
// server's REST shape: `GET /` lists, `POST /` creates, and the `item`
// child serves `GET|PUT|DELETE /:id`. Responses arrive in the
// `{code, data, message}` envelope.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Envelope, ListPage, NewPost, NewUser, Post, PostPatch, User, UserPatch};
use crate::proxy::RouteProxy;
use crate::routes::ITEM;

/// A REST collection with record type `T`, create body `C` and update
/// body `U`.
pub struct Resource<T, C, U> {
    client: ApiClient,
    name: &'static str,
    _marker: PhantomData<fn() -> (T, C, U)>,
}

pub type Users = Resource<User, NewUser, UserPatch>;
pub type Posts = Resource<Post, NewPost, PostPatch>;

impl<T, C, U> Clone for Resource<T, C, U> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            name: self.name,
            _marker: PhantomData,
        }
    }
}

impl<T, C, U> fmt::Debug for Resource<T, C, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Users {
    pub fn users(client: &ApiClient) -> Self {
        Self::new(client, "users")
    }
}

impl Posts {
    pub fn posts(client: &ApiClient) -> Self {
        Self::new(client, "posts")
    }
}

impl<T, C, U> Resource<T, C, U>
where
    T: DeserializeOwned,
    C: Serialize,
    U: Serialize,
{
    pub fn new(client: &ApiClient, name: &'static str) -> Self {
        Self {
            client: client.clone(),
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Proxy for the collection route.
    pub fn collection(&self) -> RouteProxy {
        self.client.route(self.name)
    }

    /// Proxy for one record, with `:id` bound.
    pub fn item(&self, id: impl fmt::Display) -> RouteProxy {
        self.collection()
            .path(ITEM)
            .params(json!({ "id": id.to_string() }))
    }

    /// List records. `query` is appended as-is (pagination, filters).
    pub async fn list(&self, query: Value) -> Result<ListPage<T>, Error> {
        let value = self.collection().get().query(query).send().await?;
        ListPage::from_value(value)
    }

    pub async fn get(&self, id: impl fmt::Display) -> Result<T, Error> {
        let value = self.item(id).get().send().await?;
        unwrap_data(value)
    }

    pub async fn create(&self, body: &C) -> Result<T, Error> {
        let value = self.collection().json(body)?.send().await?;
        debug!(resource = self.name, "created record");
        unwrap_data(value)
    }

    pub async fn update(&self, id: impl fmt::Display, body: &U) -> Result<T, Error> {
        let value = self.item(id).put().json(body)?.send().await?;
        unwrap_data(value)
    }

    /// Delete a record; returns the server's confirmation message.
    pub async fn delete(&self, id: impl fmt::Display) -> Result<Option<String>, Error> {
        let value = self.item(id).delete().send().await?;
        let env: Envelope<Value> = deserialize(value)?;
        Ok(env.message)
    }
}

fn deserialize<V: DeserializeOwned>(value: Value) -> Result<V, Error> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}

/// Pull `data` out of an envelope. A body that is not an envelope is
/// treated as the record itself.
fn unwrap_data<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    match value {
        Value::Object(mut map) if map.contains_key("data") && map.contains_key("code") => {
            deserialize(map.remove("data").unwrap_or(Value::Null))
        }
        other => deserialize(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unwrap_data_reads_envelopes() {
        let user: User = unwrap_data(json!({
            "code": 201,
            "message": "User created",
            "data": {"id": 4, "name": "n", "email": "e@x"}
        }))
        .unwrap();
        assert_eq!(user.id, 4);
    }

    #[test]
    fn unwrap_data_accepts_bare_records() {
        let user: User = unwrap_data(json!({"id": 5, "name": "n", "email": "e@x"})).unwrap();
        assert_eq!(user.id, 5);
    }
}
