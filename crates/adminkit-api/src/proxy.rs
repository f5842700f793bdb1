// ── Route proxy ──
//
// Fluent request builder that mirrors the route schema. Each step returns
// a fresh proxy holding `(segments, accumulated config)`; the receiver is
// never mutated, so a base proxy can seed any number of independent chains.
// Awaiting a proxy (or calling `send`/`dispatch`/`call`) performs exactly
// one network call.

use std::future::IntoFuture;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::client::ClientInner;
use crate::error::Error;
use crate::request::{self, Body, RequestConfig, Verb};
use crate::response::Payload;

/// A point in the route tree plus the request built so far.
#[derive(Clone)]
pub struct RouteProxy {
    client: Arc<ClientInner>,
    segments: Arc<[String]>,
    config: RequestConfig,
}

impl std::fmt::Debug for RouteProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteProxy")
            .field("segments", &self.segments)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RouteProxy {
    pub(crate) fn root(client: Arc<ClientInner>) -> Self {
        Self {
            client,
            segments: Arc::from(Vec::new()),
            config: RequestConfig::default(),
        }
    }

    fn with_config(&self, config: RequestConfig) -> Self {
        Self {
            client: Arc::clone(&self.client),
            segments: Arc::clone(&self.segments),
            config,
        }
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Descend one path segment. Segments unknown to the schema are kept
    /// and joined literally when the path is resolved.
    pub fn path(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.to_vec();
        segments.push(segment.into());
        Self {
            client: Arc::clone(&self.client),
            segments: Arc::from(segments),
            config: self.config.clone(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The request accumulated so far.
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    // ── Verbs ────────────────────────────────────────────────────────

    pub fn method(&self, verb: Verb) -> Self {
        self.with_config(RequestConfig {
            method: Some(verb),
            ..self.config.clone()
        })
    }

    pub fn get(&self) -> Self {
        self.method(Verb::Get)
    }

    pub fn post(&self) -> Self {
        self.method(Verb::Post)
    }

    pub fn put(&self) -> Self {
        self.method(Verb::Put)
    }

    pub fn delete(&self) -> Self {
        self.method(Verb::Delete)
    }

    // ── Request parts (last writer wins) ─────────────────────────────

    pub fn body(&self, body: impl Into<Body>) -> Self {
        self.with_config(RequestConfig {
            body: Some(body.into()),
            ..self.config.clone()
        })
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<Self, Error> {
        Ok(self.body(serde_json::to_value(value)?))
    }

    pub fn query(&self, query: Value) -> Self {
        self.with_config(RequestConfig {
            query: Some(query),
            ..self.config.clone()
        })
    }

    pub fn params(&self, params: Value) -> Self {
        self.with_config(RequestConfig {
            params: Some(params),
            ..self.config.clone()
        })
    }

    pub fn header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut config = self.config.clone();
        config.headers.insert(name.into(), value.into());
        self.with_config(config)
    }

    /// Whether a 401 on this call should trigger the login redirect.
    pub fn auto_redirect(&self, enabled: bool) -> Self {
        let mut config = self.config.clone();
        config.options.auto_redirect = Some(enabled);
        self.with_config(config)
    }

    // ── Resolution ───────────────────────────────────────────────────

    /// Path template for the current segments.
    pub fn template(&self) -> String {
        self.client.schema.path_for(&self.segments[..])
    }

    /// Concrete request path: template with params substituted and the
    /// query string appended.
    pub fn url(&self) -> String {
        request::build_url(&self.resolved(RequestConfig::default()))
    }

    /// `{path: template, ...accumulated, ...overrides}`
    fn resolved(&self, overrides: RequestConfig) -> RequestConfig {
        RequestConfig::new(self.template())
            .merge(self.config.clone())
            .merge(overrides)
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Invoke the proxy with per-call overrides; override fields win.
    pub async fn call(&self, overrides: RequestConfig) -> Result<Payload, Error> {
        let config = self.resolved(overrides);
        if let Some(node) = self.client.schema.resolve(&self.segments[..]) {
            let verb = config.resolved_method();
            if !node.operations().is_empty() && !node.supports(verb) {
                debug!(
                    route = %self.segments.join("."),
                    %verb,
                    "verb not declared for route, sending anyway"
                );
            }
        }
        self.client.fetch(config).await
    }

    /// Send the accumulated request.
    pub async fn dispatch(&self) -> Result<Payload, Error> {
        self.call(RequestConfig::default()).await
    }

    /// Send and return the JSON result; downloads yield `""`.
    pub async fn send(&self) -> Result<Value, Error> {
        self.dispatch().await.map(Payload::into_value)
    }

    /// Send and deserialize the JSON result.
    pub async fn send_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let value = self.send().await?;
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        })
    }
}

impl IntoFuture for RouteProxy {
    type Output = Result<Value, Error>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.send().await })
    }
}
