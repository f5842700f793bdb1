//! Async typed request client for the adminkit HTTP API.
//!
//! - **[`ApiClient`]** owns the HTTP transport, the base URL, the
//!   [`RouteSchema`] and the injected capabilities: a [`TokenProvider`] for
//!   bearer auth, [`ResponseHooks`] for login redirects and notifications,
//!   and a [`DownloadSink`] that receives file responses.
//!
//! - **[`RouteProxy`]** is the fluent request builder. Chains such as
//!   `client.route("posts").path("item").params(..).put().json(&patch)?`
//!   never mutate their receiver; awaiting a proxy sends exactly one request
//!   and yields the JSON result.
//!
//! - **[`Resource`]** wraps a REST collection with typed
//!   `list`/`get`/`create`/`update`/`delete`.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod proxy;
pub mod request;
pub mod resource;
pub mod response;
pub mod routes;
pub mod schema;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{NoToken, StaticToken, TokenProvider, TokenStore};
pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, Error};
pub use proxy::RouteProxy;
pub use request::{Body, CallOptions, FormPart, Object, RequestConfig, Verb};
pub use resource::{Posts, Resource, Users};
pub use response::{DirectorySink, DownloadSink, Payload, ResponseHooks, TracingHooks};
pub use routes::admin_schema;
pub use schema::{RouteNode, RouteSchema};
pub use transport::{TlsMode, TransportConfig};
