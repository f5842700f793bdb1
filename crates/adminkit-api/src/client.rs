// API client
//
// Owns the HTTP client, base URL, route schema and the injected
// capabilities (token provider, response hooks, download sink). Proxies
// share it through an `Arc`; every dispatched call goes through `fetch`.

use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use tracing::debug;
use url::Url;

use crate::auth::{NoToken, TokenProvider};
use crate::error::Error;
use crate::proxy::RouteProxy;
use crate::request::{self, FormPart, PreparedBody, RequestConfig};
use crate::response::{self, DirectorySink, DownloadSink, Payload, ResponseHooks, TracingHooks};
use crate::schema::RouteSchema;
use crate::transport::TransportConfig;

pub(crate) struct ClientInner {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) schema: RouteSchema,
    pub(crate) tokens: Arc<dyn TokenProvider>,
    pub(crate) hooks: Arc<dyn ResponseHooks>,
    pub(crate) sink: Arc<dyn DownloadSink>,
}

/// Async client for a server described by a [`RouteSchema`].
///
/// Cheap to clone. Use [`request`](Self::request) or [`route`](Self::route)
/// to start a proxy chain, or [`fetch`](Self::fetch) to send a hand-built
/// [`RequestConfig`].
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn builder(base_url: Url) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url,
            schema: RouteSchema::empty(),
            transport: TransportConfig::default(),
            http: None,
            tokens: Arc::new(NoToken),
            hooks: Arc::new(TracingHooks::default()),
            sink: Arc::new(DirectorySink::new(".")),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn schema(&self) -> &RouteSchema {
        &self.inner.schema
    }

    /// Hooks used for notifications; shared with the UI drivers.
    pub fn hooks(&self) -> Arc<dyn ResponseHooks> {
        Arc::clone(&self.inner.hooks)
    }

    /// A proxy at the root of the route tree.
    pub fn request(&self) -> RouteProxy {
        RouteProxy::root(Arc::clone(&self.inner))
    }

    /// Shorthand for `request().path(segment)`.
    pub fn route(&self, segment: &str) -> RouteProxy {
        self.request().path(segment)
    }

    /// Send one request and run the response pipeline on the result.
    pub async fn fetch(&self, config: RequestConfig) -> Result<Payload, Error> {
        self.inner.fetch(config).await
    }
}

impl ClientInner {
    /// Join a built path onto the base URL, keeping any base path prefix.
    fn absolute_url(&self, path: &str) -> Result<Url, Error> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    pub(crate) async fn fetch(&self, config: RequestConfig) -> Result<Payload, Error> {
        let prepared = request::prepare(&config, self.tokens.as_ref())?;
        let url = self.absolute_url(&prepared.url)?;
        debug!("{} {url}", prepared.method);

        let mut builder = self
            .http
            .request(prepared.method.as_method(), url)
            .headers(prepared.headers);

        builder = match prepared.body {
            None => builder,
            Some(PreparedBody::Bytes(bytes)) => builder.body(bytes),
            Some(PreparedBody::Multipart(parts)) => builder.multipart(multipart_form(parts)?),
        };

        let resp = builder.send().await?;
        response::handle_response(resp, prepared.options, self.hooks.as_ref(), self.sink.as_ref())
            .await
    }
}

fn multipart_form(parts: Vec<FormPart>) -> Result<Form, Error> {
    parts.into_iter().try_fold(Form::new(), |form, part| {
        Ok(match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                filename,
                content_type,
                data,
            } => {
                let mut file = Part::bytes(data.to_vec()).file_name(filename);
                if let Some(ct) = content_type {
                    file = file.mime_str(&ct)?;
                }
                form.part(name, file)
            }
        })
    })
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: Url,
    schema: RouteSchema,
    transport: TransportConfig,
    http: Option<reqwest::Client>,
    tokens: Arc<dyn TokenProvider>,
    hooks: Arc<dyn ResponseHooks>,
    sink: Arc<dyn DownloadSink>,
}

impl ApiClientBuilder {
    pub fn schema(mut self, schema: RouteSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Use a pre-built `reqwest::Client` instead of building one from the
    /// transport config.
    pub fn http(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn tokens(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ResponseHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn download_sink(mut self, sink: Arc<dyn DownloadSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> Result<ApiClient, Error> {
        let http = match self.http {
            Some(http) => http,
            None => self.transport.build_client()?,
        };
        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: self.base_url,
                schema: self.schema,
                tokens: self.tokens,
                hooks: self.hooks,
                sink: self.sink,
            }),
        })
    }
}
