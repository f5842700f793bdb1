// ── Runtime connection configuration ──
//
// Describes how to reach an adminkit server. Carries credentials and
// transport tuning but never touches disk; the CLI resolves profiles and
// hands a `ClientConfig` in.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adminkit_api::{
    ApiClient, DirectorySink, NoToken, ResponseHooks, StaticToken, TlsMode, TokenProvider,
    TransportConfig, admin_schema,
};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Configuration for one adminkit server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:3000`.
    pub url: Url,
    /// Bearer token; requests go unauthenticated when absent.
    pub token: Option<SecretString>,
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Where file downloads are written.
    pub download_dir: PathBuf,
    /// Login location reported when the server rejects the session.
    pub login_url: Option<String>,
}

impl ClientConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            token: None,
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            download_dir: PathBuf::from("."),
            login_url: None,
        }
    }

    /// Build an [`ApiClient`] for the admin route tree.
    pub fn connect(&self, hooks: Arc<dyn ResponseHooks>) -> Result<ApiClient, CoreError> {
        let tokens: Arc<dyn TokenProvider> = match &self.token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(NoToken),
        };
        let transport = TransportConfig::default()
            .with_tls(self.tls.clone())
            .with_timeout(self.timeout);

        let client = ApiClient::builder(self.url.clone())
            .schema(admin_schema()?)
            .transport(transport)
            .tokens(tokens)
            .hooks(hooks)
            .download_sink(Arc::new(DirectorySink::new(self.download_dir.clone())))
            .build()?;
        Ok(client)
    }
}
