// ── Bearer token capability ──
//
// The request builder never reads tokens from ambient state. Callers hand
// the client a `TokenProvider` and the builder asks it once per request.

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};

/// Source of the bearer token attached to every outgoing request.
pub trait TokenProvider: Send + Sync {
    /// The current token, or `None` to send the request unauthenticated.
    fn token(&self) -> Option<SecretString>;
}

/// Never authenticates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenProvider for NoToken {
    fn token(&self) -> Option<SecretString> {
        None
    }
}

/// A fixed token resolved at startup (config file, env var, keyring).
#[derive(Debug, Clone)]
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<SecretString> {
        Some(self.0.clone())
    }
}

/// A token slot that can be filled or cleared after the client is built,
/// e.g. once a login call returns a fresh token.
#[derive(Debug, Default)]
pub struct TokenStore {
    slot: RwLock<Option<SecretString>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: SecretString) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = Some(token);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.slot.write() {
            *slot = None;
        }
    }
}

impl TokenProvider for TokenStore {
    fn token(&self) -> Option<SecretString> {
        self.slot.read().ok().and_then(|slot| slot.clone())
    }
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<SecretString> + Send + Sync,
{
    fn token(&self) -> Option<SecretString> {
        self()
    }
}

/// Format the `Authorization` header value for a token.
///
/// Tokens persisted as JSON strings keep their surrounding quotes; those are
/// stripped. Returns `None` for an empty token.
pub(crate) fn bearer_value(token: &SecretString) -> Option<String> {
    let raw = token.expose_secret().replace('"', "");
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else {
        Some(format!("Bearer {raw}"))
    }
}
