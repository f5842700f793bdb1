// ── URL / request builder ──
//
// Pure transforms from a `RequestConfig` to a concrete request: path
// placeholder substitution, query-string merging, method defaulting and
// header assembly. Nothing here performs I/O.

use std::collections::BTreeMap;

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};
use url::form_urlencoded;

use crate::auth::{TokenProvider, bearer_value};
use crate::error::Error;

/// JSON object used for query strings, path params and form values.
pub type Object = Map<String, Value>;

// ── Verb ────────────────────────────────────────────────────────────

/// The four HTTP verbs a route can expose.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 4] = [Verb::Get, Verb::Post, Verb::Put, Verb::Delete];

    pub fn as_method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

// ── Body ────────────────────────────────────────────────────────────

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

/// Request payload.
///
/// JSON bodies are serialized by the builder; multipart and raw bytes are
/// passed through so the transport can set its own `Content-Type`.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Multipart(Vec<FormPart>),
    Bytes {
        content_type: Option<String>,
        data: Bytes,
    },
}

impl Body {
    /// Multipart and raw byte bodies are binary payloads.
    pub fn is_binary(&self) -> bool {
        !matches!(self, Self::Json(_))
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

// ── RequestConfig ───────────────────────────────────────────────────

/// Per-call options threaded through to the response pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Redirect to the login view on 401. Defaults to `true` when unset.
    pub auto_redirect: Option<bool>,
}

impl CallOptions {
    pub fn auto_redirect(&self) -> bool {
        self.auto_redirect.unwrap_or(true)
    }
}

/// The accumulated, not-yet-dispatched description of one HTTP call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub path: Option<String>,
    pub method: Option<Verb>,
    pub query: Option<Value>,
    pub body: Option<Body>,
    pub params: Option<Value>,
    pub headers: BTreeMap<String, String>,
    pub options: CallOptions,
}

impl RequestConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Overlay `other` onto `self`. Every field set in `other` replaces the
    /// corresponding field here, wholesale.
    pub fn merge(mut self, other: RequestConfig) -> Self {
        if other.path.is_some() {
            self.path = other.path;
        }
        if other.method.is_some() {
            self.method = other.method;
        }
        if other.query.is_some() {
            self.query = other.query;
        }
        if other.body.is_some() {
            self.body = other.body;
        }
        if other.params.is_some() {
            self.params = other.params;
        }
        if !other.headers.is_empty() {
            self.headers = other.headers;
        }
        if other.options.auto_redirect.is_some() {
            self.options = other.options;
        }
        self
    }

    /// Explicit method, else `POST` when a body is present, else `GET`.
    pub fn resolved_method(&self) -> Verb {
        match (self.method, &self.body) {
            (Some(verb), _) => verb,
            (None, Some(_)) => Verb::Post,
            (None, None) => Verb::Get,
        }
    }
}

// ── URL processing ──────────────────────────────────────────────────

/// Render a scalar JSON value the way it appears in a URL.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute `/:key` placeholders from `params`, then strip everything from
/// the first unmatched `/:placeholder` onwards.
pub fn replace_params(path: &str, params: Option<&Value>) -> String {
    let mut out = path.to_owned();

    if let Some(Value::Object(params)) = params {
        for (key, value) in params {
            let needle = format!("/:{key}");
            let replacement = format!("/{}", scalar_to_string(value));
            let mut result = String::with_capacity(out.len());
            let mut rest = out.as_str();
            while let Some(pos) = rest.find(&needle) {
                let after = &rest[pos + needle.len()..];
                // Only whole segments match: `/:id` must not eat `/:idx`.
                let boundary = after
                    .chars()
                    .next()
                    .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
                result.push_str(&rest[..pos]);
                if boundary {
                    result.push_str(&replacement);
                } else {
                    result.push_str(&needle);
                }
                rest = after;
            }
            result.push_str(rest);
            out = result;
        }
    }

    if let Some(pos) = out.find("/:") {
        out.truncate(pos);
    }
    out
}

/// Encode a JSON object as a query string. Arrays repeat their key and
/// `null` entries are skipped.
pub fn encode_query(query: &Value) -> String {
    let Value::Object(map) = query else {
        return String::new();
    };

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    serializer.append_pair(key, &scalar_to_string(item));
                }
            }
            other => {
                serializer.append_pair(key, &scalar_to_string(other));
            }
        }
    }
    serializer.finish()
}

/// Append `query` to `path`, joining with `&` when `path` already carries a
/// query string.
pub fn add_query(path: &str, query: Option<&Value>) -> String {
    let Some(query) = query else {
        return path.to_owned();
    };
    let encoded = encode_query(query);
    if encoded.is_empty() {
        return path.to_owned();
    }
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{encoded}")
}

/// Final request path for a config: params substituted, query appended.
pub fn build_url(config: &RequestConfig) -> String {
    let path = config.path.as_deref().unwrap_or_default();
    let path = replace_params(path, config.params.as_ref());
    add_query(&path, config.query.as_ref())
}

// ── Prepared request ────────────────────────────────────────────────

/// Wire-ready body.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedBody {
    Bytes(Bytes),
    Multipart(Vec<FormPart>),
}

/// A concrete HTTP request descriptor produced from a `RequestConfig`.
///
/// Requests always travel with credentials: the transport keeps a cookie
/// jar and the bearer header is attached here.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Verb,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<PreparedBody>,
    pub options: CallOptions,
}

fn header_error(name: &str, reason: impl std::fmt::Display) -> Error {
    Error::InvalidHeader {
        name: name.to_owned(),
        reason: reason.to_string(),
    }
}

/// Build the request descriptor for `config`.
pub fn prepare(config: &RequestConfig, tokens: &dyn TokenProvider) -> Result<PreparedRequest, Error> {
    let mut headers = HeaderMap::new();

    if let Some(value) = tokens.token().as_ref().and_then(bearer_value) {
        let mut value =
            HeaderValue::from_str(&value).map_err(|e| header_error("Authorization", e))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    if !config.body.as_ref().is_some_and(Body::is_binary) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    if let Some(Body::Bytes {
        content_type: Some(ct),
        ..
    }) = &config.body
    {
        let value = HeaderValue::from_str(ct).map_err(|e| header_error("Content-Type", e))?;
        headers.insert(CONTENT_TYPE, value);
    }

    for (name, value) in &config.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| header_error(name, e))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| header_error(name, e))?;
        headers.insert(header_name, header_value);
    }

    let body = match &config.body {
        None => None,
        Some(Body::Json(value)) => Some(PreparedBody::Bytes(Bytes::from(serde_json::to_vec(
            value,
        )?))),
        Some(Body::Bytes { data, .. }) => Some(PreparedBody::Bytes(data.clone())),
        Some(Body::Multipart(parts)) => Some(PreparedBody::Multipart(parts.clone())),
    };

    Ok(PreparedRequest {
        method: config.resolved_method(),
        url: build_url(config),
        headers,
        body,
        options: config.options,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::auth::{NoToken, StaticToken};

    #[test]
    fn verb_parses_case_insensitively() {
        assert_eq!("get".parse::<Verb>().unwrap(), Verb::Get);
        assert_eq!("Delete".parse::<Verb>().unwrap(), Verb::Delete);
        assert_eq!(Verb::Put.to_string(), "PUT");
        assert!("patch".parse::<Verb>().is_err());
    }

    #[test]
    fn replaces_path_params() {
        let params = json!({"id": 7});
        assert_eq!(replace_params("/posts/:id", Some(&params)), "/posts/7");
    }

    #[test]
    fn replaces_every_occurrence_and_multiple_keys() {
        let params = json!({"user": "u1", "post": 3});
        assert_eq!(
            replace_params("/users/:user/posts/:post", Some(&params)),
            "/users/u1/posts/3"
        );
    }

    #[test]
    fn placeholder_prefix_is_not_substituted() {
        let params = json!({"id": 1});
        assert_eq!(replace_params("/a/:idx/b", Some(&params)), "/a");
    }

    #[test]
    fn unmatched_trailing_placeholders_are_stripped() {
        assert_eq!(replace_params("/posts/:id", None), "/posts");
        let params = json!({"id": 2});
        assert_eq!(
            replace_params("/posts/:id/comments/:cid", Some(&params)),
            "/posts/2/comments"
        );
    }

    #[test]
    fn query_appends_with_question_mark() {
        let q = json!({"b": 2});
        assert_eq!(add_query("/path", Some(&q)), "/path?b=2");
    }

    #[test]
    fn query_merges_with_ampersand() {
        let q = json!({"b": 2});
        assert_eq!(add_query("/path?a=1", Some(&q)), "/path?a=1&b=2");
    }

    #[test]
    fn query_repeats_array_keys_and_skips_nulls() {
        let q = json!({"name": null, "sorting": "age desc", "status": ["active", "banned"]});
        assert_eq!(
            encode_query(&q),
            "sorting=age+desc&status=active&status=banned"
        );
    }

    #[test]
    fn empty_query_leaves_path_untouched() {
        assert_eq!(add_query("/p", Some(&json!({}))), "/p");
        assert_eq!(add_query("/p", None), "/p");
    }

    #[test]
    fn method_defaults() {
        let mut config = RequestConfig::new("/x");
        assert_eq!(config.resolved_method(), Verb::Get);
        config.body = Some(Body::Json(json!({"a": 1})));
        assert_eq!(config.resolved_method(), Verb::Post);
        config.method = Some(Verb::Put);
        assert_eq!(config.resolved_method(), Verb::Put);
    }

    #[test]
    fn merge_prefers_override_fields() {
        let base = RequestConfig {
            path: Some("/a".into()),
            method: Some(Verb::Get),
            query: Some(json!({"x": 1})),
            ..RequestConfig::default()
        };
        let merged = base.merge(RequestConfig {
            query: Some(json!({"y": 2})),
            ..RequestConfig::default()
        });
        assert_eq!(merged.path.as_deref(), Some("/a"));
        assert_eq!(merged.method, Some(Verb::Get));
        assert_eq!(merged.query, Some(json!({"y": 2})));
    }

    #[test]
    fn prepare_sets_auth_and_json_content_type() {
        let mut config = RequestConfig::new("/posts/:id");
        config.params = Some(json!({"id": 5}));
        config.body = Some(Body::Json(json!({"title": "t"})));
        let tokens = StaticToken::new(SecretString::from("\"tok\""));

        let prepared = prepare(&config, &tokens).unwrap();
        assert_eq!(prepared.method, Verb::Post);
        assert_eq!(prepared.url, "/posts/5");
        assert_eq!(prepared.headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(prepared.headers[CONTENT_TYPE], "application/json");
        assert_eq!(
            prepared.body,
            Some(PreparedBody::Bytes(Bytes::from_static(br#"{"title":"t"}"#)))
        );
    }

    #[test]
    fn prepare_omits_content_type_for_multipart() {
        let mut config = RequestConfig::new("/upload");
        config.body = Some(Body::Multipart(vec![FormPart::Text {
            name: "a".into(),
            value: "b".into(),
        }]));

        let prepared = prepare(&config, &NoToken).unwrap();
        assert!(prepared.headers.get(CONTENT_TYPE).is_none());
        assert!(prepared.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn explicit_headers_win() {
        let mut config = RequestConfig::new("/x");
        config
            .headers
            .insert("content-type".into(), "text/plain".into());
        let prepared = prepare(&config, &NoToken).unwrap();
        assert_eq!(prepared.headers[CONTENT_TYPE], "text/plain");
    }
}
