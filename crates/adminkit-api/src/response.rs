// ── Response pipeline ──
//
// Classifies a completed HTTP response as JSON payload, file download or
// application error and dispatches accordingly. Side effects (login
// redirects, user notifications, saving files) go through injected hooks.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ApiError, Error};
use crate::request::CallOptions;

// ── Hooks ───────────────────────────────────────────────────────────

/// User-facing side effects triggered by responses.
pub trait ResponseHooks: Send + Sync {
    /// Leave the current view for the login screen (HTTP 401).
    fn redirect_to_login(&self);

    /// Surface an error message to the user.
    fn notify_error(&self, message: &str);

    /// Surface a success message to the user.
    fn notify_success(&self, message: &str);
}

/// Hooks that only emit `tracing` events.
#[derive(Debug, Clone, Default)]
pub struct TracingHooks {
    login_url: Option<String>,
}

impl TracingHooks {
    pub fn new(login_url: Option<String>) -> Self {
        Self { login_url }
    }
}

impl ResponseHooks for TracingHooks {
    fn redirect_to_login(&self) {
        info!(
            login_url = self.login_url.as_deref().unwrap_or("/login"),
            "session rejected, redirecting to login"
        );
    }

    fn notify_error(&self, message: &str) {
        warn!("{message}");
    }

    fn notify_success(&self, message: &str) {
        info!("{message}");
    }
}

// ── Download sinks ──────────────────────────────────────────────────

/// Destination for file downloads (the "save as" action).
pub trait DownloadSink: Send + Sync {
    /// Persist `data` under a name derived from `filename`, returning where
    /// it was written.
    fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf, Error>;
}

/// Writes downloads into a directory, never overwriting existing files.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free path for `name`: `name.ext`, `name (1).ext`, `name (2).ext`, ...
    fn unique_path(&self, name: &str) -> PathBuf {
        let candidate = self.dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        let path = Path::new(name);
        let stem = path
            .file_stem()
            .map_or_else(|| name.to_owned(), |s| s.to_string_lossy().into_owned());
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (1u32..)
            .map(|n| self.dir.join(format!("{stem} ({n}){ext}")))
            .find(|p| !p.exists())
            .unwrap_or(candidate)
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf, Error> {
        let io_err = |source| Error::Download {
            filename: filename.to_owned(),
            source,
        };
        // Keep only the final component so a server cannot write outside `dir`.
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "download".to_owned());

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let path = self.unique_path(&name);
        std::fs::write(&path, data).map_err(io_err)?;
        debug!(path = %path.display(), bytes = data.len(), "download saved");
        Ok(path)
    }
}

// ── Payload ─────────────────────────────────────────────────────────

/// Successful outcome of one dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Parsed JSON body.
    Json(Value),
    /// Binary body that was handed to the download sink.
    File { filename: String, path: PathBuf },
}

impl Payload {
    /// JSON view of the payload. Downloads resolve to the empty string;
    /// the caller never receives the binary.
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::File { .. } => Value::String(String::new()),
        }
    }
}

// ── Classification ──────────────────────────────────────────────────

/// How an OK response should be consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Json,
    File { filename: String },
}

const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("application/pdf", ".pdf"),
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
    ("application/vnd.ms-excel", ".xls"),
    ("application/msword", ".doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("text/plain", ".txt"),
    ("application/zip", ".zip"),
    ("application/json", ".json"),
];

const BINARY_PREFIXES: &[&str] = &[
    "application/octet-stream",
    "application/pdf",
    "image/",
    "video/",
    "audio/",
];

/// File extension (with leading dot) for a `Content-Type`, or `""`.
pub fn extension_for_mime(content_type: &str) -> &'static str {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    MIME_EXTENSIONS
        .iter()
        .find(|(m, _)| m.eq_ignore_ascii_case(mime))
        .map_or("", |(_, ext)| ext)
}

/// Whether the headers describe a downloadable artifact.
pub fn is_file_download(content_disposition: Option<&str>, content_type: &str) -> bool {
    content_disposition.is_some_and(|cd| cd.contains("attachment"))
        || BINARY_PREFIXES.iter().any(|p| content_type.starts_with(p))
        || content_type.contains("download")
}

/// Decode `%XX` escapes, leaving `+` untouched.
fn percent_decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Extract the `filename` parameter of a `Content-Disposition` header,
/// quotes stripped and percent-decoded. Falls back to `filename*`.
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for item in header.split(';') {
        let Some((key, value)) = item.split_once('=') else {
            continue;
        };
        let value = value.trim().replace('"', "");
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" if plain.is_none() => plain = Some(percent_decode(&value)),
            "filename*" if extended.is_none() => {
                // RFC 5987: charset'lang'value
                let encoded = value.splitn(3, '\'').nth(2).unwrap_or(&value).to_owned();
                extended = Some(percent_decode(&encoded));
            }
            _ => {}
        }
    }

    plain.or(extended).filter(|name| !name.is_empty())
}

fn header_str<'a>(headers: &'a HeaderMap, name: reqwest::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Decide between JSON and file download for an OK response.
pub fn classify(headers: &HeaderMap) -> Disposition {
    let disposition = header_str(headers, CONTENT_DISPOSITION);
    let content_type = header_str(headers, CONTENT_TYPE).unwrap_or_default();

    if !is_file_download(disposition, content_type) {
        return Disposition::Json;
    }

    let filename = disposition
        .and_then(content_disposition_filename)
        .unwrap_or_else(|| format!("download{}", extension_for_mime(content_type)));
    Disposition::File { filename }
}

// ── Error handling ──────────────────────────────────────────────────

/// Normalize an error body into `ApiError`.
///
/// The body is parsed as JSON when possible; the message is the body itself
/// for plain text, or its `message` field for JSON objects.
pub fn parse_error_body(status: u16, text: &str) -> ApiError {
    let raw = serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_owned()));
    let message = match &raw {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        _ => String::new(),
    };
    ApiError {
        status,
        message,
        raw,
    }
}

type ErrorHandler = fn(&ApiError, CallOptions, &dyn ResponseHooks);

fn on_unauthorized(_: &ApiError, options: CallOptions, hooks: &dyn ResponseHooks) {
    if options.auto_redirect() {
        hooks.redirect_to_login();
    }
}

fn on_not_found(err: &ApiError, _: CallOptions, hooks: &dyn ResponseHooks) {
    hooks.notify_error(if err.message.is_empty() {
        "404"
    } else {
        &err.message
    });
}

fn on_default(err: &ApiError, _: CallOptions, hooks: &dyn ResponseHooks) {
    hooks.notify_error(if err.message.is_empty() {
        "Unknown error"
    } else {
        &err.message
    });
}

const ERROR_HANDLERS: &[(u16, ErrorHandler)] = &[(401, on_unauthorized), (404, on_not_found)];

fn error_handler(status: u16) -> ErrorHandler {
    ERROR_HANDLERS
        .iter()
        .find(|(code, _)| *code == status)
        .map_or(on_default as ErrorHandler, |(_, handler)| *handler)
}

/// Run the status-specific side effect for an application error.
pub fn report_error(err: &ApiError, options: CallOptions, hooks: &dyn ResponseHooks) {
    error_handler(err.status)(err, options, hooks);
}

// ── Pipeline ────────────────────────────────────────────────────────

/// Consume a response into a payload or an error.
pub(crate) async fn handle_response(
    resp: reqwest::Response,
    options: CallOptions,
    hooks: &dyn ResponseHooks,
    sink: &dyn DownloadSink,
) -> Result<Payload, Error> {
    let status = resp.status();

    if !status.is_success() {
        let text = resp.text().await?;
        let err = parse_error_body(status.as_u16(), &text);
        debug!(status = err.status, message = %err.message, "request failed");
        report_error(&err, options, hooks);
        return Err(Error::Api(err));
    }

    match classify(resp.headers()) {
        Disposition::File { filename } => {
            let data = resp.bytes().await?;
            let path = sink.save(&filename, &data)?;
            Ok(Payload::File { filename, path })
        }
        Disposition::Json => {
            let body = resp.text().await?;
            if body.trim().is_empty() {
                return Ok(Payload::Json(Value::Null));
            }
            serde_json::from_str(&body).map(Payload::Json).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body: body.clone(),
                }
            })
        }
    }
}
