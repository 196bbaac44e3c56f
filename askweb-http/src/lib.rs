//! Minimal HTTP client with safe logging and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout
//! - Redacts sensitive query params and never logs secret values
//! - JSON, form and raw-bytes helpers; absolute URLs for page fetching
//! - Optional *raw* request/response logging via `ASKWEB_HTTP_RAW=1`
//!
//! No retries: every failure is reported once to the caller.
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), askweb_http::HttpError> {
//! let client = askweb_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", askweb_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

const RAW_ENV: &str = "ASKWEB_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;

const SECRET_QUERY_KEYS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "token",
    "secret",
    "client_secret",
    "bearer",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl HttpError {
    /// HTTP status for API errors, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use askweb_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Custom header (e.g., Brave: X-Subscription-Token)
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    None,
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use askweb_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(10)),
///     allow_absolute: true,
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 10);
/// assert!(opts.auth.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
    /// Stop reading the body after this many bytes.
    pub max_body: Option<usize>,
}

enum Payload<'a> {
    Empty,
    Json(Vec<u8>),
    Form(&'a [(&'a str, &'a str)]),
}

impl Payload<'_> {
    fn is_some(&self) -> bool {
        !matches!(self, Payload::Empty)
    }
}

/// Status, headers and body of a successful (2xx) response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Option<Url>,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use askweb_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        // Relative joins replace the last segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base: Some(base),
            inner: build_inner(None)?,
            default_timeout: Duration::from_secs(30),
        })
    }

    /// Construct a client without a base URL; every path must be absolute.
    pub fn unanchored(user_agent: Option<&str>) -> Result<Self, HttpError> {
        Ok(Self {
            base: None,
            inner: build_inner(user_agent)?,
            default_timeout: Duration::from_secs(30),
        })
    }

    /// Override the default timeout.
    ///
    /// ```no_run
    /// use askweb_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Duration::from_secs(2));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// POST JSON using optional Bearer auth.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let opts = RequestOpts {
            auth: bearer.map(Auth::Bearer),
            ..Default::default()
        };
        self.post_json_opts(path, body, opts).await
    }

    /// POST JSON with per-request options.
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let resp = self
            .execute(Method::POST, path, Payload::Json(bytes), opts)
            .await?;
        decode_json(&resp.body)
    }

    /// GET JSON with per-request options.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let resp = self.execute(Method::GET, path, Payload::Empty, opts).await?;
        decode_json(&resp.body)
    }

    /// GET raw bytes (HTML pages and other non-JSON bodies).
    pub async fn get_bytes(
        &self,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<RawResponse, HttpError> {
        self.execute(Method::GET, path, Payload::Empty, opts).await
    }

    /// POST an urlencoded form and return the raw body.
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
        opts: RequestOpts<'_>,
    ) -> Result<RawResponse, HttpError> {
        self.execute(Method::POST, path, Payload::Form(form), opts)
            .await
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute || self.base.is_none() {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        match &self.base {
            Some(base) => base.join(path).map_err(|e| HttpError::Url(e.to_string())),
            None => Err(HttpError::Url(format!("relative path without base: {path}"))),
        }
    }

    // FIXME(observability): emit a dedicated span with `http.*` fields instead of
    // loose events so request/response pairs group in JSON logs.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        payload: Payload<'_>,
        opts: RequestOpts<'_>,
    ) -> Result<RawResponse, HttpError> {
        let url = self.resolve(path, opts.allow_absolute)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpError::Url(format!("unsupported scheme: {url}")));
        }

        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut rb = self.inner.request(method.clone(), url.clone()).timeout(timeout);

        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }

        let has_body = payload.is_some();
        let mut raw_body: Option<Vec<u8>> = None;
        match payload {
            Payload::Empty => {}
            Payload::Json(bytes) => {
                raw_body = Some(bytes.clone());
                rb = rb
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(bytes);
            }
            Payload::Form(form) => {
                rb = rb.form(form);
            }
        }

        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        let auth_kind = match &opts.auth {
            Some(Auth::Bearer(tok)) => {
                let tok = sanitize_api_key(tok)?;
                rb = rb.bearer_auth(tok);
                "bearer"
            }
            Some(Auth::Header { name, value }) => {
                rb = rb.header(name, value);
                "header"
            }
            Some(Auth::None) | None => "none",
        };

        let redacted_q = redact_query_pairs(opts.query.as_deref().unwrap_or_default());
        let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());

        tracing::debug!(
            method=%method,
            host_path=%host_path,
            query=?redacted_q,
            timeout_ms=timeout.as_millis() as u64,
            auth_kind,
            has_body,
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(
                &method,
                &url,
                opts.headers.as_ref().unwrap_or(&HeaderMap::new()),
                raw_body.as_deref(),
            );
            tracing::debug!(target: "http.raw", %curl, "request");
        }

        let t0 = Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let mapped = map_reqwest_error(err, timeout);
            tracing::warn!(host_path=%host_path, error=%mapped, "http.network_error.send");
            mapped
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let (bytes, capped) = read_body(resp, opts.max_body).await.map_err(|err| {
            let mapped = map_reqwest_error(err, timeout);
            tracing::warn!(host_path=%host_path, error=%mapped, "http.network_error.body");
            mapped
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            host_path=%host_path,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            capped,
            "http.response"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let cut = bytes.len().min(RAW_MAX_BODY);
            let text = String::from_utf8_lossy(&bytes[..cut]);
            tracing::info!(
                target: "http.raw",
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated=bytes.len() > RAW_MAX_BODY
            );
        }

        if status.is_success() {
            return Ok(RawResponse {
                status,
                headers,
                body: bytes,
            });
        }

        let message = extract_error_message(status, &bytes);
        tracing::warn!(
            host_path=%host_path,
            %status,
            message=%message,
            "http.error"
        );
        Err(HttpError::Api { status, message })
    }
}

fn build_inner(user_agent: Option<&str>) -> Result<Client, HttpError> {
    let mut headers = HeaderMap::new();
    if let Some(ua) = user_agent {
        let value = HeaderValue::from_str(ua).map_err(|e| HttpError::Build(e.to_string()))?;
        headers.insert(USER_AGENT, value);
    }
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .redirect(reqwest::redirect::Policy::limited(5))
        .default_headers(headers)
        .build()
        .map_err(|e| HttpError::Build(e.to_string()))
}

/// Read the body chunk by chunk, keeping at most `cap` bytes.
async fn read_body(
    mut resp: reqwest::Response,
    cap: Option<usize>,
) -> Result<(Vec<u8>, bool), reqwest::Error> {
    let limit = cap.unwrap_or(usize::MAX);
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        let room = limit - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout(timeout)
    } else {
        HttpError::Network(err.to_string())
    }
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice::<T>(bytes).map_err(|e| {
        let snippet = snip_body(bytes);
        tracing::warn!(
            serde_line=%e.line(),
            serde_col=%e.column(),
            serde_err=%e,
            body_snippet=%snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    if let Some(bytes) = body {
        let cut = bytes.len().min(RAW_MAX_BODY);
        let s = String::from_utf8_lossy(&bytes[..cut]);
        parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
    }
    let mut shown = url.clone();
    let redacted: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| redact_pair(&k, &v))
        .collect();
    if redacted.is_empty() {
        shown.set_query(None);
    } else {
        shown.query_pairs_mut().clear().extend_pairs(redacted);
    }
    parts.push(format!("'{}'", shown.as_str()));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let lower = key.to_ascii_lowercase();
            let val = if lower == "authorization" || lower.ends_with("-token") {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

fn redact_query_pairs(q: &[(&str, Cow<'_, str>)]) -> Vec<(String, String)> {
    q.iter().map(|(k, v)| redact_pair(k, v)).collect()
}

fn redact_pair(key: &str, value: &str) -> (String, String) {
    let is_secret = SECRET_QUERY_KEYS.contains(&key.to_ascii_lowercase().as_str());
    let shown = if is_secret { "<redacted>" } else { value };
    (key.to_string(), shown.to_string())
}

fn extract_error_message(status: StatusCode, body: &[u8]) -> String {
    // OpenAI/Groq style: {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct OpenAiEnv {
        error: OpenAiDetail,
    }
    #[derive(Deserialize)]
    struct OpenAiDetail {
        message: String,
    }

    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<OpenAiEnv>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    // Markup bodies collapse to the status reason.
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        return status.canonical_reason().unwrap_or("no reason").to_string();
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(500) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}
