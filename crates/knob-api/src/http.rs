// Request adapter for the Knob REST API.
//
// Every call is one HTTP exchange against `{endpoint}/{api_version}/{path}`.
// The adapter stamps the identity headers, encodes JSON bodies, and turns the
// response status into either a parsed body or a typed `Error`. Transport-level
// "raise on error" is never used; the status is always inspected here.

use std::fmt;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, error, trace};
use url::Url;

use crate::error::{Error, StatusClass, classify_status, extract_error_message};
use crate::resource::{Identify, getid};
use crate::transport::TransportConfig;

const JSON: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";

/// A request path below the versioned base URL, held as separate segments.
///
/// Each segment becomes exactly one percent-encoded URL path segment, so an
/// identifier containing `/` can never reach a different resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiPath {
    segments: Vec<String>,
}

impl ApiPath {
    /// The root of a collection, e.g. `gates`.
    pub fn collection(name: &str) -> Self {
        Self {
            segments: vec![name.to_owned()],
        }
    }

    /// Append a fixed sub-collection segment, e.g. `targets`.
    #[must_use]
    pub fn join(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_owned());
        self
    }

    /// Append the identifier of `item` as one segment.
    pub fn item<T: Identify + ?Sized>(mut self, item: &T) -> Result<Self, Error> {
        self.segments.push(getid(item)?.as_str().to_owned());
        Ok(self)
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Optional per-call request parts.
///
/// `headers` override both the adapter defaults and the per-verb
/// `Content-Type` / `Accept` values.
#[derive(Debug, Default)]
pub struct RequestParts<'a> {
    pub query: &'a [(String, String)],
    pub body: Option<&'a Value>,
    pub headers: HeaderMap,
}

impl<'a> RequestParts<'a> {
    pub fn query(query: &'a [(String, String)]) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn body(body: &'a Value) -> Self {
        Self {
            body: Some(body),
            ..Self::default()
        }
    }
}

/// Authenticated JSON-over-HTTP adapter shared by all resource managers.
///
/// The base URL and default headers are fixed at construction.
#[derive(Debug)]
pub struct RequestAdapter {
    http: reqwest::Client,
    base_url: Url,
    default_headers: HeaderMap,
}

impl RequestAdapter {
    /// Build an adapter with its own `reqwest::Client`.
    pub fn new(
        endpoint: &str,
        api_version: &str,
        default_headers: HeaderMap,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(endpoint, api_version, http, default_headers)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        endpoint: &str,
        api_version: &str,
        http: reqwest::Client,
        default_headers: HeaderMap,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(endpoint, api_version)?;
        Ok(Self {
            http,
            base_url,
            default_headers,
        })
    }

    /// `{endpoint}/{api_version}`, unless the endpoint already ends with the
    /// version segment.
    fn normalize_base_url(endpoint: &str, api_version: &str) -> Result<Url, Error> {
        let mut url = Url::parse(endpoint)?;
        let already_versioned = url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .is_some_and(|last| last == api_version);

        if !already_versioned && !api_version.is_empty() {
            url.path_segments_mut()
                .map_err(|()| {
                    Error::configuration(format!("endpoint cannot be a base URL: {endpoint}"))
                })?
                .pop_if_empty()
                .push(api_version);
        }
        Ok(url)
    }

    /// The versioned base URL every path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Resolve a relative resource path. `/` and `%` inside a segment are
    /// encoded rather than treated as separators.
    pub fn url(&self, path: &ApiPath) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::configuration(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(path.segments());
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get(&self, path: &ApiPath) -> Result<Option<Value>, Error> {
        self.send(Method::GET, path, RequestParts::default()).await
    }

    pub async fn get_with_params(
        &self,
        path: &ApiPath,
        params: &[(String, String)],
    ) -> Result<Option<Value>, Error> {
        self.send(Method::GET, path, RequestParts::query(params)).await
    }

    pub async fn post(&self, path: &ApiPath, body: &Value) -> Result<Option<Value>, Error> {
        self.send(Method::POST, path, RequestParts::body(body)).await
    }

    pub async fn put(&self, path: &ApiPath, body: &Value) -> Result<Option<Value>, Error> {
        self.send(Method::PUT, path, RequestParts::body(body)).await
    }

    pub async fn patch(&self, path: &ApiPath, body: &Value) -> Result<Option<Value>, Error> {
        self.send(Method::PATCH, path, RequestParts::body(body)).await
    }

    pub async fn delete(&self, path: &ApiPath) -> Result<Option<Value>, Error> {
        self.send(Method::DELETE, path, RequestParts::default()).await
    }

    /// Perform one exchange and classify the outcome.
    ///
    /// Returns `Ok(None)` for a successful response with an empty body.
    pub async fn send(
        &self,
        method: Method,
        path: &ApiPath,
        parts: RequestParts<'_>,
    ) -> Result<Option<Value>, Error> {
        let url = self.url(path)?;
        let headers = self.request_headers(&method, parts.body.is_some(), parts.headers);

        if parts.query.is_empty() {
            debug!("{method} {url}");
        } else {
            debug!("{method} {url} params={:?}", parts.query);
        }

        let mut builder = self.http.request(method, url).headers(headers);
        if !parts.query.is_empty() {
            builder = builder.query(parts.query);
        }
        if let Some(body) = parts.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        Self::handle_response(resp).await
    }

    /// Defaults, then the verb's content headers, then the caller's overrides.
    fn request_headers(&self, method: &Method, has_body: bool, overrides: HeaderMap) -> HeaderMap {
        let mut headers = self.default_headers.clone();
        if *method == Method::DELETE && !has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
        } else {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
            headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        }
        for (name, value) in &overrides {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response(resp: reqwest::Response) -> Result<Option<Value>, Error> {
        let status = resp.status().as_u16();
        debug!("Response status {status}");

        match classify_status(Some(status)) {
            StatusClass::Success => {
                let body = resp.bytes().await?;
                parse_body(&body)
            }
            class => {
                let body = resp.bytes().await.unwrap_or_default();
                Err(classify_failure(class, &body))
            }
        }
    }
}

/// Parse a successful response body; empty or whitespace-only is `None`.
fn parse_body(body: &[u8]) -> Result<Option<Value>, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        trace!("empty response body");
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        let text = String::from_utf8_lossy(body).into_owned();
        let preview: String = text.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: text,
        }
    })
}

/// Build the typed error for a failing status. The message is extracted
/// exactly once.
fn classify_failure(class: StatusClass, body: &[u8]) -> Error {
    let message = extract_error_message(body);
    match class {
        StatusClass::Auth => {
            error!("Auth error: {message}");
            Error::auth(message)
        }
        StatusClass::Server(status) => {
            error!("5xx Server error: {message}");
            Error::server(status, message)
        }
        StatusClass::Client(status) => {
            error!("4xx Client error: {message}");
            Error::client(status, message)
        }
        StatusClass::Success => Error::server(0, message),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn adapter(endpoint: &str) -> RequestAdapter {
        RequestAdapter::from_reqwest(endpoint, "v1", reqwest::Client::new(), HeaderMap::new())
            .unwrap()
    }

    #[test]
    fn base_url_appends_version() {
        assert_eq!(
            adapter("http://knob:9990").base_url().as_str(),
            "http://knob:9990/v1"
        );
        assert_eq!(
            adapter("http://knob:9990/ssh/").base_url().as_str(),
            "http://knob:9990/ssh/v1"
        );
    }

    #[test]
    fn base_url_keeps_existing_version() {
        assert_eq!(
            adapter("http://knob:9990/v1/").base_url().as_str(),
            "http://knob:9990/v1/"
        );
    }

    #[test]
    fn url_joins_and_encodes_segments() {
        let a = adapter("http://knob:9990");
        let path = ApiPath::collection("gates")
            .item("g 1")
            .unwrap()
            .join("targets");
        assert_eq!(
            a.url(&path).unwrap().as_str(),
            "http://knob:9990/v1/gates/g%201/targets"
        );
        assert_eq!(
            a.url(&ApiPath::collection("gates")).unwrap().as_str(),
            "http://knob:9990/v1/gates"
        );
    }

    #[test]
    fn identifier_stays_in_one_segment() {
        let a = adapter("http://knob:9990");
        let path = ApiPath::collection("gates").item("g1/targets/t1").unwrap();
        assert_eq!(
            a.url(&path).unwrap().as_str(),
            "http://knob:9990/v1/gates/g1%2Ftargets%2Ft1"
        );
    }

    #[test]
    fn empty_or_relative_identifier_is_rejected() {
        for bad in ["", ".", ".."] {
            assert!(matches!(
                ApiPath::collection("targets").item(bad),
                Err(Error::InvalidIdentifier { .. })
            ));
        }
    }

    #[test]
    fn delete_defaults_to_octet_stream() {
        let a = adapter("http://knob:9990");
        let h = a.request_headers(&Method::DELETE, false, HeaderMap::new());
        assert_eq!(h[CONTENT_TYPE], "application/octet-stream");
        assert!(!h.contains_key(ACCEPT));

        let h = a.request_headers(&Method::DELETE, true, HeaderMap::new());
        assert_eq!(h[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn overrides_win_over_defaults() {
        let mut defaults = HeaderMap::new();
        defaults.insert("x-user-name", HeaderValue::from_static("alice"));
        let a = RequestAdapter::from_reqwest("http://knob", "v1", reqwest::Client::new(), defaults)
            .unwrap();

        let mut overrides = HeaderMap::new();
        overrides.insert("x-user-name", HeaderValue::from_static("bob"));
        overrides.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        let h = a.request_headers(&Method::GET, false, overrides);
        assert_eq!(h["x-user-name"], "bob");
        assert_eq!(h[ACCEPT], "text/plain");
        assert_eq!(h[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn parse_body_handles_empty_and_invalid() {
        assert!(parse_body(b"").unwrap().is_none());
        assert!(parse_body(b"  \n").unwrap().is_none());
        assert_eq!(parse_body(br#"{"a":1}"#).unwrap(), Some(serde_json::json!({"a": 1})));
        assert!(matches!(
            parse_body(b"not json"),
            Err(Error::Deserialization { .. })
        ));
    }

    #[test]
    fn classify_failure_maps_kinds() {
        let body = br#"{"title":"Not Found","description":"no such gate"}"#;
        match classify_failure(StatusClass::Client(404), body) {
            Error::Client { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found: no such gate");
            }
            other => panic!("expected Client error, got {other:?}"),
        }
        assert!(matches!(
            classify_failure(StatusClass::Auth, b"denied"),
            Error::Auth { .. }
        ));
        assert!(matches!(
            classify_failure(StatusClass::Server(503), b""),
            Error::Server { status: 503, .. }
        ));
    }
}
