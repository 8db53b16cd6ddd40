//! The dispatch context: the unit of request state.
//!
//! One [`DispatchContext`] exists per logical request, whether it is the
//! main inbound request, an internal request started by a handler, or a
//! `_global` cascade child. Its resolution fields are fixed at
//! construction; its response fields are mutated while the request
//! executes and read off by the caller afterwards.

use std::path::{Path, PathBuf};

use http::{Method, StatusCode};
use mime::Mime;

use crate::handler::Value;
use crate::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use crate::values::Values;

/// The state of one logical request: identity, resolution result and
/// response.
///
/// Created by [`Router::dispatch`](crate::Router::dispatch), executed by
/// [`Router::execute`](crate::Router::execute), then read for the status
/// code, response headers and body.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub(crate) id: u64,

    // Request identity.
    pub(crate) method: Method,
    pub(crate) scheme: String,
    pub(crate) host: String,
    pub(crate) port: Option<u16>,
    pub(crate) raw_path: String,
    pub(crate) query: String,
    pub(crate) segments: Vec<String>,

    // Resolution result.
    pub(crate) dir: PathBuf,
    pub(crate) file: Vec<String>,
    pub(crate) args: Vec<String>,
    pub(crate) extension: Option<String>,
    pub(crate) handler_ext: String,

    // Request containers, lazily defaulted to empty.
    pub(crate) query_values: Option<Values>,
    pub(crate) post: Option<Values>,
    pub(crate) cookies: Option<Values>,
    pub(crate) headers: Option<HeaderMap>,
    pub(crate) raw_body: Option<String>,
    pub(crate) body: Option<Value>,

    // Response state.
    pub(crate) status: Option<StatusCode>,
    pub(crate) status_message: Option<String>,
    pub(crate) response_headers: HeaderMap,
    pub(crate) response: Option<Value>,

    // Bookkeeping.
    pub(crate) canceled: bool,
    pub(crate) global_contexts: Vec<DispatchContext>,
    pub(crate) internal: bool,
}

impl DispatchContext {
    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request scheme, `"http"` or `"https"` unless the URL carried
    /// something else.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The request host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The request port, when the URL carried one.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The raw, undecoded request path.
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// The raw query string, empty when the URL carried none.
    pub fn query_string(&self) -> &str {
        &self.query
    }

    /// The cleaned, percent-decoded path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// One path segment by index, or `""` when out of range.
    pub fn path_segment(&self, index: usize) -> &str {
        self.segments.get(index).map_or("", String::as_str)
    }

    /// The leftover path segments that did not match the handler file.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// One argument by index, or `""` when out of range.
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map_or("", String::as_str)
    }

    /// The extension split off the final path segment, or `""` when the
    /// directory's policy did not apply.
    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or("")
    }

    /// The registered directory the handler file was found under.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The handler file path relative to [`dir`](Self::dir), including the
    /// handler extension.
    pub fn file(&self) -> PathBuf {
        let mut file = self.file.iter().collect::<PathBuf>().into_os_string();
        file.push(format!(".{}", self.handler_ext));
        PathBuf::from(file)
    }

    /// The absolute handler file path.
    pub fn absolute_file(&self) -> PathBuf {
        self.dir.join(self.file())
    }

    /// Rebuilds the URI of this request.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # let ctx: trellis::DispatchContext = unimplemented!();
    /// let uri = ctx.request_uri(true, true); // "http://host/path?query"
    /// let path_only = ctx.request_uri(false, false);
    /// ```
    pub fn request_uri(&self, include_host: bool, include_query: bool) -> String {
        let mut uri = String::new();
        if include_host {
            uri.push_str(&self.scheme);
            uri.push_str("://");
            uri.push_str(&self.host);
            if let Some(port) = self.port {
                uri.push_str(&format!(":{}", port));
            }
        }
        uri.push('/');
        uri.push_str(&self.segments.join("/"));
        if include_query && !self.query.is_empty() {
            uri.push('?');
            uri.push_str(&self.query);
        }
        uri
    }

    // Request containers.

    /// Supplies the query parameter values.
    pub fn with_query_values(mut self, values: Values) -> Self {
        self.query_values = Some(values);
        self
    }

    /// Supplies the posted form values.
    pub fn with_post(mut self, values: Values) -> Self {
        self.post = Some(values);
        self
    }

    /// Supplies the request cookies.
    pub fn with_cookies(mut self, values: Values) -> Self {
        self.cookies = Some(values);
        self
    }

    /// Supplies the request headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Supplies the raw request body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self.body = None;
        self
    }

    /// The query parameter values, empty if never supplied.
    pub fn query_values(&mut self) -> &Values {
        self.query_values.get_or_insert_with(Values::new)
    }

    /// The posted form values, empty if never supplied.
    pub fn post(&mut self) -> &Values {
        self.post.get_or_insert_with(Values::new)
    }

    /// The request cookies, empty if never supplied.
    pub fn cookies(&mut self) -> &Values {
        self.cookies.get_or_insert_with(Values::new)
    }

    /// The request headers, empty if never supplied.
    pub fn headers(&mut self) -> &HeaderMap {
        self.headers.get_or_insert_with(HeaderMap::new)
    }

    /// The request body.
    ///
    /// Parsed once on first access: JSON when the request `Content-Type`
    /// is `application/json`, the raw string otherwise, [`Value::Null`]
    /// when no body was supplied.
    pub fn body(&mut self) -> &Value {
        if self.body.is_none() {
            self.body = Some(parse_body(
                self.raw_body.as_deref(),
                self.headers.as_ref(),
            ));
        }
        self.body
            .as_ref()
            .expect("request body cache is filled above")
    }

    // Response state.

    /// The response status code, once one has been set.
    pub fn status_code(&self) -> Option<u16> {
        self.status.map(|status| status.as_u16())
    }

    /// The response status message, once a status has been set.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Sets the response status code, with the default message for that
    /// code (empty for unknown codes).
    ///
    /// # Panics
    ///
    /// Panics if the code is outside the range 100-999.
    pub fn set_status_code(&mut self, code: u16) {
        let status = StatusCode::from_u16(code).expect("invalid status code");
        self.status_message = Some(status.canonical_reason().unwrap_or("").to_owned());
        self.status = Some(status);
    }

    /// Sets the response status code with an explicit message.
    ///
    /// # Panics
    ///
    /// Panics if the code is outside the range 100-999.
    pub fn set_status_code_with_message(&mut self, code: u16, message: impl Into<String>) {
        self.status = Some(StatusCode::from_u16(code).expect("invalid status code"));
        self.status_message = Some(message.into());
    }

    /// The response headers.
    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    /// Sets a response header, replacing any existing values for the name.
    ///
    /// # Panics
    ///
    /// Panics if the provided header name or value was not valid.
    pub fn set_header(
        &mut self,
        name: impl TryInto<HeaderName>,
        value: impl TryInto<HeaderValue>,
    ) {
        let (name, value) = convert_header(name, value);
        self.response_headers.insert(name, value);
    }

    /// Adds a response header, in addition to any existing values for the
    /// name.
    ///
    /// # Panics
    ///
    /// Panics if the provided header name or value was not valid.
    pub fn add_header(
        &mut self,
        name: impl TryInto<HeaderName>,
        value: impl TryInto<HeaderValue>,
    ) {
        let (name, value) = convert_header(name, value);
        self.response_headers.append(name, value);
    }

    /// The response body, if one was produced.
    pub fn response(&self) -> Option<&Value> {
        self.response.as_ref()
    }

    /// Whether a `_global` handler canceled this request before its target
    /// handler ran.
    pub fn canceled(&self) -> bool {
        self.canceled
    }

    /// The `_global` cascade contexts executed for this request, in
    /// root-to-leaf order.
    pub fn global_contexts(&self) -> &[DispatchContext] {
        &self.global_contexts
    }

    /// Whether this context was created by a handler as an internal
    /// request rather than dispatched as the outermost one.
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    // Crate-internal plumbing.

    /// Defaults every request container that was never supplied.
    pub(crate) fn ensure_containers(&mut self) {
        self.query_values.get_or_insert_with(Values::new);
        self.post.get_or_insert_with(Values::new);
        self.cookies.get_or_insert_with(Values::new);
        self.headers.get_or_insert_with(HeaderMap::new);
    }

    /// Snapshots this context for a `_global` cascade level.
    ///
    /// The child shares the parent's resolved request fields (including
    /// any already-propagated status) but gets its own identity, the
    /// overridden file target, and cleared body and bookkeeping.
    pub(crate) fn global_child(&self, id: u64, file: Vec<String>) -> Self {
        let mut child = self.clone();
        child.id = id;
        child.file = file;
        child.response = None;
        child.canceled = false;
        child.global_contexts = Vec::new();
        child
    }
}

fn convert_header(
    name: impl TryInto<HeaderName>,
    value: impl TryInto<HeaderValue>,
) -> (HeaderName, HeaderValue) {
    let name = match name.try_into() {
        Ok(name) => name,
        Err(_) => panic!("invalid response header name"),
    };
    let value = match value.try_into() {
        Ok(value) => value,
        Err(_) => panic!("invalid response header value"),
    };
    (name, value)
}

fn parse_body(raw: Option<&str>, headers: Option<&HeaderMap>) -> Value {
    let raw = match raw {
        Some(raw) => raw,
        None => return Value::Null,
    };
    if is_json(headers) {
        if let Ok(value) = serde_json::from_str(raw) {
            return value;
        }
    }
    Value::String(raw.to_owned())
}

fn is_json(headers: Option<&HeaderMap>) -> bool {
    headers
        .and_then(|headers| headers.get(CONTENT_TYPE))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Mime>().ok())
        .map_or(false, |mime| {
            mime.type_() == mime::APPLICATION && mime.subtype() == mime::JSON
        })
}

#[cfg(test)]
mod tests {
    use super::{is_json, parse_body};
    use crate::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use crate::Value;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers
    }

    #[test]
    fn json_detection() {
        assert!(is_json(Some(&json_headers())));
        assert!(!is_json(None));

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(Some(&headers)));
    }

    #[test]
    fn body_parsing() {
        assert_eq!(parse_body(None, None), Value::Null);
        assert_eq!(
            parse_body(Some("plain"), None),
            Value::String("plain".into())
        );

        let headers = json_headers();
        assert_eq!(
            parse_body(Some(r#"{"a":1}"#), Some(&headers)),
            serde_json::json!({ "a": 1 })
        );
        // Malformed JSON falls back to the raw string.
        assert_eq!(
            parse_body(Some("{oops"), Some(&headers)),
            Value::String("{oops".into())
        );
    }
}
