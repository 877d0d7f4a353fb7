use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use once_cell::unsync::OnceCell;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::ContextError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::router::{ParamVec, PathParams};

/// Normalized request handed to the routing core.
///
/// The HTTP layer is responsible for wire parsing. By the time a `Request`
/// exists the method is upper-cased, the path is percent-decoded with the
/// query string stripped, and the body is fully buffered.
#[derive(Debug)]
pub struct Request {
    request_id: RequestId,
    method: Method,
    path: String,
    headers: HeaderMap,
    query: ParamVec,
    params: PathParams,
    body: Vec<u8>,
    json: OnceCell<Value>,
}

impl Request {
    /// Build a request from a method and a request target such as
    /// `/users/42?verbose=true`.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            request_id: RequestId::new(),
            method: normalize_method(method),
            path,
            headers: HeaderMap::new(),
            query,
            params: PathParams::default(),
            body: Vec::new(),
            json: OnceCell::new(),
        }
    }

    /// Normalize an `http::Request`, rejecting bodies larger than `max_body_bytes`.
    pub fn from_http(req: http::Request<Vec<u8>>, max_body_bytes: usize) -> Result<Self, ContextError> {
        let (parts, body) = req.into_parts();
        if body.len() > max_body_bytes {
            return Err(ContextError::BodyTooLarge {
                size: body.len(),
                limit: max_body_bytes,
            });
        }

        let target = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());
        let (path, query) = split_target(&target);
        let request_id = RequestId::from_header_or_new(
            parts
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
        );

        debug!(
            request_id = %request_id,
            method = %parts.method,
            path = %path,
            header_count = parts.headers.len(),
            query_count = query.len(),
            body_bytes = body.len(),
            "HTTP request normalized"
        );

        Ok(Self {
            request_id,
            method: normalize_method(parts.method),
            path,
            headers: parts.headers,
            query,
            params: PathParams::default(),
            body,
            json: OnceCell::new(),
        })
    }

    /// Add a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.json = OnceCell::new();
        self
    }

    /// Attach a JSON body and the matching content type.
    #[must_use]
    pub fn with_json(self, body: &Value) -> Self {
        self.with_header(CONTENT_TYPE.as_str(), "application/json")
            .with_body(body.to_string())
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Header lookup, case-insensitive. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Query parameter lookup.
    ///
    /// Keys match case-insensitively; values are returned exactly as
    /// percent-decoded. Repeated keys resolve to the last occurrence.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_params(&self) -> &ParamVec {
        &self.query
    }

    /// Path parameter captured by a `:name` segment.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, or `None` when the request had no body.
    pub fn body_text(&self) -> Option<std::borrow::Cow<'_, str>> {
        (!self.body.is_empty()).then(|| String::from_utf8_lossy(&self.body))
    }

    /// Body parsed as JSON. Parsed on first call and cached afterwards.
    pub fn body_json(&self) -> Result<&Value, ContextError> {
        if let Some(parsed) = self.json.get() {
            return Ok(parsed);
        }
        if self.body.is_empty() {
            return Err(ContextError::NoBody);
        }
        let content_type = self.header(CONTENT_TYPE.as_str()).unwrap_or_default();
        if !is_json(content_type) {
            return Err(ContextError::NotJson {
                content_type: content_type.to_owned(),
            });
        }
        self.json
            .get_or_try_init(|| serde_json::from_slice(&self.body).map_err(ContextError::InvalidJson))
    }

    /// Body deserialized into `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, ContextError> {
        T::deserialize(self.body_json()?).map_err(ContextError::InvalidJson)
    }
}

fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn normalize_method(method: Method) -> Method {
    let upper = method.as_str().to_ascii_uppercase();
    if upper == method.as_str() {
        return method;
    }
    Method::from_bytes(upper.as_bytes()).unwrap_or(method)
}

/// Split a request target into a decoded path and decoded query parameters.
pub(crate) fn split_target(target: &str) -> (String, ParamVec) {
    let (raw_path, raw_query) = match target.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (target, None),
    };
    let path = match urlencoding::decode(raw_path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw_path.to_owned(),
    };
    let path = if path.is_empty() { "/".to_owned() } else { path };
    let query = raw_query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (std::sync::Arc::from(k.as_ref()), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();
    (path, query)
}
