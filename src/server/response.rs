use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::debug;

use super::cookie::{serialize_cookie, CookieOptions};
use super::error::ContextError;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Response header storage. Names are `Arc<str>` because most of them are
/// the same handful of static strings.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "",
    }
}

/// A committed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with a `content-type` header.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let mut res = Self::new(status, HeaderVec::new(), body.to_string().into_bytes());
        res.set_header("content-type", "application/json".to_owned());
        res
    }

    /// `{"error": message}` with the given status.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        status_reason(self.status)
    }

    /// First header with this name, case-insensitive.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for this header, in insertion order.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every header with this name.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Body parsed as JSON, for callers inspecting a committed response.
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_slice(&self.body)
    }

    /// Convert into an `http::Response` for the HTTP layer. Headers whose
    /// name or value is not valid HTTP are dropped.
    #[must_use]
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let mut builder = http::Response::builder().status(self.status);
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in &self.headers {
                if let (Ok(name), Ok(value)) = (
                    http::HeaderName::from_bytes(name.as_bytes()),
                    http::HeaderValue::from_str(value),
                ) {
                    headers.append(name, value);
                }
            }
        }
        match builder.body(self.body) {
            Ok(res) => res,
            Err(err) => {
                debug!(error = %err, status = self.status, "Invalid response status; sending 500");
                let mut res = http::Response::new(Vec::new());
                *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                res
            }
        }
    }
}

/// Write surface of a [`super::Context`].
///
/// Status and headers accumulate until one of the commit methods
/// ([`ResponseWriter::json`], [`ResponseWriter::text`],
/// [`ResponseWriter::error`]) finalizes the response. Exactly one commit
/// succeeds per request.
#[derive(Debug)]
pub struct ResponseWriter {
    status: u16,
    headers: HeaderVec,
    committed: Option<Response>,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            committed: None,
        }
    }
}

impl ResponseWriter {
    pub fn status(&mut self, code: u16) -> &mut Self {
        self.status = code;
        self
    }

    /// Set a header, replacing any previous value.
    pub fn header(&mut self, key: &str, value: &str) -> &mut Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self.headers.push((Arc::from(key), value.to_owned()));
        self
    }

    /// Append a `Set-Cookie` header.
    pub fn cookie(
        &mut self,
        name: &str,
        value: &str,
        options: &CookieOptions,
    ) -> Result<&mut Self, ContextError> {
        let cookie = serialize_cookie(name, value, options)?;
        self.headers.push((Arc::from("set-cookie"), cookie));
        Ok(self)
    }

    /// Expire a cookie by sending an empty value with an epoch `Expires`.
    pub fn clear_cookie(&mut self, name: &str, path: &str) -> &mut Self {
        let options = CookieOptions {
            path: Some(path.to_owned()),
            expires: Some(DateTime::<Utc>::UNIX_EPOCH),
            ..CookieOptions::default()
        };
        if let Ok(cookie) = serialize_cookie(name, "", &options) {
            self.headers.push((Arc::from("set-cookie"), cookie));
        }
        self
    }

    /// Commit a JSON body.
    pub fn json<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<(), ContextError> {
        self.ensure_open()?;
        let bytes = serde_json::to_vec(body).map_err(ContextError::Serialize)?;
        self.header("content-type", "application/json");
        self.commit(bytes);
        Ok(())
    }

    /// Commit a plain-text body.
    pub fn text(&mut self, body: impl Into<String>) -> Result<(), ContextError> {
        self.ensure_open()?;
        if !self
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        {
            self.header("content-type", "text/plain; charset=utf-8");
        }
        self.commit(body.into().into_bytes());
        Ok(())
    }

    /// Commit `{"error": message}` with `status`, then hand `err` back so the
    /// calling step can abort the chain with it:
    ///
    /// ```rust
    /// use signalrouter::middleware::Step;
    ///
    /// let parse = Step::chain(|ctx, next| {
    ///     if let Err(err) = ctx.req.body_json() {
    ///         return Err(ctx.res.error(err, 400, "Invalid JSON body"));
    ///     }
    ///     next.run(ctx)
    /// });
    /// # let _ = parse;
    /// ```
    ///
    /// If a response was already committed nothing is written and
    /// [`ContextError::AlreadySent`] is returned instead of `err`.
    pub fn error<E: Into<anyhow::Error>>(&mut self, err: E, status: u16, message: &str) -> anyhow::Error {
        if self.ensure_open().is_err() {
            return ContextError::AlreadySent.into();
        }
        self.status = status;
        self.header("content-type", "application/json");
        self.commit(serde_json::json!({ "error": message }).to_string().into_bytes());
        err.into()
    }

    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.committed.is_some()
    }

    /// The committed response, if any.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.committed.as_ref()
    }

    pub(crate) fn take_response(&mut self) -> Option<Response> {
        self.committed.take()
    }

    fn ensure_open(&self) -> Result<(), ContextError> {
        if self.is_sent() {
            Err(ContextError::AlreadySent)
        } else {
            Ok(())
        }
    }

    fn commit(&mut self, body: Vec<u8>) {
        self.committed = Some(Response::new(self.status, self.headers.clone(), body));
    }
}
