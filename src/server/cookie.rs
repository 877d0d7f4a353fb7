use chrono::{DateTime, Utc};

use super::error::ContextError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes for a `Set-Cookie` header.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    /// Lifetime in seconds.
    pub max_age: Option<i64>,
    pub expires: Option<DateTime<Utc>>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

/// Render a `Set-Cookie` header value. The cookie value is percent-encoded.
pub(crate) fn serialize_cookie(
    name: &str,
    value: &str,
    options: &CookieOptions,
) -> Result<String, ContextError> {
    if options.same_site == Some(SameSite::None) && !options.secure {
        return Err(ContextError::InsecureSameSite {
            name: name.to_owned(),
        });
    }

    let mut cookie = format!("{name}={}", urlencoding::encode(value));
    if let Some(max_age) = options.max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    if let Some(expires) = options.expires {
        cookie.push_str(&format!(
            "; Expires={}",
            expires.format("%a, %d %b %Y %H:%M:%S GMT")
        ));
    }
    if let Some(path) = &options.path {
        cookie.push_str(&format!("; Path={path}"));
    }
    if let Some(domain) = &options.domain {
        cookie.push_str(&format!("; Domain={domain}"));
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if let Some(same_site) = options.same_site {
        cookie.push_str("; SameSite=");
        cookie.push_str(same_site.as_str());
    }
    Ok(cookie)
}
