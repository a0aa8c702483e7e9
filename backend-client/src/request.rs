use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Only these methods serialize a request body; any body passed with
    /// `GET` or `DELETE` is dropped.
    pub fn carries_body(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request knobs. The default requires authentication and adds no headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestOptions {
    pub requires_auth: bool,
    /// Merged over the default `Content-Type`/`Accept` headers.
    pub headers: HashMap<String, String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            requires_auth: true,
            headers: HashMap::new(),
        }
    }
}

impl RequestOptions {
    /// Options for endpoints that must be called without a bearer credential.
    pub fn public() -> Self {
        Self {
            requires_auth: false,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Where a logical request is in its single refresh-and-resend cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Attempt {
    Sent,
    RetriedAfterRefresh,
}

impl Attempt {
    /// The only transition: a 401 on the first send of an authenticated
    /// request.
    pub(crate) fn should_refresh(self, status: reqwest::StatusCode, requires_auth: bool) -> bool {
        self == Attempt::Sent && requires_auth && status == reqwest::StatusCode::UNAUTHORIZED
    }
}
