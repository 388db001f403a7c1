use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub user_agent: Option<String>,
}

impl Request {
    /// Build a `GET` request from a path with an optional query string.
    #[must_use]
    pub fn get(target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method: "GET".to_string(),
            path: path.to_string(),
            query: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            user_agent: None,
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// A query parameter counts as set only when it carries a value, so
    /// `?update` and `?update=` are both unset.
    #[must_use]
    pub fn query_flag(&self, key: &str) -> bool {
        self.query
            .iter()
            .any(|(name, value)| name == key && !value.is_empty())
    }

    /// Percent-decoded, non-empty path segments. `None` when a segment does
    /// not decode to UTF-8.
    pub(crate) fn segments(&self) -> Option<Vec<String>> {
        self.path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                percent_decode_str(segment)
                    .decode_utf8()
                    .ok()
                    .map(Cow::into_owned)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn json<T: Serialize>(status: u16, payload: &T) -> Self {
        match serde_json::to_vec(payload) {
            Ok(body) => Self::empty(status)
                .with_header("content-type", "application/json")
                .with_body(body),
            Err(error) => {
                log::error!("Failed to serialize response payload: {error}");
                Self::empty(500)
            }
        }
    }

    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::empty(302).with_header("location", location)
    }

    #[must_use]
    pub fn bytes(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        let length = body.len().to_string();
        Self::empty(200)
            .with_header("content-type", content_type)
            .with_header("content-length", length)
            .with_body(body)
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}
