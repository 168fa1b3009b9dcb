use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::query::encode_component;

/// Identity of a logical operation, stable across every retry attempt of one
/// call. `operation` names the invoked method, `target` the logical service.
/// Both become metric labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub operation: String,
    pub target: String,
}

impl CallDescriptor {
    pub fn new(operation: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            target: target.into(),
        }
    }
}

/// Per-call execution options, handed untouched to the innermost transport.
#[derive(Debug, Clone)]
pub struct Options {
    /// Time allowed for establishing the connection
    pub connect_timeout: Duration,
    /// Time allowed for the whole request/response exchange
    pub request_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl Options {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// An immutable HTTP call description.
///
/// A `Request` is created once per logical call through [`RequestBuilder`],
/// which renders query parameters into the path exactly once. Decorators never
/// mutate a request; target resolution produces a new value via
/// [`Request::with_authority`] that differs only in its authority.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    scheme: String,
    authority: Option<String>,
    path_and_query: String,
    headers: BTreeMap<String, Vec<String>>,
    body: Option<Bytes>,
    descriptor: CallDescriptor,
}

impl Request {
    /// Starts building a request for `path` (no query string; use
    /// [`RequestBuilder::query`] so values are escaped exactly once).
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            method,
            scheme: "http".to_string(),
            authority: None,
            path: path.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
            descriptor: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Resolved `host:port`, if a target has been assigned.
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// Encoded path plus query string, e.g. `/users?name=a%20b`.
    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    pub fn headers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn descriptor(&self) -> &CallDescriptor {
        &self.descriptor
    }

    /// Full URL. Requests without an authority render as path-and-query only;
    /// the balancer assigns the authority before the transport needs one.
    pub fn url(&self) -> String {
        match &self.authority {
            Some(authority) => format!("{}://{}{}", self.scheme, authority, self.path_and_query),
            None => self.path_and_query.clone(),
        }
    }

    /// Returns a copy of this request routed to `authority`. Everything apart
    /// from the authority is identical, including the already-encoded query.
    pub fn with_authority(&self, authority: impl Into<String>) -> Request {
        let mut routed = self.clone();
        routed.authority = Some(authority.into());
        routed
    }
}

/// Builder for [`Request`]. Query values are percent-encoded once, at
/// [`RequestBuilder::build`].
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    scheme: String,
    authority: Option<String>,
    path: String,
    query: Vec<(String, String)>,
    headers: BTreeMap<String, Vec<String>>,
    body: Option<Bytes>,
    descriptor: Option<CallDescriptor>,
}

impl RequestBuilder {
    pub fn descriptor(mut self, descriptor: CallDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Pre-resolves the target. Usually left unset and filled in by the
    /// load-balancing layer.
    pub fn authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Appends one query parameter. The raw value is escaped at `build()`.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Appends every entry of an encoded object, as produced by
    /// [`QueryMapEncoder::encode`](crate::query::QueryMapEncoder::encode).
    pub fn query_map(mut self, map: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(map);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Request {
        let mut path_and_query = self.path;
        for (i, (name, value)) in self.query.iter().enumerate() {
            path_and_query.push(if i == 0 { '?' } else { '&' });
            path_and_query.push_str(&encode_component(name));
            path_and_query.push('=');
            path_and_query.push_str(&encode_component(value));
        }

        let descriptor = self.descriptor.unwrap_or_else(|| {
            CallDescriptor::new(
                format!("{} {}", self.method, path_and_query),
                self.authority.clone().unwrap_or_else(|| "unresolved".to_string()),
            )
        });

        Request {
            method: self.method,
            scheme: self.scheme,
            authority: self.authority,
            path_and_query,
            headers: self.headers,
            body: self.body,
            descriptor,
        }
    }
}

/// An immutable HTTP response, produced by the innermost transport and only
/// observed on the way out.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: BTreeMap<String, Vec<String>>,
    body: Option<Bytes>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn from_parts(
        status: StatusCode,
        headers: BTreeMap<String, Vec<String>>,
        body: Option<Bytes>,
    ) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.headers
    }

    /// First value of `name`, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Maps a non-success status into the coded failure channel. Decorators
    /// never call this; it is for callers that want status checking after the
    /// chain has completed.
    pub fn into_result(self, descriptor: &CallDescriptor) -> Result<Response> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::Application {
                status: self.status,
                operation: descriptor.operation.clone(),
                body: self.body,
            })
        }
    }
}
