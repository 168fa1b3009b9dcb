//! The transport capability and its hyper-backed default implementation.
//!
//! [`Transport`] is the minimal contract everything in courier composes over:
//! execute one request, return one response or fail. Decorators implement the
//! same trait and wrap an inner instance, so composition order is entirely
//! caller-chosen.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::error::{Error, Result};
use crate::request::{Options, Request, Response};

/// Executes a single request and returns a response or fails with a transport
/// error. `execute` may be invoked concurrently from independent calls
/// sharing one instance.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &Request, options: &Options) -> Result<Response>;
}

/// Default [`Transport`] over hyper's HTTP/1 client.
///
/// All framing is delegated to hyper. Every well-formed exchange produces a
/// `Response` regardless of status code; interpreting non-2xx statuses as
/// failures is a caller decision (see
/// [`Response::into_result`](crate::request::Response::into_result)).
pub struct HttpTransport;

impl HttpTransport {
    pub fn new() -> Self {
        Self
    }

    fn client_for(options: &Options) -> Client<HttpConnector, Full<Bytes>> {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(options.connect_timeout));
        Client::builder(TokioExecutor::new()).build(connector)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &Request, options: &Options) -> Result<Response> {
        let url = request.url();
        let mut builder = hyper::Request::builder()
            .method(request.method().clone())
            .uri(url.as_str());
        for (name, values) in request.headers() {
            for value in values {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        let body = request.body().cloned().unwrap_or_default();
        let http_request = builder
            .body(Full::new(body))
            .map_err(|e| Error::Transport(format!("failed to build request for {}: {}", url, e)))?;

        let client = Self::client_for(options);
        let response_future = client.request(http_request);
        let response = tokio::time::timeout(options.request_timeout, response_future)
            .await
            .map_err(|_| Error::Timeout(options.request_timeout.as_millis() as u64))?
            .map_err(|e| Error::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response body: {}", e)))?
            .to_bytes();
        let body = if body.is_empty() { None } else { Some(body) };

        Ok(Response::from_parts(status, headers, body))
    }
}
