//! Courier Client
//!
//! Facade that composes the courier decorator chain around a base transport.
//!
//! [`ClientBuilder`] applies each configured layer in the canonical order,
//! outermost first:
//!
//! ```text
//! RetryingTransport -> LoadBalancedTransport -> MeteredTransport -> base
//! ```
//!
//! Retry sits outside load balancing so every attempt re-selects a target;
//! metrics sit inside retry so every attempt records its own latency sample
//! and status counter. Layers that are not configured are simply not applied.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use courier_balance::ServerList;
//! use courier_client::Client;
//! use courier_core::{CallDescriptor, Request, RetryPolicy};
//! use courier_metrics::MetricsRegistry;
//! use http::Method;
//!
//! # #[tokio::main]
//! # async fn main() -> courier_core::Result<()> {
//! let servers = Arc::new(ServerList::new(vec![
//!     "10.0.0.1:8080".to_string(),
//!     "10.0.0.2:8080".to_string(),
//! ]));
//! let registry = Arc::new(MetricsRegistry::new());
//!
//! let client = Client::builder()
//!     .servers(servers)
//!     .metrics(registry.clone())
//!     .retry(RetryPolicy::default())
//!     .build();
//!
//! let request = Request::builder(Method::GET, "/users")
//!     .descriptor(CallDescriptor::new("UserApi#list", "users"))
//!     .build();
//! let response = client.execute(&request).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use courier_balance::{LoadBalancedTransport, ServerList};
use courier_core::error::Result;
use courier_core::request::{Options, Request, Response};
use courier_core::retry::{RetryPolicy, RetryingTransport};
use courier_core::transport::{HttpTransport, Transport};
use courier_metrics::{MeteredTransport, MetricsSink};

/// Configures and composes a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    servers: Option<Arc<ServerList>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    retry: Option<RetryPolicy>,
    options: Options,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            servers: None,
            metrics: None,
            retry: None,
            options: Options::default(),
        }
    }

    /// Adds the load-balancing layer over `servers`.
    pub fn servers(mut self, servers: Arc<ServerList>) -> Self {
        self.servers = Some(servers);
        self
    }

    /// Adds the metrics layer reporting into `sink`.
    pub fn metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Adds the retry layer governed by `policy`.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Default per-call options.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Builds the client over the default hyper-backed transport.
    pub fn build(self) -> Client {
        self.build_with_transport(Arc::new(HttpTransport::new()))
    }

    /// Builds the client over a caller-supplied base transport.
    pub fn build_with_transport(self, base: Arc<dyn Transport>) -> Client {
        let mut transport = base;
        if let Some(sink) = self.metrics {
            transport = Arc::new(MeteredTransport::new(transport, sink));
        }
        if let Some(servers) = self.servers {
            transport = Arc::new(LoadBalancedTransport::new(transport, servers));
        }
        if let Some(policy) = self.retry {
            transport = Arc::new(RetryingTransport::new(transport, policy));
        }
        Client {
            transport,
            options: self.options,
        }
    }
}

/// A composed courier client. Cheap to clone; safe to share across tasks.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    options: Options,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Executes `request` through the decorator chain with the client's
    /// default options.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        self.transport.execute(request, &self.options).await
    }

    /// Executes `request` with per-call options.
    pub async fn execute_with_options(
        &self,
        request: &Request,
        options: &Options,
    ) -> Result<Response> {
        self.transport.execute(request, options).await
    }
}
