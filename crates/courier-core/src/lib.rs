//! Courier Core
//!
//! Core building blocks of the courier declarative HTTP invocation layer:
//! immutable request/response values, the object-to-query-map encoder, the
//! [`Transport`] capability, and retry decoration.
//!
//! # Overview
//!
//! Courier turns a described remote call (method, path, parameters, headers,
//! body) into an executed HTTP request. A call travels through a chain of
//! decorators that all implement the same [`Transport`] contract:
//!
//! ```text
//! RetryingTransport -> LoadBalancedTransport -> MeteredTransport -> base
//! ```
//!
//! Each layer performs its concern and delegates inward, then observes the
//! result on the way out. Load balancing and metrics live in the
//! `courier-balance` and `courier-metrics` crates; `courier-client` composes
//! the chain.
//!
//! # Example
//!
//! ```no_run
//! use courier_core::{CallDescriptor, HttpTransport, Options, Request, Transport};
//! use http::Method;
//!
//! # #[tokio::main]
//! # async fn main() -> courier_core::Result<()> {
//! let request = Request::builder(Method::GET, "/repos/search")
//!     .descriptor(CallDescriptor::new("RepoApi#search", "github"))
//!     .authority("127.0.0.1:8080")
//!     .query("q", "courier")
//!     .build();
//!
//! let transport = HttpTransport::new();
//! let response = transport.execute(&request, &Options::default()).await?;
//! println!("status: {}", response.status());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod query;
pub mod request;
pub mod retry;
pub mod transport;

pub use error::{Error, Result};
pub use query::{QueryMapEncoder, TypeMetadata};
pub use request::{CallDescriptor, Options, Request, RequestBuilder, Response};
pub use retry::{RetryPolicy, RetryingTransport};
pub use transport::{HttpTransport, Transport};
