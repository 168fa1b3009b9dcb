use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use courier_core::error::{Error, Result};
use courier_core::request::{Options, Request, Response};
use courier_core::transport::Transport;

use crate::server_list::ServerList;

/// Decorates a [`Transport`] with endpoint selection.
///
/// Each call selects one endpoint from the shared [`ServerList`] and rewrites
/// the request's authority before delegating; everything else in the request
/// is identical to the input. An empty list fails with
/// [`Error::NoAvailableTarget`] before any delegation. Call outcomes are fed
/// back to the selection policy; the default round-robin policy ignores them.
pub struct LoadBalancedTransport {
    inner: Arc<dyn Transport>,
    servers: Arc<ServerList>,
}

impl LoadBalancedTransport {
    pub fn new(inner: Arc<dyn Transport>, servers: Arc<ServerList>) -> Self {
        Self { inner, servers }
    }

    pub fn servers(&self) -> &Arc<ServerList> {
        &self.servers
    }
}

#[async_trait]
impl Transport for LoadBalancedTransport {
    async fn execute(&self, request: &Request, options: &Options) -> Result<Response> {
        let server = self
            .servers
            .next_server()
            .ok_or_else(|| Error::NoAvailableTarget(request.descriptor().target.clone()))?;

        debug!(
            target = %request.descriptor().target,
            server = %server,
            "selected endpoint"
        );

        let routed = request.with_authority(&server);
        let result = self.inner.execute(&routed, options).await;
        self.servers.record_outcome(&server, result.is_ok());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use std::sync::Mutex;

    /// Records the authority of every delegated request and always succeeds.
    struct RecordingTransport {
        authorities: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                authorities: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn execute(&self, request: &Request, _options: &Options) -> Result<Response> {
            self.authorities
                .lock()
                .unwrap()
                .push(request.authority().unwrap_or("<none>").to_string());
            Ok(Response::new(StatusCode::OK))
        }
    }

    fn request() -> Request {
        Request::builder(Method::GET, "/ping")
            .descriptor(courier_core::CallDescriptor::new("Ping#get", "ping-service"))
            .build()
    }

    #[tokio::test]
    async fn test_round_robin_across_endpoints() {
        let recording = Arc::new(RecordingTransport::new());
        let servers = Arc::new(ServerList::new(vec![
            "host-a:80".to_string(),
            "host-b:80".to_string(),
        ]));
        let balanced = LoadBalancedTransport::new(recording.clone(), servers);

        let request = request();
        let options = Options::default();
        for _ in 0..4 {
            balanced.execute(&request, &options).await.unwrap();
        }

        assert_eq!(
            *recording.authorities.lock().unwrap(),
            vec!["host-a:80", "host-b:80", "host-a:80", "host-b:80"]
        );
    }

    #[tokio::test]
    async fn test_empty_list_fails_before_delegation() {
        let recording = Arc::new(RecordingTransport::new());
        let servers = Arc::new(ServerList::new(vec![]));
        let balanced = LoadBalancedTransport::new(recording.clone(), servers);

        let result = balanced.execute(&request(), &Options::default()).await;
        match result {
            Err(Error::NoAvailableTarget(target)) => assert_eq!(target, "ping-service"),
            other => panic!("expected NoAvailableTarget, got {:?}", other.map(|r| r.status())),
        }
        assert!(recording.authorities.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_original_request_is_untouched() {
        let recording = Arc::new(RecordingTransport::new());
        let servers = Arc::new(ServerList::new(vec!["host-a:80".to_string()]));
        let balanced = LoadBalancedTransport::new(recording, servers);

        let request = request();
        balanced.execute(&request, &Options::default()).await.unwrap();
        // The input request still has no authority; routing cloned it.
        assert_eq!(request.authority(), None);
    }
}
