use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Picks an endpoint from a server-list snapshot.
///
/// Policies may keep their own state (the round-robin cursor, health scores)
/// and may consume outcome feedback; the default policy is stateless apart
/// from its cursor and ignores outcomes.
pub trait SelectPolicy: Send + Sync {
    /// Index into `servers` for the next call, or `None` when the snapshot
    /// offers nothing to select.
    fn select(&self, servers: &[String]) -> Option<usize>;

    /// Outcome feedback from a completed call to `server`.
    fn record_outcome(&self, _server: &str, _success: bool) {}
}

/// Round-robin selection: an atomic cursor advanced on every call, taken
/// modulo the snapshot length.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectPolicy for RoundRobin {
    fn select(&self, servers: &[String]) -> Option<usize> {
        if servers.is_empty() {
            return None;
        }
        Some(self.cursor.fetch_add(1, Ordering::Relaxed) % servers.len())
    }
}

/// Ordered candidate endpoints for a logical client.
///
/// The list is shared across concurrent calls and externally updatable:
/// a configuration refresh calls [`ServerList::update`] and the next
/// selection observes the new membership without any restart. Reads take a
/// consistent snapshot under the read lock.
pub struct ServerList {
    servers: RwLock<Vec<String>>,
    policy: Arc<dyn SelectPolicy>,
}

impl ServerList {
    /// Creates a list with the default round-robin policy.
    pub fn new(servers: Vec<String>) -> Self {
        Self::with_policy(servers, Arc::new(RoundRobin::new()))
    }

    pub fn with_policy(servers: Vec<String>, policy: Arc<dyn SelectPolicy>) -> Self {
        Self {
            servers: RwLock::new(servers),
            policy,
        }
    }

    /// Selects the endpoint for the next call, or `None` when the list is
    /// empty.
    pub fn next_server(&self) -> Option<String> {
        let servers = self.servers.read().unwrap();
        self.policy
            .select(&servers)
            .and_then(|index| servers.get(index).cloned())
    }

    /// Feeds a call outcome back into the selection policy.
    pub fn record_outcome(&self, server: &str, success: bool) {
        self.policy.record_outcome(server, success);
    }

    /// Replaces the whole membership; subsequent calls observe the new list.
    pub fn update(&self, servers: Vec<String>) {
        *self.servers.write().unwrap() = servers;
    }

    /// Adds an endpoint. Duplicates are ignored.
    pub fn add(&self, server: String) {
        let mut servers = self.servers.write().unwrap();
        if !servers.contains(&server) {
            servers.push(server);
        }
    }

    /// Removes an endpoint.
    pub fn remove(&self, server: &str) {
        self.servers.write().unwrap().retain(|s| s != server);
    }

    pub fn len(&self) -> usize {
        self.servers.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.read().unwrap().is_empty()
    }

    /// Snapshot of the current membership.
    pub fn servers(&self) -> Vec<String> {
        self.servers.read().unwrap().clone()
    }
}
