use dashmap::DashMap;
use shoal::models::node::ReplicaNode;
use std::sync::atomic::{AtomicU64, Ordering};

pub type ConnectionId = u64;

/// Registry of live inbound replication connections, keyed by a numeric id.
/// Tasks hold only the id, never the connection itself, so a queued task does
/// not keep a socket alive past its logical closure; the connection is looked
/// up again at execution time and may legitimately be gone by then.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ReplicaNode>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn register(&self, peer: ReplicaNode) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.insert(id, peer);
        id
    }

    pub fn unregister(&self, id: ConnectionId) -> Option<ReplicaNode> {
        self.connections.remove(&id).map(|(_, peer)| peer)
    }

    pub fn get(&self, id: ConnectionId) -> Option<ReplicaNode> {
        self.connections.get(&id).map(|peer| peer.clone())
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_register_and_resolve_connections() {
        let registry = ConnectionRegistry::default();
        let id = registry.register(ReplicaNode::new("10.0.0.4", 9221));

        assert_eq!(registry.get(id).unwrap().ip, "10.0.0.4");
        assert_eq!(registry.len(), 1);

        let removed = registry.unregister(id);
        assert!(removed.is_some());
        assert!(registry.get(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn should_hand_out_unique_ids() {
        let registry = ConnectionRegistry::default();
        let first = registry.register(ReplicaNode::new("10.0.0.4", 9221));
        let second = registry.register(ReplicaNode::new("10.0.0.5", 9221));
        assert_ne!(first, second);
    }
}
