use dashmap::DashMap;
use std::sync::Arc;
use switchboard_core::{ConnectionId, ParticipantId, RelaySignal, Role};
use tokio::sync::mpsc;

/// Sending half of a connection's outbound queue. The WebSocket writer task
/// owns the receiving half; dropping every sender closes the socket.
pub type ConnectionHandle = mpsc::UnboundedSender<RelaySignal>;

#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub role: Role,
    pub connection_id: ConnectionId,
    pub handle: ConnectionHandle,
}

/// Result of pushing a signal at an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Nobody is registered under that identity.
    Offline,
    /// Registered, but the transport behind the handle is gone.
    Closed(ConnectionId),
}

/// Who is reachable right now.
///
/// Cloning is cheap and every clone sees the same map. Only the relay loop
/// writes; everything outside the crate gets a [`RegistryView`].
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    peers: Arc<DashMap<ParticipantId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn view(&self) -> RegistryView {
        RegistryView {
            inner: self.clone(),
        }
    }

    /// Inserts or replaces the entry for `identity`, returning the one it
    /// superseded.
    pub(crate) fn register(
        &self,
        identity: ParticipantId,
        role: Role,
        connection_id: ConnectionId,
        handle: ConnectionHandle,
    ) -> Option<ConnectionEntry> {
        self.peers.insert(
            identity,
            ConnectionEntry {
                role,
                connection_id,
                handle,
            },
        )
    }

    pub fn lookup(&self, identity: &ParticipantId) -> Option<ConnectionEntry> {
        self.peers.get(identity).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, identity: &ParticipantId) -> bool {
        self.peers.contains_key(identity)
    }

    pub fn role_of(&self, identity: &ParticipantId) -> Option<Role> {
        self.peers.get(identity).map(|entry| entry.role)
    }

    /// True if `connection_id` is the connection currently bound to `identity`.
    pub fn is_current(&self, identity: &ParticipantId, connection_id: ConnectionId) -> bool {
        self.peers
            .get(identity)
            .is_some_and(|entry| entry.connection_id == connection_id)
    }

    /// Removes the entry only while it still belongs to `connection_id`.
    /// Releasing an identity twice is a no-op.
    pub(crate) fn unregister_connection(
        &self,
        identity: &ParticipantId,
        connection_id: ConnectionId,
    ) -> bool {
        self.peers
            .remove_if(identity, |_, entry| entry.connection_id == connection_id)
            .is_some()
    }

    pub(crate) fn send(&self, identity: &ParticipantId, signal: RelaySignal) -> Delivery {
        let Some(entry) = self.peers.get(identity) else {
            return Delivery::Offline;
        };
        match entry.handle.send(signal) {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Closed(entry.connection_id),
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// Read side of the registry, safe to hand to code outside the relay loop.
#[derive(Debug, Clone)]
pub struct RegistryView {
    inner: ConnectionRegistry,
}

impl RegistryView {
    pub fn contains(&self, identity: &ParticipantId) -> bool {
        self.inner.contains(identity)
    }

    pub fn role_of(&self, identity: &ParticipantId) -> Option<Role> {
        self.inner.role_of(identity)
    }

    pub fn is_current(&self, identity: &ParticipantId, connection_id: ConnectionId) -> bool {
        self.inner.is_current(identity, connection_id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
