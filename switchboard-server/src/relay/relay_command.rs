use crate::config::RoutingMode;
use crate::registry::ConnectionHandle;
use serde::Serialize;
use switchboard_core::{ClientSignal, ConnectionId, ParticipantId, Role};
use tokio::sync::oneshot;

/// Commands fed to the relay loop by connection tasks.
#[derive(Debug)]
pub enum RelayCommand {
    /// A transport came up with its handshake identity and role.
    Connect {
        identity: ParticipantId,
        role: Role,
        connection_id: ConnectionId,
        handle: ConnectionHandle,
    },

    /// A well-formed message read off a connection.
    Signal {
        identity: ParticipantId,
        connection_id: ConnectionId,
        signal: ClientSignal,
    },

    /// The transport closed, cleanly or not.
    Disconnect {
        identity: ParticipantId,
        connection_id: ConnectionId,
    },

    Stats {
        reply: oneshot::Sender<RelayStats>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStats {
    pub mode: RoutingMode,
    pub connections: usize,
    pub idle_workers: usize,
    pub sessions: usize,
    pub pending_offers: usize,
    pub active_calls: usize,
}
