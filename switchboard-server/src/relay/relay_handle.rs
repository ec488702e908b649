use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::registry::{ConnectionHandle, ConnectionRegistry, RegistryView};
use crate::relay::{Relay, RelayCommand, RelayStats};
use switchboard_core::{ClientSignal, ConnectionId, ParticipantId, Role};
use tokio::sync::{mpsc, oneshot};
use tracing::info;

/// Cloneable front door to a running relay loop.
#[derive(Clone)]
pub struct RelayHandle {
    command_tx: mpsc::Sender<RelayCommand>,
    registry: ConnectionRegistry,
}

impl RelayHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<RelayCommand>, registry: ConnectionRegistry) -> Self {
        Self {
            command_tx,
            registry,
        }
    }

    /// Builds a relay and runs its loop on the current tokio runtime.
    pub fn spawn(config: RelayConfig) -> Self {
        info!("Spawning relay ({} routing)", config.mode);
        let (relay, handle) = Relay::new(config);
        tokio::spawn(relay.run());
        handle
    }

    async fn send(&self, cmd: RelayCommand) -> Result<(), RelayError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| RelayError::Unavailable)
    }

    pub async fn connect(
        &self,
        identity: ParticipantId,
        role: Role,
        connection_id: ConnectionId,
        handle: ConnectionHandle,
    ) -> Result<(), RelayError> {
        self.send(RelayCommand::Connect {
            identity,
            role,
            connection_id,
            handle,
        })
        .await
    }

    pub async fn signal(
        &self,
        identity: ParticipantId,
        connection_id: ConnectionId,
        signal: ClientSignal,
    ) -> Result<(), RelayError> {
        self.send(RelayCommand::Signal {
            identity,
            connection_id,
            signal,
        })
        .await
    }

    pub async fn disconnect(
        &self,
        identity: ParticipantId,
        connection_id: ConnectionId,
    ) -> Result<(), RelayError> {
        self.send(RelayCommand::Disconnect {
            identity,
            connection_id,
        })
        .await
    }

    pub async fn stats(&self) -> Result<RelayStats, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Stats { reply }).await?;
        Ok(rx.await?)
    }

    /// Read-only view of who is connected. Reflects every command the loop
    /// has finished processing.
    pub fn registry(&self) -> RegistryView {
        self.registry.view()
    }
}
