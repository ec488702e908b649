use crate::config::RelayConfig;
use crate::pool::ServerPool;
use crate::registry::{ConnectionHandle, ConnectionRegistry, Delivery};
use crate::relay::{RelayCommand, RelayHandle, RelayStats};
use crate::session::{CallSession, CallState, CallTable};
use std::collections::HashMap;
use switchboard_core::{ConnectionId, ParticipantId, RelaySignal, Role};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// The relay loop. Sole writer of the registry, the worker pool and the call
/// table; connection tasks talk to it through [`RelayHandle`].
pub struct Relay {
    pub(crate) config: RelayConfig,
    pub(crate) registry: ConnectionRegistry,
    pub(crate) pool: ServerPool,
    pub(crate) calls: CallTable,
    /// callee -> caller, for calls announced with `calling` and not yet answered.
    pub(crate) rings: HashMap<ParticipantId, ParticipantId>,
    closed: Vec<(ParticipantId, ConnectionId)>,
    command_rx: mpsc::Receiver<RelayCommand>,
}

impl Relay {
    pub fn new(config: RelayConfig) -> (Self, RelayHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let registry = ConnectionRegistry::new();

        let relay = Self {
            config,
            registry: registry.clone(),
            pool: ServerPool::new(),
            calls: CallTable::new(),
            rings: HashMap::new(),
            closed: Vec::new(),
            command_rx,
        };

        (relay, RelayHandle::new(command_tx, registry))
    }

    pub async fn run(mut self) {
        info!("Relay event loop started ({} routing)", self.config.mode);

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd);
            self.reap_closed();
        }

        info!("Command channel closed. Relay event loop finished");
    }

    fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Connect {
                identity,
                role,
                connection_id,
                handle,
            } => self.connect(identity, role, connection_id, handle),

            RelayCommand::Signal {
                identity,
                connection_id,
                signal,
            } => {
                let role = match self.registry.lookup(&identity) {
                    Some(entry) if entry.connection_id == connection_id => entry.role,
                    _ => {
                        debug!(
                            "Ignoring {} from released connection {} of {}",
                            signal.kind(),
                            connection_id,
                            identity
                        );
                        return;
                    }
                };
                self.handle_signal(&identity, role, signal);
            }

            RelayCommand::Disconnect {
                identity,
                connection_id,
            } => self.disconnect(&identity, connection_id),

            RelayCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    fn connect(
        &mut self,
        identity: ParticipantId,
        role: Role,
        connection_id: ConnectionId,
        handle: ConnectionHandle,
    ) {
        match self
            .registry
            .register(identity.clone(), role, connection_id, handle)
        {
            Some(previous) => {
                info!(
                    "{} reconnected as {}; superseding connection {}",
                    identity, role, previous.connection_id
                );
                if previous.role.is_worker() && !role.is_worker() {
                    self.pool.remove(&identity);
                }
            }
            None => info!("{} connected as {}", identity, role),
        }

        self.deliver(
            &identity,
            RelaySignal::ConnectionSuccess {
                identity: identity.clone(),
            },
        );
        if !self.config.ice_servers.is_empty() {
            let ice_servers = self.config.ice_servers.clone();
            self.deliver(&identity, RelaySignal::IceConfig { ice_servers });
        }

        if role.is_worker()
            && !self.calls.is_busy_worker(&identity)
            && self.pool.push(identity.clone())
        {
            info!(
                "Worker {} queued. Idle workers: {}",
                identity,
                self.pool.len()
            );
        }
    }

    fn disconnect(&mut self, identity: &ParticipantId, connection_id: ConnectionId) {
        if !self.registry.unregister_connection(identity, connection_id) {
            debug!(
                "Connection {} of {} already released",
                connection_id, identity
            );
            return;
        }
        info!("{} disconnected", identity);

        if self.pool.remove(identity) {
            info!(
                "Worker {} left the pool. Idle workers: {}",
                identity,
                self.pool.len()
            );
        }

        self.teardown(identity, "peer disconnected");
    }

    /// Ends every call and ring `identity` takes part in. Shared by
    /// untargeted `endCall` and disconnects.
    pub(crate) fn teardown(&mut self, identity: &ParticipantId, reason: &str) -> usize {
        if self.calls.is_empty() && self.rings.is_empty() {
            return 0;
        }

        let mut counterparts = self.calls.counterparts(identity);
        for (callee, caller) in &self.rings {
            let other = if callee == identity {
                caller
            } else if caller == identity {
                callee
            } else {
                continue;
            };
            if !counterparts.contains(other) {
                counterparts.push(other.clone());
            }
        }

        let mut ended = 0;
        for other in &counterparts {
            if self.end_between(identity, other, reason) {
                ended += 1;
            }
        }
        ended
    }

    /// Ends the call or ring between `ended_by` and `other`. Returns false when
    /// there was nothing to end, which is what keeps teardown idempotent.
    pub(crate) fn end_between(
        &mut self,
        ended_by: &ParticipantId,
        other: &ParticipantId,
        reason: &str,
    ) -> bool {
        let rang = self.clear_ring(ended_by, other);

        match self.calls.terminate(ended_by, other) {
            Some(call) => {
                self.finish_call(call, ended_by, reason);
                true
            }
            None if rang => {
                info!("Ring between {} and {} cancelled ({})", ended_by, other, reason);
                self.deliver(
                    other,
                    RelaySignal::EndCall {
                        from: ended_by.clone(),
                        reason: Some(reason.to_owned()),
                    },
                );
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear_ring(&mut self, a: &ParticipantId, b: &ParticipantId) -> bool {
        let mut cleared = false;
        if self.rings.get(a) == Some(b) {
            self.rings.remove(a);
            cleared = true;
        }
        if self.rings.get(b) == Some(a) {
            self.rings.remove(b);
            cleared = true;
        }
        cleared
    }

    fn finish_call(&mut self, call: CallSession, ended_by: &ParticipantId, reason: &str) {
        let counterpart = call.counterpart(ended_by).clone();
        info!(
            "Call {} <-> {} terminated by {} ({})",
            call.caller, call.callee, ended_by, reason
        );

        let notified = self.deliver(
            &counterpart,
            RelaySignal::EndCall {
                from: ended_by.clone(),
                reason: Some(reason.to_owned()),
            },
        );
        if !notified {
            debug!("{} is gone; end-call not delivered", counterpart);
        }

        if let Some(worker) = call.worker {
            self.requeue_worker(worker);
        }
    }

    pub(crate) fn requeue_worker(&mut self, worker: ParticipantId) {
        match self.registry.role_of(&worker) {
            Some(Role::ServerWorker) => {}
            Some(role) => {
                info!("{} is now connected as {}; not requeued", worker, role);
                return;
            }
            None => {
                debug!("Worker {} is offline; not requeued", worker);
                return;
            }
        }
        if self.calls.is_busy_worker(&worker) {
            return;
        }
        if self.pool.push(worker.clone()) {
            info!(
                "Worker {} returned to the pool. Idle workers: {}",
                worker,
                self.pool.len()
            );
        }
    }

    /// Pushes `signal` at `to`. A dead transport is queued for disconnect
    /// cleanup once the current command is done.
    pub(crate) fn deliver(&mut self, to: &ParticipantId, signal: RelaySignal) -> bool {
        match self.registry.send(to, signal) {
            Delivery::Delivered => true,
            Delivery::Offline => false,
            Delivery::Closed(connection_id) => {
                error!("Transport to {} failed; treating it as a disconnect", to);
                self.closed.push((to.clone(), connection_id));
                false
            }
        }
    }

    fn reap_closed(&mut self) {
        while let Some((identity, connection_id)) = self.closed.pop() {
            self.disconnect(&identity, connection_id);
        }
    }

    fn stats(&self) -> RelayStats {
        RelayStats {
            mode: self.config.mode,
            connections: self.registry.len(),
            idle_workers: self.pool.len(),
            sessions: self.calls.len(),
            pending_offers: self.calls.count_in(CallState::OfferPending),
            active_calls: self.calls.count_in(CallState::Active),
        }
    }
}
