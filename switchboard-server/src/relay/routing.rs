use crate::error::RouteError;
use crate::relay::Relay;
use crate::session::CallState;
use switchboard_core::{
    CallDecision, ClientSignal, IceCandidate, ParticipantId, RelaySignal, Role, SessionDescription,
};
use tracing::{debug, info, warn};

const NO_SERVERS_MESSAGE: &str = "No servers are currently available to handle your request.";

/// Resolved recipient of an offer, answer or candidate.
struct Route {
    target: ParticipantId,
    /// Pool worker the call holds, when the target is one.
    worker: Option<ParticipantId>,
}

impl Route {
    fn direct(target: ParticipantId) -> Self {
        Self {
            target,
            worker: None,
        }
    }

    fn worker(worker: ParticipantId) -> Self {
        Self {
            target: worker.clone(),
            worker: Some(worker),
        }
    }
}

impl Relay {
    pub(crate) fn handle_signal(&mut self, sender: &ParticipantId, role: Role, signal: ClientSignal) {
        debug!("{} from {}", signal.kind(), sender);

        match signal {
            ClientSignal::OfferOrAnswer { target, payload } => {
                self.route_description(sender, role, target, payload)
            }
            ClientSignal::Candidate { target, candidate } => {
                self.route_candidate(sender, role, target, candidate)
            }
            ClientSignal::EndCall(targets) => {
                let named = targets.map(|targets| targets.named()).unwrap_or_default();
                self.end_call(sender, named)
            }
            ClientSignal::CheckOffer => self.check_pending_offer(sender),
            ClientSignal::Calling { target } => self.ring(sender, target),
            ClientSignal::CheckCalling => self.check_calling(sender),
            ClientSignal::AnswerToCall { target, decision } => {
                self.answer_ring(sender, target, decision)
            }
            ClientSignal::RequestServer => self.request_server(sender, role),
        }
    }

    /// Works out who a routed message is for without touching the pool.
    fn resolve(
        &self,
        sender: &ParticipantId,
        role: Role,
        target: Option<ParticipantId>,
    ) -> Result<Route, RouteError> {
        let mode = self.config.mode;

        match target {
            Some(target) if &target == sender => Err(RouteError::SelfTarget),
            Some(target) => {
                if self.calls.assigned_worker(sender) == Some(&target) {
                    return Ok(Route::worker(target));
                }
                if role == Role::Peer && !mode.allows_direct() {
                    return Err(RouteError::DirectAddressingDisabled(target));
                }
                Ok(Route::direct(target))
            }
            None if !mode.allows_brokered() => Err(RouteError::MissingTarget),
            None if role.is_worker() => Err(RouteError::WorkerMustTarget),
            None => self
                .calls
                .assigned_worker(sender)
                .cloned()
                .map(Route::worker)
                .ok_or(RouteError::NoAssignedWorker),
        }
    }

    fn route_description(
        &mut self,
        sender: &ParticipantId,
        role: Role,
        target: Option<ParticipantId>,
        payload: SessionDescription,
    ) {
        let is_offer = payload.is_offer();
        let kind = payload.kind.as_str();

        let mut route = match self.resolve(sender, role, target) {
            Ok(route) => route,
            Err(RouteError::NoAssignedWorker) if is_offer => match self.take_worker() {
                Some(worker) => {
                    info!(
                        "Assigned worker {} to {}. Idle workers: {}",
                        worker,
                        sender,
                        self.pool.len()
                    );
                    Route::worker(worker)
                }
                None => {
                    self.notify_no_servers(sender);
                    return;
                }
            },
            Err(err) => {
                warn!("Dropping {} from {}: {}", kind, sender, err);
                return;
            }
        };

        if !self.registry.contains(&route.target) {
            warn!(
                "Routing miss: {} from {} to offline {}",
                kind, sender, route.target
            );
            return;
        }

        // A fresh offer naming a worker directly takes that worker out of the pool.
        if is_offer
            && route.worker.is_none()
            && self.registry.role_of(&route.target) == Some(Role::ServerWorker)
            && self.calls.get(sender, &route.target).is_none()
        {
            if !self.pool.remove(&route.target) {
                warn!("Worker {} is busy; refusing offer from {}", route.target, sender);
                self.notify_no_servers(sender);
                return;
            }
            route.worker = Some(route.target.clone());
        }

        if is_offer {
            match self
                .calls
                .record_offer(sender, &route.target, &payload, route.worker.as_ref())
            {
                None => info!("Offer pending: {} -> {}", sender, route.target),
                Some(CallState::Active) => {
                    debug!("Renegotiation between {} and {}", sender, route.target)
                }
                Some(_) => debug!("Re-offer from {} to {}", sender, route.target),
            }
        } else if payload.is_answer() && self.calls.record_answer(sender, &route.target) {
            info!("Call {} <-> {} is active", route.target, sender);
        }

        debug!("Forwarding {} from {} to {}", kind, sender, route.target);
        self.deliver(
            &route.target,
            RelaySignal::OfferOrAnswer {
                from: sender.clone(),
                payload,
            },
        );
    }

    fn route_candidate(
        &mut self,
        sender: &ParticipantId,
        role: Role,
        target: Option<ParticipantId>,
        candidate: IceCandidate,
    ) {
        let route = match self.resolve(sender, role, target) {
            Ok(route) => route,
            Err(err) => {
                warn!("Dropping candidate from {}: {}", sender, err);
                return;
            }
        };

        let delivered = self.deliver(
            &route.target,
            RelaySignal::Candidate {
                from: sender.clone(),
                candidate,
            },
        );
        if delivered {
            debug!("Forwarded candidate from {} to {}", sender, route.target);
        } else {
            warn!(
                "Routing miss: candidate from {} to offline {}",
                sender, route.target
            );
        }
    }

    fn end_call(&mut self, sender: &ParticipantId, named: Vec<ParticipantId>) {
        if named.is_empty() {
            if self.teardown(sender, "call ended") == 0 {
                debug!("endCall from {} with no call in progress", sender);
            }
            return;
        }

        for target in &named {
            if !self.end_between(sender, target, "call ended") {
                debug!("endCall from {}: no call with {}", sender, target);
            }
        }
    }

    fn check_pending_offer(&mut self, sender: &ParticipantId) {
        let reply = match self.calls.pending_offer_for(sender) {
            Some((from, payload)) => {
                info!("Sending pending offer from {} to {}", from, sender);
                RelaySignal::PendingOffer { from, payload }
            }
            None => {
                debug!("No pending offer for {}", sender);
                RelaySignal::NoOffer
            }
        };
        self.deliver(sender, reply);
    }

    fn ring(&mut self, sender: &ParticipantId, target: ParticipantId) {
        if &target == sender {
            warn!("Dropping calling from {}: {}", sender, RouteError::SelfTarget);
            return;
        }

        let delivered = self.deliver(
            &target,
            RelaySignal::IncomingCall {
                caller: sender.clone(),
            },
        );
        if !delivered {
            warn!("Routing miss: {} is calling offline {}", sender, target);
            return;
        }

        info!("{} is calling {}", sender, target);
        self.rings.insert(target, sender.clone());
    }

    fn check_calling(&mut self, sender: &ParticipantId) {
        let status = match self.rings.get(sender) {
            Some(caller) => RelaySignal::CallingStatus {
                is_being_called: true,
                from: Some(caller.clone()),
            },
            None => RelaySignal::CallingStatus {
                is_being_called: false,
                from: None,
            },
        };
        self.deliver(sender, status);
    }

    fn answer_ring(&mut self, sender: &ParticipantId, target: ParticipantId, decision: CallDecision) {
        if self.rings.get(sender) == Some(&target) {
            self.rings.remove(sender);
        }

        let delivered = self.deliver(
            &target,
            RelaySignal::CallResponse {
                decision,
                from: sender.clone(),
            },
        );
        if !delivered {
            warn!("Routing miss: call response from {} to offline {}", sender, target);
        } else {
            info!("{} responded {:?} to {}", sender, decision, target);
        }

        if decision == CallDecision::Reject {
            if let Some(call) = self.calls.terminate(sender, &target) {
                info!("Call {} <-> {} rejected", call.caller, call.callee);
                if let Some(worker) = call.worker {
                    self.requeue_worker(worker);
                }
            }
        }
    }

    fn request_server(&mut self, sender: &ParticipantId, role: Role) {
        if role.is_worker() {
            warn!("Dropping requestServer from worker {}", sender);
            return;
        }
        if !self.config.mode.allows_brokered() {
            warn!("Dropping requestServer from {}: brokered routing is disabled", sender);
            return;
        }

        let server = match self.calls.assigned_worker(sender) {
            Some(worker) => worker.clone(),
            None => match self.take_worker() {
                Some(worker) => {
                    self.calls.reserve_worker(sender, &worker);
                    info!(
                        "Reserved worker {} for {}. Idle workers: {}",
                        worker,
                        sender,
                        self.pool.len()
                    );
                    worker
                }
                None => {
                    self.notify_no_servers(sender);
                    return;
                }
            },
        };

        self.deliver(sender, RelaySignal::ServerAssigned { server });
    }

    /// Pops the next idle worker that is still connected as a worker. Entries
    /// for identities that vanished or came back as peers are dropped as
    /// routing misses.
    fn take_worker(&mut self) -> Option<ParticipantId> {
        while let Some(worker) = self.pool.pop_next_available() {
            match self.registry.role_of(&worker) {
                Some(Role::ServerWorker) => return Some(worker),
                Some(role) => warn!(
                    "Routing miss: queued worker {} is now connected as {}",
                    worker, role
                ),
                None => warn!("Routing miss: queued worker {} is no longer connected", worker),
            }
        }
        None
    }

    fn notify_no_servers(&mut self, sender: &ParticipantId) {
        warn!("No available servers to handle the call from {}", sender);
        self.deliver(
            sender,
            RelaySignal::NoServersAvailable {
                message: NO_SERVERS_MESSAGE.to_owned(),
            },
        );
    }
}
