use std::collections::HashMap;
use switchboard_core::{ParticipantId, SessionDescription};

/// Where a call stands, as far as routing is concerned. A terminated call is
/// simply removed from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// A worker is reserved for the caller but no offer went out yet.
    Idle,
    OfferPending,
    Active,
}

/// Unordered pair of identities; `(a, b)` and `(b, a)` are the same call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallKey(ParticipantId, ParticipantId);

impl CallKey {
    pub fn new(a: &ParticipantId, b: &ParticipantId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallSession {
    /// Sender of the most recent offer.
    pub caller: ParticipantId,
    pub callee: ParticipantId,
    /// Set when one side is a pool worker that must be requeued on teardown.
    pub worker: Option<ParticipantId>,
    pub state: CallState,
    pending_offer: Option<SessionDescription>,
    opened: u64,
}

impl CallSession {
    pub fn involves(&self, id: &ParticipantId) -> bool {
        &self.caller == id || &self.callee == id
    }

    /// The other side of the call from `id`'s point of view.
    pub fn counterpart(&self, id: &ParticipantId) -> &ParticipantId {
        if &self.caller == id {
            &self.callee
        } else {
            &self.caller
        }
    }
}

#[derive(Debug, Default)]
pub struct CallTable {
    calls: HashMap<CallKey, CallSession>,
    next_seq: u64,
}

impl CallTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub fn get(&self, a: &ParticipantId, b: &ParticipantId) -> Option<&CallSession> {
        self.calls.get(&CallKey::new(a, b))
    }

    /// Opens an `Idle` brokered call: `worker` is held for `peer` until the
    /// call ends.
    pub fn reserve_worker(&mut self, peer: &ParticipantId, worker: &ParticipantId) {
        let opened = self.next_seq();
        self.calls.insert(
            CallKey::new(peer, worker),
            CallSession {
                caller: peer.clone(),
                callee: worker.clone(),
                worker: Some(worker.clone()),
                state: CallState::Idle,
                pending_offer: None,
                opened,
            },
        );
    }

    /// Worker serving `peer`. A peer holding several brokered calls gets the
    /// one opened first.
    pub fn assigned_worker(&self, peer: &ParticipantId) -> Option<&ParticipantId> {
        self.calls
            .values()
            .filter(|call| call.involves(peer))
            .filter_map(|call| {
                call.worker
                    .as_ref()
                    .filter(|worker| *worker != peer)
                    .map(|worker| (call.opened, worker))
            })
            .min_by_key(|(opened, _)| *opened)
            .map(|(_, worker)| worker)
    }

    pub fn is_busy_worker(&self, worker: &ParticipantId) -> bool {
        self.calls
            .values()
            .any(|call| call.worker.as_ref() == Some(worker))
    }

    /// Records an offer from `from` to `to`. An offer inside an `Active` call
    /// is a renegotiation and leaves the state alone. Returns the state the
    /// call was in before, `None` for a fresh call.
    pub fn record_offer(
        &mut self,
        from: &ParticipantId,
        to: &ParticipantId,
        offer: &SessionDescription,
        worker: Option<&ParticipantId>,
    ) -> Option<CallState> {
        let key = CallKey::new(from, to);

        if let Some(call) = self.calls.get_mut(&key) {
            let previous = call.state;
            if previous != CallState::Active {
                call.caller = from.clone();
                call.callee = to.clone();
                call.state = CallState::OfferPending;
                call.pending_offer = Some(offer.clone());
            }
            if call.worker.is_none() {
                call.worker = worker.cloned();
            }
            return Some(previous);
        }

        let opened = self.next_seq();
        self.calls.insert(
            key,
            CallSession {
                caller: from.clone(),
                callee: to.clone(),
                worker: worker.cloned(),
                state: CallState::OfferPending,
                pending_offer: Some(offer.clone()),
                opened,
            },
        );
        None
    }

    /// Moves the call to `Active` when `from` answers an offer it received.
    /// Returns true on that transition.
    pub fn record_answer(&mut self, from: &ParticipantId, to: &ParticipantId) -> bool {
        let Some(call) = self.calls.get_mut(&CallKey::new(from, to)) else {
            return false;
        };
        if call.state != CallState::OfferPending || &call.callee != from {
            return false;
        }
        call.state = CallState::Active;
        call.pending_offer = None;
        true
    }

    /// Oldest unanswered offer addressed to `callee`.
    pub fn pending_offer_for(
        &self,
        callee: &ParticipantId,
    ) -> Option<(ParticipantId, SessionDescription)> {
        self.calls
            .values()
            .filter(|call| call.state == CallState::OfferPending && &call.callee == callee)
            .min_by_key(|call| call.opened)
            .and_then(|call| {
                call.pending_offer
                    .clone()
                    .map(|offer| (call.caller.clone(), offer))
            })
    }

    /// Everyone `id` currently has a call with, oldest call first.
    pub fn counterparts(&self, id: &ParticipantId) -> Vec<ParticipantId> {
        let mut involved: Vec<&CallSession> =
            self.calls.values().filter(|call| call.involves(id)).collect();
        involved.sort_by_key(|call| call.opened);
        involved
            .into_iter()
            .map(|call| call.counterpart(id).clone())
            .collect()
    }

    pub fn terminate(&mut self, a: &ParticipantId, b: &ParticipantId) -> Option<CallSession> {
        self.calls.remove(&CallKey::new(a, b))
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn count_in(&self, state: CallState) -> usize {
        self.calls.values().filter(|call| call.state == state).count()
    }
}
