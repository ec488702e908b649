use std::collections::VecDeque;
use switchboard_core::ParticipantId;

/// FIFO of idle workers. A worker is in here at most once, and not at all
/// while it is serving a call.
#[derive(Debug, Default)]
pub struct ServerPool {
    idle: VecDeque<ParticipantId>,
}

impl ServerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `worker` unless it is already queued. Returns whether it was added.
    pub fn push(&mut self, worker: ParticipantId) -> bool {
        if self.idle.contains(&worker) {
            return false;
        }
        self.idle.push_back(worker);
        true
    }

    pub fn pop_next_available(&mut self) -> Option<ParticipantId> {
        self.idle.pop_front()
    }

    pub fn remove(&mut self, worker: &ParticipantId) -> bool {
        let before = self.idle.len();
        self.idle.retain(|id| id != worker);
        self.idle.len() != before
    }

    pub fn len(&self) -> usize {
        self.idle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idle.is_empty()
    }
}
