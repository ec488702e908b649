use switchboard_core::ParticipantId;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay loop is not running")]
    Unavailable,
    #[error("relay loop dropped the reply")]
    NoReply(#[from] oneshot::error::RecvError),
}

/// Why a routed message could not be addressed. These are logged and the
/// message dropped; none of them reach the sender.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("message has no target and brokered routing is disabled")]
    MissingTarget,
    #[error("message is addressed to its own sender")]
    SelfTarget,
    #[error("workers must name the peer they are answering")]
    WorkerMustTarget,
    #[error("peers may only address their assigned worker, not {0}")]
    DirectAddressingDisabled(ParticipantId),
    #[error("sender has no assigned worker")]
    NoAssignedWorker,
}
