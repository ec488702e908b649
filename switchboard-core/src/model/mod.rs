mod connection;
mod participant;
mod signaling;

pub use connection::ConnectionId;
pub use participant::{IdentityError, MAX_IDENTITY_LEN, ParticipantId, Role};
pub use signaling::{
    CallDecision, ClientSignal, EndCallTargets, IceCandidate, IceServerConfig, RelaySignal,
    SdpType, SessionDescription,
};
