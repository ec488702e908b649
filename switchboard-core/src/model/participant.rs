use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest identity accepted from a handshake or a message target.
pub const MAX_IDENTITY_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("participant identity is empty")]
    Empty,
    #[error("participant identity is undefined")]
    Undefined,
    #[error("participant identity exceeds {} bytes", MAX_IDENTITY_LEN)]
    TooLong,
}

/// Opaque identity supplied by the client at connect time.
///
/// The relay trusts it verbatim; the only checks are the ones that would make
/// it useless as a routing key.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn parse(s: impl Into<String>) -> Result<Self, IdentityError> {
        let s = s.into();
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }
        // JS clients send this literal when the id was never set.
        if trimmed == "undefined" || trimmed == "null" {
            return Err(IdentityError::Undefined);
        }
        if s.len() > MAX_IDENTITY_LEN {
            return Err(IdentityError::TooLong);
        }

        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ParticipantId {
    type Error = IdentityError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of endpoint sits behind a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    Peer,
    /// Backend process that takes one brokered call at a time.
    #[serde(alias = "server", alias = "worker")]
    ServerWorker,
}

impl Role {
    pub fn is_worker(self) -> bool {
        matches!(self, Role::ServerWorker)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Peer => f.write_str("peer"),
            Role::ServerWorker => f.write_str("server-worker"),
        }
    }
}
