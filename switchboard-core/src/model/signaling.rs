use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// `RTCSdpType`. Only `offer` and `answer` move a call along; the other two
/// are forwarded as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

impl SdpType {
    pub fn as_str(self) -> &'static str {
        match self {
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
            SdpType::Pranswer => "pranswer",
            SdpType::Rollback => "rollback",
        }
    }
}

/// Session description as the browser produces it. `sdp` is never looked at,
/// and a rollback may leave it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpType,
    #[serde(default)]
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp: sdp.into(),
        }
    }

    pub fn is_offer(&self) -> bool {
        self.kind == SdpType::Offer
    }

    pub fn is_answer(&self) -> bool {
        self.kind == SdpType::Answer
    }
}

/// ICE candidate descriptor. Fields the relay does not name are carried in
/// `extra` so they survive forwarding untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        default,
        rename = "sdpMLineIndex",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDecision {
    Accept,
    Reject,
}

/// Addressing for an `endCall`. Both the single `target` form and the
/// `targets` list sent by older clients are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndCallTargets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ParticipantId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<ParticipantId>,
}

impl EndCallTargets {
    pub fn to(target: ParticipantId) -> Self {
        Self {
            target: Some(target),
            targets: Vec::new(),
        }
    }

    /// Every named target, deduplicated, in the order given.
    pub fn named(&self) -> Vec<ParticipantId> {
        let mut out: Vec<ParticipantId> = Vec::new();
        for id in self.target.iter().chain(self.targets.iter()) {
            if !out.contains(id) {
                out.push(id.clone());
            }
        }
        out
    }
}

/// Messages a client sends to the relay.
///
/// `target` is optional on routed messages: when absent the relay addresses
/// the sender's assigned worker (brokered routing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientSignal {
    OfferOrAnswer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ParticipantId>,
        payload: SessionDescription,
    },
    Candidate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ParticipantId>,
        candidate: IceCandidate,
    },
    /// `data` may be missing or `null`: hang up on everyone.
    EndCall(Option<EndCallTargets>),
    /// "Is anyone waiting on me with an offer?"
    CheckOffer,
    Calling {
        target: ParticipantId,
    },
    CheckCalling,
    AnswerToCall {
        target: ParticipantId,
        decision: CallDecision,
    },
    RequestServer,
}

impl ClientSignal {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientSignal::OfferOrAnswer { payload, .. } => payload.kind.as_str(),
            ClientSignal::Candidate { .. } => "candidate",
            ClientSignal::EndCall(_) => "endCall",
            ClientSignal::CheckOffer => "checkOffer",
            ClientSignal::Calling { .. } => "calling",
            ClientSignal::CheckCalling => "checkCalling",
            ClientSignal::AnswerToCall { .. } => "answerToCall",
            ClientSignal::RequestServer => "requestServer",
        }
    }
}

/// Messages the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum RelaySignal {
    ConnectionSuccess {
        identity: ParticipantId,
    },
    #[serde(rename_all = "camelCase")]
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    OfferOrAnswer {
        from: ParticipantId,
        payload: SessionDescription,
    },
    Candidate {
        from: ParticipantId,
        candidate: IceCandidate,
    },
    EndCall {
        from: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    PendingOffer {
        from: ParticipantId,
        payload: SessionDescription,
    },
    NoOffer,
    NoServersAvailable {
        message: String,
    },
    IncomingCall {
        caller: ParticipantId,
    },
    #[serde(rename_all = "camelCase")]
    CallingStatus {
        is_being_called: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<ParticipantId>,
    },
    CallResponse {
        decision: CallDecision,
        from: ParticipantId,
    },
    ServerAssigned {
        server: ParticipantId,
    },
}
