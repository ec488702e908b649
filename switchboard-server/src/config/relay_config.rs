use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use switchboard_core::IceServerConfig;
use thiserror::Error;

/// How messages without an explicit target are addressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// Every routed message must name its target.
    Direct,
    /// Peers talk to pool workers only.
    Brokered,
    /// Named targets route directly, untargeted messages go through the pool.
    #[default]
    Hybrid,
}

impl RoutingMode {
    pub fn allows_direct(self) -> bool {
        !matches!(self, RoutingMode::Brokered)
    }

    pub fn allows_brokered(self) -> bool {
        !matches!(self, RoutingMode::Direct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown routing mode '{0}' (expected direct, brokered or hybrid)")]
pub struct ParseRoutingModeError(String);

impl FromStr for RoutingMode {
    type Err = ParseRoutingModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "p2p" => Ok(RoutingMode::Direct),
            "brokered" | "pool" => Ok(RoutingMode::Brokered),
            "hybrid" | "both" => Ok(RoutingMode::Hybrid),
            other => Err(ParseRoutingModeError(other.to_owned())),
        }
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMode::Direct => f.write_str("direct"),
            RoutingMode::Brokered => f.write_str("brokered"),
            RoutingMode::Hybrid => f.write_str("hybrid"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub mode: RoutingMode,
    /// Handed to every client after `connection-success`. The relay never
    /// contacts these servers itself.
    pub ice_servers: Vec<IceServerConfig>,
    /// Capacity of the command channel feeding the relay loop.
    pub command_buffer: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: RoutingMode::default(),
            ice_servers: vec![IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                username: None,
                credential: None,
            }],
            command_buffer: 256,
        }
    }
}

impl RelayConfig {
    pub fn with_mode(mut self, mode: RoutingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = ice_servers;
        self
    }
}
