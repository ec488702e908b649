//! Signaling relay: tracks who is connected, hands brokered calls to idle
//! workers, and forwards offers, answers and ICE candidates between the two
//! ends of a call without looking inside them.

pub mod config;
pub mod error;
pub mod pool;
pub mod registry;
pub mod relay;
pub mod session;
pub mod signaling;

pub use config::{RelayConfig, RoutingMode};
pub use error::{RelayError, RouteError};
pub use pool::ServerPool;
pub use registry::{ConnectionEntry, ConnectionHandle, ConnectionRegistry, Delivery, RegistryView};
pub use relay::{Relay, RelayCommand, RelayHandle, RelayStats};
pub use session::{CallKey, CallSession, CallState, CallTable};
pub use signaling::{AppState, ConnectParams, router, ws_handler};
