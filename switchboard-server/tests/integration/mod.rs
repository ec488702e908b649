pub mod pool_tests;
pub mod routing_tests;

use tracing::Level;

use switchboard_server::{RelayConfig, RelayHandle, RoutingMode};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Relay with no ICE servers configured, so `connection-success` is the only
/// thing a fresh connection receives.
pub fn spawn_relay(mode: RoutingMode) -> RelayHandle {
    RelayHandle::spawn(
        RelayConfig::default()
            .with_mode(mode)
            .with_ice_servers(Vec::new()),
    )
}
