use switchboard_core::{ClientSignal, RelaySignal, Role};
use switchboard_server::RoutingMode;

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::{TestClient, expect_description, pid, settle};

#[tokio::test]
async fn test_no_servers_available() {
    init_tracing();

    let relay = spawn_relay(RoutingMode::Brokered);

    let mut alice = TestClient::connect(&relay, "alice", Role::Peer)
        .await
        .expect("alice failed to connect");

    alice.offer(None, "v=0").await.unwrap();

    match alice.recv().await.unwrap() {
        RelaySignal::NoServersAvailable { message } => assert!(!message.is_empty()),
        other => panic!("Expected no-servers-available, got {:?}", other),
    }

    // Candidates without a worker are dropped, not answered.
    alice.candidate(None, "candidate:0").await.unwrap();
    let stats = settle(&relay).await;
    assert!(alice.drain().is_empty(), "Notice must be sent exactly once");
    assert_eq!(stats.sessions, 0);

    alice.send(ClientSignal::RequestServer).await.unwrap();
    assert!(matches!(
        alice.recv().await.unwrap(),
        RelaySignal::NoServersAvailable { .. }
    ));

    // A worker arriving later is picked up by the next offer.
    let mut worker = TestClient::connect(&relay, "gpu-1", Role::ServerWorker)
        .await
        .expect("Worker failed to connect");

    alice.offer(None, "v=0 retry").await.unwrap();
    let (from, payload) = expect_description(&mut worker).await.unwrap();
    assert_eq!(from, pid("alice"));
    assert_eq!(payload.sdp, "v=0 retry");
}
