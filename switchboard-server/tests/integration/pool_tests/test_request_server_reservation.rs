use switchboard_core::{ClientSignal, RelaySignal, Role};
use switchboard_server::RoutingMode;

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::{TestClient, expect_candidate, expect_description, pid, settle};

#[tokio::test]
async fn test_request_server_reservation() {
    init_tracing();

    let relay = spawn_relay(RoutingMode::Hybrid);

    let mut worker = TestClient::connect(&relay, "gpu-1", Role::ServerWorker)
        .await
        .expect("Worker failed to connect");
    let mut alice = TestClient::connect(&relay, "alice", Role::Peer)
        .await
        .expect("alice failed to connect");
    let mut bob = TestClient::connect(&relay, "bob", Role::Peer)
        .await
        .expect("bob failed to connect");

    alice.send(ClientSignal::RequestServer).await.unwrap();
    match alice.recv().await.unwrap() {
        RelaySignal::ServerAssigned { server } => assert_eq!(server, pid("gpu-1")),
        other => panic!("Expected server-assigned, got {:?}", other),
    }

    let stats = settle(&relay).await;
    assert_eq!(stats.idle_workers, 0, "Reserved worker leaves the pool");
    assert_eq!(stats.sessions, 1);

    // Asking again returns the same reservation.
    alice.send(ClientSignal::RequestServer).await.unwrap();
    match alice.recv().await.unwrap() {
        RelaySignal::ServerAssigned { server } => assert_eq!(server, pid("gpu-1")),
        other => panic!("Expected server-assigned, got {:?}", other),
    }

    // Somebody else cannot take the reserved worker.
    bob.offer(Some("gpu-1"), "v=0 bob").await.unwrap();
    assert!(matches!(
        bob.recv().await.unwrap(),
        RelaySignal::NoServersAvailable { .. }
    ));

    // The untargeted offer lands on the reserved worker.
    alice.offer(None, "v=0 alice").await.unwrap();
    let (from, _) = expect_description(&mut worker).await.unwrap();
    assert_eq!(from, pid("alice"));

    worker.answer(Some("alice"), "v=0 gpu").await.unwrap();
    let (from, _) = expect_description(&mut alice).await.unwrap();
    assert_eq!(from, pid("gpu-1"));

    worker.candidate(Some("alice"), "candidate:gpu").await.unwrap();
    let (from, candidate) = expect_candidate(&mut alice).await.unwrap();
    assert_eq!(from, pid("gpu-1"));
    assert_eq!(candidate, "candidate:gpu");

    let stats = settle(&relay).await;
    assert_eq!(stats.active_calls, 1);
    assert!(worker.drain().is_empty());
}
