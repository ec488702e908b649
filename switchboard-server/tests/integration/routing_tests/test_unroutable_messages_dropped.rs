use switchboard_core::Role;
use switchboard_server::RoutingMode;

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::{TestClient, expect_description, pid, settle};

#[tokio::test]
async fn test_unroutable_messages_dropped() {
    init_tracing();

    let relay = spawn_relay(RoutingMode::Direct);

    let mut alice = TestClient::connect(&relay, "alice", Role::Peer)
        .await
        .expect("alice failed to connect");
    let mut bob = TestClient::connect(&relay, "bob", Role::Peer)
        .await
        .expect("bob failed to connect");

    // Offline target, self target, and no target at all.
    alice.offer(Some("ghost"), "v=0").await.unwrap();
    alice.candidate(Some("ghost"), "candidate:0").await.unwrap();
    alice.offer(Some("alice"), "v=0").await.unwrap();
    alice.offer(None, "v=0").await.unwrap();
    alice.candidate(None, "candidate:0").await.unwrap();

    let stats = settle(&relay).await;
    assert_eq!(stats.connections, 2, "Misses never disconnect the sender");
    assert_eq!(stats.sessions, 0, "Nothing was routed, nothing recorded");
    assert!(alice.drain().is_empty(), "Direct misses are silent");
    assert!(bob.drain().is_empty());

    // The sender's connection is still usable afterwards.
    alice.offer(Some("bob"), "v=0 real").await.unwrap();
    let (from, payload) = expect_description(&mut bob).await.unwrap();
    assert_eq!(from, pid("alice"));
    assert_eq!(payload.sdp, "v=0 real");
}
