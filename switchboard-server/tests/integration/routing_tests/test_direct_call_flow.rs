use switchboard_core::{Role, SdpType};
use switchboard_server::RoutingMode;

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::{TestClient, expect_candidate, expect_description, pid, settle};

#[tokio::test]
async fn test_direct_call_flow() {
    init_tracing();

    let relay = spawn_relay(RoutingMode::Direct);

    let mut alice = TestClient::connect(&relay, "alice", Role::Peer)
        .await
        .expect("alice failed to connect");
    let mut bob = TestClient::connect(&relay, "bob", Role::Peer)
        .await
        .expect("bob failed to connect");

    alice.offer(Some("bob"), "v=0\r\no=alice").await.unwrap();

    let (from, payload) = expect_description(&mut bob).await.unwrap();
    assert_eq!(from, pid("alice"));
    assert_eq!(payload.kind, SdpType::Offer);
    assert_eq!(payload.sdp, "v=0\r\no=alice", "SDP must pass through untouched");

    let stats = settle(&relay).await;
    assert_eq!(stats.pending_offers, 1);

    bob.answer(Some("alice"), "v=0\r\no=bob").await.unwrap();

    let (from, payload) = expect_description(&mut alice).await.unwrap();
    assert_eq!(from, pid("bob"));
    assert_eq!(payload.kind, SdpType::Answer);

    let stats = settle(&relay).await;
    assert_eq!(stats.pending_offers, 0);
    assert_eq!(stats.active_calls, 1);

    // Candidates keep the order they were sent in.
    for i in 0..5 {
        alice
            .candidate(Some("bob"), &format!("candidate:{}", i))
            .await
            .unwrap();
    }
    for i in 0..5 {
        let (from, candidate) = expect_candidate(&mut bob).await.unwrap();
        assert_eq!(from, pid("alice"));
        assert_eq!(candidate, format!("candidate:{}", i));
    }

    // Renegotiation keeps the call active.
    bob.offer(Some("alice"), "v=0 restart").await.unwrap();
    let (_, payload) = expect_description(&mut alice).await.unwrap();
    assert_eq!(payload.sdp, "v=0 restart");

    let stats = settle(&relay).await;
    assert_eq!(stats.sessions, 1);
    assert_eq!(stats.active_calls, 1);
}
