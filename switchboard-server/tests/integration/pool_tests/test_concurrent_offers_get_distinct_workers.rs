use futures::future::join_all;
use std::collections::HashSet;
use switchboard_core::Role;
use switchboard_server::RoutingMode;

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::{TestClient, expect_description, settle};

const WORKERS: usize = 4;

#[tokio::test]
async fn test_concurrent_offers_get_distinct_workers() {
    init_tracing();

    let relay = spawn_relay(RoutingMode::Brokered);

    let mut workers = Vec::new();
    for i in 0..WORKERS {
        let worker = TestClient::connect(&relay, &format!("worker-{}", i), Role::ServerWorker)
            .await
            .expect("Worker failed to connect");
        workers.push(worker);
    }

    let mut peers = Vec::new();
    for i in 0..WORKERS {
        let peer = TestClient::connect(&relay, &format!("peer-{}", i), Role::Peer)
            .await
            .expect("Peer failed to connect");
        peers.push(peer);
    }

    let stats = settle(&relay).await;
    assert_eq!(stats.idle_workers, WORKERS);

    let offers = peers.iter().map(|peer| async move {
        let sdp = format!("v=0 {}", peer.identity);
        peer.offer(None, &sdp).await
    });
    for result in join_all(offers).await {
        result.expect("Offer was not accepted by the relay");
    }

    // Every worker gets exactly one offer, and every peer is served once.
    let mut served = HashSet::new();
    for worker in &mut workers {
        let (from, payload) = expect_description(worker).await.unwrap();
        assert_eq!(payload.sdp, format!("v=0 {}", from));
        assert!(served.insert(from), "A peer was assigned two workers");
    }
    assert_eq!(served.len(), WORKERS);

    let stats = settle(&relay).await;
    assert_eq!(stats.idle_workers, 0);
    assert_eq!(stats.pending_offers, WORKERS);
    for worker in &mut workers {
        assert!(worker.drain().is_empty(), "A worker was double-assigned");
    }
    for peer in &mut peers {
        assert!(peer.drain().is_empty(), "Nobody should be told the pool is empty");
    }
}
