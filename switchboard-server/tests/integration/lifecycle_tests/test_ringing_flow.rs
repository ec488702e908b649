use switchboard_core::{CallDecision, ClientSignal, RelaySignal, Role};
use switchboard_server::RoutingMode;

use crate::integration::{init_tracing, spawn_relay};
use crate::utils::{TestClient, expect_end_call, pid, settle};

fn calling(target: &str) -> ClientSignal {
    ClientSignal::Calling {
        target: pid(target),
    }
}

fn answer_to_call(target: &str, decision: CallDecision) -> ClientSignal {
    ClientSignal::AnswerToCall {
        target: pid(target),
        decision,
    }
}

#[tokio::test]
async fn test_ringing_flow() {
    init_tracing();

    let relay = spawn_relay(RoutingMode::Hybrid);

    let mut alice = TestClient::connect(&relay, "alice", Role::Peer)
        .await
        .expect("alice failed to connect");
    let mut bob = TestClient::connect(&relay, "bob", Role::Peer)
        .await
        .expect("bob failed to connect");

    bob.send(ClientSignal::CheckCalling).await.unwrap();
    assert_eq!(
        bob.recv().await.unwrap(),
        RelaySignal::CallingStatus {
            is_being_called: false,
            from: None,
        }
    );

    alice.send(calling("bob")).await.unwrap();
    assert_eq!(
        bob.recv().await.unwrap(),
        RelaySignal::IncomingCall {
            caller: pid("alice"),
        }
    );

    bob.send(ClientSignal::CheckCalling).await.unwrap();
    assert_eq!(
        bob.recv().await.unwrap(),
        RelaySignal::CallingStatus {
            is_being_called: true,
            from: Some(pid("alice")),
        }
    );

    bob.send(answer_to_call("alice", CallDecision::Accept))
        .await
        .unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        RelaySignal::CallResponse {
            decision: CallDecision::Accept,
            from: pid("bob"),
        }
    );

    // Answering clears the ring.
    bob.send(ClientSignal::CheckCalling).await.unwrap();
    assert_eq!(
        bob.recv().await.unwrap(),
        RelaySignal::CallingStatus {
            is_being_called: false,
            from: None,
        }
    );
}

#[tokio::test]
async fn test_ringing_rejected_and_cancelled() {
    init_tracing();

    let relay = spawn_relay(RoutingMode::Hybrid);

    let mut alice = TestClient::connect(&relay, "alice", Role::Peer)
        .await
        .expect("alice failed to connect");
    let mut bob = TestClient::connect(&relay, "bob", Role::Peer)
        .await
        .expect("bob failed to connect");

    alice.send(calling("bob")).await.unwrap();
    bob.recv().await.unwrap();
    bob.send(answer_to_call("alice", CallDecision::Reject))
        .await
        .unwrap();
    assert_eq!(
        alice.recv().await.unwrap(),
        RelaySignal::CallResponse {
            decision: CallDecision::Reject,
            from: pid("bob"),
        }
    );

    // Calling somebody offline goes nowhere.
    alice.send(calling("ghost")).await.unwrap();
    let stats = settle(&relay).await;
    assert_eq!(stats.sessions, 0);
    assert!(alice.drain().is_empty());

    // A caller hanging up while it rings cancels the ring.
    alice.send(calling("bob")).await.unwrap();
    bob.recv().await.unwrap();
    alice.disconnect().await.unwrap();

    let from = expect_end_call(&mut bob).await.unwrap();
    assert_eq!(from, pid("alice"));

    bob.send(ClientSignal::CheckCalling).await.unwrap();
    assert_eq!(
        bob.recv().await.unwrap(),
        RelaySignal::CallingStatus {
            is_being_called: false,
            from: None,
        }
    );
}
