use std::time::Duration;

use libp2p::Multiaddr;
use libp2p_identity::Keypair;
use praxis_identity::{AgentCard, Capability};
use praxis_p2p::{P2pConfig, P2pEvent, P2pHandle, P2pNode};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

fn test_card(peer_id: &str, name: &str) -> AgentCard {
    AgentCard {
        did: format!("did:web:{name}.example"),
        peer_id: peer_id.to_string(),
        name: name.to_string(),
        description: "integration test agent".to_string(),
        version: "0.1.0".to_string(),
        capabilities: vec![Capability {
            name: "echo".to_string(),
            description: "echoes input".to_string(),
            parameters_schema: serde_json::json!({"type": "object"}),
        }],
        signature: None,
    }
}

fn spawn_node(card: AgentCard) -> (P2pHandle, CancellationToken) {
    let keypair = Keypair::generate_ed25519();
    let mut config = P2pConfig::new("/ip4/127.0.0.1/tcp/0".parse().unwrap(), "praxis-test-mesh");
    config.mdns_enabled = false;
    config.kad_enabled = false;
    let node = P2pNode::new(config, keypair, card);
    let cancellation = CancellationToken::new();
    let handle = node.run(cancellation.clone()).unwrap();
    (handle, cancellation)
}

async fn wait_for_listen_addr(events: &mut broadcast::Receiver<P2pEvent>) -> Multiaddr {
    loop {
        match timeout(Duration::from_secs(10), events.recv()).await {
            Ok(Ok(P2pEvent::ListeningOn(addr))) => return addr,
            Ok(Ok(_)) => continue,
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(e)) => panic!("event stream closed: {e}"),
            Err(_) => panic!("timed out waiting for a listen address"),
        }
    }
}

async fn wait_for_event<F: Fn(&P2pEvent) -> bool>(events: &mut broadcast::Receiver<P2pEvent>, pred: F) {
    loop {
        match timeout(Duration::from_secs(10), events.recv()).await {
            Ok(Ok(event)) if pred(&event) => return,
            Ok(Ok(_)) => continue,
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(e)) => panic!("event stream closed: {e}"),
            Err(_) => panic!("timed out waiting for expected event"),
        }
    }
}

#[tokio::test]
async fn two_nodes_connect_after_dialing() {
    let (a_handle, _a_token) = spawn_node(test_card("peer-a", "agent-a"));
    let (b_handle, _b_token) = spawn_node(test_card("peer-b", "agent-b"));

    let mut a_events = a_handle.subscribe();
    let mut b_events = b_handle.subscribe();

    let a_addr = wait_for_listen_addr(&mut a_events).await;
    let a_addr = a_addr.with_p2p(a_handle.local_peer_id).unwrap();

    b_handle.dial(a_addr).await.unwrap();

    wait_for_event(&mut a_events, |e| matches!(e, P2pEvent::Connected(_))).await;
    wait_for_event(&mut b_events, |e| matches!(e, P2pEvent::Connected(_))).await;
}

#[tokio::test]
async fn fetches_peer_card_after_connecting() {
    let (a_handle, _a_token) = spawn_node(test_card("peer-a", "agent-a"));
    let (b_handle, _b_token) = spawn_node(test_card("peer-b", "agent-b"));

    let mut a_events = a_handle.subscribe();
    let a_addr = wait_for_listen_addr(&mut a_events).await;
    let a_addr = a_addr.with_p2p(a_handle.local_peer_id).unwrap();

    b_handle.dial(a_addr).await.unwrap();
    wait_for_event(&mut a_events, |e| matches!(e, P2pEvent::Connected(_))).await;

    let card = timeout(Duration::from_secs(10), b_handle.fetch_card(a_handle.local_peer_id))
        .await
        .expect("fetch did not time out")
        .expect("fetch succeeded");

    assert_eq!(card.name, "agent-a");
}

#[tokio::test]
async fn local_peer_id_is_stable_for_a_handle() {
    let (handle, _token) = spawn_node(test_card("peer-a", "agent-a"));
    let first = handle.local_peer_id;
    let second = handle.local_peer_id;
    assert_eq!(first, second);
}

#[tokio::test]
async fn fetch_card_from_unreachable_peer_errors_or_times_out() {
    let (handle, _token) = spawn_node(test_card("peer-a", "agent-a"));
    let unreachable = Keypair::generate_ed25519().public().to_peer_id();
    let result = timeout(Duration::from_secs(5), handle.fetch_card(unreachable)).await;
    match result {
        Ok(inner) => assert!(inner.is_err()),
        Err(_) => {}
    }
}

#[tokio::test]
async fn shutdown_stops_the_event_loop() {
    let (handle, _token) = spawn_node(test_card("peer-a", "agent-a"));
    handle.shutdown().await.unwrap();
    let _ = handle.shutdown().await;
}
