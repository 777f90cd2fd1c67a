pub mod config;

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use libp2p::PeerId;

use praxis_a2a::A2aDispatcher;
use praxis_events::EventBus;
use praxis_identity::{
    build_did_document, AgentCard, DidDocument, DidResolver, ephemeral_keypair, load_or_create_keypair,
};
use praxis_orchestrator::{Orchestrator, P2pToolExecutor, RetryPolicy};
use praxis_p2p::{P2pError, P2pHandle, P2pNode};
use praxis_task::TaskManager;
use praxis_tools::{Dispatcher, ToolRegistry};

pub use config::RuntimeConfig;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Identity(#[from] praxis_identity::IdentityError),
    #[error(transparent)]
    P2p(#[from] praxis_p2p::P2pError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Wires every Praxis component into one running agent: identity, P2P
/// host, task manager, event bus, tool dispatcher, orchestrator, and the
/// A2A JSON-RPC surface. This is the composition root an embedding
/// application starts from; nothing here enforces a particular deployment
/// shape (CLI, service, embedded library) beyond assembling the pieces.
pub struct AgentRuntime {
    pub p2p: P2pHandle,
    pub tasks: Arc<TaskManager>,
    pub events: EventBus,
    pub tool_registry: Arc<ToolRegistry>,
    pub orchestrator: Arc<Orchestrator>,
    pub a2a: Arc<A2aDispatcher>,
    pub local_card: AgentCard,
    local_did_document: DidDocument,
    remote_executor: Arc<P2pToolExecutor>,
    cancellation: CancellationToken,
}

impl AgentRuntime {
    pub async fn start(config: RuntimeConfig, tool_registry: ToolRegistry) -> Result<Self> {
        let keypair = match &config.keypair_path {
            Some(path) => load_or_create_keypair(path)?,
            None => ephemeral_keypair(),
        };

        let local_peer_id = keypair.public().to_peer_id();
        let mut local_card = AgentCard {
            did: config.did.clone(),
            peer_id: local_peer_id.to_string(),
            name: config.agent_name.clone(),
            description: config.agent_description.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            capabilities: config.capabilities.clone(),
            signature: None,
        };
        local_card.sign(&keypair)?;
        let local_did_document = build_did_document(&config.did, &keypair);

        let cancellation = CancellationToken::new();
        let p2p_config = config.p2p_config();
        let p2p_node = P2pNode::new(p2p_config, keypair, local_card.clone());
        let p2p = p2p_node.run(cancellation.clone())?;

        let events = EventBus::default();
        let tasks = Arc::new(TaskManager::new(events.clone()));

        let remote_executor = Arc::new(P2pToolExecutor::new(p2p.clone()));
        for capability in &local_card.capabilities {
            debug_register_local_capability(capability);
        }

        let tool_registry = Arc::new(tool_registry);
        let dispatcher = Arc::new(Dispatcher::new(tool_registry.clone(), Some(remote_executor.clone())));
        let orchestrator = Arc::new(Orchestrator::new(dispatcher, events.clone(), RetryPolicy::default()));
        let a2a = Arc::new(A2aDispatcher::new(tasks.clone(), local_card.clone(), orchestrator.clone()));

        info!(peer_id = %local_peer_id, "praxis agent runtime started");

        Ok(Self {
            p2p,
            tasks,
            events,
            tool_registry,
            orchestrator,
            a2a,
            local_card,
            local_did_document,
            remote_executor,
            cancellation,
        })
    }

    /// The DID document backing this agent's own signing key, served at
    /// `/.well-known/did.json` by the HTTP surface.
    pub fn did_document(&self) -> &DidDocument {
        &self.local_did_document
    }

    /// Fetches a peer's Agent Card, resolves its DID document, and checks
    /// the card's signature against the DID's verification key. Only a
    /// verified card's capabilities are registered with the tool executor,
    /// so an unverified peer never becomes reachable through the
    /// orchestrator's remote dispatch path.
    pub async fn verify_peer_card(&self, peer: PeerId, resolver: &dyn DidResolver) -> Result<AgentCard> {
        let card = self.p2p.fetch_card(peer).await?;
        let document = resolver
            .resolve(&card.did)
            .await
            .map_err(|_| RuntimeError::P2p(P2pError::CardVerificationFailed(peer)))?;
        let kid = card
            .signature_kid()
            .ok()
            .flatten()
            .ok_or(RuntimeError::P2p(P2pError::CardVerificationFailed(peer)))?;
        let public_key = document
            .public_key_for_kid(&kid)
            .map_err(|_| RuntimeError::P2p(P2pError::CardVerificationFailed(peer)))?;
        card.verify(&public_key)
            .map_err(|_| RuntimeError::P2p(P2pError::CardVerificationFailed(peer)))?;

        for capability in &card.capabilities {
            self.remote_executor.register_tool_peer(capability.name.clone(), peer).await;
        }
        Ok(card)
    }

    /// Builds the `axum` router exposing this agent's A2A JSON-RPC
    /// endpoint and its well-known discovery documents. The caller binds
    /// it to `RuntimeConfig::http_listen_addr` with `axum::serve`.
    pub fn http_router(&self) -> axum::Router {
        praxis_a2a::router(self.a2a.clone(), self.local_card.clone(), self.local_did_document.clone())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.cancellation.cancel();
        self.p2p.shutdown().await?;
        Ok(())
    }
}

fn debug_register_local_capability(capability: &praxis_identity::Capability) {
    tracing::debug!(tool = %capability.name, "advertising local capability");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RuntimeConfig {
        RuntimeConfig {
            agent_name: "test-agent".into(),
            agent_description: "integration test agent".into(),
            did: "did:web:agent.example".into(),
            capabilities: vec![],
            keypair_path: None,
            p2p_listen_addr: "/ip4/127.0.0.1/tcp/0".parse().unwrap(),
            rendezvous_tag: "praxis-test".into(),
            http_listen_addr: "127.0.0.1:0".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn starts_and_signs_its_own_card() {
        let runtime = AgentRuntime::start(test_config(), ToolRegistry::new()).await.unwrap();
        assert!(runtime.local_card.signature.is_some());
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn card_matches_local_peer_id() {
        let runtime = AgentRuntime::start(test_config(), ToolRegistry::new()).await.unwrap();
        assert_eq!(runtime.local_card.peer_id, runtime.p2p.local_peer_id.to_string());
        runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn http_router_serves_the_agent_card() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let runtime = AgentRuntime::start(test_config(), ToolRegistry::new()).await.unwrap();
        let response = runtime
            .http_router()
            .oneshot(
                Request::builder()
                    .uri("/.well-known/agent-card.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        runtime.shutdown().await.unwrap();
    }
}
