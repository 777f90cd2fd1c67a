use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use praxis_identity::{AgentCard, DidDocument};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::rpc::{A2aDispatcher, JsonRpcRequest, JsonRpcResponse};

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<A2aDispatcher>,
    card: AgentCard,
    did_document: DidDocument,
}

/// Builds the external HTTP surface for an agent: the A2A JSON-RPC
/// endpoint plus the two well-known discovery documents peers fetch
/// before ever opening a P2P connection.
pub fn router(dispatcher: Arc<A2aDispatcher>, card: AgentCard, did_document: DidDocument) -> Router {
    let state = AppState { dispatcher, card, did_document };
    Router::new()
        .route("/a2a/v1", post(handle_rpc))
        .route("/.well-known/agent-card.json", get(agent_card))
        .route("/.well-known/did.json", get(did_document_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_rpc(State(state): State<AppState>, Json(request): Json<JsonRpcRequest>) -> Json<JsonRpcResponse> {
    Json(state.dispatcher.handle(request).await)
}

async fn agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(state.card)
}

async fn did_document_handler(State(state): State<AppState>) -> Json<DidDocument> {
    Json(state.did_document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use libp2p_identity::Keypair;
    use praxis_events::EventBus;
    use praxis_identity::Capability;
    use praxis_orchestrator::{Orchestrator, RetryPolicy};
    use praxis_task::TaskManager;
    use praxis_tools::{Dispatcher, ToolRegistry};
    use tower::ServiceExt;

    fn sample_orchestrator() -> Arc<Orchestrator> {
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(ToolRegistry::new()), None));
        Arc::new(Orchestrator::new(dispatcher, EventBus::default(), RetryPolicy::default()))
    }

    fn sample_card() -> AgentCard {
        AgentCard {
            did: "did:web:agent.example".into(),
            peer_id: "peer-a".into(),
            name: "agent-a".into(),
            description: "test agent".into(),
            version: "0.1.0".into(),
            capabilities: vec![Capability {
                name: "echo".into(),
                description: "echoes".into(),
                parameters_schema: serde_json::json!({}),
            }],
            signature: None,
        }
    }

    #[tokio::test]
    async fn agent_card_endpoint_returns_the_local_card() {
        let dispatcher = Arc::new(A2aDispatcher::new(Arc::new(TaskManager::new(EventBus::default())), sample_card(), sample_orchestrator()));
        let doc = praxis_identity::build_did_document("did:web:agent.example", &Keypair::generate_ed25519());
        let app = router(dispatcher, sample_card(), doc);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/.well-known/agent-card.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rpc_endpoint_handles_a_jsonrpc_request() {
        let dispatcher = Arc::new(A2aDispatcher::new(Arc::new(TaskManager::new(EventBus::default())), sample_card(), sample_orchestrator()));
        let doc = praxis_identity::build_did_document("did:web:agent.example", &Keypair::generate_ed25519());
        let app = router(dispatcher, sample_card(), doc);

        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "agent/getAuthenticatedExtendedCard",
            "params": null
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/a2a/v1")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
