use std::collections::HashMap;
use std::time::Instant;

use futures::StreamExt;
use libp2p::request_response::{self, OutboundRequestId, ResponseChannel};
use libp2p::swarm::SwarmEvent;
use libp2p::{identify, identity::Keypair, mdns, Multiaddr, PeerId, Swarm};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use praxis_identity::AgentCard;

use crate::behaviour::{new_behaviour, PraxisBehaviourEvent};
use crate::config::P2pConfig;
use crate::error::{P2pError, Result};
use crate::protocol::{
    A2aRequest, A2aResponse, CardExchangeRequest, CardExchangeResponse, ToolInvokeRequest,
    ToolInvokeResponse,
};
use crate::transport::{build_transport, default_swarm_config};

#[derive(Debug, Clone)]
pub struct CachedCard {
    pub card: AgentCard,
    pub verified: bool,
    pub fetched_at: Instant,
}

#[derive(Debug, Clone)]
pub enum P2pEvent {
    PeerDiscovered(PeerId),
    PeerExpired(PeerId),
    Connected(PeerId),
    Disconnected(PeerId),
    ListeningOn(Multiaddr),
    CardReceived { peer: PeerId, verified: bool },
    ToolInvocationReceived { peer: PeerId, inbound_id: Uuid, call: ToolInvokeRequest },
    A2aRequestReceived { peer: PeerId, inbound_id: Uuid, request: A2aRequest },
    Error(String),
}

pub enum P2pCommand {
    FetchCard {
        peer: PeerId,
        reply: oneshot::Sender<Result<AgentCard>>,
    },
    InvokeTool {
        peer: PeerId,
        call: ToolInvokeRequest,
        reply: oneshot::Sender<Result<ToolInvokeResponse>>,
    },
    SendA2a {
        peer: PeerId,
        request: A2aRequest,
        reply: oneshot::Sender<Result<A2aResponse>>,
    },
    RespondToolInvocation {
        inbound_id: Uuid,
        response: ToolInvokeResponse,
    },
    RespondA2a {
        inbound_id: Uuid,
        response: A2aResponse,
    },
    Dial(Multiaddr),
    Shutdown,
}

/// A cheap-clone front for a running `P2pNode`: a command sender paired
/// with an event broadcaster, so every caller gets its own event stream
/// without contending on the node's internal state.
#[derive(Clone)]
pub struct P2pHandle {
    commands: mpsc::Sender<P2pCommand>,
    events: broadcast::Sender<P2pEvent>,
    pub local_peer_id: PeerId,
}

impl P2pHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<P2pEvent> {
        self.events.subscribe()
    }

    pub async fn fetch_card(&self, peer: PeerId) -> Result<AgentCard> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(P2pCommand::FetchCard { peer, reply })
            .await
            .map_err(|_| P2pError::Shutdown)?;
        rx.await.map_err(|_| P2pError::Shutdown)?
    }

    pub async fn invoke_tool(&self, peer: PeerId, call: ToolInvokeRequest) -> Result<ToolInvokeResponse> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(P2pCommand::InvokeTool { peer, call, reply })
            .await
            .map_err(|_| P2pError::Shutdown)?;
        rx.await.map_err(|_| P2pError::Shutdown)?
    }

    pub async fn send_a2a(&self, peer: PeerId, request: A2aRequest) -> Result<A2aResponse> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(P2pCommand::SendA2a { peer, request, reply })
            .await
            .map_err(|_| P2pError::Shutdown)?;
        rx.await.map_err(|_| P2pError::Shutdown)?
    }

    pub async fn respond_tool_invocation(&self, inbound_id: Uuid, response: ToolInvokeResponse) -> Result<()> {
        self.commands
            .send(P2pCommand::RespondToolInvocation { inbound_id, response })
            .await
            .map_err(|_| P2pError::Shutdown)
    }

    pub async fn respond_a2a(&self, inbound_id: Uuid, response: A2aResponse) -> Result<()> {
        self.commands
            .send(P2pCommand::RespondA2a { inbound_id, response })
            .await
            .map_err(|_| P2pError::Shutdown)
    }

    pub async fn dial(&self, addr: Multiaddr) -> Result<()> {
        self.commands
            .send(P2pCommand::Dial(addr))
            .await
            .map_err(|_| P2pError::Shutdown)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.commands
            .send(P2pCommand::Shutdown)
            .await
            .map_err(|_| P2pError::Shutdown)
    }
}

pub struct P2pNode {
    config: P2pConfig,
    keypair: Keypair,
    local_card: AgentCard,
}

impl P2pNode {
    pub fn new(config: P2pConfig, keypair: Keypair, local_card: AgentCard) -> Self {
        Self {
            config,
            keypair,
            local_card,
        }
    }

    /// Builds the swarm and spawns the node's event loop, returning a
    /// handle immediately. The loop runs until `P2pHandle::shutdown` is
    /// called or `cancellation` fires.
    pub fn run(self, cancellation: CancellationToken) -> Result<P2pHandle> {
        let local_peer_id = PeerId::from(self.keypair.public());
        let transport = build_transport(&self.keypair)?;
        let behaviour = new_behaviour(local_peer_id, self.keypair.public(), &self.config)
            .map_err(P2pError::Codec)?;
        let mut swarm = Swarm::new(transport, behaviour, local_peer_id, default_swarm_config());

        swarm
            .listen_on(self.config.listen_addr.clone())
            .map_err(P2pError::Transport)?;

        if self.config.kad_enabled {
            for addr in &self.config.kad_bootstrap_addrs {
                if let Err(e) = swarm.dial(addr.clone()) {
                    warn!(error = %e, %addr, "failed to dial kademlia bootstrap address");
                }
            }
        }

        let (command_tx, command_rx) = mpsc::channel(64);
        let (event_tx, _) = broadcast::channel(256);

        let handle = P2pHandle {
            commands: command_tx,
            events: event_tx.clone(),
            local_peer_id,
        };

        let state = NodeState {
            swarm,
            config: self.config,
            local_card: self.local_card,
            events: event_tx,
            pending_fetch_card: HashMap::new(),
            pending_invoke_tool: HashMap::new(),
            pending_a2a: HashMap::new(),
            pending_tool_inbound: HashMap::new(),
            pending_a2a_inbound: HashMap::new(),
            card_cache: HashMap::new(),
            recently_discovered: HashMap::new(),
        };

        tokio::spawn(state.event_loop(command_rx, cancellation));

        Ok(handle)
    }
}

struct NodeState {
    swarm: Swarm<crate::behaviour::PraxisBehaviour>,
    config: P2pConfig,
    local_card: AgentCard,
    events: broadcast::Sender<P2pEvent>,
    pending_fetch_card: HashMap<OutboundRequestId, oneshot::Sender<Result<AgentCard>>>,
    pending_invoke_tool: HashMap<OutboundRequestId, oneshot::Sender<Result<ToolInvokeResponse>>>,
    pending_a2a: HashMap<OutboundRequestId, oneshot::Sender<Result<A2aResponse>>>,
    pending_tool_inbound: HashMap<Uuid, ResponseChannel<ToolInvokeResponse>>,
    pending_a2a_inbound: HashMap<Uuid, ResponseChannel<A2aResponse>>,
    card_cache: HashMap<PeerId, CachedCard>,
    recently_discovered: HashMap<PeerId, Instant>,
}

impl NodeState {
    async fn event_loop(mut self, mut commands: mpsc::Receiver<P2pCommand>, cancellation: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    info!("p2p node cancelled, shutting down");
                    break;
                }
                event = self.swarm.select_next_some() => {
                    self.handle_swarm_event(event);
                }
                Some(command) = commands.recv() => {
                    if !self.handle_command(command) {
                        break;
                    }
                }
                else => break,
            }
        }
    }

    fn emit(&self, event: P2pEvent) {
        let _ = self.events.send(event);
    }

    fn handle_command(&mut self, command: P2pCommand) -> bool {
        match command {
            P2pCommand::FetchCard { peer, reply } => {
                if let Some(cached) = self.card_cache.get(&peer) {
                    if cached.fetched_at.elapsed() < self.config.card_cache_ttl {
                        let _ = reply.send(Ok(cached.card.clone()));
                        return true;
                    }
                }
                let request_id = self
                    .swarm
                    .behaviour_mut()
                    .card
                    .send_request(&peer, CardExchangeRequest::default());
                self.pending_fetch_card.insert(request_id, reply);
            }
            P2pCommand::InvokeTool { peer, call, reply } => {
                if !self.config.is_authorized(&peer) {
                    let _ = reply.send(Err(P2pError::PeerNotAuthorized(peer)));
                    return true;
                }
                let request_id = self.swarm.behaviour_mut().tool.send_request(&peer, call);
                self.pending_invoke_tool.insert(request_id, reply);
            }
            P2pCommand::SendA2a { peer, request, reply } => {
                let request_id = self.swarm.behaviour_mut().a2a.send_request(&peer, request);
                self.pending_a2a.insert(request_id, reply);
            }
            P2pCommand::RespondToolInvocation { inbound_id, response } => {
                if let Some(channel) = self.pending_tool_inbound.remove(&inbound_id) {
                    let _ = self.swarm.behaviour_mut().tool.send_response(channel, response);
                } else {
                    warn!(%inbound_id, "no pending tool invocation for this response");
                }
            }
            P2pCommand::RespondA2a { inbound_id, response } => {
                if let Some(channel) = self.pending_a2a_inbound.remove(&inbound_id) {
                    let _ = self.swarm.behaviour_mut().a2a.send_response(channel, response);
                } else {
                    warn!(%inbound_id, "no pending a2a request for this response");
                }
            }
            P2pCommand::Dial(addr) => {
                if let Err(e) = self.swarm.dial(addr) {
                    warn!(error = %e, "dial failed");
                }
            }
            P2pCommand::Shutdown => return false,
        }
        true
    }

    fn handle_swarm_event(&mut self, event: SwarmEvent<PraxisBehaviourEvent>) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                self.emit(P2pEvent::ListeningOn(address));
            }
            SwarmEvent::ConnectionEstablished { peer_id, .. } => {
                self.emit(P2pEvent::Connected(peer_id));
            }
            SwarmEvent::ConnectionClosed { peer_id, .. } => {
                self.emit(P2pEvent::Disconnected(peer_id));
            }
            SwarmEvent::Behaviour(PraxisBehaviourEvent::Mdns(mdns::Event::Discovered(peers))) => {
                for (peer_id, addr) in peers {
                    if self.is_duplicate_discovery(peer_id) {
                        continue;
                    }
                    if let Some(kad) = self.swarm.behaviour_mut().kad.as_mut() {
                        kad.add_address(&peer_id, addr);
                    }
                    self.emit(P2pEvent::PeerDiscovered(peer_id));
                }
            }
            SwarmEvent::Behaviour(PraxisBehaviourEvent::Mdns(mdns::Event::Expired(peers))) => {
                for (peer_id, _addr) in peers {
                    self.emit(P2pEvent::PeerExpired(peer_id));
                }
            }
            SwarmEvent::Behaviour(PraxisBehaviourEvent::Identify(identify::Event::Received {
                peer_id,
                info,
                ..
            })) => {
                if let Some(kad) = self.swarm.behaviour_mut().kad.as_mut() {
                    for addr in info.listen_addrs {
                        kad.add_address(&peer_id, addr);
                    }
                }
            }
            SwarmEvent::Behaviour(PraxisBehaviourEvent::Card(request_response::Event::Message {
                peer,
                message,
                ..
            })) => self.handle_card_message(peer, message),
            SwarmEvent::Behaviour(PraxisBehaviourEvent::Tool(request_response::Event::Message {
                peer,
                message,
                ..
            })) => self.handle_tool_message(peer, message),
            SwarmEvent::Behaviour(PraxisBehaviourEvent::A2a(request_response::Event::Message {
                peer,
                message,
                ..
            })) => self.handle_a2a_message(peer, message),
            SwarmEvent::Behaviour(PraxisBehaviourEvent::Card(request_response::Event::OutboundFailure {
                request_id,
                error,
                ..
            })) => {
                if let Some(reply) = self.pending_fetch_card.remove(&request_id) {
                    let _ = reply.send(Err(P2pError::Dial(error.to_string())));
                }
            }
            SwarmEvent::Behaviour(PraxisBehaviourEvent::Tool(request_response::Event::OutboundFailure {
                request_id,
                error,
                ..
            })) => {
                if let Some(reply) = self.pending_invoke_tool.remove(&request_id) {
                    let _ = reply.send(Err(P2pError::Dial(error.to_string())));
                }
            }
            SwarmEvent::Behaviour(PraxisBehaviourEvent::A2a(request_response::Event::OutboundFailure {
                request_id,
                error,
                ..
            })) => {
                if let Some(reply) = self.pending_a2a.remove(&request_id) {
                    let _ = reply.send(Err(P2pError::Dial(error.to_string())));
                }
            }
            other => {
                debug!(?other, "unhandled swarm event");
            }
        }
    }

    fn is_duplicate_discovery(&mut self, peer: PeerId) -> bool {
        if let Some(seen_at) = self.recently_discovered.get(&peer) {
            if seen_at.elapsed() < self.config.discovery_dedup_window {
                return true;
            }
        }
        self.recently_discovered.insert(peer, Instant::now());
        false
    }

    fn handle_card_message(&mut self, peer: PeerId, message: request_response::Message<CardExchangeRequest, CardExchangeResponse>) {
        match message {
            request_response::Message::Request { channel, .. } => {
                let response = CardExchangeResponse {
                    card: self.local_card.clone(),
                };
                let _ = self.swarm.behaviour_mut().card.send_response(channel, response);
            }
            request_response::Message::Response { request_id, response } => {
                // Signature verification happens at a higher layer that holds
                // the peer's DID document; here we only cache the card as
                // unverified until that layer confirms it.
                self.card_cache.insert(
                    peer,
                    CachedCard {
                        card: response.card.clone(),
                        verified: false,
                        fetched_at: Instant::now(),
                    },
                );
                if let Some(reply) = self.pending_fetch_card.remove(&request_id) {
                    let _ = reply.send(Ok(response.card));
                }
                self.emit(P2pEvent::CardReceived { peer, verified: false });
            }
        }
    }

    fn handle_tool_message(&mut self, peer: PeerId, message: request_response::Message<ToolInvokeRequest, ToolInvokeResponse>) {
        match message {
            request_response::Message::Request { request, channel, .. } => {
                let inbound_id = Uuid::new_v4();
                self.pending_tool_inbound.insert(inbound_id, channel);
                self.emit(P2pEvent::ToolInvocationReceived { peer, inbound_id, call: request });
            }
            request_response::Message::Response { request_id, response } => {
                if let Some(reply) = self.pending_invoke_tool.remove(&request_id) {
                    let _ = reply.send(Ok(response));
                }
            }
        }
    }

    fn handle_a2a_message(&mut self, peer: PeerId, message: request_response::Message<A2aRequest, A2aResponse>) {
        match message {
            request_response::Message::Request { request, channel, .. } => {
                let inbound_id = Uuid::new_v4();
                self.pending_a2a_inbound.insert(inbound_id, channel);
                self.emit(P2pEvent::A2aRequestReceived { peer, inbound_id, request });
            }
            request_response::Message::Response { request_id, response } => {
                if let Some(reply) = self.pending_a2a.remove(&request_id) {
                    let _ = reply.send(Ok(response));
                }
            }
        }
    }
}
