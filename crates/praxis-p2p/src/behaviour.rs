use libp2p::kad;
use libp2p::swarm::behaviour::toggle::Toggle;
use libp2p::swarm::NetworkBehaviour;
use libp2p::{identify, mdns, ping, request_response, PeerId};

use crate::config::P2pConfig;
use crate::protocol::{
    A2aCodec, CardCodec, ToolInvokeCodec, A2A_PROTOCOL, CARD_EXCHANGE_PROTOCOL,
    TOOL_INVOKE_PROTOCOL,
};

/// The composed network behaviour for a Praxis host: local-network
/// discovery (mdns), wide-area discovery (kad), liveness/identity
/// (ping/identify), and the three request-response protocols that carry
/// card exchange, tool invocation, and A2A JSON-RPC traffic. mdns and kad
/// are individually toggleable so a host can run with either discovery
/// mechanism disabled.
#[derive(NetworkBehaviour)]
pub struct PraxisBehaviour {
    pub mdns: Toggle<mdns::tokio::Behaviour>,
    pub kad: Toggle<kad::Behaviour<kad::store::MemoryStore>>,
    pub identify: identify::Behaviour,
    pub ping: ping::Behaviour,
    pub card: request_response::Behaviour<CardCodec>,
    pub tool: request_response::Behaviour<ToolInvokeCodec>,
    pub a2a: request_response::Behaviour<A2aCodec>,
}

pub fn new_behaviour(
    local_peer_id: PeerId,
    local_public_key: libp2p::identity::PublicKey,
    config: &P2pConfig,
) -> Result<PraxisBehaviour, std::io::Error> {
    let mdns = if config.mdns_enabled {
        Some(mdns::tokio::Behaviour::new(mdns::Config::default(), local_peer_id)?)
    } else {
        None
    };

    let kad = if config.kad_enabled {
        Some(kad::Behaviour::new(
            local_peer_id,
            kad::store::MemoryStore::new(local_peer_id),
        ))
    } else {
        None
    };

    let identify = identify::Behaviour::new(identify::Config::new(
        "/praxis/1.0.0".to_string(),
        local_public_key,
    ));

    let ping = ping::Behaviour::new(ping::Config::default());

    let card = request_response::Behaviour::new(
        std::iter::once((CARD_EXCHANGE_PROTOCOL, request_response::ProtocolSupport::Full)),
        request_response::Config::default(),
    );
    let tool = request_response::Behaviour::new(
        std::iter::once((TOOL_INVOKE_PROTOCOL, request_response::ProtocolSupport::Full)),
        request_response::Config::default(),
    );
    let a2a = request_response::Behaviour::new(
        std::iter::once((A2A_PROTOCOL, request_response::ProtocolSupport::Full)),
        request_response::Config::default(),
    );

    Ok(PraxisBehaviour {
        mdns: mdns.into(),
        kad: kad.into(),
        identify,
        ping,
        card,
        tool,
        a2a,
    })
}
