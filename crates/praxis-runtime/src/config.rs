use std::path::PathBuf;

use libp2p::Multiaddr;
use praxis_identity::Capability;
use praxis_p2p::P2pConfig;

/// Everything needed to assemble a running `AgentRuntime`. Built
/// programmatically by the embedding application; this crate never reads
/// a config file itself.
pub struct RuntimeConfig {
    pub agent_name: String,
    pub agent_description: String,
    pub did: String,
    pub capabilities: Vec<Capability>,
    pub keypair_path: Option<PathBuf>,
    pub p2p_listen_addr: Multiaddr,
    pub rendezvous_tag: String,
    pub http_listen_addr: std::net::SocketAddr,
}

impl RuntimeConfig {
    pub fn p2p_config(&self) -> P2pConfig {
        let mut config = P2pConfig::new(self.p2p_listen_addr.clone(), self.rendezvous_tag.clone());
        config.keypair_path = self.keypair_path.clone();
        config
    }
}
