use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use libp2p::{Multiaddr, PeerId};

/// Governs how a `P2pNode` discovers and authorizes peers. Deny-all by
/// default: `agent_peers` must explicitly list a peer before it is treated
/// as authorized for inbound Announce/tool traffic.
#[derive(Debug, Clone)]
pub struct P2pConfig {
    pub listen_addr: Multiaddr,
    pub rendezvous_tag: String,
    pub mdns_enabled: bool,
    pub kad_enabled: bool,
    pub kad_bootstrap_addrs: Vec<Multiaddr>,
    pub keypair_path: Option<PathBuf>,
    pub agent_peers: HashSet<PeerId>,
    pub discovery_dedup_window: Duration,
    pub card_cache_ttl: Duration,
}

impl P2pConfig {
    pub fn new(listen_addr: Multiaddr, rendezvous_tag: impl Into<String>) -> Self {
        Self {
            listen_addr,
            rendezvous_tag: rendezvous_tag.into(),
            mdns_enabled: true,
            kad_enabled: true,
            kad_bootstrap_addrs: Vec::new(),
            keypair_path: None,
            agent_peers: HashSet::new(),
            discovery_dedup_window: Duration::from_secs(30),
            card_cache_ttl: Duration::from_secs(300),
        }
    }

    pub fn is_authorized(&self, peer: &PeerId) -> bool {
        self.agent_peers.contains(peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_denies_unknown_peers() {
        let config = P2pConfig::new("/ip4/127.0.0.1/tcp/0".parse().unwrap(), "praxis-mesh");
        let peer = PeerId::random();
        assert!(!config.is_authorized(&peer));
    }

    #[test]
    fn listed_peer_is_authorized() {
        let mut config = P2pConfig::new("/ip4/127.0.0.1/tcp/0".parse().unwrap(), "praxis-mesh");
        let peer = PeerId::random();
        config.agent_peers.insert(peer);
        assert!(config.is_authorized(&peer));
    }
}
