use std::time::Duration;

use libp2p::core::muxing::StreamMuxerBox;
use libp2p::core::transport::Boxed;
use libp2p::core::upgrade::Version;
use libp2p::identity::Keypair;
use libp2p::{noise, swarm, tcp, yamux, PeerId, Transport};

use crate::error::Result;

/// Builds the TCP + Noise + Yamux transport every `P2pNode` uses:
/// authenticated and multiplexed, matching the mesh's confidentiality and
/// stream-multiplexing requirements.
pub fn build_transport(keypair: &Keypair) -> Result<Boxed<(PeerId, StreamMuxerBox)>> {
    let noise_config = noise::Config::new(keypair).map_err(|e| {
        crate::error::P2pError::Identity(praxis_identity::IdentityError::Signing(e.to_string()))
    })?;

    let transport = tcp::tokio::Transport::new(tcp::Config::default().nodelay(true))
        .upgrade(Version::V1)
        .authenticate(noise_config)
        .multiplex(yamux::Config::default())
        .timeout(Duration::from_secs(20))
        .boxed();

    Ok(transport)
}

pub fn default_swarm_config() -> swarm::Config {
    swarm::Config::with_tokio_executor().with_idle_connection_timeout(Duration::from_secs(60))
}
