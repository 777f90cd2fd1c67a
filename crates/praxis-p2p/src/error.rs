use thiserror::Error;
use libp2p::{PeerId, TransportError};

#[derive(Debug, Error)]
pub enum P2pError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError<std::io::Error>),

    #[error("dial error: {0}")]
    Dial(String),

    #[error("peer {0} not found")]
    PeerNotFound(PeerId),

    #[error("peer {0} is not authorized")]
    PeerNotAuthorized(PeerId),

    #[error("card verification failed for {0}")]
    CardVerificationFailed(PeerId),

    #[error("identity error: {0}")]
    Identity(#[from] praxis_identity::IdentityError),

    #[error("codec error: {0}")]
    Codec(#[from] std::io::Error),

    #[error("node is shutting down")]
    Shutdown,

    #[error("request timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, P2pError>;
