use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("keypair decode error: {0}")]
    KeypairDecode(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("canonicalization error: {0}")]
    Canonicalize(#[from] serde_json::Error),

    #[error("did resolution error: {0}")]
    DidResolution(String),

    #[error("did document malformed: {0}")]
    MalformedDidDocument(String),

    #[error("unsupported did method: {0}")]
    UnsupportedDidMethod(String),
}

pub type Result<T> = std::result::Result<T, IdentityError>;
