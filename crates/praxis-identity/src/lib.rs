pub mod card;
pub mod did;
pub mod error;
pub mod keypair;

pub use card::{AgentCard, Capability, CardSignature};
pub use did::{
    build_did_document, CachingDidResolver, DidDocument, DidResolver, DidWebResolver,
    InMemoryDidResolver, VerificationMethod,
};
pub use error::{IdentityError, Result};
pub use keypair::{ephemeral_keypair, load_or_create_keypair};
