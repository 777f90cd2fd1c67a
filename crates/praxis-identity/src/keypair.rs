use std::path::Path;

use libp2p_identity::Keypair;
use tracing::{info, warn};

use crate::error::{IdentityError, Result};

/// Loads the Ed25519 keypair at `path`, generating and persisting a new one
/// if none exists. The same key backs both the libp2p host identity and
/// the DID signing key, so callers must not silently rotate it once peers
/// depend on a stable PeerId.
pub fn load_or_create_keypair(path: &Path) -> Result<Keypair> {
    if path.exists() {
        let bytes = std::fs::read(path)?;
        let keypair = Keypair::from_protobuf_encoding(&bytes).map_err(|e| {
            IdentityError::KeypairDecode(format!(
                "failed to decode identity key at {}: {e}",
                path.display()
            ))
        })?;
        info!(path = %path.display(), "loaded persisted identity key");
        return Ok(keypair);
    }

    warn!(path = %path.display(), "no identity key found, generating a new one");
    let keypair = Keypair::generate_ed25519();
    persist_keypair(&keypair, path)?;
    Ok(keypair)
}

/// Generates an ephemeral keypair with no on-disk persistence. Intended for
/// tests and short-lived agents that don't need a stable PeerId.
pub fn ephemeral_keypair() -> Keypair {
    Keypair::generate_ed25519()
}

fn persist_keypair(keypair: &Keypair, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let encoded = keypair
        .to_protobuf_encoding()
        .map_err(|e| IdentityError::KeypairDecode(e.to_string()))?;
    std::fs::write(path, encoded)?;
    set_owner_only_permissions(path)?;
    info!(path = %path.display(), "persisted new identity key");
    Ok(())
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
