use std::collections::BTreeMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use libp2p_identity::{Keypair, PublicKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IdentityError, Result};

/// A capability an agent advertises: a tool name plus its JSON schema, as
/// carried in the `capabilities` field of a signed Agent Card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub parameters_schema: Value,
}

/// The signed capability descriptor an agent presents to the mesh. The
/// `signature` field holds a detached JWS over every other field, computed
/// under RFC 8785-style canonical JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentCard {
    pub did: String,
    pub peer_id: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub signature: Option<CardSignature>,
}

/// A detached JWS in its two-member JSON serialization (RFC 7515 §7.2.2):
/// `protected` is the base64url-encoded JOSE header, `signature` the
/// base64url-encoded signature bytes. The payload is never embedded here
/// since it is reconstructed from the card's own canonical bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardSignature {
    pub protected: String,
    pub signature: String,
}

const KEY_ID_FRAGMENT: &str = "key-1";

impl AgentCard {
    /// The verification method id this card's signature is keyed under,
    /// matching the `#key-1` fragment `build_did_document` publishes.
    pub fn key_id(&self) -> String {
        format!("{}#{KEY_ID_FRAGMENT}", self.did)
    }

    /// Returns the canonical byte representation used both to sign and to
    /// verify this card. The signature field is always excluded.
    fn signing_bytes(&self) -> Result<Vec<u8>> {
        let mut unsigned = self.clone();
        unsigned.signature = None;
        let value = serde_json::to_value(&unsigned)?;
        Ok(canonicalize(&value))
    }

    fn header(&self) -> Value {
        serde_json::json!({
            "alg": "EdDSA",
            "b64": false,
            "crit": ["b64"],
            "kid": self.key_id(),
        })
    }

    /// The signing input for a detached, unencoded-payload JWS: the
    /// base64url header, a literal `.`, then the raw payload bytes
    /// (unencoded, per `b64:false`/`crit:["b64"]`).
    fn signing_input(protected: &str, payload: &[u8]) -> Vec<u8> {
        let mut input = format!("{protected}.").into_bytes();
        input.extend_from_slice(payload);
        input
    }

    /// Produces a detached JWS over the canonical card bytes and stores it
    /// in `signature`.
    pub fn sign(&mut self, keypair: &Keypair) -> Result<()> {
        let payload = self.signing_bytes()?;
        let header_bytes = serde_json::to_vec(&self.header())?;
        let protected = URL_SAFE_NO_PAD.encode(&header_bytes);
        let signing_input = Self::signing_input(&protected, &payload);
        let sig = keypair
            .sign(&signing_input)
            .map_err(|e| IdentityError::Signing(e.to_string()))?;
        self.signature = Some(CardSignature {
            protected,
            signature: URL_SAFE_NO_PAD.encode(sig),
        });
        Ok(())
    }

    /// The `kid` carried in this card's JWS header, if any. A peer uses
    /// this to pick the right verification method out of the signer's DID
    /// document before calling `verify`.
    pub fn signature_kid(&self) -> Result<Option<String>> {
        let Some(sig) = &self.signature else {
            return Ok(None);
        };
        let header_bytes = URL_SAFE_NO_PAD
            .decode(&sig.protected)
            .map_err(|e| IdentityError::Signing(format!("bad protected header encoding: {e}")))?;
        let header: Value = serde_json::from_slice(&header_bytes)?;
        Ok(header.get("kid").and_then(Value::as_str).map(str::to_string))
    }

    /// Verifies the detached JWS against `public_key`, returning an error
    /// if the signature is missing, malformed, doesn't match, or was
    /// issued for a different `kid` than this card claims.
    pub fn verify(&self, public_key: &PublicKey) -> Result<()> {
        let sig = self
            .signature
            .as_ref()
            .ok_or_else(|| IdentityError::Signing("card has no signature".into()))?;

        let kid = self
            .signature_kid()?
            .ok_or_else(|| IdentityError::Signing("jws header carries no kid".into()))?;
        if kid != self.key_id() {
            return Err(IdentityError::Signing(format!(
                "jws kid {kid} does not match card did {}",
                self.did
            )));
        }

        let payload = self.signing_bytes()?;
        let signing_input = Self::signing_input(&sig.protected, &payload);
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(&sig.signature)
            .map_err(|e| IdentityError::Signing(format!("bad signature encoding: {e}")))?;

        if public_key.verify(&signing_input, &sig_bytes) {
            Ok(())
        } else {
            Err(IdentityError::InvalidSignature)
        }
    }
}

/// Recursively sorts object keys so the serialized bytes are deterministic
/// across processes, languages, and serde_json feature flags.
fn canonicalize(value: &Value) -> Vec<u8> {
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.iter().map(|(k, v)| (k.clone(), sort(v))).collect();
                serde_json::to_value(sorted).expect("btreemap of values always serializes")
            }
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    serde_json::to_vec(&sort(value)).expect("sorted value always serializes")
}
