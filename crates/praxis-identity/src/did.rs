use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use libp2p_identity::{Keypair, PublicKey};
use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};

/// A minimal DID document: enough to carry a `did:web` subject and its
/// Ed25519 verification key, per the subset of the DID Core spec this
/// crate needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DidDocument {
    pub id: String,
    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    #[serde(rename = "publicKeyMultibase")]
    pub public_key_multibase: String,
}

const KEY_TYPE: &str = "Ed25519VerificationKey2020";

/// Builds the DID document published at a `did:web` agent's
/// `.well-known/did.json`, binding `did` to the public half of `keypair`.
pub fn build_did_document(did: &str, keypair: &Keypair) -> DidDocument {
    let key_id = format!("{did}#key-1");
    let encoded = multibase_encode(&keypair.public().encode_protobuf());
    DidDocument {
        id: did.to_string(),
        verification_method: vec![VerificationMethod {
            id: key_id,
            method_type: KEY_TYPE.to_string(),
            controller: did.to_string(),
            public_key_multibase: encoded,
        }],
    }
}

fn multibase_encode(bytes: &[u8]) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    format!("u{}", URL_SAFE_NO_PAD.encode(bytes))
}

fn multibase_decode(value: &str) -> Result<Vec<u8>> {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    let rest = value
        .strip_prefix('u')
        .ok_or_else(|| IdentityError::MalformedDidDocument("unsupported multibase prefix".into()))?;
    URL_SAFE_NO_PAD
        .decode(rest)
        .map_err(|e| IdentityError::MalformedDidDocument(format!("bad multibase encoding: {e}")))
}

impl DidDocument {
    /// Extracts the verification public key for `did`'s first method. Only
    /// useful when the document carries exactly one key; a signer's `kid`
    /// should be resolved with `public_key_for_kid` instead whenever the
    /// signature names one.
    pub fn public_key(&self) -> Result<PublicKey> {
        let method = self
            .verification_method
            .first()
            .ok_or_else(|| IdentityError::MalformedDidDocument("no verification method".into()))?;
        Self::decode_method(method)
    }

    /// Extracts the verification public key whose `id` matches `kid`, as
    /// named in a card's JWS header.
    pub fn public_key_for_kid(&self, kid: &str) -> Result<PublicKey> {
        let method = self
            .verification_method
            .iter()
            .find(|m| m.id == kid)
            .ok_or_else(|| IdentityError::MalformedDidDocument(format!("no verification method for kid {kid}")))?;
        Self::decode_method(method)
    }

    fn decode_method(method: &VerificationMethod) -> Result<PublicKey> {
        let bytes = multibase_decode(&method.public_key_multibase)?;
        PublicKey::try_decode_protobuf(&bytes)
            .map_err(|e| IdentityError::MalformedDidDocument(e.to_string()))
    }
}

/// Resolves a DID to its document. Implementations may hit the network
/// (`did:web`) or a fixture (tests).
#[async_trait]
pub trait DidResolver: Send + Sync {
    async fn resolve(&self, did: &str) -> Result<DidDocument>;
}

/// Resolves `did:web:<domain>[:<path>...]` identifiers over HTTPS, per the
/// did:web method spec: the domain becomes a `.well-known/did.json` GET
/// (or `<path>/did.json` when the DID carries a path component).
pub struct DidWebResolver {
    client: reqwest::Client,
}

impl DidWebResolver {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest client builds with static config"),
        }
    }

    fn url_for(did: &str) -> Result<String> {
        let rest = did
            .strip_prefix("did:web:")
            .ok_or_else(|| IdentityError::UnsupportedDidMethod(did.to_string()))?;
        let mut segments = rest.split(':').map(|s| {
            percent_decode(s)
        });
        let host = segments
            .next()
            .ok_or_else(|| IdentityError::MalformedDidDocument("empty did:web subject".into()))?;
        let path_segments: Vec<String> = segments.collect();
        if path_segments.is_empty() {
            Ok(format!("https://{host}/.well-known/did.json"))
        } else {
            Ok(format!("https://{host}/{}/did.json", path_segments.join("/")))
        }
    }
}

impl Default for DidWebResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn percent_decode(segment: &str) -> String {
    segment.replace("%3A", ":")
}

#[async_trait]
impl DidResolver for DidWebResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument> {
        let url = Self::url_for(did)?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IdentityError::DidResolution(format!("GET {url} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(IdentityError::DidResolution(format!(
                "GET {url} returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| IdentityError::MalformedDidDocument(e.to_string()))
    }
}

/// A fixture resolver for tests: documents are registered in memory rather
/// than fetched over HTTP.
#[derive(Default)]
pub struct InMemoryDidResolver {
    documents: Mutex<HashMap<String, DidDocument>>,
}

impl InMemoryDidResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, did: impl Into<String>, document: DidDocument) {
        self.documents.lock().unwrap().insert(did.into(), document);
    }
}

#[async_trait]
impl DidResolver for InMemoryDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument> {
        self.documents
            .lock()
            .unwrap()
            .get(did)
            .cloned()
            .ok_or_else(|| IdentityError::DidResolution(format!("unknown did: {did}")))
    }
}

/// Wraps a `DidResolver` with a small bounded TTL cache, so repeated card
/// verification against the same peer doesn't re-fetch its DID document on
/// every message.
pub struct CachingDidResolver<R> {
    inner: R,
    ttl: Duration,
    cache: Mutex<HashMap<String, (DidDocument, Instant)>>,
}

impl<R: DidResolver> CachingDidResolver<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<R: DidResolver> DidResolver for CachingDidResolver<R> {
    async fn resolve(&self, did: &str) -> Result<DidDocument> {
        if let Some((doc, fetched_at)) = self.cache.lock().unwrap().get(did).cloned() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(doc);
            }
        }
        let doc = self.inner.resolve(did).await?;
        self.cache
            .lock()
            .unwrap()
            .insert(did.to_string(), (doc.clone(), Instant::now()));
        Ok(doc)
    }
}
