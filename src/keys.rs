//! # Key registry
//!
//! Resolves key identifiers to verification keys and supplies the signing key
//! for issuance. The table is fixed: one symmetric HMAC-SHA256 key used for
//! both signing and verification, and one ECDSA P-256 public key used for
//! verification only.
//!
//! The symmetric key is the single piece of shared mutable state in the
//! service. Rotation swaps it under a write lock; readers clone the current
//! key and never observe a torn value. Rotation immediately invalidates
//! verification of tokens signed with the previous key.

use crate::error::Error;
use crate::header::Algorithm;
use ct_codecs::{Decoder as _, Encoder as _, Hex};
use p256::ecdsa::VerifyingKey;
use p256::pkcs8::DecodePublicKey;
use rand::RngCore;
use std::sync::RwLock;

/// Key identifier for the symmetric HMAC-SHA256 key
pub const KID_HS256: &str = "akamai_key_hs256";
/// Key identifier for the ECDSA P-256 public key
pub const KID_ES256: &str = "akamai_key_es256";

/// Fallback symmetric key used when `HS256_KEY` is not set.
///
/// Deploying with this key is a known weakness; startup logs a warning when
/// it is in use.
pub const DEFAULT_HS256_KEY_HEX: &str =
    "403697de87af64611c1d32a05dab0fe1fcb715a86ab435f1ec99192d79569388";

/// ES256 public key bound to [`KID_ES256`]. There is no issuance path for
/// this key; it only verifies externally signed tokens.
const ES256_PUBLIC_KEY_PEM: &str = "-----BEGIN PUBLIC KEY-----
MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAED5fNFnQYFBOjWa1ndpQK3ZrzXuHD
77oGDgPaMNbtZ7tjiJLobxq2qnfHznEk58Jj33sBVYc/L50SAuToJo1nvA==
-----END PUBLIC KEY-----";

/// A key resolved for verification, tagged by algorithm family.
#[derive(Debug, Clone)]
pub enum VerificationKey {
    /// Raw symmetric key material for HMAC-SHA256
    Hmac(Vec<u8>),
    /// ECDSA P-256 public key for ES256
    EcdsaP256(Box<VerifyingKey>),
}

/// Process-wide key table, immutable apart from symmetric key rotation.
#[derive(Debug)]
pub struct KeyRegistry {
    hs256_key: RwLock<Vec<u8>>,
    es256_key: VerifyingKey,
}

impl KeyRegistry {
    /// Create a registry with the given symmetric key material.
    pub fn new(hs256_key: Vec<u8>) -> Result<Self, Error> {
        let es256_key = VerifyingKey::from_public_key_pem(ES256_PUBLIC_KEY_PEM)
            .map_err(|err| Error::Encoding(format!("invalid ES256 public key: {err}")))?;
        Ok(Self {
            hs256_key: RwLock::new(hs256_key),
            es256_key,
        })
    }

    /// Create a registry from a hex-encoded symmetric key.
    pub fn from_hex(hs256_key_hex: &str) -> Result<Self, Error> {
        let key = Hex::decode_to_vec(hs256_key_hex, None)
            .map_err(|_| Error::Encoding("HS256 key is not valid hex".to_string()))?;
        Self::new(key)
    }

    /// Resolve a key identifier to its verification key.
    ///
    /// Fails with [`Error::UnknownKey`] for any identifier outside the fixed
    /// table; the caller must not fall back to a default key.
    pub fn resolve(&self, kid: &str) -> Result<VerificationKey, Error> {
        match kid {
            KID_HS256 => Ok(VerificationKey::Hmac(self.current_hs256_key())),
            KID_ES256 => Ok(VerificationKey::EcdsaP256(Box::new(self.es256_key.clone()))),
            _ => Err(Error::UnknownKey(kid.to_string())),
        }
    }

    /// The key and algorithm used for issuance. Always the symmetric key.
    pub fn signing_key(&self) -> (Vec<u8>, Algorithm) {
        (self.current_hs256_key(), Algorithm::HmacSha256)
    }

    /// Replace the symmetric signing key with fresh random material.
    ///
    /// The swap is atomic: concurrent callers observe either the old key or
    /// the new one. Returns the new key as hex for the caller to distribute.
    pub fn rotate_signing_key(&self) -> String {
        let mut key = vec![0u8; 32];
        rand::rng().fill_bytes(&mut key);
        let hex = Hex::encode_to_string(&key).unwrap_or_default();

        let mut current = self
            .hs256_key
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = key;

        hex
    }

    fn current_hs256_key(&self) -> Vec<u8> {
        self.hs256_key
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
