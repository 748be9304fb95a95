//! # Header types for Common Access Tokens
//!
//! Headers are divided into two categories:
//!
//! - **Protected headers**: integrity-protected, part of the signature input.
//!   The algorithm always lives here.
//! - **Unprotected headers**: not integrity-protected. The service places the
//!   key identifier here, matching the token layout it accepts on validation.

use crate::constants::{cose_algs, cose_labels};
use std::collections::BTreeMap;

/// Supported algorithms for token signing and verification.
///
/// Issuance always uses HMAC-SHA256; ES256 exists for the verification-only
/// path bound to the asymmetric key in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// HMAC with SHA-256 (COSE algorithm identifier: 5)
    HmacSha256,
    /// ECDSA with P-256 and SHA-256 (COSE algorithm identifier: -7)
    Es256,
}

impl Algorithm {
    /// Get the algorithm identifier as defined in the COSE spec
    pub fn identifier(&self) -> i32 {
        match self {
            Algorithm::HmacSha256 => cose_algs::HMAC_SHA_256,
            Algorithm::Es256 => cose_algs::ES256,
        }
    }

    /// Create an Algorithm from a COSE identifier
    pub fn from_identifier(id: i32) -> Option<Self> {
        match id {
            cose_algs::HMAC_SHA_256 => Some(Algorithm::HmacSha256),
            cose_algs::ES256 => Some(Algorithm::Es256),
            _ => None,
        }
    }
}

/// Key identifier that can be either a binary or string value.
///
/// The key identifier (kid) selects the verification key in the registry.
/// Issued tokens carry the kid as a byte string in the unprotected header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyId {
    /// Binary key identifier
    Binary(Vec<u8>),
    /// String key identifier
    String(String),
}

impl KeyId {
    /// Create a new binary key identifier
    pub fn binary<T: Into<Vec<u8>>>(data: T) -> Self {
        KeyId::Binary(data.into())
    }

    /// Create a new string key identifier
    pub fn string<T: Into<String>>(data: T) -> Self {
        KeyId::String(data.into())
    }

    /// Get the key identifier as bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            KeyId::Binary(data) => data,
            KeyId::String(data) => data.as_bytes(),
        }
    }
}

/// CBOR value type for header and claim values.
///
/// A closed variant set covering every shape a CAT claim can take on the wire:
/// integers, byte strings, text strings, integer-keyed maps, arrays, and null.
///
/// ```
/// use cat_token_service::CborValue;
/// use std::collections::BTreeMap;
///
/// let mut map = BTreeMap::new();
/// map.insert(0, CborValue::Text("https".to_string()));
/// let nested = CborValue::Map(map);
/// assert!(matches!(nested, CborValue::Map(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CborValue {
    /// Integer value (signed 64-bit integer)
    Integer(i64),
    /// Byte string value
    Bytes(Vec<u8>),
    /// Text string value
    Text(String),
    /// Map value (nested CBOR map with integer keys)
    Map(BTreeMap<i32, CborValue>),
    /// Array value
    Array(Vec<CborValue>),
    /// Null value
    Null,
}

/// Type alias for header maps
pub type HeaderMap = BTreeMap<i32, CborValue>;

/// Header for a Common Access Token.
#[derive(Debug, Clone, Default)]
pub struct Header {
    /// Protected header parameters (integrity protected)
    pub protected: HeaderMap,
    /// Unprotected header parameters
    pub unprotected: HeaderMap,
}

impl Header {
    /// Creates a new empty header with no parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the algorithm in the protected header.
    ///
    /// The algorithm is a critical parameter and must be integrity-protected.
    pub fn with_algorithm(mut self, alg: Algorithm) -> Self {
        self.protected
            .insert(cose_labels::ALG, CborValue::Integer(alg.identifier() as i64));
        self
    }

    /// Sets the key identifier in the unprotected header.
    ///
    /// String identifiers are carried as byte strings, matching the wire form
    /// the verifier expects.
    ///
    /// ```
    /// use cat_token_service::{Header, KeyId};
    ///
    /// let header = Header::new().with_unprotected_key_id(KeyId::string("akamai_key_hs256"));
    /// assert!(header.key_id().is_some());
    /// ```
    pub fn with_unprotected_key_id(mut self, kid: KeyId) -> Self {
        self.unprotected
            .insert(cose_labels::KID, CborValue::Bytes(kid.as_bytes().to_vec()));
        self
    }

    /// Gets the algorithm from the protected header.
    ///
    /// Returns `None` if the algorithm is not present or not recognized.
    pub fn algorithm(&self) -> Option<Algorithm> {
        if let Some(CborValue::Integer(alg)) = self.protected.get(&cose_labels::ALG) {
            Algorithm::from_identifier(*alg as i32)
        } else {
            None
        }
    }

    /// Gets the key identifier from the unprotected or protected header.
    ///
    /// Issued tokens carry the kid in the unprotected header, so that is read
    /// first; a protected kid is honored when the unprotected one is absent.
    pub fn key_id(&self) -> Option<KeyId> {
        for map in [&self.unprotected, &self.protected] {
            match map.get(&cose_labels::KID) {
                Some(CborValue::Bytes(data)) => return Some(KeyId::Binary(data.clone())),
                Some(CborValue::Text(data)) => return Some(KeyId::String(data.clone())),
                _ => {}
            }
        }
        None
    }
}
