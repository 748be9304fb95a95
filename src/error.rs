//! Error types for the CAT token service
//!
//! Issuance and verification failures are distinguishable by variant so the
//! HTTP layer (and callers in general) can tell a malformed token from an
//! unknown key from a cryptographic failure.

use thiserror::Error;

/// Errors that can occur when issuing or validating Common Access Tokens
#[derive(Error, Debug)]
pub enum Error {
    /// Error during CBOR encoding; the encoder writes to memory, so the
    /// write error is infallible
    #[error("CBOR encoding error: {0}")]
    CborEncode(#[from] minicbor::encode::Error<std::convert::Infallible>),

    /// Error during CBOR decoding
    #[error("CBOR decode error: {0}")]
    CborDecode(#[from] minicbor::decode::Error),

    /// Token could not be decoded at all (bad base64url or bad COSE structure)
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Claim set fails the CAT structural rules
    #[error("Claim set is not well-formed: {0}")]
    NotWellFormed(String),

    /// Key identifier is not registered
    #[error("Unknown key identifier: {0}")]
    UnknownKey(String),

    /// Signature verification failed
    #[error("Signature verification failed. The token's signature does not match the expected signature")]
    SignatureVerification,

    /// Token failed the acceptability check (temporal validity)
    #[error("Token is not acceptable: {0}")]
    NotAcceptable(String),

    /// Token expired
    #[error("Token expired. The token's expiration time (exp) is in the past")]
    Expired,

    /// Token not yet valid
    #[error("Token not yet valid. The token's not-before time (nbf) is in the future")]
    NotYetValid,

    /// Invalid algorithm
    #[error("Invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    /// A claim value could not be represented in the canonical encoding
    #[error("Claim encoding error: {0}")]
    Encoding(String),
}
