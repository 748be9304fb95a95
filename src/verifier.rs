//! # Token verification
//!
//! Decodes a transport-encoded token, resolves its key by identifier,
//! verifies the MAC or signature, checks acceptability, and reconstructs the
//! external claim representation. Every failure path is a distinct error
//! variant so callers can map rejection reasons faithfully.

use crate::claims::check_acceptable;
use crate::error::Error;
use crate::keys::KeyRegistry;
use crate::labels::{to_external, ExternalClaims};
use crate::token::Token;
use crate::utils::current_timestamp;
use ct_codecs::{Base64UrlSafeNoPadding, Decoder as _};

/// Verify a transport-encoded token and return its external claim set.
///
/// The key identifier must resolve in the registry before any cryptographic
/// check runs; an unknown identifier stops verification without touching the
/// signature.
pub fn verify(registry: &KeyRegistry, encoded: &str) -> Result<ExternalClaims, Error> {
    let bytes = Base64UrlSafeNoPadding::decode_to_vec(encoded.trim(), None)
        .map_err(|_| Error::MalformedToken("invalid base64url encoding".to_string()))?;

    let token = Token::from_bytes(&bytes).map_err(|err| match err {
        Error::MalformedToken(_) => err,
        other => Error::MalformedToken(other.to_string()),
    })?;

    let kid = token
        .key_id()
        .ok_or_else(|| Error::MalformedToken("token carries no key identifier".to_string()))?;
    let kid = String::from_utf8(kid.as_bytes().to_vec())
        .map_err(|_| Error::MalformedToken("key identifier is not valid UTF-8".to_string()))?;

    let key = registry.resolve(&kid)?;

    token.verify(&key).map_err(|err| match err {
        Error::SignatureVerification => err,
        other => Error::MalformedToken(other.to_string()),
    })?;

    check_acceptable(&token.claims, current_timestamp())
        .map_err(|err| Error::NotAcceptable(err.to_string()))?;

    Ok(to_external(&token.claims))
}
