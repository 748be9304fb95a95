//! # Token issuance
//!
//! Drives a claim set from its external form to a transport-encoded token:
//! translate, stamp timestamps, check well-formedness, build headers, MAC,
//! and base64url-encode. Issuance is a single attempt; any failure aborts
//! and surfaces to the caller.

use crate::claims::{check_well_formed, ClaimKey};
use crate::constants::cwt_keys;
use crate::error::Error;
use crate::header::{Algorithm, CborValue, Header, KeyId};
use crate::keys::{KeyRegistry, KID_HS256};
use crate::labels::{to_canonical, ExternalClaims};
use crate::token::Token;
use crate::utils::current_timestamp;
use ct_codecs::{Base64UrlSafeNoPadding, Encoder as _};

/// Issue a token over the given external claim set.
///
/// The issued-at and not-before claims are stamped with the current time at
/// signing, overriding any caller-supplied value. The token is always signed
/// with the registry's symmetric key and carries [`KID_HS256`] in its
/// unprotected header.
pub fn issue(registry: &KeyRegistry, external: &ExternalClaims) -> Result<String, Error> {
    let mut claims = to_canonical(external)?;

    // Timestamps are server-controlled, never taken from the request.
    let now = current_timestamp() as i64;
    claims.insert(ClaimKey::Label(cwt_keys::IAT), CborValue::Integer(now));
    claims.insert(ClaimKey::Label(cwt_keys::NBF), CborValue::Integer(now));

    check_well_formed(&claims)?;

    let header = Header::new()
        .with_algorithm(Algorithm::HmacSha256)
        .with_unprotected_key_id(KeyId::string(KID_HS256));

    let (key, _) = registry.signing_key();
    let token = Token::mac(claims, &key, header)?;
    let bytes = token.to_bytes()?;

    Base64UrlSafeNoPadding::encode_to_string(&bytes)
        .map_err(|_| Error::Encoding("token could not be base64url-encoded".to_string()))
}
