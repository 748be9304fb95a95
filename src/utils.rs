//! Utility functions for the CAT token service

use crate::error::Error;
use hmac_sha256::HMAC;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};

/// Compute HMAC-SHA256 signature
pub fn compute_hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    HMAC::mac(data, key).to_vec()
}

/// Verify HMAC-SHA256 signature
pub fn verify_hmac_sha256(key: &[u8], data: &[u8], signature: &[u8]) -> Result<(), Error> {
    let computed_mac = HMAC::mac(data, key);

    if ct_codecs::verify(&computed_mac, signature) {
        Ok(())
    } else {
        Err(Error::SignatureVerification)
    }
}

/// Verify an ES256 signature over the COSE Signature1 input.
///
/// COSE carries ECDSA signatures as raw `r || s` bytes, not DER.
pub fn verify_es256(key: &VerifyingKey, data: &[u8], signature: &[u8]) -> Result<(), Error> {
    let signature =
        Signature::from_slice(signature).map_err(|_| Error::SignatureVerification)?;
    key.verify(data, &signature)
        .map_err(|_| Error::SignatureVerification)
}

/// Get current timestamp in seconds since Unix epoch
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}
