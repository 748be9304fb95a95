//! # CAT Token Service
//!
//! Issues and validates Common Access Tokens (a CBOR Web Token variant) over
//! HTTP. A client posts a JSON claim set to receive a signed, base64url-encoded
//! token; a client or resource server later submits a token and gets back the
//! decoded claim set or a rejection reason.
//!
//! The crate is organized around the token lifecycle:
//!
//! - [`labels`] translates between external (string-keyed) and canonical
//!   (integer-labeled) claim sets, including the claim-specific encodings for
//!   URI-match, ALPN, and renewal claims.
//! - [`keys`] resolves key identifiers to verification keys and owns the
//!   rotatable symmetric signing key.
//! - [`token`] is the COSE codec: envelope encode/decode and MAC/signature
//!   computation over the canonical claim set.
//! - [`claims`] holds the structural and temporal rules a claim set must
//!   satisfy.
//! - [`issuer`] and [`verifier`] orchestrate the two halves of the lifecycle.
//! - [`server`] binds everything to the HTTP routes.
//!
//! ## Example
//!
//! ```rust
//! use cat_token_service::keys::KeyRegistry;
//! use cat_token_service::{issuer, verifier};
//!
//! let registry = KeyRegistry::from_hex(
//!     "403697de87af64611c1d32a05dab0fe1fcb715a86ab435f1ec99192d79569388",
//! )
//! .expect("valid key");
//!
//! let mut claims = serde_json::Map::new();
//! claims.insert("sub".to_string(), serde_json::Value::from("alice"));
//!
//! let token = issuer::issue(&registry, &claims).expect("issuance succeeds");
//! let payload = verifier::verify(&registry, &token).expect("verification succeeds");
//! assert_eq!(payload.get("sub"), Some(&serde_json::Value::from("alice")));
//! ```

pub mod claims;
pub mod config;
pub mod constants;
pub mod error;
pub mod header;
pub mod issuer;
pub mod keys;
pub mod labels;
pub mod server;
pub mod token;
pub mod utils;
pub mod verifier;

pub use claims::{ClaimKey, ClaimsMap};
pub use constants::{cat_keys, cose_algs, cose_labels, cwt_keys, match_types, renewal_params, uri_components};
pub use error::Error;
pub use header::{Algorithm, CborValue, Header, HeaderMap, KeyId};
pub use keys::{KeyRegistry, VerificationKey};
pub use labels::ExternalClaims;
pub use token::Token;
pub use utils::current_timestamp;

#[cfg(test)]
mod tests;
