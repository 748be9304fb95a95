//! # Claim set rules
//!
//! The canonical claim set is a CBOR map from integer label to value
//! ([`ClaimsMap`]). This module holds the structural (well-formedness) rules a
//! claim set must satisfy before it may be signed, and the temporal
//! (acceptability) rules a decoded claim set must satisfy before it is
//! returned to a caller.

use crate::constants::{cat_keys, cwt_keys, renewal_params};
use crate::error::Error;
use crate::header::CborValue;
use std::collections::BTreeMap;

/// Key of a canonical claim map entry.
///
/// Claims in the vocabulary travel by integer label; names outside the
/// vocabulary pass through as text keys, so a claim set survives translation
/// even when this service does not know the claim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClaimKey {
    /// Registered integer claim label
    Label(i32),
    /// Pass-through claim name
    Name(String),
}

impl From<i32> for ClaimKey {
    fn from(label: i32) -> Self {
        ClaimKey::Label(label)
    }
}

/// Type alias for claims maps
pub type ClaimsMap = BTreeMap<ClaimKey, CborValue>;

/// Check that a canonical claim set is structurally valid.
///
/// Every known label must carry the type the CAT specification assigns to it;
/// labels and names this service does not know are allowed through untouched.
/// The error message is surfaced verbatim as the issuance failure.
pub fn check_well_formed(claims: &ClaimsMap) -> Result<(), Error> {
    if claims.is_empty() {
        return Err(Error::NotWellFormed("claim set is empty".to_string()));
    }

    for (key, value) in claims {
        let ClaimKey::Label(label) = key else {
            continue;
        };
        match *label {
            cwt_keys::ISS | cwt_keys::SUB | cwt_keys::AUD => {
                if !matches!(value, CborValue::Text(_)) {
                    return Err(type_error(*label, "a text string", value));
                }
            }
            cwt_keys::EXP | cwt_keys::NBF | cwt_keys::IAT => {
                if !matches!(value, CborValue::Integer(_)) {
                    return Err(type_error(*label, "an integer", value));
                }
            }
            cwt_keys::CTI => {
                if !matches!(value, CborValue::Bytes(_)) {
                    return Err(type_error(*label, "a byte string", value));
                }
            }
            cat_keys::CATV | cat_keys::CATREPLAY | cat_keys::CATPOR => {
                if !matches!(value, CborValue::Integer(_)) {
                    return Err(type_error(*label, "an integer", value));
                }
            }
            cat_keys::CATU => check_catu(value)?,
            cat_keys::CATM => {
                let CborValue::Array(methods) = value else {
                    return Err(type_error(*label, "an array", value));
                };
                if methods.iter().any(|m| !matches!(m, CborValue::Text(_))) {
                    return Err(Error::NotWellFormed(
                        "catm claim methods must be text strings".to_string(),
                    ));
                }
            }
            cat_keys::CATALPN => check_catalpn(value)?,
            cat_keys::CATR => check_catr(value)?,
            _ => {}
        }
    }

    Ok(())
}

fn type_error(label: i32, expected: &str, got: &CborValue) -> Error {
    Error::NotWellFormed(format!(
        "claim {label} must be {expected}, got {got:?}"
    ))
}

fn check_catu(value: &CborValue) -> Result<(), Error> {
    let CborValue::Map(components) = value else {
        return Err(Error::NotWellFormed("catu claim must be a map".to_string()));
    };
    for (component, entry) in components {
        // Each entry is a (match-type, pattern) pair.
        let CborValue::Array(pair) = entry else {
            return Err(Error::NotWellFormed(format!(
                "catu component {component} must be a match pair"
            )));
        };
        let valid = pair.len() == 2
            && matches!(pair[0], CborValue::Integer(_))
            && matches!(pair[1], CborValue::Text(_) | CborValue::Bytes(_));
        if !valid {
            return Err(Error::NotWellFormed(format!(
                "catu component {component} must pair an integer match type with a text or byte pattern"
            )));
        }
    }
    Ok(())
}

fn check_catalpn(value: &CborValue) -> Result<(), Error> {
    match value {
        CborValue::Bytes(_) => Ok(()),
        CborValue::Array(entries)
            if entries.iter().all(|e| matches!(e, CborValue::Bytes(_))) =>
        {
            Ok(())
        }
        _ => Err(Error::NotWellFormed(
            "catalpn claim must be a byte string or an array of byte strings".to_string(),
        )),
    }
}

fn check_catr(value: &CborValue) -> Result<(), Error> {
    let CborValue::Map(params) = value else {
        return Err(Error::NotWellFormed("catr claim must be a map".to_string()));
    };
    for required in [renewal_params::TYPE, renewal_params::EXPADD] {
        if !matches!(params.get(&required), Some(CborValue::Integer(_))) {
            return Err(Error::NotWellFormed(format!(
                "catr claim must carry an integer renewal parameter {required}"
            )));
        }
    }
    if let Some(deadline) = params.get(&renewal_params::DEADLINE) {
        if !matches!(deadline, CborValue::Integer(_)) {
            return Err(Error::NotWellFormed(
                "catr renewal deadline must be an integer".to_string(),
            ));
        }
    }
    Ok(())
}

/// Check that a decoded claim set is currently acceptable.
///
/// Temporal validity only: `nbf <= now < exp`, with zero clock-skew tolerance.
/// Claims that are absent are not enforced.
pub fn check_acceptable(claims: &ClaimsMap, now: u64) -> Result<(), Error> {
    if let Some(CborValue::Integer(exp)) = claims.get(&ClaimKey::Label(cwt_keys::EXP)) {
        if now as i64 >= *exp {
            return Err(Error::Expired);
        }
    }

    if let Some(CborValue::Integer(nbf)) = claims.get(&ClaimKey::Label(cwt_keys::NBF)) {
        if (now as i64) < *nbf {
            return Err(Error::NotYetValid);
        }
    }

    Ok(())
}
