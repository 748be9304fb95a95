//! # Claim translation
//!
//! Bidirectional translation between the external claim representation (a
//! JSON object keyed by claim name) and the canonical claim set (a CBOR map
//! keyed by integer label). Translation is pure: it never touches keys,
//! clocks, or the wire format.
//!
//! Label numbers are only unique within their claim's own namespace, so the
//! reverse direction selects the nested label table from the *outer* claim
//! label rather than inspecting the nested value. Labels with no name in the
//! vocabulary fail open as their decimal string, which keeps
//! unrecognized-but-structurally-valid tokens inspectable, and claim names
//! outside the vocabulary pass through unchanged in both directions.

use crate::claims::{ClaimKey, ClaimsMap};
use crate::constants::{cat_keys, cwt_keys, match_types, renewal_params, uri_components};
use crate::error::Error;
use crate::header::CborValue;
use ct_codecs::{Decoder as _, Encoder as _, Hex};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// External claim representation: claim name to JSON value.
pub type ExternalClaims = serde_json::Map<String, Value>;

/// Claim name to canonical label, covering the full CAT vocabulary.
const CLAIM_LABELS: &[(&str, i32)] = &[
    ("iss", cwt_keys::ISS),
    ("sub", cwt_keys::SUB),
    ("aud", cwt_keys::AUD),
    ("exp", cwt_keys::EXP),
    ("nbf", cwt_keys::NBF),
    ("iat", cwt_keys::IAT),
    ("cti", cwt_keys::CTI),
    ("catreplay", cat_keys::CATREPLAY),
    ("catpor", cat_keys::CATPOR),
    ("catv", cat_keys::CATV),
    ("catnip", cat_keys::CATNIP),
    ("catu", cat_keys::CATU),
    ("catm", cat_keys::CATM),
    ("catalpn", cat_keys::CATALPN),
    ("cath", cat_keys::CATH),
    ("catgeoiso3166", cat_keys::CATGEOISO3166),
    ("catgeocoord", cat_keys::CATGEOCOORD),
    ("catgeoalt", cat_keys::CATGEOALT),
    ("cattpk", cat_keys::CATTPK),
    ("catifdata", cat_keys::CATIFDATA),
    ("catdpop", cat_keys::CATDPOP),
    ("catif", cat_keys::CATIF),
    ("catr", cat_keys::CATR),
    ("cattprint", cat_keys::CATTPRINT),
];

/// URI component names for entries of the catu claim.
const URI_COMPONENT_LABELS: &[(&str, i32)] = &[
    ("scheme", uri_components::SCHEME),
    ("host", uri_components::HOST),
    ("port", uri_components::PORT),
    ("path", uri_components::PATH),
    ("query", uri_components::QUERY),
    ("parent_path", uri_components::PARENT_PATH),
    ("filename", uri_components::FILENAME),
    ("stem", uri_components::STEM),
    ("extension", uri_components::EXTENSION),
];

/// Match-type names, used when reversing nested labels under the catm claim.
const MATCH_TYPE_LABELS: &[(&str, i32)] = &[
    ("exact", match_types::EXACT),
    ("prefix", match_types::PREFIX),
    ("suffix", match_types::SUFFIX),
    ("contains", match_types::CONTAINS),
    ("regex", match_types::REGEX),
    ("sha256", match_types::SHA256),
    ("sha512-256", match_types::SHA512_256),
];

/// Renewal parameter names for entries of the catr claim.
const RENEWAL_LABELS: &[(&str, i32)] = &[
    ("renewal_type", renewal_params::TYPE),
    ("exp_extension", renewal_params::EXPADD),
    ("renewal_deadline", renewal_params::DEADLINE),
];

fn forward_lookup(table: &[(&str, i32)], name: &str) -> Option<i32> {
    table.iter().find(|(n, _)| *n == name).map(|(_, l)| *l)
}

// Inverse maps are built once; reverse translation never scans the tables.

fn claim_names() -> &'static HashMap<i32, &'static str> {
    static NAMES: OnceLock<HashMap<i32, &'static str>> = OnceLock::new();
    NAMES.get_or_init(|| CLAIM_LABELS.iter().map(|(n, l)| (*l, *n)).collect())
}

fn nested_names(outer: i32) -> Option<&'static HashMap<i32, &'static str>> {
    static URI: OnceLock<HashMap<i32, &'static str>> = OnceLock::new();
    static MATCH: OnceLock<HashMap<i32, &'static str>> = OnceLock::new();
    static RENEWAL: OnceLock<HashMap<i32, &'static str>> = OnceLock::new();

    fn build(table: &'static [(&'static str, i32)]) -> HashMap<i32, &'static str> {
        table.iter().map(|(n, l)| (*l, *n)).collect()
    }

    match outer {
        cat_keys::CATU => Some(URI.get_or_init(|| build(URI_COMPONENT_LABELS))),
        cat_keys::CATM => Some(MATCH.get_or_init(|| build(MATCH_TYPE_LABELS))),
        cat_keys::CATR => Some(RENEWAL.get_or_init(|| build(RENEWAL_LABELS))),
        _ => None,
    }
}

/// Translate an external claim set into the canonical form.
///
/// Claims with a claim-specific wire encoding (`catu`, `catalpn`, `catr`) are
/// re-encoded as described in the CAT specification; every other known claim
/// converts generically. Claim names that are decimal integers address that
/// label directly, which makes reverse-then-forward translation lossless for
/// labels outside the vocabulary. Names the vocabulary does not know pass
/// through as text keys.
pub fn to_canonical(external: &ExternalClaims) -> Result<ClaimsMap, Error> {
    let mut canonical = ClaimsMap::new();

    for (name, value) in external {
        let Some(label) = forward_lookup(CLAIM_LABELS, name).or_else(|| name.parse::<i32>().ok())
        else {
            canonical.insert(ClaimKey::Name(name.clone()), json_to_cbor(name, value)?);
            continue;
        };

        let encoded = match label {
            cat_keys::CATU => encode_catu(value)?,
            cat_keys::CATALPN => encode_catalpn(value)?,
            cat_keys::CATR => encode_catr(value)?,
            _ => json_to_cbor(name, value)?,
        };
        canonical.insert(ClaimKey::Label(label), encoded);
    }

    Ok(canonical)
}

/// Translate a canonical claim set back into the external form.
pub fn to_external(canonical: &ClaimsMap) -> ExternalClaims {
    let mut external = ExternalClaims::new();

    for (key, value) in canonical {
        let (name, nested) = match key {
            ClaimKey::Label(label) => {
                let name = claim_names()
                    .get(label)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| label.to_string());
                (name, nested_names(*label))
            }
            ClaimKey::Name(name) => (name.clone(), None),
        };
        external.insert(name, cbor_to_json(value, nested));
    }

    external
}

/// Encode the catu claim: URI component name -> (match type, pattern) pair.
///
/// Patterns for hash match types arrive as hexadecimal text and are carried
/// on the wire as raw digest bytes.
fn encode_catu(value: &Value) -> Result<CborValue, Error> {
    let Value::Object(components) = value else {
        return Err(Error::Encoding("catu claim must be an object".to_string()));
    };

    let mut map = BTreeMap::new();
    for (component, pair) in components {
        let label = forward_lookup(URI_COMPONENT_LABELS, component)
            .or_else(|| component.parse::<i32>().ok())
            .ok_or_else(|| {
                Error::Encoding(format!("unknown catu component: {component}"))
            })?;

        let (match_type, pattern) = match pair.as_array().map(|a| a.as_slice()) {
            Some([Value::Number(m), Value::String(p)]) => {
                let m = m.as_i64().ok_or_else(|| {
                    Error::Encoding(format!("catu match type for {component} is not an integer"))
                })?;
                (m, p)
            }
            _ => {
                return Err(Error::Encoding(format!(
                    "catu component {component} must be a [match_type, pattern] pair"
                )))
            }
        };

        let pattern = if match_type == match_types::SHA256 as i64
            || match_type == match_types::SHA512_256 as i64
        {
            let digest = Hex::decode_to_vec(pattern, None).map_err(|_| {
                Error::Encoding(format!(
                    "catu hash pattern for {component} is not valid hex"
                ))
            })?;
            CborValue::Bytes(digest)
        } else {
            CborValue::Text(pattern.clone())
        };

        map.insert(
            label,
            CborValue::Array(vec![CborValue::Integer(match_type), pattern]),
        );
    }

    Ok(CborValue::Map(map))
}

/// Encode the catalpn claim: a protocol name or list of them, as raw bytes.
fn encode_catalpn(value: &Value) -> Result<CborValue, Error> {
    match value {
        Value::String(s) => Ok(CborValue::Bytes(s.as_bytes().to_vec())),
        Value::Array(entries) => {
            let mut encoded = Vec::with_capacity(entries.len());
            for entry in entries {
                let Value::String(s) = entry else {
                    return Err(Error::Encoding(
                        "catalpn entries must be strings".to_string(),
                    ));
                };
                encoded.push(CborValue::Bytes(s.as_bytes().to_vec()));
            }
            Ok(CborValue::Array(encoded))
        }
        _ => Err(Error::Encoding(
            "catalpn claim must be a string or an array of strings".to_string(),
        )),
    }
}

/// Encode the catr claim from its issuance field names.
///
/// Input uses `renewabletype` / `expext` / `deadline`; the canonical form uses
/// the renewal parameter labels, with the deadline present only if supplied.
fn encode_catr(value: &Value) -> Result<CborValue, Error> {
    let Value::Object(fields) = value else {
        return Err(Error::Encoding("catr claim must be an object".to_string()));
    };

    let int_field = |name: &str| -> Result<Option<i64>, Error> {
        match fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
                Error::Encoding(format!("catr field {name} is not an integer"))
            }),
            Some(_) => Err(Error::Encoding(format!(
                "catr field {name} is not an integer"
            ))),
        }
    };

    let mut map = BTreeMap::new();
    if let Some(renewal_type) = int_field("renewabletype")? {
        map.insert(renewal_params::TYPE, CborValue::Integer(renewal_type));
    }
    if let Some(extension) = int_field("expext")? {
        map.insert(renewal_params::EXPADD, CborValue::Integer(extension));
    }
    if let Some(deadline) = int_field("deadline")? {
        map.insert(renewal_params::DEADLINE, CborValue::Integer(deadline));
    }

    Ok(CborValue::Map(map))
}

/// Generic JSON to CBOR conversion for claims without a specific encoding.
fn json_to_cbor(name: &str, value: &Value) -> Result<CborValue, Error> {
    match value {
        Value::String(s) => Ok(CborValue::Text(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(CborValue::Integer)
            .ok_or_else(|| Error::Encoding(format!("claim {name} is not an integer"))),
        Value::Array(entries) => {
            let mut encoded = Vec::with_capacity(entries.len());
            for entry in entries {
                encoded.push(json_to_cbor(name, entry)?);
            }
            Ok(CborValue::Array(encoded))
        }
        Value::Null => Ok(CborValue::Null),
        Value::Bool(_) | Value::Object(_) => Err(Error::Encoding(format!(
            "claim {name} has no canonical encoding"
        ))),
    }
}

/// Convert a canonical value back to JSON.
///
/// Byte strings render as text when they are valid UTF-8 (ALPN identifiers),
/// otherwise as lowercase hex (hash digests, token ids). Nested map keys
/// reverse through `nested`, falling back to decimal strings.
fn cbor_to_json(value: &CborValue, nested: Option<&HashMap<i32, &'static str>>) -> Value {
    match value {
        CborValue::Integer(i) => Value::from(*i),
        CborValue::Text(s) => Value::String(s.clone()),
        CborValue::Bytes(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::String(Hex::encode_to_string(b).unwrap_or_default()),
        },
        CborValue::Array(entries) => Value::Array(
            entries
                .iter()
                .map(|entry| cbor_to_json(entry, nested))
                .collect(),
        ),
        CborValue::Map(map) => {
            let mut object = serde_json::Map::new();
            for (label, entry) in map {
                let name = nested
                    .and_then(|table| table.get(label))
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| label.to_string());
                object.insert(name, cbor_to_json(entry, nested));
            }
            Value::Object(object)
        }
        CborValue::Null => Value::Null,
    }
}
