//! Tests for the CAT token service core

use crate::claims::{check_acceptable, check_well_formed, ClaimKey, ClaimsMap};
use crate::constants::{
    cat_keys, cbor_tags, cose_algs, cose_labels, cwt_keys, match_types, renewal_params,
    uri_components,
};
use crate::error::Error;
use crate::header::{Algorithm, CborValue, Header, KeyId};
use crate::keys::{KeyRegistry, VerificationKey, DEFAULT_HS256_KEY_HEX, KID_ES256, KID_HS256};
use crate::labels::{to_canonical, to_external, ExternalClaims};
use crate::token::Token;
use crate::utils::{compute_hmac_sha256, current_timestamp};
use crate::{issuer, verifier};
use ct_codecs::{Base64UrlSafeNoPadding, Decoder as _, Encoder as _};
use minicbor::data::Tag;
use minicbor::Encoder;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use serde_json::{json, Value};

fn registry() -> KeyRegistry {
    KeyRegistry::from_hex(DEFAULT_HS256_KEY_HEX).expect("default key is valid hex")
}

fn external(value: Value) -> ExternalClaims {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

fn encode_token(token: &Token) -> String {
    let bytes = token.to_bytes().expect("token encodes");
    Base64UrlSafeNoPadding::encode_to_string(&bytes).expect("token base64-encodes")
}

#[test]
fn test_scalar_claims_round_trip() {
    let claims = external(json!({
        "iss": "issuer",
        "sub": "alice",
        "aud": "cdn",
        "exp": 1_900_000_000u64,
        "catv": 1,
    }));

    let canonical = to_canonical(&claims).expect("translation succeeds");
    assert!(matches!(
        canonical.get(&ClaimKey::Label(cwt_keys::SUB)),
        Some(CborValue::Text(s)) if s == "alice"
    ));
    assert!(matches!(
        canonical.get(&ClaimKey::Label(cwt_keys::EXP)),
        Some(CborValue::Integer(1_900_000_000))
    ));

    assert_eq!(Value::Object(to_external(&canonical)), Value::Object(claims));
}

#[test]
fn test_catm_list_round_trip() {
    let claims = external(json!({ "catm": ["GET", "HEAD"] }));

    let canonical = to_canonical(&claims).expect("translation succeeds");
    let Some(CborValue::Array(methods)) = canonical.get(&ClaimKey::Label(cat_keys::CATM)) else {
        panic!("catm did not translate to an array");
    };
    assert_eq!(methods.len(), 2);

    assert_eq!(Value::Object(to_external(&canonical)), Value::Object(claims));
}

#[test]
fn test_catu_translation_and_hash_patterns() {
    // The sha256 digest here is deliberately not valid UTF-8.
    let digest_hex = "ff0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
    let claims = external(json!({
        "catu": {
            "scheme": [match_types::EXACT, "https"],
            "path": [match_types::PREFIX, "/api"],
            "host": [match_types::SHA256, digest_hex],
        }
    }));

    let canonical = to_canonical(&claims).expect("translation succeeds");
    let Some(CborValue::Map(components)) = canonical.get(&ClaimKey::Label(cat_keys::CATU)) else {
        panic!("catu did not translate to a map");
    };

    let Some(CborValue::Array(pair)) = components.get(&uri_components::HOST) else {
        panic!("host component missing");
    };
    assert!(matches!(pair[0], CborValue::Integer(m) if m == match_types::SHA256 as i64));
    assert!(matches!(&pair[1], CborValue::Bytes(b) if b.len() == 32));

    // Hash patterns come back out as hex text; everything else is unchanged.
    assert_eq!(Value::Object(to_external(&canonical)), Value::Object(claims));
}

#[test]
fn test_catr_translation() {
    let now = current_timestamp();
    let claims = external(json!({
        "catr": { "renewabletype": 0, "expext": 3600, "deadline": now + 3000 }
    }));

    let canonical = to_canonical(&claims).expect("translation succeeds");
    let Some(CborValue::Map(params)) = canonical.get(&ClaimKey::Label(cat_keys::CATR)) else {
        panic!("catr did not translate to a map");
    };
    assert!(matches!(
        params.get(&renewal_params::TYPE),
        Some(CborValue::Integer(0))
    ));
    assert!(matches!(
        params.get(&renewal_params::EXPADD),
        Some(CborValue::Integer(3600))
    ));

    // Reverse translation uses the canonical parameter names.
    let reversed = to_external(&canonical);
    assert_eq!(
        reversed.get("catr"),
        Some(&json!({
            "renewal_type": 0,
            "exp_extension": 3600,
            "renewal_deadline": now + 3000,
        }))
    );
}

#[test]
fn test_catr_deadline_is_optional() {
    let claims = external(json!({ "catr": { "renewabletype": 1, "expext": 600 } }));

    let canonical = to_canonical(&claims).expect("translation succeeds");
    let Some(CborValue::Map(params)) = canonical.get(&ClaimKey::Label(cat_keys::CATR)) else {
        panic!("catr did not translate to a map");
    };
    assert!(!params.contains_key(&renewal_params::DEADLINE));
}

#[test]
fn test_catalpn_string_and_list() {
    let single = external(json!({ "catalpn": "h2" }));
    let canonical = to_canonical(&single).expect("translation succeeds");
    assert!(matches!(
        canonical.get(&ClaimKey::Label(cat_keys::CATALPN)),
        Some(CborValue::Bytes(b)) if b == b"h2"
    ));
    assert_eq!(Value::Object(to_external(&canonical)), Value::Object(single));

    let list = external(json!({ "catalpn": ["h2", "h3"] }));
    let canonical = to_canonical(&list).expect("translation succeeds");
    let Some(CborValue::Array(entries)) = canonical.get(&ClaimKey::Label(cat_keys::CATALPN))
    else {
        panic!("catalpn list did not translate to an array");
    };
    assert!(matches!(&entries[1], CborValue::Bytes(b) if b == b"h3"));
    assert_eq!(Value::Object(to_external(&canonical)), Value::Object(list));
}

#[test]
fn test_unknown_labels_fail_open_as_decimal_strings() {
    let mut canonical = ClaimsMap::new();
    canonical.insert(ClaimKey::Label(999), CborValue::Text("mystery".to_string()));

    let reversed = to_external(&canonical);
    assert_eq!(reversed.get("999"), Some(&json!("mystery")));

    // And the decimal name routes back to the same label.
    let round = to_canonical(&reversed).expect("decimal names translate");
    assert!(matches!(
        round.get(&ClaimKey::Label(999)),
        Some(CborValue::Text(s)) if s == "mystery"
    ));
}

#[test]
fn test_unknown_claim_names_pass_through() {
    let claims = external(json!({ "sub": "alice", "customclaim": "hello" }));

    let canonical = to_canonical(&claims).expect("translation succeeds");
    assert!(matches!(
        canonical.get(&ClaimKey::Name("customclaim".to_string())),
        Some(CborValue::Text(s)) if s == "hello"
    ));

    // The name survives the full lifecycle, wire format included.
    let registry = registry();
    let token = issuer::issue(&registry, &claims).expect("issuance succeeds");
    let payload = verifier::verify(&registry, &token).expect("verification succeeds");
    assert_eq!(payload.get("customclaim"), Some(&json!("hello")));
    assert_eq!(payload.get("sub"), Some(&json!("alice")));
}

#[test]
fn test_untranslatable_values_are_rejected() {
    let float = external(json!({ "exp": 1.5 }));
    assert!(matches!(to_canonical(&float), Err(Error::Encoding(_))));

    let boolean = external(json!({ "sub": true }));
    assert!(matches!(to_canonical(&boolean), Err(Error::Encoding(_))));

    // Pass-through claims obey the same value rules.
    let nested = external(json!({ "customclaim": { "a": 1 } }));
    assert!(matches!(to_canonical(&nested), Err(Error::Encoding(_))));
}

#[test]
fn test_well_formedness_rules() {
    assert!(matches!(
        check_well_formed(&ClaimsMap::new()),
        Err(Error::NotWellFormed(_))
    ));

    let mut wrong_type = ClaimsMap::new();
    wrong_type.insert(ClaimKey::Label(cwt_keys::ISS), CborValue::Integer(5));
    assert!(matches!(
        check_well_formed(&wrong_type),
        Err(Error::NotWellFormed(_))
    ));

    let mut incomplete_catr = ClaimsMap::new();
    let mut params = std::collections::BTreeMap::new();
    params.insert(renewal_params::TYPE, CborValue::Integer(0));
    incomplete_catr.insert(ClaimKey::Label(cat_keys::CATR), CborValue::Map(params));
    assert!(matches!(
        check_well_formed(&incomplete_catr),
        Err(Error::NotWellFormed(msg)) if msg.contains("renewal parameter")
    ));

    let valid = to_canonical(&external(json!({
        "sub": "alice",
        "exp": 1_900_000_000u64,
        "catm": ["GET"],
        "catalpn": "h2",
    })))
    .expect("translation succeeds");
    check_well_formed(&valid).expect("valid claim set passes");
}

#[test]
fn test_acceptability_is_temporal_with_zero_skew() {
    let now = current_timestamp();

    let mut live = ClaimsMap::new();
    live.insert(ClaimKey::Label(cwt_keys::NBF), CborValue::Integer(now as i64));
    live.insert(
        ClaimKey::Label(cwt_keys::EXP),
        CborValue::Integer((now + 60) as i64),
    );
    check_acceptable(&live, now).expect("current token is acceptable");

    let mut expired = ClaimsMap::new();
    expired.insert(ClaimKey::Label(cwt_keys::EXP), CborValue::Integer(now as i64));
    assert!(matches!(check_acceptable(&expired, now), Err(Error::Expired)));

    let mut future = ClaimsMap::new();
    future.insert(
        ClaimKey::Label(cwt_keys::NBF),
        CborValue::Integer((now + 1) as i64),
    );
    assert!(matches!(
        check_acceptable(&future, now),
        Err(Error::NotYetValid)
    ));

    // Absent temporal claims are not enforced.
    let mut bare = ClaimsMap::new();
    bare.insert(
        ClaimKey::Label(cwt_keys::SUB),
        CborValue::Text("alice".to_string()),
    );
    check_acceptable(&bare, now).expect("claims without exp/nbf are acceptable");
}

#[test]
fn test_codec_mac_encode_decode_verify() {
    let key = b"test-key-for-hmac-sha256-algorithm".to_vec();
    let mut claims = ClaimsMap::new();
    claims.insert(
        ClaimKey::Label(cwt_keys::SUB),
        CborValue::Text("alice".to_string()),
    );
    claims.insert(
        ClaimKey::Label(cwt_keys::EXP),
        CborValue::Integer((current_timestamp() + 60) as i64),
    );

    let header = Header::new()
        .with_algorithm(Algorithm::HmacSha256)
        .with_unprotected_key_id(KeyId::string(KID_HS256));
    let token = Token::mac(claims, &key, header).expect("MAC succeeds");

    let bytes = token.to_bytes().expect("token encodes");
    let decoded = Token::from_bytes(&bytes).expect("token decodes");

    // The kid travels as a byte string in the unprotected header.
    match decoded.key_id() {
        Some(KeyId::Binary(kid)) => assert_eq!(kid, KID_HS256.as_bytes()),
        other => panic!("unexpected key id: {other:?}"),
    }

    decoded
        .verify(&VerificationKey::Hmac(key))
        .expect("MAC verifies");

    let wrong = decoded.verify(&VerificationKey::Hmac(b"wrong-key".to_vec()));
    assert!(matches!(wrong, Err(Error::SignatureVerification)));
}

#[test]
fn test_unprotected_key_id_is_read_first() {
    let mut header = Header::new().with_unprotected_key_id(KeyId::string(KID_HS256));
    header
        .protected
        .insert(cose_labels::KID, CborValue::Bytes(b"other_key".to_vec()));

    let kid = header.key_id().expect("kid present");
    assert_eq!(kid.as_bytes(), KID_HS256.as_bytes());
}

#[test]
fn test_indefinite_length_claims_map_is_rejected() {
    let registry = registry();
    let (key, _) = registry.signing_key();

    let mut protected = Vec::new();
    let mut enc = Encoder::new(&mut protected);
    enc.map(1).unwrap();
    enc.i32(cose_labels::ALG).unwrap();
    enc.i32(cose_algs::HMAC_SHA_256).unwrap();

    // Indefinite-length claims map carrying an already expired exp claim.
    let mut payload = Vec::new();
    let mut enc = Encoder::new(&mut payload);
    enc.begin_map().unwrap();
    enc.i32(cwt_keys::EXP).unwrap();
    enc.i64(0).unwrap();
    enc.end().unwrap();

    let mut input = Vec::new();
    let mut enc = Encoder::new(&mut input);
    enc.array(4).unwrap();
    enc.str("MAC0").unwrap();
    enc.bytes(&protected).unwrap();
    enc.bytes(&[]).unwrap();
    enc.bytes(&payload).unwrap();
    let mac = compute_hmac_sha256(&key, &input);

    let mut envelope = Vec::new();
    let mut enc = Encoder::new(&mut envelope);
    enc.tag(Tag::new(cbor_tags::CWT)).unwrap();
    enc.tag(Tag::new(cbor_tags::COSE_MAC0)).unwrap();
    enc.array(4).unwrap();
    enc.bytes(&protected).unwrap();
    enc.map(1).unwrap();
    enc.i32(cose_labels::KID).unwrap();
    enc.bytes(KID_HS256.as_bytes()).unwrap();
    enc.bytes(&payload).unwrap();
    enc.bytes(&mac).unwrap();

    // The MAC is genuine, but the payload must not decode to an empty claim
    // set that would skip the temporal checks.
    let encoded = Base64UrlSafeNoPadding::encode_to_string(&envelope).expect("token encodes");
    assert!(matches!(
        verifier::verify(&registry, &encoded),
        Err(Error::MalformedToken(msg)) if msg.contains("indefinite")
    ));
}

#[test]
fn test_issue_stamps_timestamps_and_overrides_caller_values() {
    let registry = registry();
    let before = current_timestamp();

    // The caller-supplied iat must not survive issuance.
    let claims = external(json!({ "sub": "alice", "iat": 1 }));
    let token = issuer::issue(&registry, &claims).expect("issuance succeeds");

    let payload = verifier::verify(&registry, &token).expect("verification succeeds");
    let after = current_timestamp();

    assert_eq!(payload.get("sub"), Some(&json!("alice")));
    let iat = payload.get("iat").and_then(Value::as_u64).expect("iat stamped");
    let nbf = payload.get("nbf").and_then(Value::as_u64).expect("nbf stamped");
    assert_eq!(iat, nbf);
    assert!(iat >= before && iat <= after);
}

#[test]
fn test_issuance_is_deterministic_modulo_timestamps() {
    let registry = registry();
    let claims = external(json!({
        "sub": "alice",
        "exp": 1_900_000_000u64,
        "catm": ["GET"],
    }));

    let first = issuer::issue(&registry, &claims).expect("issuance succeeds");
    let second = issuer::issue(&registry, &claims).expect("issuance succeeds");

    let mut first = verifier::verify(&registry, &first).expect("first verifies");
    let mut second = verifier::verify(&registry, &second).expect("second verifies");
    for stamped in ["iat", "nbf"] {
        first.remove(stamped);
        second.remove(stamped);
    }
    assert_eq!(first, second);
}

#[test]
fn test_issue_rejects_malformed_claim_sets() {
    let registry = registry();

    // catr without its required parameters fails the well-formedness check.
    let claims = external(json!({ "catr": { "renewabletype": 0 } }));
    assert!(matches!(
        issuer::issue(&registry, &claims),
        Err(Error::NotWellFormed(_))
    ));
}

#[test]
fn test_issued_token_round_trips_cat_claims() {
    let registry = registry();
    let claims = external(json!({
        "sub": "alice",
        "catu": { "scheme": [match_types::EXACT, "https"] },
        "catm": ["GET", "HEAD"],
        "catalpn": ["h2"],
        "catr": { "renewabletype": 0, "expext": 3600 },
    }));

    let token = issuer::issue(&registry, &claims).expect("issuance succeeds");
    let payload = verifier::verify(&registry, &token).expect("verification succeeds");

    assert_eq!(
        payload.get("catu"),
        Some(&json!({ "scheme": [match_types::EXACT, "https"] }))
    );
    assert_eq!(payload.get("catm"), Some(&json!(["GET", "HEAD"])));
    assert_eq!(payload.get("catalpn"), Some(&json!(["h2"])));
    assert_eq!(
        payload.get("catr"),
        Some(&json!({ "renewal_type": 0, "exp_extension": 3600 }))
    );
}

#[test]
fn test_verify_rejects_garbage() {
    let registry = registry();

    assert!(matches!(
        verifier::verify(&registry, "not/base64url!"),
        Err(Error::MalformedToken(_))
    ));

    // Valid base64url, not valid CBOR.
    let garbage = Base64UrlSafeNoPadding::encode_to_string(b"garbage").unwrap();
    assert!(matches!(
        verifier::verify(&registry, &garbage),
        Err(Error::MalformedToken(_))
    ));
}

#[test]
fn test_verify_rejects_unknown_key_before_signature_check() {
    let registry = registry();
    let (key, _) = registry.signing_key();

    let mut claims = ClaimsMap::new();
    claims.insert(
        ClaimKey::Label(cwt_keys::SUB),
        CborValue::Text("alice".to_string()),
    );
    let header = Header::new()
        .with_algorithm(Algorithm::HmacSha256)
        .with_unprotected_key_id(KeyId::string("mystery_key"));
    let token = Token::mac(claims, &key, header).expect("MAC succeeds");

    // The MAC is valid under the current signing key, but the kid does not
    // resolve, so the signature must never be consulted.
    assert!(matches!(
        verifier::verify(&registry, &encode_token(&token)),
        Err(Error::UnknownKey(kid)) if kid == "mystery_key"
    ));
}

#[test]
fn test_verify_rejects_expired_and_not_yet_valid_tokens() {
    let registry = registry();
    let (key, _) = registry.signing_key();
    let now = current_timestamp() as i64;

    let mut expired = ClaimsMap::new();
    expired.insert(
        ClaimKey::Label(cwt_keys::SUB),
        CborValue::Text("alice".to_string()),
    );
    expired.insert(ClaimKey::Label(cwt_keys::EXP), CborValue::Integer(now - 60));
    let header = Header::new()
        .with_algorithm(Algorithm::HmacSha256)
        .with_unprotected_key_id(KeyId::string(KID_HS256));
    let token = Token::mac(expired, &key, header.clone()).expect("MAC succeeds");
    assert!(matches!(
        verifier::verify(&registry, &encode_token(&token)),
        Err(Error::NotAcceptable(msg)) if msg.contains("expired")
    ));

    let mut future = ClaimsMap::new();
    future.insert(
        ClaimKey::Label(cwt_keys::NBF),
        CborValue::Integer(now + 3600),
    );
    let token = Token::mac(future, &key, header).expect("MAC succeeds");
    assert!(matches!(
        verifier::verify(&registry, &encode_token(&token)),
        Err(Error::NotAcceptable(msg)) if msg.contains("not yet valid")
    ));
}

#[test]
fn test_es256_signed_token_verifies() {
    let registry = registry();

    // Private scalar matching the registry's ES256 public key.
    let scalar = Base64UrlSafeNoPadding::decode_to_vec(
        "CyJoz5l2IG9cPEXvPATnU3BHrNS1Qx5-dZ4e_Z0H_3M",
        None,
    )
    .expect("scalar decodes");
    let signing_key = SigningKey::from_slice(&scalar).expect("valid P-256 scalar");

    let mut protected = Vec::new();
    let mut enc = Encoder::new(&mut protected);
    enc.map(1).unwrap();
    enc.i32(cose_labels::ALG).unwrap();
    enc.i32(cose_algs::ES256).unwrap();

    let mut payload = Vec::new();
    let mut enc = Encoder::new(&mut payload);
    enc.map(2).unwrap();
    enc.i32(cwt_keys::SUB).unwrap();
    enc.str("alice").unwrap();
    enc.i32(cwt_keys::EXP).unwrap();
    enc.i64((current_timestamp() + 60) as i64).unwrap();

    let mut input = Vec::new();
    let mut enc = Encoder::new(&mut input);
    enc.array(4).unwrap();
    enc.str("Signature1").unwrap();
    enc.bytes(&protected).unwrap();
    enc.bytes(&[]).unwrap();
    enc.bytes(&payload).unwrap();
    let signature: Signature = signing_key.sign(&input);
    let signature_bytes = signature.to_bytes();

    let mut envelope = Vec::new();
    let mut enc = Encoder::new(&mut envelope);
    enc.tag(Tag::new(cbor_tags::CWT)).unwrap();
    enc.tag(Tag::new(cbor_tags::COSE_SIGN1)).unwrap();
    enc.array(4).unwrap();
    enc.bytes(&protected).unwrap();
    enc.map(1).unwrap();
    enc.i32(cose_labels::KID).unwrap();
    enc.bytes(KID_ES256.as_bytes()).unwrap();
    enc.bytes(&payload).unwrap();
    enc.bytes(signature_bytes.as_slice()).unwrap();

    let encoded = Base64UrlSafeNoPadding::encode_to_string(&envelope).expect("token encodes");
    let result = verifier::verify(&registry, &encoded).expect("ES256 token verifies");
    assert_eq!(result.get("sub"), Some(&json!("alice")));

    // A tampered signature must not verify.
    let last = envelope.len() - 1;
    envelope[last] ^= 0x01;
    let tampered = Base64UrlSafeNoPadding::encode_to_string(&envelope).expect("token encodes");
    assert!(matches!(
        verifier::verify(&registry, &tampered),
        Err(Error::SignatureVerification)
    ));
}

#[test]
fn test_rotation_invalidates_previously_issued_tokens() {
    let registry = registry();
    let claims = external(json!({ "sub": "alice" }));

    let old_token = issuer::issue(&registry, &claims).expect("issuance succeeds");
    verifier::verify(&registry, &old_token).expect("verifies before rotation");

    let new_key_hex = registry.rotate_signing_key();
    assert_eq!(new_key_hex.len(), 64);
    assert!(new_key_hex.chars().all(|c| c.is_ascii_hexdigit()));

    // No grace period: the old key is gone.
    assert!(matches!(
        verifier::verify(&registry, &old_token),
        Err(Error::SignatureVerification)
    ));

    // Tokens issued after rotation verify against the new key.
    let new_token = issuer::issue(&registry, &claims).expect("issuance succeeds");
    verifier::verify(&registry, &new_token).expect("verifies after rotation");
}

#[test]
fn test_resolve_unknown_key_identifier() {
    let registry = registry();
    assert!(matches!(
        registry.resolve("nope"),
        Err(Error::UnknownKey(kid)) if kid == "nope"
    ));
    assert!(matches!(
        registry.resolve(KID_HS256),
        Ok(VerificationKey::Hmac(_))
    ));
    assert!(matches!(
        registry.resolve(KID_ES256),
        Ok(VerificationKey::EcdsaP256(_))
    ));
}
