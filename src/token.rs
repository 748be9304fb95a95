//! Token codec for Common Access Tokens
//!
//! Encodes and decodes the COSE envelope around a canonical claim set, and
//! computes/verifies the MAC or signature over it. The claim set itself is the
//! integer-labeled [`ClaimsMap`] produced by [`crate::labels`]; this module
//! never looks at claim semantics beyond the envelope.

use crate::claims::{ClaimKey, ClaimsMap};
use crate::constants::cbor_tags;
use crate::error::Error;
use crate::header::{Algorithm, CborValue, Header, HeaderMap, KeyId};
use crate::keys::VerificationKey;
use crate::utils::{compute_hmac_sha256, verify_es256, verify_hmac_sha256};
use minicbor::{Decoder, Encoder};

/// A decoded or freshly signed Common Access Token
#[derive(Debug, Clone)]
pub struct Token {
    /// Token header
    pub header: Header,
    /// Canonical claim set
    pub claims: ClaimsMap,
    /// MAC or signature bytes
    pub signature: Vec<u8>,
    /// Payload bytes as they appeared on the wire, kept for verification
    original_payload_bytes: Option<Vec<u8>>,
}

impl Token {
    /// Build and MAC a token over the given claim set with HMAC-SHA256.
    ///
    /// This is the only signing entry point: issuance in this service is
    /// always symmetric. The external AAD is empty and the CWT and COSE_Mac0
    /// tags are always applied on encode.
    pub fn mac(claims: ClaimsMap, key: &[u8], header: Header) -> Result<Self, Error> {
        let alg = header.algorithm().ok_or_else(|| {
            Error::InvalidAlgorithm("missing algorithm in protected header".to_string())
        })?;
        if alg != Algorithm::HmacSha256 {
            return Err(Error::InvalidAlgorithm(format!(
                "MAC generation requires HMAC-SHA256, got COSE algorithm {}",
                alg.identifier()
            )));
        }

        let mut token = Token {
            header,
            claims,
            signature: Vec::new(),
            original_payload_bytes: None,
        };
        token.signature = compute_hmac_sha256(key, &token.mac0_input()?);
        Ok(token)
    }

    /// Encode the token to CBOR bytes, wrapped in the CWT and COSE tags.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);

        enc.tag(minicbor::data::Tag::new(cbor_tags::CWT))?;
        match self.header.algorithm() {
            Some(Algorithm::Es256) => {
                enc.tag(minicbor::data::Tag::new(cbor_tags::COSE_SIGN1))?;
            }
            _ => {
                enc.tag(minicbor::data::Tag::new(cbor_tags::COSE_MAC0))?;
            }
        }

        // COSE structure: [protected bstr, unprotected map, payload bstr, tag]
        enc.array(4)?;

        let protected_bytes = encode_map(&self.header.protected)?;
        enc.bytes(&protected_bytes)?;

        encode_map_direct(&self.header.unprotected, &mut enc)?;

        let claims_bytes = encode_claims(&self.claims)?;
        enc.bytes(&claims_bytes)?;

        enc.bytes(&self.signature)?;

        Ok(buf)
    }

    /// Decode a token from CBOR bytes.
    ///
    /// Leading tags (CWT 61, COSE_Mac0 17, COSE_Sign1 18) are skipped; the
    /// underlying structure must be the 4-element COSE array.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut dec = Decoder::new(bytes);

        if dec.datatype()? == minicbor::data::Type::Tag {
            let _ = dec.tag()?;
            if dec.datatype()? == minicbor::data::Type::Tag {
                let _ = dec.tag()?;
            }
        }

        let array_len = definite(dec.array()?, "COSE array")?;
        if array_len != 4 {
            return Err(Error::MalformedToken(format!(
                "expected COSE array of length 4, got {array_len}"
            )));
        }

        let protected_bytes = dec.bytes()?;
        let protected = decode_map(protected_bytes)?;

        let unprotected = decode_map_direct(&mut dec)?;

        let claims_bytes = dec.bytes()?;
        let claims = decode_claims(claims_bytes)?;

        let signature = dec.bytes()?.to_vec();

        Ok(Self {
            header: Header {
                protected,
                unprotected,
            },
            claims,
            signature,
            original_payload_bytes: Some(claims_bytes.to_vec()),
        })
    }

    /// Extract the key identifier from the token header.
    pub fn key_id(&self) -> Option<KeyId> {
        self.header.key_id()
    }

    /// Verify the token's MAC or signature against a resolved key.
    ///
    /// The algorithm from the protected header selects the COSE structure:
    /// HMAC tokens are checked over the MAC0 input (with a Signature1
    /// fallback for tokens produced by signers that MAC the Sign1 structure),
    /// ES256 tokens over the Signature1 input.
    pub fn verify(&self, key: &VerificationKey) -> Result<(), Error> {
        let alg = self.header.algorithm().ok_or_else(|| {
            Error::InvalidAlgorithm("missing algorithm in protected header".to_string())
        })?;

        match (alg, key) {
            (Algorithm::HmacSha256, VerificationKey::Hmac(key)) => {
                let mac0 = self.mac0_input()?;
                if verify_hmac_sha256(key, &mac0, &self.signature).is_ok() {
                    return Ok(());
                }
                let sign1 = self.sign1_input()?;
                verify_hmac_sha256(key, &sign1, &self.signature)
            }
            (Algorithm::Es256, VerificationKey::EcdsaP256(key)) => {
                let sign1 = self.sign1_input()?;
                verify_es256(key, &sign1, &self.signature)
            }
            (alg, _) => Err(Error::InvalidAlgorithm(format!(
                "key does not match token algorithm {}",
                alg.identifier()
            ))),
        }
    }

    /// Get the encoded payload bytes, preferring the wire bytes when present.
    fn payload_bytes(&self) -> Result<Vec<u8>, Error> {
        match &self.original_payload_bytes {
            Some(original) => Ok(original.clone()),
            None => encode_claims(&self.claims),
        }
    }

    /// COSE_Mac0 MAC input: ["MAC0", protected, external_aad, payload]
    fn mac0_input(&self) -> Result<Vec<u8>, Error> {
        self.cose_structure_input("MAC0")
    }

    /// COSE_Sign1 signature input: ["Signature1", protected, external_aad, payload]
    fn sign1_input(&self) -> Result<Vec<u8>, Error> {
        self.cose_structure_input("Signature1")
    }

    fn cose_structure_input(&self, context: &str) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);

        enc.array(4)?;
        enc.str(context)?;

        let protected_bytes = encode_map(&self.header.protected)?;
        enc.bytes(&protected_bytes)?;

        // External AAD is always empty for this service.
        enc.bytes(&[])?;

        let claims_bytes = self.payload_bytes()?;
        enc.bytes(&claims_bytes)?;

        Ok(buf)
    }
}

// CBOR encoding/decoding helpers. Header maps are integer-keyed per COSE;
// claim maps additionally carry text keys for pass-through claim names.
// Indefinite-length items are rejected so the decoded claim set always
// reflects the signed payload.

fn definite(len: Option<u64>, what: &str) -> Result<u64, Error> {
    len.ok_or_else(|| Error::MalformedToken(format!("indefinite-length {what}")))
}

fn encode_map(map: &HeaderMap) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    encode_map_direct(map, &mut enc)?;
    Ok(buf)
}

fn encode_claims(claims: &ClaimsMap) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    enc.map(claims.len() as u64)?;
    for (key, value) in claims {
        match key {
            ClaimKey::Label(label) => {
                enc.i32(*label)?;
            }
            ClaimKey::Name(name) => {
                enc.str(name)?;
            }
        }
        encode_cbor_value(value, &mut enc)?;
    }
    Ok(buf)
}

fn decode_claims(bytes: &[u8]) -> Result<ClaimsMap, Error> {
    let mut dec = Decoder::new(bytes);
    let map_len = definite(dec.map()?, "claims map")?;
    let mut claims = ClaimsMap::new();
    for _ in 0..map_len {
        let key = match dec.datatype()? {
            minicbor::data::Type::String => ClaimKey::Name(dec.str()?.to_string()),
            _ => ClaimKey::Label(dec.i32()?),
        };
        claims.insert(key, decode_cbor_value(&mut dec)?);
    }
    Ok(claims)
}

fn encode_map_direct(map: &HeaderMap, enc: &mut Encoder<&mut Vec<u8>>) -> Result<(), Error> {
    enc.map(map.len() as u64)?;
    for (key, value) in map {
        enc.i32(*key)?;
        encode_cbor_value(value, enc)?;
    }
    Ok(())
}

fn encode_cbor_value(value: &CborValue, enc: &mut Encoder<&mut Vec<u8>>) -> Result<(), Error> {
    match value {
        CborValue::Integer(i) => {
            enc.i64(*i)?;
        }
        CborValue::Bytes(b) => {
            enc.bytes(b)?;
        }
        CborValue::Text(s) => {
            enc.str(s)?;
        }
        CborValue::Map(nested) => {
            encode_map_direct(nested, enc)?;
        }
        CborValue::Array(arr) => {
            enc.array(arr.len() as u64)?;
            for item in arr {
                encode_cbor_value(item, enc)?;
            }
        }
        CborValue::Null => {
            enc.null()?;
        }
    }
    Ok(())
}

fn decode_map(bytes: &[u8]) -> Result<HeaderMap, Error> {
    let mut dec = Decoder::new(bytes);
    decode_map_direct(&mut dec)
}

fn decode_map_direct(dec: &mut Decoder<'_>) -> Result<HeaderMap, Error> {
    let map_len = definite(dec.map()?, "map")?;
    let mut map = HeaderMap::new();
    for _ in 0..map_len {
        let key = dec.i32()?;
        map.insert(key, decode_cbor_value(dec)?);
    }
    Ok(map)
}

fn decode_cbor_value(dec: &mut Decoder<'_>) -> Result<CborValue, Error> {
    use minicbor::data::Type;

    let datatype = dec.datatype()?;
    let value = match datatype {
        Type::Int | Type::I8 | Type::I16 | Type::I32 | Type::I64 => {
            CborValue::Integer(dec.i64()?)
        }
        Type::U8 | Type::U16 | Type::U32 | Type::U64 => CborValue::Integer(dec.u64()? as i64),
        Type::Bytes => CborValue::Bytes(dec.bytes()?.to_vec()),
        Type::String => CborValue::Text(dec.str()?.to_string()),
        Type::Map => CborValue::Map(decode_map_direct(dec)?),
        Type::Array => {
            let array_len = definite(dec.array()?, "array")?;
            let mut array = Vec::with_capacity(array_len as usize);
            for _ in 0..array_len {
                array.push(decode_cbor_value(dec)?);
            }
            CborValue::Array(array)
        }
        Type::Null => {
            dec.null()?;
            CborValue::Null
        }
        other => {
            return Err(Error::MalformedToken(format!(
                "unsupported CBOR type: {other:?}"
            )))
        }
    };
    Ok(value)
}
