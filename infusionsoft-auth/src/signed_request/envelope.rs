//! Parsing, verification and signing of `signature.payload` envelopes.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde_json::{Map, Value};
use tracing::warn;

use super::{HmacSha256Hash, KeyedHash};
use crate::error::{signed_request_error, Error, SignedRequestErrorKind};

/// The single signing algorithm accepted in a signed request payload.
pub const SUPPORTED_ALGORITHM: &str = "HMAC-SHA256";

const ALGORITHM_KEY: &str = "algorithm";
const CODE_KEY: &str = "code";

/// URL-safe base64 that emits no padding and tolerates it missing or present on decode.
///
/// Non-zero trailing bits are rejected, so every byte string has exactly one
/// accepted encoding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A verified signed request payload.
///
/// Only constructed once the envelope signature has been checked, so holding a
/// `SignedRequest` means its contents came from someone who knows the client secret.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    payload: Map<String, Value>,
}

impl SignedRequest {
    /// Parse and verify a raw envelope with HMAC-SHA256.
    pub fn parse(raw: &str, secret: &[u8]) -> Result<Self, Error> {
        Self::parse_with(raw, secret, &HmacSha256Hash)
    }

    /// Parse and verify a raw envelope using the given keyed hash.
    ///
    /// The declared algorithm is checked before `hash` is touched, so an envelope
    /// naming an unsupported algorithm never reaches the hashing step.
    pub fn parse_with(raw: &str, secret: &[u8], hash: &dyn KeyedHash) -> Result<Self, Error> {
        let (encoded_signature, encoded_payload) = split_envelope(raw)?;

        let signature = URL_SAFE_LENIENT.decode(encoded_signature).map_err(|e| {
            signed_request_error(
                SignedRequestErrorKind::MalformedSignature,
                &format!("Signature is not valid base64url: {e}"),
            )
        })?;

        let payload = decode_payload(encoded_payload)?;

        check_algorithm(&payload)?;

        hash.verify(secret, encoded_payload.as_bytes(), &signature)
            .inspect_err(|_| warn!("Rejected signed request with mismatched signature"))?;

        Ok(Self { payload })
    }

    /// Sign `payload` with HMAC-SHA256 and encode it as an envelope.
    pub fn sign(payload: &Map<String, Value>, secret: &[u8]) -> Result<String, Error> {
        Self::sign_with(payload, secret, &HmacSha256Hash)
    }

    /// Sign `payload` with the given keyed hash and encode it as an envelope.
    pub fn sign_with(
        payload: &Map<String, Value>,
        secret: &[u8],
        hash: &dyn KeyedHash,
    ) -> Result<String, Error> {
        let json = serde_json::to_vec(payload).map_err(|e| {
            signed_request_error(SignedRequestErrorKind::MalformedPayload, &e.to_string())
        })?;
        let encoded_payload = URL_SAFE_LENIENT.encode(json);
        let signature = hash.sign(secret, encoded_payload.as_bytes())?;

        Ok(format!(
            "{}.{}",
            URL_SAFE_LENIENT.encode(signature),
            encoded_payload
        ))
    }

    /// The algorithm declared by the payload.
    pub fn algorithm(&self) -> Option<&str> {
        self.payload.get(ALGORITHM_KEY).and_then(Value::as_str)
    }

    /// The authorization code carried by the payload.
    ///
    /// Empty and non-string values are treated as no code at all.
    pub fn code(&self) -> Option<&str> {
        self.payload
            .get(CODE_KEY)
            .and_then(Value::as_str)
            .filter(|code| !code.is_empty())
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn into_payload(self) -> Map<String, Value> {
        self.payload
    }
}

fn split_envelope(raw: &str) -> Result<(&str, &str), Error> {
    match raw.split_once('.') {
        Some((signature, payload)) if !signature.is_empty() && !payload.is_empty() => {
            Ok((signature, payload))
        }
        _ => Err(signed_request_error(
            SignedRequestErrorKind::MalformedEnvelope,
            "Signed request must have the form `signature.payload`",
        )),
    }
}

fn decode_payload(encoded_payload: &str) -> Result<Map<String, Value>, Error> {
    let bytes = URL_SAFE_LENIENT.decode(encoded_payload).map_err(|e| {
        signed_request_error(
            SignedRequestErrorKind::MalformedPayload,
            &format!("Payload is not valid base64url: {e}"),
        )
    })?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(signed_request_error(
            SignedRequestErrorKind::MalformedPayload,
            "Payload must be a JSON object",
        )),
        Err(e) => Err(signed_request_error(
            SignedRequestErrorKind::MalformedPayload,
            &format!("Payload is not valid JSON: {e}"),
        )),
    }
}

fn check_algorithm(payload: &Map<String, Value>) -> Result<(), Error> {
    match payload.get(ALGORITHM_KEY) {
        Some(Value::String(tag)) if tag.eq_ignore_ascii_case(SUPPORTED_ALGORITHM) => Ok(()),
        other => {
            let tag = match other {
                Some(Value::String(tag)) => tag.clone(),
                Some(value) => value.to_string(),
                None => "<none>".to_string(),
            };
            warn!("Rejected signed request with algorithm {}", tag);
            Err(signed_request_error(
                SignedRequestErrorKind::UnknownSignatureAlgorithm,
                &format!("unknown algorithm: {tag}"),
            ))
        }
    }
}
