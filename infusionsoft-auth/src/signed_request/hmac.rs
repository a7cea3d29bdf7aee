//! HMAC-SHA256 keyed hash for signed requests.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::KeyedHash;
use crate::error::{
    config_error, signed_request_error, ConfigErrorKind, Error, SignedRequestErrorKind,
};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 keyed hash, the only algorithm accepted in signed requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256Hash;

impl HmacSha256Hash {
    fn mac(secret: &[u8]) -> Result<HmacSha256, Error> {
        HmacSha256::new_from_slice(secret)
            .map_err(|_| config_error(ConfigErrorKind::InvalidSecret, "Invalid HMAC key"))
    }
}

impl KeyedHash for HmacSha256Hash {
    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, Error> {
        let mut mac = Self::mac(secret)?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn verify(&self, secret: &[u8], message: &[u8], signature: &[u8]) -> Result<(), Error> {
        let mut mac = Self::mac(secret)?;
        mac.update(message);

        // verify_slice compares in constant time
        mac.verify_slice(signature).map_err(|_| {
            signed_request_error(
                SignedRequestErrorKind::SignatureMismatch,
                "Signed request signature does not match",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_sign_is_deterministic() {
        let hash = HmacSha256Hash;
        let first = hash.sign(b"secret", b"payload").unwrap();
        let second = hash.sign(b"secret", b"payload").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn test_verify_valid_signature() {
        let hash = HmacSha256Hash;
        let signature = hash.sign(b"secret", b"payload").unwrap();
        assert!(hash.verify(b"secret", b"payload", &signature).is_ok());
    }

    #[test]
    fn test_verify_wrong_secret() {
        let hash = HmacSha256Hash;
        let signature = hash.sign(b"secret", b"payload").unwrap();
        let err = hash.verify(b"other", b"payload", &signature).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::SignedRequest(SignedRequestErrorKind::SignatureMismatch)
        );
    }

    #[test]
    fn test_verify_truncated_signature() {
        let hash = HmacSha256Hash;
        let signature = hash.sign(b"secret", b"payload").unwrap();
        let err = hash.verify(b"secret", b"payload", &signature[..16]).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::SignedRequest(SignedRequestErrorKind::SignatureMismatch)
        );
    }
}
