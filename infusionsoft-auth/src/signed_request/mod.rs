//! Signed request envelopes deposited by the client-side sign-in flow.
//!
//! An envelope has the form `base64url(signature).base64url(json_payload)` where the
//! signature is a keyed hash of the encoded payload part.

mod envelope;
mod hmac;

pub use envelope::{SignedRequest, SUPPORTED_ALGORITHM};
pub use hmac::HmacSha256Hash;

use crate::error::Error;

/// Keyed hash primitive used to sign and verify envelopes.
pub trait KeyedHash: Send + Sync {
    /// Compute the signature of `message` under `secret`.
    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, Error>;

    /// Verify `signature` against `message` under `secret`.
    ///
    /// Implementations must compare in constant time and return
    /// `SignatureMismatch` when the signature does not match.
    fn verify(&self, secret: &[u8], message: &[u8], signature: &[u8]) -> Result<(), Error>;
}
