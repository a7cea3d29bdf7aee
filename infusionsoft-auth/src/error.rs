//! Error types for the `infusionsoft-auth` crate.
//!
//! Follows the same pattern as the rest of the workspace: a root Error struct holding
//! an error kind tree and an optional source for error chaining.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for infusionsoft-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in infusionsoft-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    SignedRequest(SignedRequestErrorKind),
    Callback(CallbackErrorKind),
    OAuth(OAuthErrorKind),
    Config(ConfigErrorKind),
}

/// Errors from parsing and verifying a signed request envelope.
#[derive(Debug, PartialEq)]
pub enum SignedRequestErrorKind {
    /// Separator missing or one of the two parts is empty.
    MalformedEnvelope,
    MalformedSignature,
    MalformedPayload,
    /// The payload declares an algorithm other than HMAC-SHA256 (or none at all).
    UnknownSignatureAlgorithm,
    SignatureMismatch,
}

/// Errors from resolving the authorization code of a callback.
#[derive(Debug, PartialEq)]
pub enum CallbackErrorKind {
    NoAuthorizationCode,
}

/// Errors from the OAuth request/callback phases.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    CsrfDetected,
}

/// Errors from strategy configuration.
#[derive(Debug, PartialEq)]
pub enum ConfigErrorKind {
    MissingClientId,
    MissingClientSecret,
    InvalidSecret,
    InvalidUrl,
}

impl Error {
    /// Tag reported to the user-facing authentication failure handler.
    pub fn failure_tag(&self) -> &'static str {
        match &self.error_kind {
            ErrorKind::SignedRequest(kind) => match kind {
                SignedRequestErrorKind::MalformedEnvelope
                | SignedRequestErrorKind::MalformedSignature
                | SignedRequestErrorKind::MalformedPayload => "malformed_signed_request",
                SignedRequestErrorKind::UnknownSignatureAlgorithm => "unknown_signature_algorithm",
                SignedRequestErrorKind::SignatureMismatch => "invalid_signature",
            },
            ErrorKind::Callback(CallbackErrorKind::NoAuthorizationCode) => "no_authorization_code",
            ErrorKind::OAuth(OAuthErrorKind::CsrfDetected) => "csrf_detected",
            ErrorKind::Config(_) => "invalid_configuration",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::SignedRequest(kind) => write!(f, "Signed request error: {:?}", kind)?,
            ErrorKind::Callback(kind) => write!(f, "Callback error: {:?}", kind)?,
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind)?,
            ErrorKind::Config(kind) => write!(f, "Configuration error: {:?}", kind)?,
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Config(ConfigErrorKind::InvalidUrl),
        }
    }
}

/// Helper function to create signed request errors.
pub fn signed_request_error(kind: SignedRequestErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::SignedRequest(kind),
    }
}

/// Helper function to create callback errors.
pub fn callback_error(kind: CallbackErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Callback(kind),
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create configuration errors.
pub fn config_error(kind: ConfigErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Config(kind),
    }
}
