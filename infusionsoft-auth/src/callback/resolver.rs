//! Authorization code precedence and the lease-wrapped continuation.

use std::collections::HashMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::lease::CookieCodeLease;
use super::{CallbackPhase, CallbackState, CODE_PARAM, SIGNED_REQUEST_COOKIE_PREFIX};
use crate::error::{callback_error, CallbackErrorKind, Error};
use crate::signed_request::{HmacSha256Hash, KeyedHash, SignedRequest};

/// Which authorization code a callback should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
    /// The request already carries a `code` parameter.
    Request,
    /// The code was read from a verified signed request cookie.
    SignedCookie(String),
    /// Neither source provided a code.
    Missing,
}

/// Resolves the authorization code of a callback request.
///
/// Precedence:
/// 1. The request `code` parameter (standard server-side redirect)
/// 2. The `code` field of the `fbsr_<client_id>` signed request cookie (client-side flow)
pub struct CodeResolver {
    client_id: String,
    client_secret: SecretString,
    hash: Box<dyn KeyedHash>,
}

impl CodeResolver {
    /// Create a resolver verifying cookies with HMAC-SHA256.
    ///
    /// # Arguments
    ///
    /// * `client_id` - OAuth client id, used to name the signed request cookie
    /// * `client_secret` - OAuth client secret, the signed request key
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self {
            client_id,
            client_secret,
            hash: Box::new(HmacSha256Hash),
        }
    }

    /// Replace the keyed hash used to verify signed request cookies.
    pub fn with_hash(mut self, hash: Box<dyn KeyedHash>) -> Self {
        self.hash = hash;
        self
    }

    /// Name of the cookie holding the signed request for this client.
    pub fn cookie_name(&self) -> String {
        format!("{}{}", SIGNED_REQUEST_COOKIE_PREFIX, self.client_id)
    }

    /// Decide where the authorization code comes from, without touching any state.
    ///
    /// A cookie that is present but fails verification is an error; a verified
    /// cookie without a usable `code` field counts as no cookie code at all.
    pub fn select_code_source(
        &self,
        params: &HashMap<String, String>,
        raw_cookie: Option<&str>,
    ) -> Result<CodeSource, Error> {
        if params.contains_key(CODE_PARAM) {
            debug!("Using authorization code from request parameters");
            return Ok(CodeSource::Request);
        }

        let Some(raw_cookie) = raw_cookie else {
            return Ok(CodeSource::Missing);
        };

        let signed_request = SignedRequest::parse_with(
            raw_cookie,
            self.client_secret.expose_secret().as_bytes(),
            self.hash.as_ref(),
        )?;

        match signed_request.code() {
            Some(code) => {
                debug!("Using authorization code from {} cookie", self.cookie_name());
                Ok(CodeSource::SignedCookie(code.to_string()))
            }
            None => {
                debug!("Verified {} cookie carries no code", self.cookie_name());
                Ok(CodeSource::Missing)
            }
        }
    }

    /// Resolve the authorization code and run `proceed` with it installed.
    ///
    /// A cookie-derived code is injected into `state` together with a disabled CSRF
    /// check for the duration of `proceed` only; both are undone before returning,
    /// including when `proceed` panics.
    pub fn resolve<T, F>(
        &self,
        state: &mut CallbackState,
        raw_cookie: Option<&str>,
        proceed: F,
    ) -> Result<T, Error>
    where
        F: FnOnce(&CallbackState) -> T,
    {
        match self.select_code_source(&state.params, raw_cookie)? {
            CodeSource::Request => Ok(proceed(state)),
            CodeSource::SignedCookie(code) => {
                let lease = CookieCodeLease::acquire(state, code);
                Ok(proceed(&*lease))
            }
            CodeSource::Missing => Err(self.no_authorization_code()),
        }
    }

    /// Async counterpart of [`CodeResolver::resolve`].
    ///
    /// The lease lives inside the returned future, so dropping the future before it
    /// completes (timeout, aborted request) restores the state as well.
    pub async fn resolve_async<P>(
        &self,
        state: &mut CallbackState,
        raw_cookie: Option<&str>,
        phase: &P,
    ) -> Result<P::Output, Error>
    where
        P: CallbackPhase + ?Sized,
    {
        match self.select_code_source(&state.params, raw_cookie)? {
            CodeSource::Request => Ok(phase.run(state).await),
            CodeSource::SignedCookie(code) => {
                let lease = CookieCodeLease::acquire(state, code);
                Ok(phase.run(&*lease).await)
            }
            CodeSource::Missing => Err(self.no_authorization_code()),
        }
    }

    fn no_authorization_code(&self) -> Error {
        callback_error(
            CallbackErrorKind::NoAuthorizationCode,
            &format!(
                "must pass either a `code` (via URL or by an `{}` signed request cookie)",
                self.cookie_name()
            ),
        )
    }
}

impl fmt::Debug for CodeResolver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CodeResolver")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}
