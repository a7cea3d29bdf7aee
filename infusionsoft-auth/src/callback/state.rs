//! Request-scoped callback state.

use std::collections::HashMap;

use super::{CodeOrigin, ResolvedCode, CODE_PARAM};

/// Parameters and CSRF-check setting of a single callback request.
///
/// Owned by the request being handled. The resolver may override the `code`
/// parameter and the CSRF-check flag only for the duration of a cookie lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackState {
    pub(super) params: HashMap<String, String>,
    pub(super) ignores_state: bool,
    pub(super) cookie_lease_active: bool,
}

impl CallbackState {
    /// Create callback state from the request parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - Query/body parameters of the callback request
    /// * `ignores_state` - Whether the CSRF state check is skipped for this provider
    pub fn new(params: HashMap<String, String>, ignores_state: bool) -> Self {
        Self {
            params,
            ignores_state,
            cookie_lease_active: false,
        }
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Whether the CSRF state check should be skipped right now.
    pub fn ignores_state(&self) -> bool {
        self.ignores_state
    }

    /// Whether the current code was taken from the signed request cookie.
    pub fn is_cookie_derived(&self) -> bool {
        self.cookie_lease_active
    }

    /// The authorization code in effect, if any.
    pub fn resolved_code(&self) -> Option<ResolvedCode> {
        let origin = if self.cookie_lease_active {
            CodeOrigin::SignedCookie
        } else {
            CodeOrigin::Request
        };

        self.param(CODE_PARAM).map(|code| ResolvedCode {
            code: code.to_string(),
            origin,
        })
    }

    /// Redirect URI to present during the token exchange.
    ///
    /// The client-side flow issues its code with an empty redirect URI, and the
    /// token exchange must repeat it, so the configured URI is replaced by `""`
    /// while a cookie-derived code is in effect.
    pub fn callback_url<'a>(&self, configured: &'a str) -> &'a str {
        if self.cookie_lease_active {
            ""
        } else {
            configured
        }
    }
}
