//! Scoped override of the callback state for a cookie-derived code.

use std::ops::Deref;

use super::{CallbackState, CODE_PARAM};

/// Installs a cookie-derived code into the callback state and disables the CSRF
/// state check until dropped.
///
/// Dropping the lease removes the injected code and restores the original flag, so
/// every exit path (return, error, panic unwind, a cancelled future) leaves the
/// state as it was before the lease was acquired.
pub(super) struct CookieCodeLease<'a> {
    state: &'a mut CallbackState,
    original_ignores_state: bool,
}

impl<'a> CookieCodeLease<'a> {
    pub(super) fn acquire(state: &'a mut CallbackState, code: String) -> Self {
        let original_ignores_state = state.ignores_state;

        state.params.insert(CODE_PARAM.to_string(), code);
        state.cookie_lease_active = true;
        // The client-side flow never issues a state token.
        state.ignores_state = true;

        Self {
            state,
            original_ignores_state,
        }
    }
}

impl Deref for CookieCodeLease<'_> {
    type Target = CallbackState;

    fn deref(&self) -> &CallbackState {
        &*self.state
    }
}

impl Drop for CookieCodeLease<'_> {
    fn drop(&mut self) {
        self.state.params.remove(CODE_PARAM);
        self.state.cookie_lease_active = false;
        self.state.ignores_state = self.original_ignores_state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::CodeOrigin;
    use std::collections::HashMap;

    #[test]
    fn test_lease_overrides_state() {
        let mut state = CallbackState::new(HashMap::new(), false);
        let lease = CookieCodeLease::acquire(&mut state, "xyz789".to_string());

        assert_eq!(lease.param(CODE_PARAM), Some("xyz789"));
        assert!(lease.ignores_state());
        assert!(lease.is_cookie_derived());
        assert_eq!(
            lease.resolved_code().map(|resolved| resolved.origin),
            Some(CodeOrigin::SignedCookie)
        );
        assert_eq!(lease.callback_url("https://app.example.com/callback"), "");
    }

    #[test]
    fn test_drop_restores_state() {
        let params = HashMap::from([("state".to_string(), "s1".to_string())]);
        let mut state = CallbackState::new(params, false);
        let before = state.clone();

        drop(CookieCodeLease::acquire(&mut state, "xyz789".to_string()));

        assert_eq!(state, before);
    }

    #[test]
    fn test_drop_restores_configured_ignore_flag() {
        let mut state = CallbackState::new(HashMap::new(), true);

        drop(CookieCodeLease::acquire(&mut state, "xyz789".to_string()));

        assert!(state.ignores_state());
        assert!(!state.is_cookie_derived());
    }
}
