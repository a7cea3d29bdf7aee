//! CSRF state management for OAuth flows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// State data stored between the request and callback phases.
#[derive(Debug, Clone)]
pub struct StateData {
    /// When this state was issued.
    pub issued_at: DateTime<Utc>,
    /// When this state expires.
    pub expires_at: DateTime<Utc>,
}

/// Manager for OAuth state parameters with expiration.
///
/// Generates and validates CSRF state tokens to prevent cross-site request forgery attacks.
/// Each token is single use.
#[derive(Clone)]
pub struct StateManager {
    states: Arc<Mutex<HashMap<String, StateData>>>,
    ttl: Duration,
}

impl StateManager {
    /// Create a new state manager with default TTL of 10 minutes.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }

    /// Create a new state manager with custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Generate and remember a new state token.
    pub fn generate(&self) -> String {
        let state = Self::generate_token();
        let issued_at = Utc::now();

        let data = StateData {
            issued_at,
            expires_at: issued_at + self.ttl,
        };

        self.lock().insert(state.clone(), data);

        state
    }

    /// Validate and consume a state token.
    ///
    /// # Returns
    ///
    /// `Some(StateData)` if valid, `None` if unknown, already used or expired.
    pub fn validate(&self, state: &str) -> Option<StateData> {
        let data = self.lock().remove(state)?;

        if Utc::now() > data.expires_at {
            return None;
        }
        Some(data)
    }

    /// Clean up expired states.
    ///
    /// Should be called periodically to prevent memory leaks.
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.lock().retain(|_, data| data.expires_at > now);
    }

    /// Number of outstanding state tokens.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StateData>> {
        // the map stays consistent even if a holder panicked
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generate a cryptographically random state token.
    fn generate_token() -> String {
        let random_bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(random_bytes)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
