//! Authorization code resolution for the sign-in callback.
//!
//! The code either arrives as the `code` request parameter (server-side redirect) or
//! inside the signed request cookie written by the client-side flow.

mod lease;
mod resolver;
mod state;

pub use resolver::{CodeResolver, CodeSource};
pub use state::CallbackState;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request parameter holding the authorization code.
pub const CODE_PARAM: &str = "code";

/// Prefix of the signed request cookie name, followed by the client id.
pub const SIGNED_REQUEST_COOKIE_PREFIX: &str = "fbsr_";

/// Where the authorization code of a callback came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeOrigin {
    Request,
    SignedCookie,
}

/// The authorization code in effect for a callback, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCode {
    pub code: String,
    pub origin: CodeOrigin,
}

/// The remainder of the callback handling (token exchange and so on), run once the
/// authorization code has been resolved and installed into the callback state.
#[async_trait]
pub trait CallbackPhase: Send + Sync {
    type Output: Send;

    /// Run the phase against the callback state with the code in place.
    async fn run(&self, state: &CallbackState) -> Self::Output;
}
