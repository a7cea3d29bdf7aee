//! # infusionsoft-auth
//!
//! Sign-in with Infusionsoft over OAuth 2.0:
//! - Signed request envelopes (`fbsr_<client_id>` cookie) parsed and verified with HMAC-SHA256
//! - Authorization code resolution from the callback request or the signed request cookie
//! - Strategy options, authorization redirect and CSRF state handling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use infusionsoft_auth::{
//!     callback::{CallbackPhase, CallbackState},
//!     oauth::{Strategy, StrategyOptions},
//! };
//!
//! let strategy = Strategy::new(options)?;
//! let mut state = strategy.callback_state(query_params);
//! let token = strategy.callback_phase(&mut state, &cookies, &token_exchange).await?;
//! ```

pub mod callback;
pub mod error;
pub mod oauth;
pub mod signed_request;

// Re-export commonly used types
pub use callback::{CallbackPhase, CallbackState, CodeOrigin, CodeResolver, ResolvedCode};
pub use error::{Error, ErrorKind};
pub use signed_request::SignedRequest;
