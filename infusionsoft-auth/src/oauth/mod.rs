//! OAuth 2.0 strategy for Infusionsoft sign-in.
//!
//! Builds the authorization redirect, issues and checks CSRF state, and drives the
//! callback through authorization code resolution.

pub mod options;
mod state;
mod strategy;

pub use options::{AccessTokenOptions, ClientOptions, StrategyOptions, DEFAULT_SCOPE};
pub use state::{StateData, StateManager};
pub use strategy::{AuthorizationRequest, Strategy, STATE_PARAM};
