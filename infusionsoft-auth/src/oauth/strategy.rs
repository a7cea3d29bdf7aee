//! Infusionsoft sign-in strategy: request phase, callback phase and redirect URI.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use url::Url;

use super::options::{authorize_params, StrategyOptions};
use super::StateManager;
use crate::callback::{CallbackPhase, CallbackState, CodeResolver};
use crate::error::{config_error, oauth_error, ConfigErrorKind, Error, OAuthErrorKind};

/// Request parameter carrying the CSRF state token.
pub const STATE_PARAM: &str = "state";

/// Authorization request with URL and issued state.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Authorization URL to redirect the user to.
    pub url: String,
    /// CSRF state parameter expected back on the callback.
    pub state: String,
}

/// The Infusionsoft OAuth strategy.
///
/// Issues authorization requests, and on callback resolves the authorization code
/// from the request or the signed request cookie before handing over to the
/// token exchange.
pub struct Strategy {
    options: StrategyOptions,
    resolver: CodeResolver,
    states: StateManager,
}

impl Strategy {
    /// Create a strategy from its options.
    pub fn new(options: StrategyOptions) -> Result<Self, Error> {
        Self::with_state_manager(options, StateManager::new())
    }

    /// Create a strategy sharing an existing state manager.
    pub fn with_state_manager(
        options: StrategyOptions,
        states: StateManager,
    ) -> Result<Self, Error> {
        if options.client_id.is_empty() {
            return Err(config_error(
                ConfigErrorKind::MissingClientId,
                "OAuth client id must not be empty",
            ));
        }
        if options.client_secret.expose_secret().is_empty() {
            return Err(config_error(
                ConfigErrorKind::MissingClientSecret,
                "OAuth client secret must not be empty",
            ));
        }
        Url::parse(&options.client.authorize_url)?;

        let resolver = CodeResolver::new(
            options.client_id.clone(),
            SecretString::new(options.client_secret.expose_secret().clone()),
        );

        Ok(Self {
            options,
            resolver,
            states,
        })
    }

    pub fn options(&self) -> &StrategyOptions {
        &self.options
    }

    pub fn resolver(&self) -> &CodeResolver {
        &self.resolver
    }

    pub fn states(&self) -> &StateManager {
        &self.states
    }

    /// Name of the signed request cookie, `fbsr_<client_id>`.
    pub fn cookie_name(&self) -> String {
        self.resolver.cookie_name()
    }

    /// Fresh callback state for an incoming callback request.
    pub fn callback_state(&self, params: HashMap<String, String>) -> CallbackState {
        CallbackState::new(params, self.options.provider_ignores_state)
    }

    /// Redirect URI for the token exchange of this callback.
    ///
    /// Empty while the code came from the signed request cookie.
    pub fn callback_url<'a>(&'a self, state: &CallbackState) -> &'a str {
        state.callback_url(&self.options.callback_url)
    }

    /// Build the authorization redirect and issue its CSRF state.
    ///
    /// `display`, `scope` and `auth_type` may be passed on the request to override the
    /// configured authorization parameters.
    pub fn request_phase(
        &self,
        request_params: &HashMap<String, String>,
    ) -> Result<AuthorizationRequest, Error> {
        let mut url = Url::parse(&self.options.client.authorize_url)?;
        let state = self.states.generate();

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.options.client_id)
                .append_pair("redirect_uri", &self.options.callback_url)
                .append_pair("response_type", "code")
                .append_pair(STATE_PARAM, &state);

            for (key, value) in authorize_params(&self.options.authorize_params, request_params) {
                query.append_pair(&key, &value);
            }
        }

        Ok(AuthorizationRequest {
            url: url.into(),
            state,
        })
    }

    /// Handle a callback request.
    ///
    /// Resolves the authorization code, checks the CSRF state unless it is ignored
    /// for this callback, then runs `phase` (the token exchange). Any failure is
    /// logged here as "Authentication failure!" with its failure tag, so callers
    /// only act on the returned error.
    pub async fn callback_phase<P>(
        &self,
        state: &mut CallbackState,
        cookies: &HashMap<String, String>,
        phase: &P,
    ) -> Result<P::Output, Error>
    where
        P: CallbackPhase,
    {
        let raw_cookie = cookies.get(&self.cookie_name()).map(String::as_str);
        let checked = StateCheckedPhase {
            states: &self.states,
            inner: phase,
        };

        let outcome = self
            .resolver
            .resolve_async(state, raw_cookie, &checked)
            .await
            .and_then(|checked_outcome| checked_outcome);

        match &outcome {
            Ok(_) => info!("Infusionsoft callback phase completed"),
            Err(e) => warn!("Authentication failure! {}: {}", e.failure_tag(), e),
        }
        outcome
    }
}

/// Wraps the caller's phase with the CSRF state check.
struct StateCheckedPhase<'a, P: ?Sized> {
    states: &'a StateManager,
    inner: &'a P,
}

#[async_trait]
impl<'a, P> CallbackPhase for StateCheckedPhase<'a, P>
where
    P: CallbackPhase + ?Sized,
{
    type Output = Result<P::Output, Error>;

    async fn run(&self, state: &CallbackState) -> Self::Output {
        if !state.ignores_state() {
            let returned = state.param(STATE_PARAM).filter(|value| !value.is_empty());

            if returned.and_then(|value| self.states.validate(value)).is_none() {
                return Err(oauth_error(
                    OAuthErrorKind::CsrfDetected,
                    "CSRF detected: state parameter missing or unknown",
                ));
            }
        }

        Ok(self.inner.run(state).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{CodeOrigin, ResolvedCode, CODE_PARAM};
    use crate::oauth::options::ClientOptions;
    use crate::error::{CallbackErrorKind, ErrorKind, SignedRequestErrorKind};
    use crate::signed_request::SignedRequest;
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;

    const CALLBACK_URL: &str = "https://app.example.com/auth/infusionsoft/callback";

    fn options() -> StrategyOptions {
        StrategyOptions::new(
            "abc_client".to_string(),
            SecretString::new("client_secret".to_string()),
            CALLBACK_URL.to_string(),
        )
    }

    fn strategy() -> Strategy {
        Strategy::new(options()).unwrap()
    }

    fn signed_cookie(value: Value) -> String {
        let payload: Map<String, Value> = match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        };
        SignedRequest::sign(&payload, b"client_secret").unwrap()
    }

    /// Stands in for the token exchange, recording what it would send and returning
    /// the `Authorization` header value for the issued token.
    struct TokenExchange<'a> {
        strategy: &'a Strategy,
        calls: Mutex<Vec<(ResolvedCode, String)>>,
    }

    #[async_trait]
    impl<'a> CallbackPhase for TokenExchange<'a> {
        type Output = String;

        async fn run(&self, state: &CallbackState) -> String {
            let code = state.resolved_code().unwrap();
            let redirect_uri = self.strategy.callback_url(state).to_string();
            self.calls
                .lock()
                .unwrap()
                .push((code.clone(), redirect_uri));
            let token = format!("token-for-{}", code.code);
            self.strategy
                .options()
                .access_token
                .authorization_header(&token)
        }
    }

    fn exchange(strategy: &Strategy) -> TokenExchange<'_> {
        TokenExchange {
            strategy,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_new_rejects_missing_credentials() {
        let mut missing_id = options();
        missing_id.client_id = String::new();
        let err = Strategy::new(missing_id).err().unwrap();
        assert_eq!(
            err.error_kind,
            ErrorKind::Config(ConfigErrorKind::MissingClientId)
        );

        let mut missing_secret = options();
        missing_secret.client_secret = SecretString::new(String::new());
        let err = Strategy::new(missing_secret).err().unwrap();
        assert_eq!(
            err.error_kind,
            ErrorKind::Config(ConfigErrorKind::MissingClientSecret)
        );
    }

    #[test]
    fn test_new_rejects_invalid_authorize_url() {
        let client = ClientOptions {
            authorize_url: "not a url".to_string(),
            ..ClientOptions::default()
        };
        let err = Strategy::new(options().with_client(client)).err().unwrap();
        assert_eq!(err.error_kind, ErrorKind::Config(ConfigErrorKind::InvalidUrl));
    }

    #[test]
    fn test_cookie_name() {
        assert_eq!(strategy().cookie_name(), "fbsr_abc_client");
    }

    #[test]
    fn test_request_phase_builds_authorize_url() {
        let strategy = strategy();
        let request = HashMap::from([("display".to_string(), "popup".to_string())]);

        let authorization = strategy.request_phase(&request).unwrap();
        let url = Url::parse(&authorization.url).unwrap();
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("signin.infusionsoft.com"));
        assert_eq!(url.path(), "/app/oauth/authorize");
        assert_eq!(query["client_id"], "abc_client");
        assert_eq!(query["redirect_uri"], CALLBACK_URL);
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["scope"], "full");
        assert_eq!(query["display"], "popup");
        assert_eq!(query["state"], authorization.state);
        assert_eq!(strategy.states().pending(), 1);
    }

    #[tokio::test]
    async fn test_callback_with_request_code_checks_state() {
        let strategy = strategy();
        let issued = strategy.request_phase(&HashMap::new()).unwrap().state;
        let mut state = strategy.callback_state(HashMap::from([
            (CODE_PARAM.to_string(), "abc123".to_string()),
            (STATE_PARAM.to_string(), issued),
        ]));
        let phase = exchange(&strategy);

        let token = strategy
            .callback_phase(&mut state, &HashMap::new(), &phase)
            .await
            .unwrap();

        assert_eq!(token, "OAuth token-for-abc123");
        let calls = phase.calls.lock().unwrap();
        assert_eq!(calls[0].0.origin, CodeOrigin::Request);
        assert_eq!(calls[0].1, CALLBACK_URL);
    }

    #[tokio::test]
    async fn test_callback_with_request_code_and_bad_state() {
        let strategy = strategy();
        let mut state = strategy.callback_state(HashMap::from([
            (CODE_PARAM.to_string(), "abc123".to_string()),
            (STATE_PARAM.to_string(), "forged".to_string()),
        ]));
        let phase = exchange(&strategy);

        let err = strategy
            .callback_phase(&mut state, &HashMap::new(), &phase)
            .await
            .unwrap_err();

        assert_eq!(err.error_kind, ErrorKind::OAuth(OAuthErrorKind::CsrfDetected));
        assert!(phase.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_ignores_state_skips_check() {
        let strategy = Strategy::new(options().with_provider_ignores_state(true)).unwrap();
        let mut state = strategy.callback_state(HashMap::from([(
            CODE_PARAM.to_string(),
            "abc123".to_string(),
        )]));
        let phase = exchange(&strategy);

        let token = strategy
            .callback_phase(&mut state, &HashMap::new(), &phase)
            .await
            .unwrap();

        assert_eq!(token, "OAuth token-for-abc123");
    }

    #[tokio::test]
    async fn test_callback_with_signed_cookie_skips_state_and_empties_redirect() {
        let strategy = strategy();
        let mut state = strategy.callback_state(HashMap::new());
        let before = state.clone();
        let cookies = HashMap::from([(
            strategy.cookie_name(),
            signed_cookie(json!({"code": "xyz789", "algorithm": "HMAC-SHA256"})),
        )]);
        let phase = exchange(&strategy);

        let token = strategy
            .callback_phase(&mut state, &cookies, &phase)
            .await
            .unwrap();

        assert_eq!(token, "OAuth token-for-xyz789");
        let calls = phase.calls.lock().unwrap();
        assert_eq!(calls[0].0.origin, CodeOrigin::SignedCookie);
        assert_eq!(calls[0].1, "");
        assert_eq!(state, before);
        assert_eq!(strategy.callback_url(&state), CALLBACK_URL);
    }

    #[tokio::test]
    async fn test_cookie_for_other_client_is_ignored() {
        let strategy = strategy();
        let mut state = strategy.callback_state(HashMap::new());
        let cookies = HashMap::from([(
            "fbsr_other_client".to_string(),
            signed_cookie(json!({"code": "xyz789", "algorithm": "HMAC-SHA256"})),
        )]);
        let phase = exchange(&strategy);

        let err = strategy
            .callback_phase(&mut state, &cookies, &phase)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Callback(CallbackErrorKind::NoAuthorizationCode)
        );
    }

    #[tokio::test]
    async fn test_callback_with_unknown_algorithm() {
        let strategy = strategy();
        let mut state = strategy.callback_state(HashMap::new());
        let cookies = HashMap::from([(
            strategy.cookie_name(),
            signed_cookie(json!({"code": "xyz789", "algorithm": "HMAC-SHA1"})),
        )]);
        let phase = exchange(&strategy);

        let err = strategy
            .callback_phase(&mut state, &cookies, &phase)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::SignedRequest(SignedRequestErrorKind::UnknownSignatureAlgorithm)
        );
        assert_eq!(err.failure_tag(), "unknown_signature_algorithm");
        assert!(phase.calls.lock().unwrap().is_empty());
    }
}
