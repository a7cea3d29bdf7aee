//! Infusionsoft endpoint and request options.

use std::collections::{BTreeMap, HashMap};

use secrecy::SecretString;

/// Scope requested when neither the configuration nor the request names one.
pub const DEFAULT_SCOPE: &str = "full";

/// Request parameters copied onto the authorization request when present.
pub const AUTHORIZE_PASSTHROUGH_PARAMS: [&str; 3] = ["display", "scope", "auth_type"];

pub const DEFAULT_SITE: &str = "https://signin.infusionsoft.com";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://signin.infusionsoft.com/app/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://api.infusionsoft.com/token";

/// OAuth endpoints of the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub site: String,
    pub authorize_url: String,
    pub token_url: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

/// How the access token is presented to the API after the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenOptions {
    /// `Authorization` header template, `%s` is replaced by the token.
    pub header_format: String,
    /// Query parameter name when the token is sent as a parameter.
    pub param_name: String,
}

impl AccessTokenOptions {
    /// Value of the `Authorization` header for `token`.
    pub fn authorization_header(&self, token: &str) -> String {
        self.header_format.replacen("%s", token, 1)
    }
}

impl Default for AccessTokenOptions {
    fn default() -> Self {
        Self {
            header_format: "OAuth %s".to_string(),
            param_name: "access_token".to_string(),
        }
    }
}

/// Everything the strategy needs to know about the OAuth client.
#[derive(Debug)]
pub struct StrategyOptions {
    pub client_id: String,
    pub client_secret: SecretString,
    pub client: ClientOptions,
    pub access_token: AccessTokenOptions,
    /// Authorization parameters applied to every request phase.
    pub authorize_params: BTreeMap<String, String>,
    /// Redirect URI registered with the provider.
    pub callback_url: String,
    /// Skip the CSRF state check on every callback, not only cookie-derived ones.
    pub provider_ignores_state: bool,
}

impl StrategyOptions {
    /// Create options with the Infusionsoft defaults.
    pub fn new(client_id: String, client_secret: SecretString, callback_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            client: ClientOptions::default(),
            access_token: AccessTokenOptions::default(),
            authorize_params: BTreeMap::new(),
            callback_url,
            provider_ignores_state: false,
        }
    }

    pub fn with_client(mut self, client: ClientOptions) -> Self {
        self.client = client;
        self
    }

    pub fn with_authorize_param(mut self, key: &str, value: &str) -> Self {
        self.authorize_params
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_provider_ignores_state(mut self, ignores_state: bool) -> Self {
        self.provider_ignores_state = ignores_state;
        self
    }
}

/// Build the extra authorization parameters for a request phase.
///
/// `display`, `scope` and `auth_type` given on the request override the configured
/// values, and `scope` falls back to [`DEFAULT_SCOPE`].
pub fn authorize_params(
    configured: &BTreeMap<String, String>,
    request_params: &HashMap<String, String>,
) -> BTreeMap<String, String> {
    let mut params = configured.clone();

    for key in AUTHORIZE_PASSTHROUGH_PARAMS {
        if let Some(value) = request_params.get(key) {
            params.insert(key.to_string(), value.clone());
        }
    }

    params
        .entry("scope".to_string())
        .or_insert_with(|| DEFAULT_SCOPE.to_string());

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_options() {
        let client = ClientOptions::default();
        assert_eq!(client.site, "https://signin.infusionsoft.com");
        assert_eq!(
            client.authorize_url,
            "https://signin.infusionsoft.com/app/oauth/authorize"
        );
        assert_eq!(client.token_url, "https://api.infusionsoft.com/token");
    }

    #[test]
    fn test_authorization_header() {
        let options = AccessTokenOptions::default();
        assert_eq!(options.authorization_header("tok123"), "OAuth tok123");
        assert_eq!(options.param_name, "access_token");
    }

    #[test]
    fn test_scope_defaults_to_full() {
        let params = authorize_params(&BTreeMap::new(), &HashMap::new());
        assert_eq!(params.get("scope").map(String::as_str), Some("full"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_request_params_override_configured() {
        let configured = BTreeMap::from([
            ("scope".to_string(), "configured".to_string()),
            ("display".to_string(), "page".to_string()),
        ]);
        let request = HashMap::from([
            ("display".to_string(), "popup".to_string()),
            ("auth_type".to_string(), "reauthenticate".to_string()),
            ("unrelated".to_string(), "ignored".to_string()),
        ]);

        let params = authorize_params(&configured, &request);

        assert_eq!(params.get("scope").map(String::as_str), Some("configured"));
        assert_eq!(params.get("display").map(String::as_str), Some("popup"));
        assert_eq!(
            params.get("auth_type").map(String::as_str),
            Some("reauthenticate")
        );
        assert!(!params.contains_key("unrelated"));
    }
}
