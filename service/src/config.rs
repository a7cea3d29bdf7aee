use clap::builder::TypedValueParser as _;
use clap::Args;
use dotenvy::dotenv;
use infusionsoft_auth::error::{config_error, ConfigErrorKind, Error};
use infusionsoft_auth::oauth::{options, ClientOptions, StrategyOptions};
use log::LevelFilter;
use secrecy::SecretString;
use std::fmt;
use std::str::FromStr;

/// Redirect URI used when `CALLBACK_URL` is not set.
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:4000/auth/infusionsoft/callback";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

/// Load variables from a `.env` file, if there is one, before arguments are parsed.
pub fn load_env_file() {
    dotenv().ok();
}

#[derive(Clone, Args)]
pub struct Config {
    /// The OAuth client ID issued by Infusionsoft.
    #[arg(long, env)]
    client_id: Option<String>,

    /// The OAuth client secret issued by Infusionsoft. Also the signed request cookie key.
    #[arg(long, env, hide_env_values = true)]
    client_secret: Option<String>,

    /// Base URL of the Infusionsoft sign-in site.
    #[arg(long, env, default_value = options::DEFAULT_SITE)]
    pub site: String,

    /// The authorization endpoint users are redirected to.
    #[arg(long, env, default_value = options::DEFAULT_AUTHORIZE_URL)]
    pub authorize_url: String,

    /// The token endpoint used to exchange authorization codes.
    #[arg(long, env, default_value = options::DEFAULT_TOKEN_URL)]
    pub token_url: String,

    /// Redirect URI registered with Infusionsoft for the callback.
    #[arg(long, env, default_value = DEFAULT_CALLBACK_URL)]
    pub callback_url: String,

    /// Scope requested when the request does not name one (Infusionsoft defaults to `full`).
    #[arg(long, env)]
    pub scope: Option<String>,

    /// Skip the CSRF state check on every callback.
    #[arg(long, env, default_value_t = false)]
    pub provider_ignores_state: bool,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Config {
    pub fn client_id(&self) -> Result<&str, Error> {
        self.client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                config_error(
                    ConfigErrorKind::MissingClientId,
                    "No client ID provided (--client-id or CLIENT_ID)",
                )
            })
    }

    pub fn client_secret(&self) -> Result<SecretString, Error> {
        self.client_secret
            .clone()
            .filter(|secret| !secret.is_empty())
            .map(SecretString::new)
            .ok_or_else(|| {
                config_error(
                    ConfigErrorKind::MissingClientSecret,
                    "No client secret provided (--client-secret or CLIENT_SECRET)",
                )
            })
    }

    /// Build the strategy options from this configuration.
    pub fn strategy_options(&self) -> Result<StrategyOptions, Error> {
        let client = ClientOptions {
            site: self.site.clone(),
            authorize_url: self.authorize_url.clone(),
            token_url: self.token_url.clone(),
        };

        let mut strategy_options = StrategyOptions::new(
            self.client_id()?.to_string(),
            self.client_secret()?,
            self.callback_url.clone(),
        )
        .with_client(client)
        .with_provider_ignores_state(self.provider_ignores_state);

        if let Some(scope) = &self.scope {
            strategy_options = strategy_options.with_authorize_param("scope", scope);
        }

        Ok(strategy_options)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("site", &self.site)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("callback_url", &self.callback_url)
            .field("scope", &self.scope)
            .field("provider_ignores_state", &self.provider_ignores_state)
            .field("log_level_filter", &self.log_level_filter)
            .field("runtime_env", &self.runtime_env)
            .finish()
    }
}
