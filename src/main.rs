use clap::{Parser, Subcommand};
use infusionsoft_auth::callback::CODE_PARAM;
use infusionsoft_auth::error::{signed_request_error, Error, SignedRequestErrorKind};
use infusionsoft_auth::oauth::Strategy;
use infusionsoft_auth::signed_request::{SignedRequest, SUPPORTED_ALGORITHM};
use log::{debug, error};
use secrecy::ExposeSecret;
use serde_json::{json, Map, Value};
use service::{config::Config, logging::Logger};
use std::collections::HashMap;

#[derive(Parser)]
#[command(author, version, about = "Infusionsoft sign-in tooling", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the authorization URL a user would be redirected to.
    AuthorizeUrl {
        /// Passed through as the `display` authorization parameter.
        #[arg(long)]
        display: Option<String>,
        /// Passed through as the `scope` authorization parameter for this request only.
        #[arg(long)]
        request_scope: Option<String>,
        /// Passed through as the `auth_type` authorization parameter.
        #[arg(long)]
        auth_type: Option<String>,
    },
    /// Sign a JSON object as a signed request cookie value.
    Sign {
        /// JSON object to sign. `algorithm` defaults to HMAC-SHA256.
        payload: String,
    },
    /// Verify a signed request cookie value and print its payload.
    Verify { signed_request: String },
    /// Resolve the authorization code of a callback from a `code` parameter and/or a signed request cookie.
    Resolve {
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        cookie: Option<String>,
    },
}

fn main() {
    service::config::load_env_file();
    let cli = Cli::parse();
    Logger::init_logger(&cli.config);

    let strategy = match service::init_strategy(&cli.config) {
        Ok(strategy) => strategy,
        Err(e) => {
            error!("Failed to configure the Infusionsoft strategy: {e}");
            std::process::exit(1);
        }
    };

    match run(&strategy, cli.command) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            error!("{}", failure_message(&e));
            std::process::exit(1);
        }
    }
}

/// Log line for a failed command. The "Authentication failure!" line belongs to
/// `Strategy::callback_phase`.
fn failure_message(e: &Error) -> String {
    format!("Command failed [{}]: {e}", e.failure_tag())
}

fn run(strategy: &Strategy, command: Command) -> Result<String, Error> {
    let secret = strategy.options().client_secret.expose_secret().as_bytes();

    match command {
        Command::AuthorizeUrl {
            display,
            request_scope,
            auth_type,
        } => {
            let request_params: HashMap<String, String> = [
                ("display", display),
                ("scope", request_scope),
                ("auth_type", auth_type),
            ]
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key.to_string(), value)))
            .collect();

            let authorization = strategy.request_phase(&request_params)?;
            debug!("Issued authorization state {}", authorization.state);
            Ok(authorization.url)
        }
        Command::Sign { payload } => {
            let mut payload: Map<String, Value> = serde_json::from_str(&payload).map_err(|e| {
                signed_request_error(
                    SignedRequestErrorKind::MalformedPayload,
                    &format!("Payload must be a JSON object: {e}"),
                )
            })?;
            payload
                .entry("algorithm")
                .or_insert_with(|| Value::from(SUPPORTED_ALGORITHM));

            SignedRequest::sign(&payload, secret)
        }
        Command::Verify { signed_request } => {
            let verified = SignedRequest::parse(&signed_request, secret)?;
            Ok(Value::Object(verified.into_payload()).to_string())
        }
        Command::Resolve { code, cookie } => {
            let mut params = HashMap::new();
            if let Some(code) = code {
                params.insert(CODE_PARAM.to_string(), code);
            }
            let mut state = strategy.callback_state(params);

            let resolution = strategy
                .resolver()
                .resolve(&mut state, cookie.as_deref(), |state| {
                    json!({
                        "resolved": state.resolved_code(),
                        "redirect_uri": strategy.callback_url(state),
                        "csrf_check": !state.ignores_state(),
                    })
                })?;

            Ok(resolution.to_string())
        }
    }
}
