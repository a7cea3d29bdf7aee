use config::Config;
use infusionsoft_auth::error::Error;
use infusionsoft_auth::oauth::Strategy;
use log::info;

pub mod config;
pub mod logging;

/// Build the sign-in strategy described by the configuration.
pub fn init_strategy(config: &Config) -> Result<Strategy, Error> {
    let strategy_options = config.strategy_options()?;

    info!(
        "Strategy config: authorize_url={}, token_url={}, callback_url={}, provider_ignores_state={}",
        strategy_options.client.authorize_url,
        strategy_options.client.token_url,
        strategy_options.callback_url,
        strategy_options.provider_ignores_state,
    );

    Strategy::new(strategy_options)
}
