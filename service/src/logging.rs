use crate::config::{Config, RustEnv};
use log::LevelFilter;
use simplelog::{self, ConfigBuilder};

/// Modules whose logs are shown when not in Trace mode.
/// Everything else (dependencies) only shows up when tracing.
const OWN_MODULES: &[&str] = &["infusionsoft_auth", "service"];

pub struct Logger {}

impl Logger {
    /// Initializes the global logger with configuration based on the provided Config.
    ///
    /// When the log level is set to Trace, all logs including dependency logs are shown.
    /// For all other log levels, only this workspace's crates are logged.
    pub fn init_logger(config: &Config) {
        let log_level_filter = Self::convert_level_filter(config.log_level_filter);
        let apply_filters = Self::should_filter_dependencies(config.log_level_filter);
        let log_config = Self::build_log_config(apply_filters);

        let (terminal_mode, color_choice) = Self::terminal_settings(&config.runtime_env);

        if simplelog::TermLogger::init(log_level_filter, log_config, terminal_mode, color_choice)
            .is_err()
        {
            eprintln!("Logger already initialized, keeping the existing one");
        }
    }

    /// Converts log::LevelFilter to simplelog::LevelFilter.
    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    /// Determines whether dependency logging should be filtered.
    ///
    /// Returns `false` for Trace level (show all logs), `true` for all other levels.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    /// Log lines go to stderr so command output on stdout stays machine readable.
    /// Colors are dropped outside development.
    fn terminal_settings(env: &RustEnv) -> (simplelog::TerminalMode, simplelog::ColorChoice) {
        match env {
            RustEnv::Development => (
                simplelog::TerminalMode::Stderr,
                simplelog::ColorChoice::Auto,
            ),
            RustEnv::Staging | RustEnv::Production => (
                simplelog::TerminalMode::Stderr,
                simplelog::ColorChoice::Never,
            ),
        }
    }

    /// Builds a simplelog Config, restricted to this workspace's modules when
    /// `apply_filters` is true.
    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in OWN_MODULES {
                builder.add_filter_allow_str(module);
            }
        }

        builder.build()
    }
}
