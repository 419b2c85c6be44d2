//! Logging infrastructure for docqa.
//!
//! All logs go to stderr so stdout carries only answers and search results.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Settings;
use crate::error::{AppError, AppResult};

/// Initialize the tracing subscriber from loaded settings.
///
/// The filter is the configured level (`--log-level`, `logging.level`,
/// `RUST_LOG`), then `debug` under `--verbose`, then `info`.
///
/// # Example
/// ```no_run
/// use docqa_core::{config::Settings, logging::init_logging};
///
/// let settings = Settings::load(None, None).expect("Failed to load settings");
/// init_logging(&settings).expect("Failed to initialize logging");
/// ```
pub fn init_logging(settings: &Settings) -> AppResult<()> {
    let env_filter = build_filter(settings)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(use_color(settings.no_color));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

fn filter_directive(settings: &Settings) -> String {
    match (&settings.log_level, settings.verbose) {
        (Some(level), _) => level.clone(),
        (None, true) => "debug".to_string(),
        (None, false) => "info".to_string(),
    }
}

fn build_filter(settings: &Settings) -> AppResult<EnvFilter> {
    EnvFilter::try_new(filter_directive(settings))
        .map_err(|e| AppError::Config(format!("Invalid log filter: {}", e)))
}

fn use_color(no_color: bool) -> bool {
    if no_color || std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stderr().is_terminal()
}
