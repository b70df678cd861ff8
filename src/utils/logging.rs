
use clap::ValueEnum;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::settings::{LogFormat, LoggingConfig};


#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::TRACE => "TRACE",
            LogLevel::DEBUG => "DEBUG",
            LogLevel::INFO => "INFO",
            LogLevel::WARN => "WARN",
            LogLevel::ERROR => "ERROR",
        }
    }
}

/// CLI level wins over the config file, which wins over `info`.
pub fn resolve(config_logging: Option<&LoggingConfig>, arg_log_level: Option<LogLevel>) -> LoggingConfig {
    let config_logging = config_logging.cloned().unwrap_or_default();
    let level = arg_log_level
        .map(|level| level.as_str().to_lowercase())
        .unwrap_or(config_logging.level);
    LoggingConfig::new(level, config_logging.format)
}

pub fn run(config_logging: Option<&LoggingConfig>, arg_log_level: Option<LogLevel>) {
    init_logging(&resolve(config_logging, arg_log_level));
}


/// Initialize tracing with the desired config.
///
/// Logs go to stderr: stdout is reserved for Singer messages.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&cfg.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Base layer: filter + writer
    let registry = tracing_subscriber::registry().with(env_filter);

    // Choose format layer
    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true)
                .with_ansi(false);

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(false);

            let _ = registry.with(layer).try_init();
        }
    };
}
