use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=info,axum=info";

/// Output flavour for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT` (`json` or anything else for compact).
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Initialize the global tracing subscriber.
/// - Respects `RUST_LOG` if set, otherwise `info,tower_http=info,axum=info`
/// - Writes to stdout
/// - Safe to call more than once; later calls are no-ops
pub fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(env_filter).with_target(false).with_writer(io::stdout);
    let _ = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Compact logging with the format picked from the environment.
pub fn init_logging_default() {
    init_logging(LogFormat::from_env());
}
