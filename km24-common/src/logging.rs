//! Tracing subscriber setup
//!
//! The subscriber is installed before configuration is read, at the default
//! level, so config loading itself is logged. Once the TOML file is known
//! [`LogLevelHandle::apply`] switches to the configured level.

use crate::config::LoggingConfig;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Handle to the installed filter, for applying the configured level
pub struct LogLevelHandle {
    handle: reload::Handle<EnvFilter, Registry>,
}

/// Install the global fmt subscriber at the default level
///
/// `RUST_LOG` takes precedence. Output goes to stderr so command output on
/// stdout stays machine-readable.
pub fn init_tracing() -> LogLevelHandle {
    let (filter, handle) = reload::Layer::new(build_filter(&LoggingConfig::default()));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();

    LogLevelHandle { handle }
}

impl LogLevelHandle {
    /// Switch to the configured level; `RUST_LOG` still wins
    ///
    /// Re-reads `RUST_LOG`, which a `.env` file may have set after startup.
    pub fn apply(&self, logging: &LoggingConfig) {
        if let Err(e) = self.handle.reload(build_filter(logging)) {
            debug!("Log level not applied: {}", e);
        }
    }
}

fn build_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(build_directive(&logging.level)))
}

/// Scope the configured level to the KM24 crates, keep dependencies at warn
fn build_directive(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    format!("warn,km24_agent={level},km24_common={level}")
}
