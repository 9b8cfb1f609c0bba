//! Runtime options read from the process environment.
//!
//! The bootstrap consumes no flags of its own (every argument belongs to the
//! installer), so the few knobs it has come from environment variables.

use std::path::PathBuf;

/// Secure scratch-directory override.
pub const SCRATCH_ENV_VAR: &str = "TMPDIR";

/// Log filter for the `tracing` subscriber.
pub const LOG_ENV_VAR: &str = "KIRO_BOOTSTRAP_LOG";

/// Default log filter when `KIRO_BOOTSTRAP_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Options resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Scratch location override; `None` when unset or empty.
    pub scratch_override: Option<PathBuf>,
    /// `NO_COLOR` present.
    pub no_color: bool,
    /// Filter directive for the log subscriber.
    pub log_filter: String,
}

impl RuntimeOptions {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve options through `lookup` (injected in tests).
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            scratch_override: lookup(SCRATCH_ENV_VAR)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            no_color: lookup("NO_COLOR").is_some(),
            log_filter: lookup(LOG_ENV_VAR)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

/// Install the stderr `tracing` subscriber. A second call is a no-op.
pub fn init_logging(options: &RuntimeOptions) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&options.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
