//! Application context: unified state built once at startup.
//!
//! Holds the output context, the compiled-in configuration, the runtime
//! options read from the environment, and the production port
//! implementations. `main` builds exactly one and lends it to `Cli::run`.

use crate::domain::config::BootstrapConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::RuntimeOptions;
use crate::infra::environment::HostEnvironment;
use crate::infra::fs::LocalFs;
use crate::output::OutputContext;

/// Unified application context passed to the command handler.
pub struct AppContext {
    /// Terminal output context (colors, TTY detection).
    pub output: OutputContext,
    /// Compiled-in configuration (validated by the command).
    pub config: BootstrapConfig,
    /// Options read from the environment.
    pub options: RuntimeOptions,
    /// Process runner for git, the interpreter probe and the installer.
    pub runner: TokioCommandRunner,
    /// Local filesystem ports.
    pub fs: LocalFs,
}

impl AppContext {
    /// Construct an `AppContext` from resolved runtime options.
    #[must_use]
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            output: OutputContext::new(options.no_color),
            config: BootstrapConfig::builtin(),
            options,
            runner: TokioCommandRunner::default(),
            fs: LocalFs,
        }
    }

    /// The host environment guard, borrowing this context's runner.
    #[must_use]
    pub fn environment_guard(&self) -> HostEnvironment<'_, TokioCommandRunner> {
        HostEnvironment::new(&self.runner, &self.options)
    }
}
