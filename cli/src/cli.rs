//! CLI surface
//!
//! Every argument belongs to the installer. The bootstrap only intercepts
//! `--help`/`-h`. The clap definition renders the usage text; the forwarded
//! list itself is taken straight from the process arguments, because clap
//! would swallow a `--` the installer must see.

use std::ffi::OsString;
use std::io::IsTerminal;

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize as _;

use crate::app::AppContext;
use crate::application::services::pipeline::Invocation;
use crate::commands;
use crate::domain::args::{INSTALLER_FLAGS, wants_help};
use crate::output::{OutputContext, TerminalReporter};

/// Fetch, verify and run the Kiro installer
#[derive(Parser, Debug)]
#[command(
    name = "kiro-bootstrap",
    version,
    disable_help_flag = true,
    disable_version_flag = true,
    after_help = "Environment:\n  TMPDIR              Secure scratch directory (default /tmp)\n  KIRO_BOOTSTRAP_LOG  Log filter, e.g. debug (default warn)\n  NO_COLOR            Disable colored output"
)]
pub struct Cli {
    /// Arguments forwarded verbatim to the installer
    #[arg(
        value_name = "INSTALLER_ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

impl Cli {
    /// Forward this process's arguments (after the program name).
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is not valid UTF-8.
    pub fn from_env() -> Result<Self> {
        Self::from_args(std::env::args_os().skip(1))
    }

    /// Build from an explicit argument list, keeping every entry as given.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is not valid UTF-8.
    pub fn from_args(args: impl IntoIterator<Item = OsString>) -> Result<Self> {
        let args = args
            .into_iter()
            .map(|arg| {
                arg.into_string().map_err(|raw| {
                    anyhow!("argument '{}' is not valid UTF-8", raw.to_string_lossy())
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { args })
    }

    /// Execute the bootstrap, returning the exit code to surface.
    ///
    /// # Errors
    ///
    /// Returns an error if any pipeline stage fails.
    pub async fn run(self, app: &AppContext) -> Result<i32> {
        if wants_help(&self.args) {
            print_usage(&app.output);
            return Ok(0);
        }

        let reporter = TerminalReporter::new(&app.output);
        let guard = app.environment_guard();
        let invocation = Invocation {
            args: &self.args,
            stdin_is_tty: std::io::stdin().is_terminal(),
        };
        commands::install::run(
            &app.config,
            &guard,
            &app.runner,
            &app.fs,
            &reporter,
            &invocation,
        )
        .await
    }
}

/// Print the usage text, including the installer flags that are forwarded.
pub fn print_usage(ctx: &OutputContext) {
    let mut cmd = Cli::command();
    eprintln!("{}", cmd.render_help());
    eprintln!();
    eprintln!("{}", "Installer options (forwarded as-is):".style(ctx.styles.header));
    for (flag, help) in INSTALLER_FLAGS {
        eprintln!("  {flag:<14} {}", help.style(ctx.styles.dim));
    }
}
