//! Kiro bootstrap - fetch, verify and run the Kiro installer

use anyhow::Result;
use kiro_bootstrap::app::AppContext;
use kiro_bootstrap::cli::Cli;
use kiro_bootstrap::infra::config::{RuntimeOptions, init_logging};

/// Exit code for SIGINT/SIGTERM.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() {
    let options = RuntimeOptions::from_env();
    init_logging(&options);
    let app = AppContext::new(options);

    // Dropping the losing branch drops the pipeline future, whose secure
    // workspace is destroyed on drop. The signal handlers stay registered,
    // so a second Ctrl-C cannot kill the process mid-cleanup.
    let code = tokio::select! {
        result = run(&app) => match result {
            Ok(code) => code,
            Err(e) => {
                app.output.error(&format!("Error: {e:#}"));
                1
            }
        },
        signal = interrupted() => {
            app.output.warn(&format!("Interrupted by {signal}, cleaned up"));
            INTERRUPTED_EXIT_CODE
        }
    };
    std::process::exit(code);
}

async fn run(app: &AppContext) -> Result<i32> {
    Cli::from_env()?.run(app).await
}

/// Resolve on SIGINT or SIGTERM. A handler that cannot be installed never fires.
async fn interrupted() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let sigint = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let sigterm = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        () = sigint => "SIGINT",
        () = sigterm => "SIGTERM",
    }
}
