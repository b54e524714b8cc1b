use std::process::ExitCode;

use engine::run_app;
use tracing::error;

use super::bootstrap::{build_app, AppWiring};

pub(crate) fn run() -> ExitCode {
    let app = match build_app() {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "bootstrap_failed");
            return ExitCode::FAILURE;
        }
    };
    run_wiring(app)
}

fn run_wiring(app: AppWiring) -> ExitCode {
    if let Err(err) = run_app(app.config, app.scene) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
