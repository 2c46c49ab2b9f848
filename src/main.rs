use std::io;
use std::process::ExitCode;

use dico_core::{protocol, Engine, Settings};
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dico_core={level}")));

    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("dico-core: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&settings.log_level);

    let engine = match Engine::bootstrap(settings) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        threshold = engine.settings().fuzzy_threshold,
        pairs = engine.settings().supported_pairs.len(),
        "dico-core ready"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();

    match protocol::serve(&engine, stdin.lock(), stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        // closed stdout: the client went away
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "protocol loop stopped");
            ExitCode::FAILURE
        }
    }
}
