use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kestrel::config::AppConfig;
use kestrel::ScriptWorker;
use kestrel_script::{InterpreterState, ScriptError, Variant};

/// Demo driver: prepares a few call frames, runs each on its own worker
/// thread, and reports the status codes.
#[derive(Parser, Debug)]
#[command(name = "kestrel")]
struct Args {
    /// Path to the host configuration file.
    #[arg(long, default_value = "kestrel.json")]
    config: PathBuf,
}

/// A handler that prefixes the error value with the worker name, the way an
/// embedding would attach a stack trace.
fn message_handler() -> Variant {
    Variant::callable(|state| {
        let msg = state.arg(0).map(|v| v.to_string()).unwrap_or_default();
        state.push(Variant::Str(format!("worker: {msg}")))?;
        Ok(1)
    })
}

fn prepare_sum_frame() -> Result<InterpreterState> {
    let mut state = InterpreterState::new();
    state.push(message_handler())?;
    state.push(Variant::callable(|state| {
        let mut sum = 0;
        for i in 0..state.frame_top() {
            sum += state.arg(i).and_then(Variant::as_int).unwrap_or(0);
        }
        tracing::info!(sum, "guest computed a sum");
        Ok(0)
    }))?;
    state.push(Variant::Int(19))?;
    state.push(Variant::Int(23))?;
    Ok(state)
}

fn prepare_failing_frame() -> Result<InterpreterState> {
    let mut state = InterpreterState::new();
    state.push(message_handler())?;
    state.push(Variant::callable(|_| {
        Err(ScriptError::Raised(Variant::Str("scripted failure".into())).into())
    }))?;
    Ok(state)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::read_or_create_default(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logger.filter)),
        )
        .init();

    tracing::info!(app = %config.app_name, "starting demo invocations");

    let workers = vec![
        ("sum", ScriptWorker::spawn(prepare_sum_frame()?)?),
        ("failing", ScriptWorker::spawn(prepare_failing_frame()?)?),
    ];

    for (name, worker) in workers {
        let (_state, status) = worker
            .join()
            .with_context(|| format!("joining {name} worker"))?;
        tracing::info!(name, code = status.code(), %status, "invocation finished");
    }

    Ok(())
}
