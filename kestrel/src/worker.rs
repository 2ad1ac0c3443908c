use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use kestrel_script::{InterpreterState, Status};

use crate::shim::{invoke_protected, read_status};

/// Runs one protected invocation on a dedicated OS thread.
///
/// A worker takes ownership of a prepared interpreter state, runs the shim
/// over it exactly once, and hands the state back on [`join`](Self::join).
/// States are moved between threads, never shared, so two workers cannot
/// observe each other's stacks. There is no pooling and no cancellation;
/// a worker is one call frame.
pub struct ScriptWorker {
    handle: JoinHandle<InterpreterState>,
}

impl ScriptWorker {
    /// Move `state` onto a new named thread and run the prepared frame.
    ///
    /// The state must satisfy the Stack Frame Contract (see
    /// [`invoke_protected`]) before spawning.
    pub fn spawn(state: InterpreterState) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("kestrel-worker".to_string())
            .spawn(move || {
                let mut state = state;
                invoke_protected(&mut state);
                state
            })
            .context("failed to spawn worker thread")?;

        tracing::debug!(thread = "kestrel-worker", "spawned protected invocation");
        Ok(Self { handle })
    }

    /// Wait for the invocation to finish and decode its status.
    ///
    /// Returns the state so the embedding can reuse or tear it down.
    pub fn join(self) -> Result<(InterpreterState, Status)> {
        let state = self
            .handle
            .join()
            .map_err(|_| anyhow!("worker thread panicked"))?;
        let status = read_status(&state)
            .ok_or_else(|| anyhow!("worker left no status code on the stack"))?;
        tracing::debug!(%status, "worker joined");
        Ok((state, status))
    }

    /// Let the invocation finish unobserved. The state is dropped by the
    /// worker thread when the call completes.
    pub fn detach(self) {
        drop(self.handle);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
