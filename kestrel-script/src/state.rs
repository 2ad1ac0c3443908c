use crate::error::{ScriptError, Status};
use crate::variant::{NativeFn, Variant};

pub const DEFAULT_STACK_LIMIT: usize = 256;

/// One guest execution context: a value stack plus the frame base of the
/// currently running callable.
///
/// A state is exclusively used by one thread at a time. It is `Send` but
/// deliberately not `Clone`: the embedding layer moves a state onto the
/// thread that runs it, it never shares one state between threads.
pub struct InterpreterState {
    stack: Vec<Variant>,

    /// Index of the first argument of the running callable. Zero when no
    /// call is in progress.
    base: usize,

    limit: usize,
}

impl Default for InterpreterState {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterState {
    pub fn new() -> Self {
        Self::with_stack_limit(DEFAULT_STACK_LIMIT)
    }

    pub fn with_stack_limit(limit: usize) -> Self {
        Self {
            stack: Vec::with_capacity(limit.clamp(1, DEFAULT_STACK_LIMIT)),
            base: 0,
            limit: limit.max(1),
        }
    }

    /// Current stack depth.
    #[inline]
    pub fn top(&self) -> usize {
        self.stack.len()
    }

    /// Stack depth relative to the frame base. Inside a native callable this
    /// equals the argument count until the callable pushes results.
    #[inline]
    pub fn frame_top(&self) -> usize {
        self.stack.len() - self.base
    }

    pub fn push(&mut self, v: Variant) -> Result<(), ScriptError> {
        if self.stack.len() >= self.limit {
            return Err(ScriptError::StackOverflow { limit: self.limit });
        }
        self.stack.push(v);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Variant> {
        self.stack.pop()
    }

    /// Absolute slot, indexed from the stack bottom.
    pub fn slot(&self, idx: usize) -> Option<&Variant> {
        self.stack.get(idx)
    }

    /// Argument of the running callable, indexed from the frame base.
    pub fn arg(&self, idx: usize) -> Option<&Variant> {
        self.stack.get(self.base + idx)
    }

    /// Truncate the stack to `n` values, or pad it with `Nil` up to `n`
    /// (never beyond the stack limit).
    pub fn set_top(&mut self, n: usize) {
        self.stack.resize(n.min(self.limit), Variant::Nil);
    }

    /// Perform a protected call.
    ///
    /// Entry stack, top-down: `argN .. arg1, callable`. On success the frame
    /// (callable and arguments) is consumed and up to `nresults` results are
    /// kept, padded with `Nil`. On a raise the handler slot, an absolute
    /// index below the frame, is invoked with the error value and may
    /// transform it; the frame is consumed and the error value is kept only
    /// when `nresults > 0`.
    ///
    /// Guest errors never unwind out of this call; every outcome is a
    /// [`Status`]. A raise inside the handler, a handler slot that does not
    /// hold a callable, or a callee that is not callable all still consume
    /// the frame and report through the status code.
    pub fn protected_call(
        &mut self,
        nargs: usize,
        nresults: usize,
        handler: Option<usize>,
    ) -> Status {
        // Frame preparation is a caller precondition, same as the rest of
        // the stack primitives.
        let func_idx = self.stack.len() - nargs - 1;
        let saved_base = self.base;

        let outcome = self.run_frame(func_idx);
        self.base = saved_base;

        match outcome {
            Ok(nret) => {
                // Results sit on top; collapse the frame underneath them.
                let nret = nret.min(self.stack.len() - func_idx);
                let results_start = self.stack.len() - nret;
                self.stack.drain(func_idx..results_start);
                self.stack.truncate(func_idx + nret.min(nresults));
                while self.stack.len() < func_idx + nresults {
                    self.stack.push(Variant::Nil);
                }
                Status::Ok
            }
            Err(err) => {
                self.stack.truncate(func_idx);
                let status = err.status();
                let value = err.into_value();
                let (status, value) = match handler {
                    Some(slot) if slot < func_idx => self.run_handler(slot, status, value),
                    // A handler inside (or above) the frame was consumed by
                    // the failed call; treat it as missing.
                    Some(_) => (Status::HandlerError, value),
                    None => (status, value),
                };
                self.stack.truncate(func_idx);
                if nresults > 0 {
                    self.stack.push(value);
                    while self.stack.len() < func_idx + nresults {
                        self.stack.push(Variant::Nil);
                    }
                }
                status
            }
        }
    }

    /// Invoke the callable at `func_idx` with the frame base set to its
    /// first argument. Returns the number of results it left on top.
    fn run_frame(&mut self, func_idx: usize) -> Result<usize, ScriptError> {
        let f: NativeFn = match &self.stack[func_idx] {
            Variant::Callable(f) => f.clone(),
            other => {
                return Err(ScriptError::NotCallable {
                    type_name: other.type_name(),
                })
            }
        };
        self.base = func_idx + 1;
        f(self).map_err(raised_from_anyhow)
    }

    /// Run the message handler over an error value. The handler sees the
    /// value as its single argument; its first result (or `Nil` if it
    /// returns none) replaces the value.
    fn run_handler(&mut self, slot: usize, status: Status, value: Variant) -> (Status, Variant) {
        let f: NativeFn = match self.stack.get(slot) {
            Some(Variant::Callable(f)) => f.clone(),
            _ => return (Status::HandlerError, value),
        };

        let frame_base = self.stack.len();
        // The consumed frame left headroom below the limit; no overflow
        // check needed for the single argument slot.
        self.stack.push(value);

        let saved_base = self.base;
        self.base = frame_base;
        let out = f(self);
        self.base = saved_base;

        match out {
            Ok(0) => {
                self.stack.truncate(frame_base);
                (status, Variant::Nil)
            }
            Ok(_) => {
                let v = self.stack.pop().unwrap_or(Variant::Nil);
                self.stack.truncate(frame_base);
                (status, v)
            }
            Err(e) => {
                self.stack.truncate(frame_base);
                (Status::HandlerError, raised_from_anyhow(e).into_value())
            }
        }
    }
}

/// Callables raise through `anyhow`: a `ScriptError` passes through intact
/// (so `Raised` keeps its error value), anything else becomes a runtime
/// error with the full error chain as its message.
fn raised_from_anyhow(err: anyhow::Error) -> ScriptError {
    match err.downcast::<ScriptError>() {
        Ok(se) => se,
        Err(e) => ScriptError::Raised(Variant::Str(format!("{e:#}"))),
    }
}
