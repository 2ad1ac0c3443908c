//! kestrel-script
//!
//! A small, self-contained guest runtime: a value stack, native callables,
//! and a protected-call primitive that converts guest-level raises into
//! status codes instead of unwinding into host code.
//!
//! This crate intentionally knows nothing about threads or the embedding
//! host. One [`InterpreterState`] is one guest execution context; the
//! embedding layer decides which thread uses it and when.

pub mod error;
pub mod state;
pub mod variant;

pub use error::{ScriptError, Status};
pub use state::{InterpreterState, DEFAULT_STACK_LIMIT};
pub use variant::{NativeFn, Variant};
