//! kestrel
//!
//! Host-side embedding layer for the kestrel-script guest runtime: the
//! protected invocation shim, a one-call-per-thread worker abstraction,
//! and host configuration.

pub mod config;
pub mod shim;
pub mod worker;

pub use shim::{invoke_protected, read_status, HANDLER_SLOT};
pub use worker::ScriptWorker;
