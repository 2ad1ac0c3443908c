use kestrel_script::{InterpreterState, Status, Variant};

/// Absolute stack slot holding the message handler under the Stack Frame
/// Contract: slot 0 is the handler, slot 1 the callable, everything above
/// it the arguments.
pub const HANDLER_SLOT: usize = 0;

/// Invoke the prepared call frame under protection and leave only the
/// status code on the stack.
///
/// The caller must have established the Stack Frame Contract before calling
/// this: `[handler, callable, arg1 .. argN]`, bottom to top. No validation
/// is performed; a stack shallower than two slots is a caller error.
///
/// The callable is invoked with `depth - 2` arguments, any raise is routed
/// through the handler, and all guest results are discarded. Afterwards the
/// stack holds exactly one value: `Variant::Int(status.code())`. Nothing is
/// returned to the shim's own caller; the outcome lives entirely in the
/// state.
pub fn invoke_protected(state: &mut InterpreterState) {
    let argc = state.top() - 2;
    let status = state.protected_call(argc, 0, Some(HANDLER_SLOT));
    state.set_top(0);
    // Cannot overflow a just-cleared stack.
    let _ = state.push(Variant::Int(status.code()));
    tracing::trace!(argc, %status, "protected invocation finished");
}

/// Decode the status a finished invocation left on the stack.
///
/// Returns `None` if the stack does not hold exactly one integer carrying a
/// known status code.
pub fn read_status(state: &InterpreterState) -> Option<Status> {
    if state.top() != 1 {
        return None;
    }
    state
        .slot(0)
        .and_then(Variant::as_int)
        .and_then(Status::from_code)
}
