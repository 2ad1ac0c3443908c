use std::fmt;

use crate::variant::Variant;

/// An error raised during guest execution.
///
/// These never unwind through a protected call:
/// [`InterpreterState::protected_call`](crate::state::InterpreterState::protected_call)
/// catches them and reports a [`Status`] instead.
#[derive(thiserror::Error, Debug)]
pub enum ScriptError {
    /// An explicit guest-level raise carrying an error value.
    #[error("error raised: {0}")]
    Raised(Variant),

    #[error("attempt to call a {type_name} value")]
    NotCallable { type_name: &'static str },

    #[error("stack overflow (limit={limit})")]
    StackOverflow { limit: usize },
}

impl ScriptError {
    /// The status class this error reports through a protected call.
    pub fn status(&self) -> Status {
        match self {
            ScriptError::StackOverflow { .. } => Status::MemoryError,
            _ => Status::RuntimeError,
        }
    }

    /// The error value handed to the message handler.
    pub fn into_value(self) -> Variant {
        match self {
            ScriptError::Raised(v) => v,
            other => Variant::Str(other.to_string()),
        }
    }
}

/// Result of a protected call.
///
/// The numbering follows the embedded-runtime convention: 0 is success and
/// each failure class has a fixed nonzero code. The shim relays these codes
/// verbatim; it never interprets them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// The callee raised (or was not callable at all).
    RuntimeError,
    /// The guest ran out of stack.
    MemoryError,
    /// The message handler itself failed (raised, missing, or not callable).
    HandlerError,
}

impl Status {
    pub fn code(self) -> i64 {
        match self {
            Status::Ok => 0,
            Status::RuntimeError => 2,
            Status::MemoryError => 4,
            Status::HandlerError => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Status> {
        match code {
            0 => Some(Status::Ok),
            2 => Some(Status::RuntimeError),
            4 => Some(Status::MemoryError),
            5 => Some(Status::HandlerError),
            _ => None,
        }
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "ok",
            Status::RuntimeError => "runtime error",
            Status::MemoryError => "memory error",
            Status::HandlerError => "handler error",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for status in [
            Status::Ok,
            Status::RuntimeError,
            Status::MemoryError,
            Status::HandlerError,
        ] {
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
        assert_eq!(Status::from_code(1), None);
        assert_eq!(Status::from_code(-1), None);
    }

    #[test]
    fn error_classification() {
        assert_eq!(
            ScriptError::Raised(Variant::Int(7)).status(),
            Status::RuntimeError
        );
        assert_eq!(
            ScriptError::NotCallable { type_name: "int" }.status(),
            Status::RuntimeError
        );
        assert_eq!(
            ScriptError::StackOverflow { limit: 16 }.status(),
            Status::MemoryError
        );
    }

    #[test]
    fn error_values() {
        assert_eq!(
            ScriptError::Raised(Variant::Str("boom".into())).into_value(),
            Variant::Str("boom".into())
        );
        assert_eq!(
            ScriptError::NotCallable { type_name: "nil" }.into_value(),
            Variant::Str("attempt to call a nil value".into())
        );
    }
}
