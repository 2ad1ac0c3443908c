use std::fmt;
use std::sync::Arc;

use crate::state::InterpreterState;

/// A host function callable from the guest stack.
///
/// On entry the state's frame base points at the function's first argument;
/// `arg(i)` indexes into the arguments and `frame_top()` equals the argument
/// count. The function leaves its results on top of the stack and returns
/// how many it pushed, or raises by returning `Err` (use
/// [`ScriptError::Raised`](crate::error::ScriptError) to carry a guest
/// error value, any other error becomes a string message).
pub type NativeFn = Arc<dyn Fn(&mut InterpreterState) -> anyhow::Result<usize> + Send + Sync>;

/// A guest value.
#[derive(Clone)]
pub enum Variant {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Callable(NativeFn),
}

impl Variant {
    /// Wrap a closure as a callable guest value.
    pub fn callable<F>(f: F) -> Variant
    where
        F: Fn(&mut InterpreterState) -> anyhow::Result<usize> + Send + Sync + 'static,
    {
        Variant::Callable(Arc::new(f))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Variant::Nil => false,
            Variant::Bool(b) => *b,
            Variant::Int(v) => *v != 0,
            Variant::Float(v) => *v != 0.0,
            Variant::Str(s) => !s.is_empty(),
            Variant::Callable(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Nil => "nil",
            Variant::Bool(_) => "bool",
            Variant::Int(_) => "int",
            Variant::Float(_) => "float",
            Variant::Str(_) => "string",
            Variant::Callable(_) => "callable",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Variant::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Variant::Nil, Variant::Nil) => true,
            (Variant::Bool(a), Variant::Bool(b)) => a == b,
            (Variant::Int(a), Variant::Int(b)) => a == b,
            (Variant::Float(a), Variant::Float(b)) => a == b,
            (Variant::Str(a), Variant::Str(b)) => a == b,
            // Callables compare by identity; there is no structural equality
            // for host functions.
            (Variant::Callable(a), Variant::Callable(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Nil => f.write_str("Nil"),
            Variant::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Variant::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Variant::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Variant::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Variant::Callable(_) => f.write_str("Callable(<native fn>)"),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Nil => write!(f, "nil"),
            Variant::Bool(b) => write!(f, "{}", b),
            Variant::Int(v) => write!(f, "{}", v),
            Variant::Float(v) => write!(f, "{}", v),
            Variant::Str(s) => write!(f, "{s}"),
            Variant::Callable(_) => write!(f, "<native fn>"),
        }
    }
}
