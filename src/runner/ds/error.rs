use thiserror::Error;

use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;

/// Message of the `RangeError` raised when hosted calls nest too deeply.
pub const CALL_STACK_EXCEEDED: &str = "Maximum call stack size exceeded";

/// Interpreter error. Built-in kinds carry their message; `Thrown` carries
/// whatever value hosted code passed to `throw`.
#[derive(Debug, Clone, Error)]
pub enum JErrorType {
    #[error("Uncaught reference error: {0}.")]
    ReferenceError(String),
    #[error("Uncaught type error: {0}.")]
    TypeError(String),
    #[error("Uncaught range error: {0}.")]
    RangeError(String),
    #[error("Uncaught syntax error: {0}.")]
    SyntaxError(String),
    #[error("Uncaught {}", to_string(.0))]
    Thrown(JsValue),
}
impl JErrorType {
    /// Name of the matching error constructor, `None` for thrown values.
    pub fn error_name(&self) -> Option<&'static str> {
        match self {
            JErrorType::ReferenceError(_) => Some("ReferenceError"),
            JErrorType::TypeError(_) => Some("TypeError"),
            JErrorType::RangeError(_) => Some("RangeError"),
            JErrorType::SyntaxError(_) => Some("SyntaxError"),
            JErrorType::Thrown(_) => None,
        }
    }

    /// Whether this is the call-depth `RangeError`. Host dispatch loops
    /// propagate it instead of reporting it per callback.
    pub fn is_call_stack_exceeded(&self) -> bool {
        match self {
            JErrorType::RangeError(m) => m == CALL_STACK_EXCEEDED,
            _ => false,
        }
    }

    pub fn message(&self) -> String {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => m.to_string(),
            JErrorType::Thrown(v) => to_string(v),
        }
    }
}
