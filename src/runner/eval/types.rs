//! Core types for the evaluation engine.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::value::JsValue;

/// Completion record type.
/// Exceptions travel as `Err(JErrorType)`, so there is no throw completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionType {
    Normal,
    Return,
    Break,
    Continue,
}

/// Completion record.
/// Every statement evaluation returns a completion record.
pub struct Completion {
    pub completion_type: CompletionType,
    pub value: Option<JsValue>,
}

impl Completion {
    pub fn normal() -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: None,
        }
    }

    pub fn normal_with_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: Some(value),
        }
    }

    pub fn return_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Return,
            value: Some(value),
        }
    }

    pub fn break_completion() -> Self {
        Completion {
            completion_type: CompletionType::Break,
            value: None,
        }
    }

    pub fn continue_completion() -> Self {
        Completion {
            completion_type: CompletionType::Continue,
            value: None,
        }
    }

    pub fn is_normal(&self) -> bool {
        self.completion_type == CompletionType::Normal
    }

    pub fn is_abrupt(&self) -> bool {
        !self.is_normal()
    }

    /// Get the value, or undefined if none.
    pub fn get_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }

    /// Fills in the value of a completion that has none yet.
    pub fn update_empty(self, value: Option<JsValue>) -> Self {
        if self.value.is_none() {
            Completion { value, ..self }
        } else {
            self
        }
    }
}

/// Target of an assignment, update or `delete`.
pub enum Reference {
    /// Property `name` on a base value.
    Property { base: JsValue, name: String },
    /// Identifier resolved through a lexical environment chain.
    Identifier {
        env: JsLexEnvironmentType,
        name: String,
    },
}

/// Result type for evaluation operations.
pub type EvalResult = Result<Completion, JErrorType>;

/// Result type for value-returning operations.
pub type ValueResult = Result<JsValue, JErrorType>;
