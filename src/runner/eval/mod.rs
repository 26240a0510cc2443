//! Tree-walking evaluator for the hosted-script AST.
//!
//! Statements return completion records; exceptions travel as `Err(JErrorType)`.

pub mod expression;
pub mod function;
pub mod statement;
pub mod types;

pub use types::{Completion, CompletionType, Reference};
