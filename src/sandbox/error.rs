use thiserror::Error;

use crate::runner::ds::error::JErrorType;

/// Errors surfaced by [`Sandbox`](crate::sandbox::Sandbox) and
/// [`SandboxRegistry`](crate::sandbox::registry::SandboxRegistry).
#[derive(Debug, Clone, Error)]
pub enum SandboxError {
    /// Hosted source failed to parse or threw. The inner error is unchanged.
    #[error("{0}")]
    Evaluation(JErrorType),
    #[error("sandbox {0} has been torn down")]
    Inert(String),
    /// Restoring the host global failed partway; earlier restorations stand.
    #[error("teardown failed: {0}")]
    Teardown(JErrorType),
    #[error("invalid sandbox configuration: {0}")]
    Config(String),
    #[error("sandbox registry: {0}")]
    Registry(String),
}

impl SandboxError {
    /// The interpreter error behind an evaluation or teardown failure.
    pub fn js_error(&self) -> Option<&JErrorType> {
        match self {
            SandboxError::Evaluation(e) | SandboxError::Teardown(e) => Some(e),
            _ => None,
        }
    }
}
