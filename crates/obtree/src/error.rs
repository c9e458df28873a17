use thiserror::Error;

/// Errors raised at registration or model-definition time.
///
/// Dispatch itself has no recoverable-error path; misuse is reported
/// synchronously at the point it happens, never deferred into a bubble.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("invalid listener spec: {0}")]
    InvalidListenerSpec(String),

    #[error("model type `{model_type}` has no declared field `{field}`")]
    InvalidWrapperTarget { model_type: String, field: String },

    #[error("invalid wrapper arguments: {0}")]
    InvalidWrapperArguments(String),
}
