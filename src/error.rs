use thiserror::Error;

/// Failures the pipeline can surface to callers.
///
/// The first two are fatal to registry construction; the selector errors are
/// bad query parameters from the UI collaborator and must never take the
/// process down.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A network source could not be fetched or its payload was malformed.
    #[error("source `{source_name}` unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// The per-category tables disagree on date index or country columns,
    /// so `infected` cannot be derived without misaligning data.
    #[error("shape mismatch between category tables: {0}")]
    ShapeMismatch(String),

    /// A dataset or evaluation name that is not a registry key.
    #[error("unknown selector `{0}`")]
    UnknownSelector(String),

    /// A country that is not a column of the registry.
    #[error("unknown country `{0}`")]
    UnknownCountry(String),
}

impl PipelineError {
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
