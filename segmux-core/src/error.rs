use thiserror::Error;

/// Custom error types for segmux
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The host cannot run the engine at all (loader/shared-library failure).
    /// Remediation is a host configuration change, not a retry.
    #[error("Environment unsupported: {0}")]
    EnvironmentUnsupported(String),

    /// The engine binary is missing or the adapter was never initialized.
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("No input segments provided")]
    NoInput,

    /// A single engine invocation exited with an error. For the final mux
    /// stage this triggers the one-shot stream-copy -> re-encode fallback;
    /// everywhere else it is terminal.
    #[error("Engine invocation failed ({args}): {message}")]
    InvocationFailed { args: String, message: String },

    /// An invocation did not produce an artifact the orchestrator expected.
    #[error("Artifact not found in engine namespace: {0}")]
    ArtifactNotFound(String),

    #[error("Merge failed: {0}")]
    MergeFailed(#[source] Box<CoreError>),
}

impl CoreError {
    /// Builds an `InvocationFailed` from an argument list and a cause message.
    pub fn invocation_failed(args: &[String], message: impl Into<String>) -> Self {
        CoreError::InvocationFailed {
            args: args.join(" "),
            message: message.into(),
        }
    }
}

/// Result type for segmux operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;
