//! Structured errors for the host bridge.

/// Errors raised while handling one trigger line.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The line is not a well-formed trigger.
    #[error("INVALID_TRIGGER: {0}")]
    InvalidTrigger(String),

    /// The coordinator rejected the trigger.
    #[error(transparent)]
    Core(#[from] graines_core::Error),
}

impl HostError {
    pub fn code(&self) -> &'static str {
        match self {
            HostError::InvalidTrigger(_) => "INVALID_TRIGGER",
            HostError::Core(e) => e.code(),
        }
    }
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        HostError::InvalidTrigger(err.to_string())
    }
}
