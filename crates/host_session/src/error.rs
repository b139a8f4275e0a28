use thiserror::Error;

/// Failure reported by one of the host's collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("other: {0}")]
    Other(String),
}

/// Why a one-shot action did not complete.
#[derive(Error, Debug)]
pub enum EffectError {
    /// Nothing went wrong; the precondition for the action is not there yet.
    #[error("not ready: {0}")]
    NotReady(String),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("{failed} of {attempted} commands failed")]
    Commands { attempted: usize, failed: usize },
}

impl EffectError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EffectError::NotReady(_) | EffectError::Host(HostError::Unavailable(_))
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ron parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("ron write error: {0}")]
    Write(#[from] ron::Error),
}
