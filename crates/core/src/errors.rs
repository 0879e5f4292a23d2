use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown interaction event kind `{0}`")]
    UnknownEventKind(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable class label used in operator-facing command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain",
            Self::Persistence(_) => "persistence",
            Self::Configuration(_) => "configuration",
        }
    }
}
