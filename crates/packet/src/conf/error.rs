use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown filter kind '{0}'")]
    UnknownKind(String),

    #[error("filter entry has no kind")]
    MissingKind,

    #[error("invalid {kind} parameter '{parameter}': {reason}")]
    InvalidParameter {
        kind: &'static str,
        parameter: &'static str,
        reason: String,
    },

    #[error("invalid configuration document: {0}")]
    Document(#[from] toml::de::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(kind: &'static str, parameter: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            kind,
            parameter,
            reason: reason.into(),
        }
    }
}
