use thiserror::Error;

/// Every way a deploy invocation can fail.
///
/// The handler maps each variant to exactly one response shape: only
/// `MethodNotAllowed` is a 405, everything else is reported as a 500 with
/// the variant's message in the `error` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    MissingConfiguration(String),

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The hosting platform answered with a non-success status.
    #[error("{message}")]
    UpstreamFailure { status: u16, message: String },

    #[error("Request to hosting API failed: {0}")]
    Transport(String),

    #[error("Failed to package deploy archive: {0}")]
    Archive(String),
}

impl DeployError {
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "method_not_allowed",
            Self::MissingConfiguration(_) => "configuration_error",
            Self::InvalidInput { .. } => "invalid_input",
            Self::UpstreamFailure { .. } => "upstream_failure",
            Self::Transport(_) => "transport_error",
            Self::Archive(_) => "archive_error",
        }
    }
}

impl From<zip::result::ZipError> for DeployError {
    fn from(err: zip::result::ZipError) -> Self {
        DeployError::Archive(err.to_string())
    }
}

impl From<std::io::Error> for DeployError {
    fn from(err: std::io::Error) -> Self {
        DeployError::Archive(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
