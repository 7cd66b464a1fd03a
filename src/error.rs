use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("API error: {0}")]
    Api(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Annotation unavailable: {0}")]
    AnnotationUnavailable(String),

    #[error("Annotation failed: {0}")]
    AnnotationFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(err.to_string()),
            _ => Error::DeviceUnavailable(err.to_string()),
        }
    }
}
