use thiserror::Error;

#[derive(Error, Debug)]
pub enum VellumError {
    #[error("Not in a vellum project. Run 'vellum init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .vellum/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("{kind} document not found: {id}")]
    NotFound { kind: String, id: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid document kind: {0}")]
    InvalidKind(String),

    #[error("Invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Loro error: {0}")]
    Loro(#[from] loro::LoroError),

    #[error("Loro encode error: {0}")]
    LoroEncode(#[from] loro::LoroEncodeError),
}

impl VellumError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        VellumError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(kind: impl std::fmt::Display, id: impl Into<String>) -> Self {
        VellumError::NotFound {
            kind: kind.to_string(),
            id: id.into(),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            VellumError::NotFound { .. } => 1,
            VellumError::Validation { .. }
            | VellumError::InvalidKind(_)
            | VellumError::InvalidValue { .. } => 2,
            VellumError::UnsupportedOperation(_) => 3,
            _ => 1,
        }
    }

    /// Short machine-readable name used in API error bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            VellumError::NotInitialized => "NotInitialized",
            VellumError::AlreadyInitialized => "AlreadyInitialized",
            VellumError::Validation { .. } => "ValidationError",
            VellumError::NotFound { .. } => "NotFound",
            VellumError::UnsupportedOperation(_) => "UnsupportedOperation",
            VellumError::InvalidKind(_) => "InvalidKind",
            VellumError::InvalidValue { .. } => "InvalidValue",
            VellumError::Generation(_) => "GenerationFailed",
            VellumError::Storage(_)
            | VellumError::Io(_)
            | VellumError::Loro(_)
            | VellumError::LoroEncode(_) => "StorageError",
            VellumError::Server(_) => "ServerError",
            VellumError::Json(_) | VellumError::Yaml(_) => "InternalError",
        }
    }
}

pub type Result<T> = std::result::Result<T, VellumError>;
