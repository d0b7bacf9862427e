//! Error types for the root2pb CLI
//!
//! Every error is user-facing: the message says what went wrong and, where
//! there is one, what to do about it.

use root2pb_common::Root2pbError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// A required flag was not given
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    /// Input file does not exist
    #[error("File not found: '{0}'. Verify the file path exists and you have read permissions.")]
    FileNotFound(String),

    /// Tree is not in the input file
    #[error("{0}. Run 'root2pb inspect' against the file to check the tree name.")]
    TreeNotFound(String),

    /// External tool could not run
    #[error("{0}. Install protoc or point the PROTOC environment variable at it.")]
    Compiler(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables and flags.")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// JSON output failed
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pipeline error without a more specific hint
    #[error(transparent)]
    Pipeline(Root2pbError),
}

impl From<Root2pbError> for CliError {
    fn from(err: Root2pbError) -> Self {
        match err {
            Root2pbError::TreeNotFound { .. } => Self::TreeNotFound(err.to_string()),
            Root2pbError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                Self::FileNotFound(io.to_string())
            },
            Root2pbError::ToolLaunch { ref program, .. } if is_protoc(program) => {
                Self::Compiler(err.to_string())
            },
            Root2pbError::Config(msg) => Self::Config(msg),
            other => Self::Pipeline(other),
        }
    }
}

fn is_protoc(program: &str) -> bool {
    std::path::Path::new(program)
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with("protoc"))
}
