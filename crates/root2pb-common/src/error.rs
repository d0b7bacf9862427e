//! Error types for root2pb

use thiserror::Error;

/// Result type alias for root2pb operations
pub type Result<T> = std::result::Result<T, Root2pbError>;

/// Main error type for the root2pb pipeline
#[derive(Error, Debug)]
pub enum Root2pbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Descriptor decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("Unsupported or malformed data source: {0}")]
    SourceFormat(String),

    #[error("Tree not found: {tree} (in {path})")]
    TreeNotFound { tree: String, path: String },

    #[error("Branch not found: {branch} (in tree {tree})")]
    BranchNotFound { tree: String, branch: String },

    #[error("Branch {branch} holds {actual} values but the schema expects {expected}")]
    BindMismatch {
        branch: String,
        expected: String,
        actual: String,
    },

    #[error("Value out of range in branch {branch} at entry {entry}: {detail}")]
    ValueOutOfRange {
        branch: String,
        entry: u64,
        detail: String,
    },

    #[error("Problem loading entry {entry} of tree {tree}")]
    EntryLoad { tree: String, entry: u64 },

    #[error("Descriptor error: {0}")]
    Descriptor(String),

    #[error("Field {field} has unsupported protobuf type {declared}")]
    UnsupportedFieldType { field: String, declared: String },

    #[error("Invalid protobuf identifier: {0}")]
    InvalidName(String),

    #[error("Could not launch {program}: {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited unsuccessfully ({status})")]
    ToolFailed { program: String, status: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Root2pbError {
    /// Create a source format error
    pub fn source_format(msg: impl Into<String>) -> Self {
        Self::SourceFormat(msg.into())
    }

    /// Create a descriptor error
    pub fn descriptor(msg: impl Into<String>) -> Self {
        Self::Descriptor(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a bind mismatch error
    pub fn bind_mismatch(
        branch: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::BindMismatch {
            branch: branch.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether the error means the requested tree or its file is missing.
    ///
    /// The inspection path degrades on these instead of aborting.
    pub fn is_missing_source(&self) -> bool {
        match self {
            Self::TreeNotFound { .. } => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source_classification() {
        let err = Root2pbError::TreeNotFound {
            tree: "events".to_string(),
            path: "data.json".to_string(),
        };
        assert!(err.is_missing_source());

        let err = Root2pbError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.is_missing_source());

        let err = Root2pbError::config("bad");
        assert!(!err.is_missing_source());
    }

    #[test]
    fn test_error_messages() {
        let err = Root2pbError::bind_mismatch("px", "float", "vector<double>");
        assert_eq!(
            err.to_string(),
            "Branch px holds vector<double> values but the schema expects float"
        );
    }
}
