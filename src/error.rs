use thiserror::Error;

/// Main error type for squill operations
#[derive(Error, Debug)]
pub enum SquillError {
    #[error("Store missing: {0} (open the index in write mode to create it)")]
    StoreMissing(String),

    #[error("Failed to open store {name}: {reason}")]
    StoreOpenFailed { name: String, reason: String },

    #[error("Index is already open for writing: {0}")]
    AlreadyOpenForWrite(String),

    #[error("Document id {0} does not fit in 32 bits")]
    DocIdTooLarge(u64),

    #[error("Document {0} is already indexed; remove it first")]
    DupDoc(u32),

    #[error("Failed to open stopword file {path}: {reason}")]
    StopwordFileOpenFailed { path: String, reason: String },

    #[error("Stopwords can only be configured on a write-mode index")]
    StopwordsInReadMode,

    #[error("Term '{0}' already has postings and cannot become a stopword")]
    StopwordAfterWrite(String),

    #[error("Corrupt value in store {0}")]
    CorruptValue(&'static str),

    #[error("Bad word regex: {0}")]
    BadRegex(String),

    #[error("Cannot mutate an index opened read-only")]
    ReadOnly,

    #[error("Query parse error: {0}")]
    QueryParse(String),

    #[error("Store operation failed: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for squill operations
pub type Result<T> = std::result::Result<T, SquillError>;

impl SquillError {
    /// Check if this error indicates index corruption rather than misuse
    pub fn is_corruption(&self) -> bool {
        matches!(self, SquillError::CorruptValue(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SquillError::DocIdTooLarge(1 << 33);
        assert_eq!(
            err.to_string(),
            "Document id 8589934592 does not fit in 32 bits"
        );

        let err = SquillError::DupDoc(42);
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_corruption_classification() {
        assert!(SquillError::CorruptValue("ixd").is_corruption());
        assert!(!SquillError::ReadOnly.is_corruption());
    }
}
