//! Domain-level error taxonomy for evalboard.
//!
//! The aggregation engine itself never fails; these errors belong to the
//! Run Store boundary, run-group selection, configuration and artifact I/O.

/// Errors produced while parsing a raw run record at the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("run {run_id} mixes id-based and index-based item identities")]
    MixedIdentityScheme { run_id: String },

    #[error("run {run_id} has duplicate item identity {identity}")]
    DuplicateItem { run_id: String, identity: String },

    #[error("run {run_id} item {identity} has {values} metric values for {names} metric names")]
    MetricValuesLength {
        run_id: String,
        identity: String,
        values: usize,
        names: usize,
    },

    #[error("run record missing required field: {field}")]
    MissingField { field: &'static str },
}

/// evalboard domain errors.
#[derive(Debug, thiserror::Error)]
pub enum EvalboardError {
    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("malformed run record: {0}")]
    Record(#[from] RecordError),

    #[error("run group {group} mixes identity schemes across runs: {runs}")]
    IdentitySchemeMismatch { group: String, runs: String },

    #[error("run group has no runs: {0}")]
    EmptyGroup(String),

    #[error("explicit run selection of {requested} runs exceeds cap of {cap}")]
    SelectionTooLarge { requested: usize, cap: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for evalboard domain operations.
pub type Result<T> = std::result::Result<T, EvalboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_converts_into_domain_error() {
        let err: EvalboardError = RecordError::MixedIdentityScheme {
            run_id: "run-7".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("malformed run record"));
        assert!(msg.contains("run-7"));
    }

    #[test]
    fn test_selection_too_large_display() {
        let err = EvalboardError::SelectionTooLarge {
            requested: 12,
            cap: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn test_digest_mismatch_error() {
        let err = EvalboardError::DigestMismatch {
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("def456"));
    }
}
