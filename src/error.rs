// src/error.rs
use thiserror::Error;

/// Errors surfaced by the dataset loader and the view queries.
///
/// The type is `Clone` so it can travel inside iced messages, which is why
/// underlying io/csv errors are flattened into strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    /// Source file missing, unreadable, empty or without data rows
    #[error("dataset unavailable at {path}: {reason}")]
    DataUnavailable { path: String, reason: String },

    /// Required column absent or a value that cannot be parsed
    #[error("dataset schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Country not present in the distinct country set
    #[error("unknown country: {0}")]
    UnknownCountry(String),

    /// Latest snapshot requested over an empty dataset
    #[error("no records to aggregate")]
    EmptyAggregate,
}

impl DataError {
    pub fn unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        DataError::DataUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Load-time errors end the session; query-time errors stay on their view.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DataError::DataUnavailable { .. } | DataError::SchemaMismatch(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_are_fatal() {
        assert!(DataError::unavailable("a.csv", "gone").is_fatal());
        assert!(DataError::SchemaMismatch("missing column date".into()).is_fatal());
        assert!(!DataError::UnknownCountry("Atlantis".into()).is_fatal());
        assert!(!DataError::EmptyAggregate.is_fatal());
    }

    #[test]
    fn unavailable_message_names_path() {
        let err = DataError::unavailable("data/covid.csv", "No such file or directory");
        assert_eq!(
            err.to_string(),
            "dataset unavailable at data/covid.csv: No such file or directory"
        );
    }
}
