use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HtsError {
    /// Unsupported plate size, unresolvable control gene, too few replicates.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("data shape error: expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    DataShape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
    /// Zero-variance denominator or degenerate control sample.
    #[error("numerical error: {0}")]
    Numerical(String),
    /// Component misuse, e.g. scoring before spatial correction.
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("invalid well: {0}")]
    InvalidWell(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl HtsError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        HtsError::Configuration(msg.into())
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        HtsError::Numerical(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        HtsError::Precondition(msg.into())
    }

    pub fn shape(expected: (usize, usize), actual: (usize, usize)) -> Self {
        HtsError::DataShape {
            expected_rows: expected.0,
            expected_cols: expected.1,
            rows: actual.0,
            cols: actual.1,
        }
    }
}

pub type Result<T> = std::result::Result<T, HtsError>;
