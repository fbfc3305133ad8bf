//! Error types for Liberty loading and internal power queries

use crate::table::TableAxisVariable;
use thiserror::Error;

/// Result type for Liberty operations
pub type Result<T> = std::result::Result<T, LibertyError>;

/// Errors that can occur while loading or querying a Liberty library
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LibertyError {
    /// Table declares more axes than the power model can resolve
    #[error("unsupported table order {order}")]
    UnsupportedTableOrder { order: usize },

    /// Table axis variable is neither input transition nor output capacitance
    #[error("unsupported table axes: {variable}")]
    UnsupportedTableAxis { variable: TableAxisVariable },

    /// Value count does not match the product of the axis lengths
    #[error("table has {actual} values, axes require {expected}")]
    TableSizeMismatch { expected: usize, actual: usize },

    /// Axis declared with no index values
    #[error("table axis {0} has no index values")]
    EmptyAxis(TableAxisVariable),

    /// Unit string could not be interpreted
    #[error("invalid unit: {0}")]
    InvalidUnit(String),

    /// Condition expression could not be parsed
    #[error("invalid condition expression '{expr}': {message}")]
    InvalidExpression { expr: String, message: String },

    /// I/O error reading a Liberty file
    #[error("I/O error: {0}")]
    Io(String),

    /// Syntax error in a Liberty source
    #[error("Liberty error at line {line}: {message}")]
    Parse { message: String, line: usize },
}

impl LibertyError {
    /// Stable numeric identifier for configuration faults.
    ///
    /// Only the two characterization-data faults carry a code; everything
    /// else is reported by message alone.
    pub fn code(&self) -> Option<u32> {
        match self {
            LibertyError::UnsupportedTableOrder { .. } => Some(225),
            LibertyError::UnsupportedTableAxis { .. } => Some(226),
            _ => None,
        }
    }

    /// True for faults that indicate an inconsistent library rather than a
    /// syntax problem.
    pub fn is_configuration_fault(&self) -> bool {
        self.code().is_some()
    }
}
