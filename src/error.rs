//! Error types.
//!
//! Two layers:
//! - `PipelineError`: typed failures of the pure core (normalize, resample,
//!   correlate, simulate). Each variant belongs to exactly one stage.
//! - `AppError`: what the binary reports (message + process exit code).

use thiserror::Error;

/// Failures raised by the core pipeline stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Bad or missing input rows (price missing/non-numeric/non-positive, bad date).
    #[error("malformed input{}: {message}", line_suffix(.line))]
    MalformedInput {
        line: Option<usize>,
        message: String,
    },

    /// A resampling period ended up without any usable value.
    #[error("resampling produced an empty group for {period}")]
    EmptyGroup { period: String },

    /// Technology-node label outside the fixed node set.
    #[error("unknown technology node '{0}' (expected one of: 65 nm, 28 nm, 14 nm, 7 nm)")]
    UnknownNode(String),

    /// Too few valid pairs, or a series without variance.
    #[error("correlation is undefined: {0}")]
    UndefinedCorrelation(&'static str),
}

impl PipelineError {
    pub fn malformed(line: Option<usize>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            line,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::UnknownNode(_) => 2,
            PipelineError::MalformedInput { .. } => 3,
            PipelineError::EmptyGroup { .. } | PipelineError::UndefinedCorrelation(_) => 4,
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_exit_codes() {
        let err: AppError = PipelineError::UnknownNode("5 nm".to_string()).into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("5 nm"));

        let err: AppError = PipelineError::malformed(Some(7), "price must be > 0").into();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "malformed input (line 7): price must be > 0");
    }

    #[test]
    fn malformed_without_line_has_no_suffix() {
        let err = PipelineError::malformed(None, "no rows");
        assert_eq!(err.to_string(), "malformed input: no rows");
    }
}
