use thiserror::Error;

use crate::domain::Var;

/// Errors raised by the library while building arrays or running estimators.
///
/// Optimizer non-convergence is *not* an error: it is reported through the
/// status carried by each estimate so callers can decide whether to use it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VttError {
    #[error("The variable '{var}' (mapped to column '{column}') is missing from the dataset")]
    Mapping { var: Var, column: String },

    #[error("Invalid choice data: {}", .0.join(" "))]
    Validation(Vec<String>),

    #[error("Invalid model configuration: {}", .0.join(" "))]
    Config(Vec<String>),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Estimation cancelled")]
    Cancelled,
}

impl VttError {
    /// All human-readable messages carried by this error.
    ///
    /// Validation and configuration errors carry the complete list of
    /// violations; every other variant yields its display string.
    pub fn messages(&self) -> Vec<String> {
        match self {
            VttError::Validation(list) | VttError::Config(list) => list.clone(),
            other => vec![other.to_string()],
        }
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

impl From<VttError> for AppError {
    fn from(err: VttError) -> Self {
        let exit_code = match err {
            VttError::Mapping { .. } | VttError::Validation(_) | VttError::Config(_) => 2,
            VttError::InsufficientData(_) => 3,
            VttError::Cancelled => 4,
        };
        let message = match &err {
            VttError::Validation(list) | VttError::Config(list) => {
                let mut out = if matches!(err, VttError::Validation(_)) {
                    "Invalid choice data:".to_string()
                } else {
                    "Invalid model configuration:".to_string()
                };
                for msg in list {
                    out.push_str("\n  - ");
                    out.push_str(msg);
                }
                out
            }
            other => other.to_string(),
        };
        AppError::new(exit_code, message)
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
    fn validation_error_lists_every_message() {
        let err = VttError::Validation(vec!["first.".to_string(), "second.".to_string()]);
        assert_eq!(err.messages().len(), 2);

        let app: AppError = err.into();
        assert_eq!(app.exit_code(), 2);
        let text = app.to_string();
        assert!(text.contains("first.") && text.contains("second."));
    }

    #[test]
    fn mapping_error_names_variable_and_column() {
        let err = VttError::Mapping {
            var: Var::Cost1,
            column: "CostL".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("Cost1"));
        assert!(text.contains("CostL"));
    }
}
