use crate::{blast::BlastError, eutils::EutilsError, job_queue::QueueError};
use locus_resolver::ResolutionError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    Upstream,
    Io,
}

/// Failure of a single tool call, rendered to the client as an `isError`
/// result rather than a JSON-RPC error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Prefixes the message, keeping the code.
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for ToolError {}

impl From<EutilsError> for ToolError {
    fn from(err: EutilsError) -> Self {
        let code = match &err {
            EutilsError::Empty { .. } => ErrorCode::NotFound,
            EutilsError::Http { .. } | EutilsError::Status { .. } | EutilsError::Parse { .. } => {
                ErrorCode::Upstream
            }
        };
        Self::new(code, err.to_string())
    }
}

impl From<BlastError> for ToolError {
    fn from(err: BlastError) -> Self {
        let code = match &err {
            BlastError::InvalidInput { .. } | BlastError::InputTooLarge { .. } => {
                ErrorCode::InvalidInput
            }
            BlastError::ToolNotFound { .. } => ErrorCode::NotFound,
            BlastError::ToolFailed { .. } | BlastError::TimedOut { .. } => ErrorCode::Upstream,
            BlastError::Io { .. } => ErrorCode::Io,
        };
        Self::new(code, err.to_string())
    }
}

impl From<QueueError> for ToolError {
    fn from(err: QueueError) -> Self {
        let code = match &err {
            QueueError::JobNotFound { .. } => ErrorCode::NotFound,
            QueueError::InvalidJobId { .. } | QueueError::NotCompleted { .. } => {
                ErrorCode::InvalidInput
            }
            QueueError::Http { .. } | QueueError::Status { .. } | QueueError::Decode { .. } => {
                ErrorCode::Upstream
            }
        };
        Self::new(code, err.to_string())
    }
}

impl From<ResolutionError> for ToolError {
    fn from(err: ResolutionError) -> Self {
        Self::new(ErrorCode::NotFound, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_error_code() {
        let err = ToolError::invalid_input("gene_name is required");
        assert_eq!(err.to_string(), "InvalidInput: gene_name is required");
    }

    #[test]
    fn resolution_errors_map_to_not_found() {
        let err = ToolError::from(ResolutionError::NoRecordsFound).context("BRCA1");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.starts_with("BRCA1: "));
    }

    #[test]
    fn blast_timeouts_map_to_upstream() {
        let err = ToolError::from(BlastError::TimedOut {
            executable: "blastn".to_string(),
            timeout_secs: 3,
        });
        assert_eq!(err.code, ErrorCode::Upstream);
        assert!(err.message.contains("3 seconds"));
    }
}
