mod http;
pub mod wire;

use thiserror::Error;

use crate::models::{AttemptDetail, Question, ResultSummary, Subject, SubmissionRequest};

pub use http::HttpQuizApi;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Shown when the service could not be reached at all.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Per-operation messages used when the service gives no `Error` text.
pub mod fallback {
    pub const SUBJECTS: &str = "Failed to fetch subjects";
    pub const QUESTIONS: &str = "Failed to fetch questions";
    pub const SUBMIT: &str = "Failed to submit test";
    pub const RESULTS: &str = "Failed to fetch results";
    pub const DETAIL: &str = "Failed to fetch detailed results";
}

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("service responded with status {status}")]
    Status { status: u16, message: Option<String> },
}

impl ApiError {
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }

    /// Text suitable for the status line or stderr.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Transport(_) => GENERIC_FAILURE.to_string(),
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ApiError::Status { .. } => fallback.to_string(),
        }
    }
}

/// The five calls the client makes against the quiz service.
pub trait QuizApi: Send + Sync {
    fn list_subjects(&self) -> Result<Vec<Subject>, ApiError>;

    fn load_questions(&self, subject: &Subject) -> Result<Vec<Question>, ApiError>;

    fn submit_attempt(&self, request: &SubmissionRequest) -> Result<(), ApiError>;

    fn list_results(&self, email: &str) -> Result<Vec<ResultSummary>, ApiError>;

    fn load_result_detail(&self, id: i64) -> Result<AttemptDetail, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_with_message_uses_service_text() {
        let err = ApiError::Status {
            status: 400,
            message: Some("Subject not found".into()),
        };
        assert_eq!(err.user_message(fallback::QUESTIONS), "Subject not found");
    }

    #[test]
    fn status_without_message_uses_fallback() {
        let err = ApiError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(fallback::SUBMIT), "Failed to submit test");
    }

    #[test]
    fn blank_service_message_uses_fallback() {
        let err = ApiError::Status {
            status: 500,
            message: Some("  ".into()),
        };
        assert_eq!(err.user_message(fallback::RESULTS), "Failed to fetch results");
    }

    #[test]
    fn transport_failure_uses_generic_text() {
        let err = ApiError::Transport("connection refused".into());
        assert_eq!(err.user_message(fallback::SUBJECTS), GENERIC_FAILURE);
    }
}
