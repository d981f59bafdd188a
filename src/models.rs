use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Question banks are addressed by file name on the service side.
const BANK_FILE_SUFFIX: &str = ".txt";

/// A subject as the user sees it (no bank file suffix).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_suffix(BANK_FILE_SUFFIX) {
            Some(stripped) => Self(stripped.to_string()),
            None => Self(name),
        }
    }

    pub fn from_bank_file(file: impl Into<String>) -> Self {
        Self::new(file)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn bank_file(&self) -> String {
        format!("{}{}", self.0, BANK_FILE_SUFFIX)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: i64,
    pub question: String,
    /// Reference answer. Never shown while the test is running.
    pub answer: String,
    pub user_answer: String,
}

impl Question {
    pub fn new(id: i64, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id,
            question: question.into(),
            answer: answer.into(),
            user_answer: String::new(),
        }
    }

    // Whitespace-only answers count as answered.
    pub fn is_answered(&self) -> bool {
        !self.user_answer.is_empty()
    }
}

/// One graded question of a finished attempt, as returned by the grading service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedResult {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub user_answer: String,
    pub similarity: f64,
    pub marks: u32,
}

/// One row of the past-attempts list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub id: i64,
    pub email: String,
    pub subject: Subject,
    pub date: Option<DateTime<Utc>>,
}

impl ResultSummary {
    pub fn date_label(&self) -> String {
        match &self.date {
            Some(dt) => dt.format("%B %-d, %Y, %I:%M %p").to_string(),
            None => "Unknown date".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AttemptDetail {
    pub subject: Option<Subject>,
    pub results: Vec<GradedResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
    #[serde(rename = "userAnswer")]
    pub user_answer: String,
}

/// Body of the grading submission. `subject` is the bank file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub questions_and_answers: Vec<SubmissionEntry>,
    pub email: String,
    pub subject: String,
}

/// Credential and e-mail handed to the core by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub token: String,
    pub email: String,
}

impl Identity {
    pub fn new(token: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            email: email.into(),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("token", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

/// Accepts the timestamp shapes the results service has been seen to emit.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
