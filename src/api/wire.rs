use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{parse_timestamp, AttemptDetail, GradedResult, Question, ResultSummary, Subject};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubjectsResponse {
    pub subjects: Option<Vec<String>>,
}

impl SubjectsResponse {
    pub fn into_subjects(self) -> Vec<Subject> {
        self.subjects
            .unwrap_or_default()
            .into_iter()
            .map(Subject::from_bank_file)
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuestionsResponse {
    pub questions_and_answers: Option<Vec<RawQuestion>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawQuestion {
    pub id: Option<i64>,
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl QuestionsResponse {
    pub fn into_questions(self) -> Vec<Question> {
        self.questions_and_answers
            .unwrap_or_default()
            .into_iter()
            .map(|raw| {
                Question::new(
                    raw.id.unwrap_or_default(),
                    raw.question.unwrap_or_default(),
                    raw.answer.unwrap_or_default(),
                )
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResultsListResponse {
    pub results: Option<Vec<RawSummary>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawSummary {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
}

impl ResultsListResponse {
    pub fn into_summaries(self) -> Vec<ResultSummary> {
        self.results
            .unwrap_or_default()
            .into_iter()
            .map(|raw| ResultSummary {
                id: raw.id.unwrap_or_default(),
                email: raw.email.unwrap_or_default(),
                subject: Subject::from_bank_file(raw.subject.as_deref().unwrap_or_default()),
                date: raw.date.as_deref().and_then(parse_timestamp),
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DetailResponse {
    pub results: Option<Vec<RawGradedResult>>,
    pub subject: Option<String>,
}

/// The grading service has shipped both snake_case and camelCase names for
/// the two answer fields.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawGradedResult {
    pub id: Option<i64>,
    pub question: Option<String>,
    pub model_answer: Option<String>,
    pub answer: Option<String>,
    pub user_answer: Option<String>,
    #[serde(rename = "userAnswer")]
    pub user_answer_camel: Option<String>,
    pub similarity: Option<f64>,
    pub marks: Option<f64>,
}

impl RawGradedResult {
    pub fn normalize(self) -> GradedResult {
        GradedResult {
            id: self.id.unwrap_or_default(),
            question: self.question.unwrap_or_default(),
            answer: first_non_empty(self.model_answer, self.answer),
            user_answer: first_non_empty(self.user_answer, self.user_answer_camel),
            similarity: self.similarity.unwrap_or(0.0),
            marks: marks_from_wire(self.marks),
        }
    }
}

impl DetailResponse {
    pub fn into_detail(self) -> AttemptDetail {
        AttemptDetail {
            subject: self
                .subject
                .filter(|s| !s.is_empty())
                .map(Subject::from_bank_file),
            results: self
                .results
                .unwrap_or_default()
                .into_iter()
                .map(RawGradedResult::normalize)
                .collect(),
        }
    }
}

/// Success body of the submission call. Its contents are not used.
#[derive(Debug, Default, Deserialize)]
pub struct Ack {}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    #[serde(rename = "Error")]
    error: Option<Value>,
}

/// Reads the optional `Error` field of a failure body.
pub fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.error? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// A body of the wrong shape decodes to the empty default.
pub fn decode<T: DeserializeOwned + Default>(endpoint: &str, body: &str) -> T {
    if body.trim().is_empty() {
        debug!(target: "insightqa::api", endpoint, "empty response body");
        return T::default();
    }
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(target: "insightqa::api", endpoint, error = %e, "unexpected response shape; treating as empty");
            T::default()
        }
    }
}

fn first_non_empty(primary: Option<String>, secondary: Option<String>) -> String {
    primary
        .filter(|s| !s.is_empty())
        .or(secondary)
        .unwrap_or_default()
}

fn marks_from_wire(raw: Option<f64>) -> u32 {
    // float-to-int casts saturate; NaN becomes 0
    raw.map(|m| m.round() as u32).unwrap_or(0)
}
