use std::time::{Duration, Instant};

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::wire::{self, Ack, DetailResponse, QuestionsResponse, ResultsListResponse, SubjectsResponse};
use super::{ApiError, QuizApi};
use crate::models::{AttemptDetail, Question, ResultSummary, Subject, SubmissionRequest};

/// Blocking HTTP client for the quiz service.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    base_url: String,
}

impl HttpQuizApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("insightqa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::transport)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn execute<T: DeserializeOwned + Default>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let started = Instant::now();
        let response = request.send().map_err(|e| {
            warn!(target: "insightqa::api", endpoint, error = %e, "request failed");
            ApiError::transport(e)
        })?;
        let status = response.status();
        let body = response.text().map_err(ApiError::transport)?;

        debug!(
            target: "insightqa::api",
            endpoint,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "response received"
        );

        if !status.is_success() {
            let message = wire::error_message(&body);
            warn!(target: "insightqa::api", endpoint, status = status.as_u16(), "service returned an error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(wire::decode(endpoint, &body))
    }
}

impl QuizApi for HttpQuizApi {
    #[instrument(level = "debug", skip(self))]
    fn list_subjects(&self) -> Result<Vec<Subject>, ApiError> {
        let request = self.client.get(self.url("subjects"));
        let body: SubjectsResponse = self.execute("subjects", request)?;
        Ok(body.into_subjects())
    }

    #[instrument(level = "debug", skip(self, subject), fields(subject = %subject))]
    fn load_questions(&self, subject: &Subject) -> Result<Vec<Question>, ApiError> {
        let request = self
            .client
            .get(self.url("questions_and_answers"))
            .query(&[("subject", subject.bank_file())]);
        let body: QuestionsResponse = self.execute("questions_and_answers", request)?;
        Ok(body.into_questions())
    }

    #[instrument(level = "debug", skip(self, request), fields(subject = %request.subject, entries = request.questions_and_answers.len()))]
    fn submit_attempt(&self, request: &SubmissionRequest) -> Result<(), ApiError> {
        let builder = self
            .client
            .post(self.url("evaluate_questions_and_answers"))
            .json(request);
        let _: Ack = self.execute("evaluate_questions_and_answers", builder)?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, email))]
    fn list_results(&self, email: &str) -> Result<Vec<ResultSummary>, ApiError> {
        let request = self
            .client
            .get(self.url("get_results_list"))
            .query(&[("email", email)]);
        let body: ResultsListResponse = self.execute("get_results_list", request)?;
        Ok(body.into_summaries())
    }

    #[instrument(level = "debug", skip(self))]
    fn load_result_detail(&self, id: i64) -> Result<AttemptDetail, ApiError> {
        let request = self
            .client
            .get(self.url("get_detailed_results"))
            .query(&[("id", id)]);
        let body: DetailResponse = self.execute("get_detailed_results", request)?;
        Ok(body.into_detail())
    }
}
