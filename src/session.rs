use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{fallback, ApiError};
use crate::models::{Identity, Question, Subject, SubmissionEntry, SubmissionRequest};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    LoadFailed,
    Submitting,
    Submitted,
    SubmitFailed,
}

impl Phase {
    pub fn is_editable(&self) -> bool {
        matches!(self, Phase::Ready | Phase::SubmitFailed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::LoadFailed => "load failed",
            Phase::Submitting => "submitting",
            Phase::Submitted => "submitted",
            Phase::SubmitFailed => "submit failed",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for this subject")]
    Empty,
    #[error("question index {index} is out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("answers cannot be changed while {}", .0.label())]
    NotEditable(Phase),
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("questions were already requested for this session")]
    LoadAlreadyIssued,
    #[error("response belongs to a different session")]
    StaleTicket,
    #[error("session has been discarded")]
    Discarded,
    #[error("no request outstanding while {}", .0.label())]
    UnexpectedCompletion(Phase),
}

/// Completion percentage shown next to the question counter.
pub fn progress_percent(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    (current.min(total) * 100 / total) as u8
}

/// Immutable snapshot of an attempt. Every change produces a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    subject: Subject,
    questions: Vec<Question>,
    current: usize,
}

impl Session {
    pub fn new(subject: Subject, questions: Vec<Question>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            subject,
            questions,
            current: 0,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.questions.get(index).is_some_and(Question::is_answered)
    }

    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_answered()).count()
    }

    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.current, self.questions.len())
    }

    fn check_index(&self, index: usize) -> Result<(), SessionError> {
        if index < self.questions.len() {
            Ok(())
        } else {
            Err(SessionError::IndexOutOfRange {
                index,
                len: self.questions.len(),
            })
        }
    }

    pub fn with_current(&self, index: usize) -> Result<Self, SessionError> {
        self.check_index(index)?;
        Ok(Self {
            current: index,
            ..self.clone()
        })
    }

    pub fn with_answer(&self, index: usize, text: impl Into<String>) -> Result<Self, SessionError> {
        self.check_index(index)?;
        let mut next = self.clone();
        next.questions[index].user_answer = text.into();
        Ok(next)
    }

    /// Grading payload: every question in load order, unanswered ones as "".
    pub fn submission(&self, email: &str) -> SubmissionRequest {
        SubmissionRequest {
            questions_and_answers: self
                .questions
                .iter()
                .map(|q| SubmissionEntry {
                    id: q.id,
                    question: q.question.clone(),
                    answer: q.answer.clone(),
                    user_answer: q.user_answer.clone(),
                })
                .collect(),
            email: email.to_string(),
            subject: self.subject.bank_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    pub session: SessionId,
    pub subject: Subject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionTicket {
    pub session: SessionId,
    pub request: SubmissionRequest,
}

pub const SUBMITTED_MESSAGE: &str = "Test submitted successfully!";

/// Drives one attempt from loading to submission.
#[derive(Debug)]
pub struct SessionController {
    id: SessionId,
    identity: Identity,
    subject: Subject,
    phase: Phase,
    session: Option<Session>,
    load_issued: bool,
    discarded: bool,
    message: Option<String>,
}

impl SessionController {
    pub fn new(identity: Identity, subject: Subject) -> Self {
        let id = SessionId::next();
        debug!(target: "insightqa::session", session = id.0, subject = %subject, "session created");
        Self {
            id,
            identity,
            subject,
            phase: Phase::Loading,
            session: None,
            load_issued: false,
            discarded: false,
            message: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Last user-facing outcome (error or success text).
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[cfg(test)]
    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    pub fn progress_percent(&self) -> u8 {
        self.session.as_ref().map_or(0, Session::progress_percent)
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_answered(index))
    }

    pub fn is_last_question(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_last)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref().map(Session::current_question)
    }

    pub fn answered_count(&self) -> usize {
        self.session.as_ref().map_or(0, Session::answered_count)
    }

    pub fn begin_load(&mut self) -> Result<LoadTicket, SessionError> {
        if self.discarded {
            return Err(SessionError::Discarded);
        }
        if self.load_issued {
            return Err(SessionError::LoadAlreadyIssued);
        }
        self.load_issued = true;
        Ok(LoadTicket {
            session: self.id,
            subject: self.subject.clone(),
        })
    }

    fn accept_completion(&self, from: SessionId, expected: Phase) -> Result<(), SessionError> {
        if self.discarded {
            debug!(target: "insightqa::session", session = self.id.0, "ignoring response for discarded session");
            return Err(SessionError::Discarded);
        }
        if from != self.id {
            return Err(SessionError::StaleTicket);
        }
        if self.phase != expected {
            return Err(SessionError::UnexpectedCompletion(self.phase));
        }
        Ok(())
    }

    pub fn complete_load(
        &mut self,
        from: SessionId,
        result: Result<Vec<Question>, ApiError>,
    ) -> Result<Phase, SessionError> {
        self.accept_completion(from, Phase::Loading)?;

        match result.map(|questions| Session::new(self.subject.clone(), questions)) {
            Ok(Ok(session)) => {
                info!(target: "insightqa::session", session = self.id.0, questions = session.len(), "questions loaded");
                self.session = Some(session);
                self.phase = Phase::Ready;
                self.message = None;
            }
            Ok(Err(e)) => {
                warn!(target: "insightqa::session", session = self.id.0, "question bank is empty");
                self.phase = Phase::LoadFailed;
                self.message = Some(e.to_string());
            }
            Err(e) => {
                warn!(target: "insightqa::session", session = self.id.0, error = %e, "question load failed");
                self.phase = Phase::LoadFailed;
                self.message = Some(e.user_message(fallback::QUESTIONS));
            }
        }
        Ok(self.phase)
    }

    fn editable(&self) -> Result<&Session, SessionError> {
        if self.discarded {
            return Err(SessionError::Discarded);
        }
        if !self.phase.is_editable() {
            return Err(SessionError::NotEditable(self.phase));
        }
        self.session
            .as_ref()
            .ok_or(SessionError::NotEditable(self.phase))
    }

    /// No-op on the last question.
    pub fn go_next(&mut self) -> Result<(), SessionError> {
        let session = self.editable()?;
        if session.is_last() {
            return Ok(());
        }
        self.session = Some(session.with_current(session.current_index() + 1)?);
        Ok(())
    }

    /// No-op on the first question.
    pub fn go_previous(&mut self) -> Result<(), SessionError> {
        let session = self.editable()?;
        if session.current_index() == 0 {
            return Ok(());
        }
        self.session = Some(session.with_current(session.current_index() - 1)?);
        Ok(())
    }

    pub fn go_to(&mut self, index: usize) -> Result<(), SessionError> {
        let session = self.editable()?;
        self.session = Some(session.with_current(index)?);
        Ok(())
    }

    /// Replaces the answer of the question currently shown.
    pub fn edit_answer(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let session = self.editable()?;
        self.session = Some(session.with_answer(session.current_index(), text)?);
        Ok(())
    }

    pub fn begin_submit(&mut self) -> Result<SubmissionTicket, SessionError> {
        if self.phase == Phase::Submitting {
            return Err(SessionError::AlreadySubmitting);
        }
        let request = self.editable()?.submission(&self.identity.email);

        info!(
            target: "insightqa::session",
            session = self.id.0,
            entries = request.questions_and_answers.len(),
            "submitting attempt"
        );
        self.phase = Phase::Submitting;
        self.message = None;
        Ok(SubmissionTicket {
            session: self.id,
            request,
        })
    }

    pub fn complete_submit(
        &mut self,
        from: SessionId,
        result: Result<(), ApiError>,
    ) -> Result<Phase, SessionError> {
        self.accept_completion(from, Phase::Submitting)?;

        match result {
            Ok(()) => {
                info!(target: "insightqa::session", session = self.id.0, "attempt submitted");
                self.phase = Phase::Submitted;
                self.message = Some(SUBMITTED_MESSAGE.to_string());
            }
            Err(e) => {
                warn!(target: "insightqa::session", session = self.id.0, error = %e, "submission failed");
                self.phase = Phase::SubmitFailed;
                self.message = Some(e.user_message(fallback::SUBMIT));
            }
        }
        Ok(self.phase)
    }

    /// Marks the session as abandoned. Late responses are ignored afterwards.
    pub fn tear_down(&mut self) {
        if !self.discarded {
            debug!(target: "insightqa::session", session = self.id.0, phase = self.phase.label(), "session discarded");
        }
        self.discarded = true;
    }
}
