use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::debug;

use crate::api::{ApiError, QuizApi};
use crate::models::{AttemptDetail, Question, ResultSummary, Subject};
use crate::session::{LoadTicket, SessionId, SubmissionTicket};

#[derive(Debug, Clone)]
pub enum Request {
    Subjects,
    Questions(LoadTicket),
    Submit(SubmissionTicket),
    Results { email: String },
    Detail { id: i64 },
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Request::Subjects => "subjects",
            Request::Questions(_) => "questions",
            Request::Submit(_) => "submit",
            Request::Results { .. } => "results",
            Request::Detail { .. } => "detail",
        }
    }
}

#[derive(Debug)]
pub enum Response {
    Subjects(Result<Vec<Subject>, ApiError>),
    Questions {
        session: SessionId,
        result: Result<Vec<Question>, ApiError>,
    },
    Submitted {
        session: SessionId,
        result: Result<(), ApiError>,
    },
    Results(Result<Vec<ResultSummary>, ApiError>),
    Detail {
        id: i64,
        result: Result<AttemptDetail, ApiError>,
    },
}

/// Performs one request synchronously.
pub fn execute(api: &dyn QuizApi, request: Request) -> Response {
    match request {
        Request::Subjects => Response::Subjects(api.list_subjects()),
        Request::Questions(ticket) => Response::Questions {
            session: ticket.session,
            result: api.load_questions(&ticket.subject),
        },
        Request::Submit(ticket) => Response::Submitted {
            session: ticket.session,
            result: api.submit_attempt(&ticket.request),
        },
        Request::Results { email } => Response::Results(api.list_results(&email)),
        Request::Detail { id } => Response::Detail {
            id,
            result: api.load_result_detail(id),
        },
    }
}

pub struct Worker {
    api: Arc<dyn QuizApi>,
    tx: Sender<Response>,
    rx: Receiver<Response>,
}

impl Worker {
    pub fn new(api: Arc<dyn QuizApi>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { api, tx, rx }
    }

    pub fn dispatch(&self, request: Request) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let name = request.name();
        debug!(target: "insightqa::tui", request = name, "dispatching");

        thread::spawn(move || {
            let response = execute(api.as_ref(), request);
            // the receiver only goes away when the app is shutting down
            if tx.send(response).is_err() {
                debug!(target: "insightqa::tui", request = name, "response dropped after shutdown");
            }
        });
    }

    /// Everything that has arrived since the last call, without blocking.
    pub fn drain(&self) -> Vec<Response> {
        self.rx.try_iter().collect()
    }

    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<Response> {
        self.rx.recv_timeout(timeout).ok()
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeApi;
    use super::*;
    use crate::models::Identity;
    use crate::session::SessionController;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    mod execute_tests {
        use super::*;

        #[test]
        fn subjects_come_back_tagged() {
            let api = FakeApi::with_questions(1);
            match execute(&api, Request::Subjects) {
                Response::Subjects(Ok(subjects)) => assert_eq!(subjects.len(), 2),
                other => panic!("unexpected response: {:?}", other),
            }
        }

        #[test]
        fn questions_carry_the_ticket_session() {
            let api = FakeApi::with_questions(3);
            let mut controller = SessionController::new(Identity::new("t", "e@x.io"), Subject::new("os"));
            let ticket = controller.begin_load().unwrap();

            match execute(&api, Request::Questions(ticket)) {
                Response::Questions { session, result } => {
                    assert_eq!(session, controller.id());
                    assert_eq!(result.unwrap().len(), 3);
                }
                other => panic!("unexpected response: {:?}", other),
            }
        }
    }

    mod dispatch_tests {
        use super::*;

        #[test]
        fn dispatched_request_arrives_on_channel() {
            let worker = Worker::new(Arc::new(FakeApi::with_questions(2)));
            worker.dispatch(Request::Detail { id: 7 });

            match worker.recv_timeout(WAIT) {
                Some(Response::Detail { id, result }) => {
                    assert_eq!(id, 7);
                    assert!(result.is_ok());
                }
                other => panic!("unexpected response: {:?}", other),
            }
        }

        #[test]
        fn submission_reaches_the_service() {
            let api = Arc::new(FakeApi::with_questions(2));
            let worker = Worker::new(api.clone());

            let mut controller = SessionController::new(Identity::new("t", "e@x.io"), Subject::new("os"));
            let ticket = controller.begin_load().unwrap();
            controller
                .complete_load(ticket.session, Ok(api.questions.clone()))
                .unwrap();
            controller.edit_answer("first").unwrap();
            let submission = controller.begin_submit().unwrap();

            worker.dispatch(Request::Submit(submission));
            match worker.recv_timeout(WAIT) {
                Some(Response::Submitted { session, result }) => {
                    assert_eq!(session, controller.id());
                    assert!(result.is_ok());
                }
                other => panic!("unexpected response: {:?}", other),
            }

            let sent = api.submitted.lock().unwrap();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].questions_and_answers[0].user_answer, "first");
            assert_eq!(sent[0].email, "e@x.io");
        }

        #[test]
        fn drain_is_empty_when_nothing_arrived() {
            let worker = Worker::new(Arc::new(FakeApi::default()));
            assert!(worker.drain().is_empty());
        }
    }
}
