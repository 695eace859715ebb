use crate::chat::transport::{ChatRequest, ChatTransport};
use crate::chat::{Message, Role, SubmissionId};
use crate::event::AppEvent;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitGuard {
    Idle,
    Submitting { submission: SubmissionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("a response is still in flight")]
    InFlight,
    #[error("input is empty")]
    EmptyInput,
}

pub struct ChatSession {
    chat_id: String,
    messages: Vec<Message>,
    input: String,
    guard: SubmitGuard,
    next_submission: SubmissionId,
    streaming: String,
    transport: Box<dyn ChatTransport>,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl ChatSession {
    pub fn new(transport: Box<dyn ChatTransport>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            chat_id: uuid::Uuid::new_v4().to_string(),
            messages: Vec::new(),
            input: String::new(),
            guard: SubmitGuard::Idle,
            next_submission: SubmissionId::first(),
            streaming: String::new(),
            transport,
            tx,
            rx,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn handle_input_change(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    #[cfg(test)]
    pub fn guard(&self) -> SubmitGuard {
        self.guard
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.guard, SubmitGuard::Submitting { .. })
    }

    pub fn streaming_text(&self) -> &str {
        &self.streaming
    }

    pub fn can_submit(&self) -> bool {
        !self.is_in_flight() && !self.input.trim().is_empty()
    }

    pub fn submit(&mut self) -> Result<SubmissionId, SubmitRejected> {
        if self.is_in_flight() {
            return Err(SubmitRejected::InFlight);
        }
        if self.input.trim().is_empty() {
            return Err(SubmitRejected::EmptyInput);
        }
        let prompt = std::mem::take(&mut self.input);

        let submission = self.next_submission;
        self.next_submission = submission.next();

        self.messages.push(Message::new(Role::User, prompt));
        self.streaming.clear();
        self.guard = SubmitGuard::Submitting { submission };
        tracing::info!(%submission, messages = self.messages.len(), "submitted prompt");

        let request = ChatRequest {
            chat_id: self.chat_id.clone(),
            messages: self.messages.clone(),
        };
        self.transport.start(submission, request, self.tx.clone());
        Ok(submission)
    }

    pub fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                // The session holds its own sender, so this never happens.
                Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        let current = match self.guard {
            SubmitGuard::Submitting { submission } if submission == event.submission() => {
                submission
            }
            _ => {
                tracing::debug!(submission = %event.submission(), "ignoring stale exchange event");
                return;
            }
        };

        match event {
            AppEvent::StreamDelta { text, .. } => {
                self.streaming.push_str(&text);
            }
            AppEvent::StreamEnd { .. } => {
                self.complete(current);
            }
            AppEvent::ExchangeFailed { message, .. } => {
                tracing::error!(submission = %current, %message, "chat exchange failed");
                self.complete(current);
            }
        }
    }

    fn complete(&mut self, submission: SubmissionId) {
        let reply = std::mem::take(&mut self.streaming);
        if reply.is_empty() {
            tracing::warn!(%submission, "exchange ended without a reply");
        } else {
            self.messages.push(Message::new(Role::Assistant, reply));
        }
        self.guard = SubmitGuard::Idle;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    pub(crate) struct RecordingTransport {
        pub started: Rc<RefCell<Vec<(SubmissionId, ChatRequest, Sender<AppEvent>)>>>,
    }

    impl ChatTransport for RecordingTransport {
        fn start(&self, submission: SubmissionId, request: ChatRequest, tx: Sender<AppEvent>) {
            self.started.borrow_mut().push((submission, request, tx));
        }
    }

    pub(crate) fn session() -> (ChatSession, RecordingTransport) {
        let transport = RecordingTransport::default();
        (ChatSession::new(Box::new(transport.clone())), transport)
    }

    #[test]
    fn submit_appends_user_message_and_streams_reply() {
        let (mut session, transport) = session();
        session.handle_input_change("Hello");

        let submission = session.submit().expect("submit");
        assert_eq!(session.input(), "");
        assert!(session.is_in_flight());
        assert!(!session.can_submit());

        let (_, request, tx) = transport.started.borrow()[0].clone();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "Hello");

        tx.send(AppEvent::StreamDelta {
            submission,
            text: "Hi, ".to_string(),
        })
        .expect("send");
        session.drain_events();
        assert_eq!(session.streaming_text(), "Hi, ");
        assert_eq!(session.messages().len(), 1);

        tx.send(AppEvent::StreamDelta {
            submission,
            text: "how can I help?".to_string(),
        })
        .expect("send");
        tx.send(AppEvent::StreamEnd { submission }).expect("send");
        session.drain_events();

        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(session.messages()[1].content, "Hi, how can I help?");
        assert_eq!(session.guard(), SubmitGuard::Idle);
        assert_eq!(session.streaming_text(), "");
    }

    #[test]
    fn blank_input_is_rejected_in_every_state() {
        let (mut session, transport) = session();
        session.handle_input_change("   \n\t");
        assert_eq!(session.submit(), Err(SubmitRejected::EmptyInput));
        assert!(!session.can_submit());

        session.handle_input_change("first");
        session.submit().expect("submit");
        session.handle_input_change(" ");
        assert!(!session.can_submit());
        assert!(transport.started.borrow().len() == 1);
    }

    #[test]
    fn second_submission_while_in_flight_is_a_no_op() {
        let (mut session, transport) = session();
        session.handle_input_change("one");
        let first = session.submit().expect("submit");

        session.handle_input_change("two");
        assert_eq!(session.submit(), Err(SubmitRejected::InFlight));
        assert_eq!(session.input(), "two");

        session.apply_event(AppEvent::StreamDelta {
            submission: first,
            text: "reply".to_string(),
        });
        session.apply_event(AppEvent::StreamEnd { submission: first });

        assert_eq!(transport.started.borrow().len(), 1);
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn events_for_other_submissions_are_ignored() {
        let (mut session, _transport) = session();
        session.handle_input_change("one");
        let first = session.submit().expect("submit");
        session.apply_event(AppEvent::StreamEnd { submission: first });

        session.handle_input_change("two");
        let second = session.submit().expect("submit");
        assert_ne!(first, second);

        session.apply_event(AppEvent::StreamDelta {
            submission: first,
            text: "late".to_string(),
        });
        session.apply_event(AppEvent::StreamEnd { submission: first });
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.streaming_text(), "");
        assert!(session.is_in_flight());
    }

    #[test]
    fn failure_keeps_partial_reply_and_returns_to_idle() {
        let (mut session, _transport) = session();
        session.handle_input_change("Hello");
        let submission = session.submit().expect("submit");
        session.apply_event(AppEvent::StreamDelta {
            submission,
            text: "partial".to_string(),
        });
        session.apply_event(AppEvent::ExchangeFailed {
            submission,
            message: "connection reset".to_string(),
        });

        assert!(!session.is_in_flight());
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].content, "partial");

        session.handle_input_change("again");
        let retry = session.submit().expect("submit");
        session.apply_event(AppEvent::ExchangeFailed {
            submission: retry,
            message: "refused".to_string(),
        });
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.guard(), SubmitGuard::Idle);
    }

    #[test]
    fn prompt_is_sent_as_typed() {
        let (mut session, transport) = session();
        session.handle_input_change("  Hello\n");
        session.submit().expect("submit");

        assert_eq!(session.messages()[0].content, "  Hello\n");
        assert_eq!(transport.started.borrow()[0].1.messages[0].content, "  Hello\n");
        assert_eq!(session.input(), "");
    }

    #[test]
    fn message_ids_are_unique() {
        let (mut session, _transport) = session();
        for prompt in ["a", "b", "c"] {
            session.handle_input_change(prompt);
            let submission = session.submit().expect("submit");
            session.apply_event(AppEvent::StreamDelta {
                submission,
                text: prompt.to_uppercase(),
            });
            session.apply_event(AppEvent::StreamEnd { submission });
        }

        let mut ids: Vec<&str> = session.messages().iter().map(|m| m.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }
}
