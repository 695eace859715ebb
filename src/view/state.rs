use crate::chat::{ChatSession, Message, MessageId, SubmissionId};
use crate::config::Config;
use crate::view::clipboard::Clipboard;
use crate::view::schedule::Scheduler;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Row<'a> {
    Message(&'a Message),
    Streaming(&'a str),
    Thinking,
}

pub fn rows(session: &ChatSession) -> impl Iterator<Item = Row<'_>> + '_ {
    let in_flight = session.is_in_flight();
    let streaming = session.streaming_text();
    session
        .messages()
        .iter()
        .map(Row::Message)
        .chain((in_flight && !streaming.is_empty()).then_some(Row::Streaming(streaming)))
        .chain(in_flight.then_some(Row::Thinking))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmitControl {
    pub label: &'static str,
    pub hover: &'static str,
    pub min_width: f32,
    pub enabled: bool,
}

pub fn submit_control(compact: bool, session: &ChatSession) -> SubmitControl {
    let enabled = session.can_submit();
    if compact {
        SubmitControl {
            label: "\u{27A4}",
            hover: "Send",
            min_width: 44.0,
            enabled,
        }
    } else {
        SubmitControl {
            label: if session.is_in_flight() { "..." } else { "Send" },
            hover: "Send",
            min_width: 80.0,
            enabled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScrollSignature {
    messages: usize,
    streaming_len: usize,
    in_flight: bool,
}

impl ScrollSignature {
    fn of(session: &ChatSession) -> Self {
        Self {
            messages: session.messages().len(),
            streaming_len: session.streaming_text().len(),
            in_flight: session.is_in_flight(),
        }
    }
}

#[derive(Debug)]
pub struct ViewState {
    copied: Option<MessageId>,
    copy_clear: Scheduler<MessageId>,
    refocus: Scheduler<SubmissionId>,
    focus_requested: bool,
    compact: bool,
    last_width: Option<f32>,
    compact_breakpoint: f32,
    copy_feedback: Duration,
    refocus_delay: Duration,
    scroll_signature: Option<ScrollSignature>,
}

impl ViewState {
    pub fn new(config: &Config) -> Self {
        Self {
            copied: None,
            copy_clear: Scheduler::default(),
            refocus: Scheduler::default(),
            focus_requested: false,
            compact: false,
            last_width: None,
            compact_breakpoint: config.compact_breakpoint,
            copy_feedback: config.copy_feedback(),
            refocus_delay: config.refocus_delay(),
            scroll_signature: None,
        }
    }

    #[cfg(test)]
    pub fn copied(&self) -> Option<&MessageId> {
        self.copied.as_ref()
    }

    pub fn is_copied(&self, id: &MessageId) -> bool {
        self.copied.as_ref() == Some(id)
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    pub fn copy_message(
        &mut self,
        clipboard: &mut dyn Clipboard,
        id: &MessageId,
        content: &str,
        now: Instant,
    ) -> bool {
        if let Err(err) = clipboard.set_text(content) {
            tracing::error!(message_id = %id, error = %err, "failed to copy text");
            return false;
        }

        self.copy_clear.cancel_all();
        self.copy_clear.schedule(id.clone(), now + self.copy_feedback);
        self.copied = Some(id.clone());
        tracing::debug!(message_id = %id, "copied message");
        true
    }

    pub fn on_submitted(&mut self, submission: SubmissionId, now: Instant) {
        self.refocus.cancel_all();
        self.refocus.schedule(submission, now + self.refocus_delay);
        self.focus_requested = false;
    }

    pub fn poll(&mut self, now: Instant) {
        for id in self.copy_clear.take_due(now) {
            if self.copied.as_ref() == Some(&id) {
                self.copied = None;
            }
        }
        if !self.refocus.take_due(now).is_empty() {
            self.focus_requested = true;
        }
    }

    pub fn take_focus_request(&mut self, input_enabled: bool) -> bool {
        if self.focus_requested && input_enabled {
            self.focus_requested = false;
            return true;
        }
        false
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.copy_clear.next_deadline(), self.refocus.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn observe_width(&mut self, width: f32) {
        if self.last_width == Some(width) {
            return;
        }
        self.last_width = Some(width);

        let compact = width <= self.compact_breakpoint;
        if compact != self.compact {
            tracing::debug!(width, compact, "layout breakpoint changed");
        }
        self.compact = compact;
    }

    pub fn should_scroll(&mut self, session: &ChatSession) -> bool {
        let signature = ScrollSignature::of(session);
        if self.scroll_signature == Some(signature) {
            return false;
        }
        self.scroll_signature = Some(signature);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::session::tests::session;
    use crate::chat::Role;
    use crate::error::ClipboardError;
    use crate::event::AppEvent;

    #[derive(Default)]
    struct FakeClipboard {
        reject: bool,
        written: Vec<String>,
    }

    impl Clipboard for FakeClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.reject {
                return Err(ClipboardError::Rejected("permission denied".to_string()));
            }
            self.written.push(text.to_string());
            Ok(())
        }
    }

    fn state() -> ViewState {
        ViewState::new(&Config::default())
    }

    #[test]
    fn rows_append_stream_and_placeholder_only_while_in_flight() {
        let (mut session, _transport) = session();
        assert_eq!(rows(&session).count(), 0);

        session.handle_input_change("Hello");
        let submission = session.submit().expect("submit");
        let kinds: Vec<Row> = rows(&session).collect();
        assert!(matches!(kinds.as_slice(), [Row::Message(m), Row::Thinking] if m.role == Role::User));

        session.apply_event(AppEvent::StreamDelta {
            submission,
            text: "Hi".to_string(),
        });
        let kinds: Vec<Row> = rows(&session).collect();
        assert!(matches!(kinds.as_slice(), [Row::Message(_), Row::Streaming("Hi"), Row::Thinking]));

        session.apply_event(AppEvent::StreamEnd { submission });
        let first: Vec<Row> = rows(&session).collect();
        let again: Vec<Row> = rows(&session).collect();
        assert_eq!(first, again);
        assert!(matches!(first.as_slice(), [Row::Message(_), Row::Message(m)] if m.role == Role::Assistant));
    }

    #[test]
    fn copy_marker_clears_after_feedback_window() {
        let mut state = state();
        let mut clipboard = FakeClipboard::default();
        let id = MessageId::from("assistant-1");
        let start = Instant::now();

        assert!(state.copy_message(&mut clipboard, &id, "answer", start));
        assert_eq!(clipboard.written, vec!["answer".to_string()]);
        assert!(state.is_copied(&id));

        state.poll(start + Duration::from_millis(1999));
        assert!(state.is_copied(&id));
        state.poll(start + Duration::from_secs(2));
        assert_eq!(state.copied(), None);
        assert_eq!(state.next_deadline(), None);
    }

    #[test]
    fn copying_another_message_reassigns_marker_and_cancels_old_clear() {
        let mut state = state();
        let mut clipboard = FakeClipboard::default();
        let first = MessageId::from("a");
        let second = MessageId::from("b");
        let start = Instant::now();

        state.copy_message(&mut clipboard, &first, "one", start);
        state.copy_message(&mut clipboard, &second, "two", start + Duration::from_millis(1500));
        assert!(state.is_copied(&second));

        state.poll(start + Duration::from_secs(2));
        assert!(state.is_copied(&second));
        state.poll(start + Duration::from_millis(3500));
        assert_eq!(state.copied(), None);
    }

    #[test]
    fn rejected_clipboard_leaves_marker_unset() {
        let mut state = state();
        let mut clipboard = FakeClipboard {
            reject: true,
            ..FakeClipboard::default()
        };

        let copied = state.copy_message(&mut clipboard, &MessageId::from("a"), "text", Instant::now());
        assert!(!copied);
        assert_eq!(state.copied(), None);
        assert_eq!(state.next_deadline(), None);
    }

    #[test]
    fn breakpoint_is_inclusive_and_reevaluated_on_resize() {
        let mut state = state();
        state.observe_width(480.0);
        assert!(state.is_compact());
        state.observe_width(480.0);
        assert!(state.is_compact());

        state.observe_width(481.0);
        assert!(!state.is_compact());
        state.observe_width(320.0);
        assert!(state.is_compact());
    }

    #[test]
    fn submit_control_tracks_breakpoint_and_guard() {
        let (mut session, _transport) = session();
        let idle = submit_control(false, &session);
        assert_eq!((idle.label, idle.min_width, idle.enabled), ("Send", 80.0, false));

        session.handle_input_change("Hello");
        assert!(submit_control(false, &session).enabled);
        let compact = submit_control(true, &session);
        assert_eq!(compact.label, "\u{27A4}");
        assert!(compact.min_width < idle.min_width);

        session.submit().expect("submit");
        session.handle_input_change("next");
        let busy = submit_control(false, &session);
        assert_eq!(busy.label, "...");
        assert!(!busy.enabled);
    }

    #[test]
    fn refocus_waits_for_delay_and_enabled_input() {
        let mut state = state();
        let start = Instant::now();
        state.on_submitted(SubmissionId::first(), start);

        state.poll(start + Duration::from_millis(50));
        assert!(!state.take_focus_request(true));

        state.poll(start + Duration::from_millis(100));
        assert!(!state.take_focus_request(false));
        assert!(state.take_focus_request(true));
        assert!(!state.take_focus_request(true));
    }

    #[test]
    fn newer_submission_cancels_pending_refocus() {
        let mut state = state();
        let start = Instant::now();
        let first = SubmissionId::first();
        state.on_submitted(first, start);
        state.on_submitted(first.next(), start + Duration::from_millis(80));

        state.poll(start + Duration::from_millis(120));
        assert!(!state.take_focus_request(true));
        state.poll(start + Duration::from_millis(180));
        assert!(state.take_focus_request(true));
    }

    #[test]
    fn scroll_requested_once_per_transcript_change() {
        let (mut session, _transport) = session();
        let mut state = state();
        assert!(state.should_scroll(&session));
        assert!(!state.should_scroll(&session));

        session.handle_input_change("Hello");
        let submission = session.submit().expect("submit");
        assert!(state.should_scroll(&session));

        session.apply_event(AppEvent::StreamDelta {
            submission,
            text: "chunk".to_string(),
        });
        assert!(state.should_scroll(&session));
        assert!(!state.should_scroll(&session));

        session.apply_event(AppEvent::StreamEnd { submission });
        assert!(state.should_scroll(&session));
    }
}
