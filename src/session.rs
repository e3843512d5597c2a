/// Chat session — the send/receive state machine and its append-only transcript.
///
/// Lifecycle of one exchange:
///
///   Idle/Composing ─submit─▶ Sending ─dispatched─▶ AwaitingResponse
///        ▲                                                │
///        └──────────── Completed / Failed ◀──resolve──────┘
///
/// `submit` appends the user's message before anything touches the network.
/// `dispatched` inserts the single typing indicator; `resolve` always removes
/// it before appending the bot's message. Sends are serialized: while an
/// exchange is outstanding `submit` refuses, so at most one indicator exists.
///
/// Every transition pushes `SessionEvent`s into an outbox that the transcript
/// view drains — the session itself never renders anything.
use tracing::{debug, info, warn};

use crate::client::{ChatBackend, ChatReply, ChatRequest, ClientError};
use crate::selection::SelectionStore;

/// Shown in place of any transport or parse failure.
pub const APOLOGY: &str = "Sorry, there was an error processing your request.";

// ── Transcript types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    /// Wall-clock label, e.g. "09:05 PM"
    pub timestamp: String,
}

/// Identity of one typing-indicator placeholder. Also tags the request it
/// belongs to, so a late resolution can be matched (or rejected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatorId(u64);

// ── State machine ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Composing,
    Sending,
    AwaitingResponse,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Transport succeeded — the reply may still carry an application error
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Appended(ChatMessage),
    TypingShown(IndicatorId),
    TypingRemoved(IndicatorId),
    PhaseChanged(Phase),
}

pub struct ChatSession {
    input: String,
    phase: Phase,
    transcript: Vec<ChatMessage>,
    indicator: Option<IndicatorId>,
    next_indicator: u64,
    outbox: Vec<SessionEvent>,
    clock: fn() -> String,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_clock(crate::ui::clock_now)
    }

    /// Use a fixed time source for message timestamps.
    pub fn with_clock(clock: fn() -> String) -> Self {
        Self {
            input: String::new(),
            phase: Phase::Idle,
            transcript: Vec::new(),
            indicator: None,
            next_indicator: 0,
            outbox: Vec::new(),
            clock,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// The outstanding typing indicator, if a request is in flight.
    pub fn indicator(&self) -> Option<IndicatorId> {
        self.indicator
    }

    /// True between `submit` and `resolve`.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Sending | Phase::AwaitingResponse)
    }

    /// The submit affordance: enabled only when idle with non-blank input.
    pub fn can_submit(&self) -> bool {
        !self.is_busy() && !self.input.trim().is_empty()
    }

    /// Take all events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.refresh_compose_phase();
    }

    /// Edit the input buffer in place. Editing is allowed while a request is
    /// outstanding; only submission is refused.
    pub fn edit_input<R>(&mut self, f: impl FnOnce(&mut String) -> R) -> R {
        let r = f(&mut self.input);
        self.refresh_compose_phase();
        r
    }

    fn refresh_compose_phase(&mut self) {
        if matches!(self.phase, Phase::Idle | Phase::Composing) {
            let next = self.compose_phase();
            self.set_phase(next);
        }
    }

    fn compose_phase(&self) -> Phase {
        if self.input.trim().is_empty() { Phase::Idle } else { Phase::Composing }
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// Idle/Composing → Sending. Clears the input, appends the user's message
    /// and returns the request to dispatch, with the selection snapshotted as
    /// it is right now. `None` when submit is disabled.
    pub fn submit(&mut self, selection: &SelectionStore) -> Option<ChatRequest> {
        if self.is_busy() {
            debug!("submit refused: request outstanding");
            return None;
        }
        let question = self.input.trim().to_string();
        if question.is_empty() {
            return None;
        }
        self.input.clear();
        self.set_phase(Phase::Sending);
        self.append(Sender::User, question.clone());

        let request = ChatRequest {
            question,
            selected_items: selection.entries().to_vec(),
        };
        info!(selected = request.selected_items.len(), "question submitted");
        Some(request)
    }

    /// Sending → AwaitingResponse. Call right after handing the request to
    /// the network; inserts the typing indicator.
    pub fn dispatched(&mut self) -> Option<IndicatorId> {
        if self.phase != Phase::Sending {
            warn!(phase = ?self.phase, "dispatched outside Sending");
            return None;
        }
        let id = IndicatorId(self.next_indicator);
        self.next_indicator += 1;
        self.indicator = Some(id);
        self.set_phase(Phase::AwaitingResponse);
        self.outbox.push(SessionEvent::TypingShown(id));
        Some(id)
    }

    /// AwaitingResponse → Completed/Failed → Idle/Composing.
    ///
    /// Removes the indicator, then appends the bot's message. A resolution for
    /// any indicator other than the outstanding one is dropped.
    pub fn resolve(
        &mut self,
        id: IndicatorId,
        result: Result<ChatReply, ClientError>,
    ) -> Option<Outcome> {
        if self.indicator != Some(id) {
            warn!(?id, outstanding = ?self.indicator, "dropping stale resolution");
            return None;
        }
        self.indicator = None;
        self.outbox.push(SessionEvent::TypingRemoved(id));

        let outcome = match result {
            Ok(ChatReply::Answer(text)) => {
                self.append(Sender::Bot, text);
                Outcome::Completed
            }
            Ok(ChatReply::AppError(e)) => {
                info!(error = %e, "server reported an application error");
                self.append(Sender::Bot, format!("Error: {e}"));
                Outcome::Completed
            }
            Err(e) => {
                warn!(error = %e, "chat request failed");
                self.append(Sender::Bot, APOLOGY.to_string());
                Outcome::Failed
            }
        };

        self.set_phase(match outcome {
            Outcome::Completed => Phase::Completed,
            Outcome::Failed => Phase::Failed,
        });
        let next = self.compose_phase();
        self.set_phase(next);
        Some(outcome)
    }

    /// Run one full exchange against `backend`: submit, dispatch, await,
    /// resolve. `None` if submit was disabled.
    pub async fn send<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        selection: &SelectionStore,
    ) -> Option<Outcome> {
        let request = self.submit(selection)?;
        let id = self.dispatched()?;
        let result = backend.ask(&request).await;
        self.resolve(id, result)
    }

    fn append(&mut self, sender: Sender, text: String) {
        let msg = ChatMessage {
            sender,
            text,
            timestamp: (self.clock)(),
        };
        self.transcript.push(msg.clone());
        self.outbox.push(SessionEvent::Appended(msg));
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            self.phase = phase;
            self.outbox.push(SessionEvent::PhaseChanged(phase));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FileDescriptor;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn fixed_clock() -> String {
        "10:30 AM".to_string()
    }

    /// Replays canned results and records every request it receives.
    #[derive(Default)]
    struct FakeBackend {
        replies: Mutex<VecDeque<Result<ChatReply, ClientError>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl FakeBackend {
        fn replying(results: Vec<Result<ChatReply, ClientError>>) -> Self {
            Self {
                replies: Mutex::new(results.into()),
                seen: Mutex::default(),
            }
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn ask(&self, request: &ChatRequest) -> Result<ChatReply, ClientError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Decode("no canned reply".to_string())))
        }
    }

    fn session_with(input: &str) -> ChatSession {
        let mut s = ChatSession::with_clock(fixed_clock);
        s.set_input(input);
        s
    }

    fn texts(s: &ChatSession) -> Vec<(Sender, &str)> {
        s.transcript().iter().map(|m| (m.sender, m.text.as_str())).collect()
    }

    #[tokio::test]
    async fn test_hello_with_empty_selection() {
        let backend = FakeBackend::replying(vec![Ok(ChatReply::Answer("hi".to_string()))]);
        let mut s = session_with("hello");
        let outcome = s.send(&backend, &SelectionStore::new()).await;

        assert_eq!(outcome, Some(Outcome::Completed));
        assert_eq!(
            backend.requests(),
            vec![ChatRequest { question: "hello".to_string(), selected_items: vec![] }]
        );
        assert_eq!(texts(&s), vec![(Sender::User, "hello"), (Sender::Bot, "hi")]);
        assert_eq!(s.transcript()[0].timestamp, "10:30 AM");
    }

    #[tokio::test]
    async fn test_selected_file_goes_into_payload() {
        let backend = FakeBackend::replying(vec![Ok(ChatReply::Answer("done".to_string()))]);
        let mut store = SelectionStore::new();
        store.toggle(&FileDescriptor {
            id: "f1".to_string(),
            name: "a.pdf".to_string(),
            kind: "file".to_string(),
            extension: "pdf".to_string(),
        });

        let mut s = session_with("summarize");
        s.send(&backend, &store).await;

        let sent = &backend.requests()[0];
        assert_eq!(
            serde_json::to_value(sent).unwrap(),
            serde_json::json!({
                "question": "summarize",
                "selected_items": [{"id": "f1", "name": "a.pdf", "type": "file", "extension": "pdf"}]
            })
        );
    }

    #[tokio::test]
    async fn test_application_error_is_prefixed() {
        let backend = FakeBackend::replying(vec![Ok(ChatReply::AppError("not found".to_string()))]);
        let mut s = session_with("where is it");
        let outcome = s.send(&backend, &SelectionStore::new()).await;

        assert_eq!(outcome, Some(Outcome::Completed));
        assert_eq!(s.transcript().last().unwrap().text, "Error: not found");
    }

    #[tokio::test]
    async fn test_transport_failure_shows_apology_only() {
        let backend = FakeBackend::replying(vec![Err(ClientError::Status {
            status: 500,
            body: "Traceback: KeyError".to_string(),
        })]);
        let mut s = session_with("anything");
        let outcome = s.send(&backend, &SelectionStore::new()).await;

        assert_eq!(outcome, Some(Outcome::Failed));
        let last = s.transcript().last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.text, APOLOGY);
        assert!(s.transcript().iter().all(|m| !m.text.contains("Traceback")));
    }

    #[test]
    fn test_submit_is_optimistic_and_clears_input() {
        let mut s = session_with("  question  ");
        let req = s.submit(&SelectionStore::new()).unwrap();

        assert_eq!(req.question, "question");
        assert_eq!(s.input(), "");
        assert_eq!(s.phase(), Phase::Sending);
        assert!(!s.can_submit());
        assert_eq!(texts(&s), vec![(Sender::User, "question")]);
    }

    #[test]
    fn test_blank_input_cannot_submit() {
        let mut s = session_with("   ");
        assert_eq!(s.phase(), Phase::Idle);
        assert!(!s.can_submit());
        assert!(s.submit(&SelectionStore::new()).is_none());
        assert!(s.transcript().is_empty());
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_compose_phase_follows_input() {
        let mut s = ChatSession::with_clock(fixed_clock);
        assert_eq!(s.phase(), Phase::Idle);
        s.edit_input(|buf| buf.push('x'));
        assert_eq!(s.phase(), Phase::Composing);
        s.edit_input(|buf| buf.clear());
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn test_indicator_lifecycle() {
        let mut s = session_with("q");
        s.submit(&SelectionStore::new()).unwrap();
        assert!(s.indicator().is_none());

        let id = s.dispatched().unwrap();
        assert_eq!(s.indicator(), Some(id));
        assert_eq!(s.phase(), Phase::AwaitingResponse);

        s.drain_events();
        s.resolve(id, Ok(ChatReply::Answer("a".to_string()))).unwrap();
        assert!(s.indicator().is_none());

        let events = s.drain_events();
        let removed = events.iter().position(|e| *e == SessionEvent::TypingRemoved(id)).unwrap();
        let appended = events
            .iter()
            .position(|e| matches!(e, SessionEvent::Appended(m) if m.sender == Sender::Bot))
            .unwrap();
        assert!(removed < appended, "indicator must go before the reply lands");
    }

    #[test]
    fn test_failure_path_also_removes_indicator_first() {
        let mut s = session_with("q");
        s.submit(&SelectionStore::new()).unwrap();
        let id = s.dispatched().unwrap();
        s.drain_events();
        s.resolve(id, Err(ClientError::Decode("eof".to_string()))).unwrap();

        let events = s.drain_events();
        assert_eq!(events[0], SessionEvent::TypingRemoved(id));
        assert!(matches!(&events[1], SessionEvent::Appended(m) if m.text == APOLOGY));
        assert!(events.contains(&SessionEvent::PhaseChanged(Phase::Failed)));
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn test_second_submit_refused_while_outstanding() {
        let store = SelectionStore::new();
        let mut s = session_with("first");
        s.submit(&store).unwrap();
        let id = s.dispatched().unwrap();

        s.set_input("second");
        assert!(!s.can_submit());
        assert!(s.submit(&store).is_none());
        assert_eq!(s.input(), "second");
        assert_eq!(s.transcript().len(), 1);

        s.resolve(id, Ok(ChatReply::Answer("one".to_string())));
        // Input typed while waiting survives and is submittable afterwards
        assert_eq!(s.phase(), Phase::Composing);
        assert!(s.can_submit());
    }

    #[test]
    fn test_stale_resolution_dropped() {
        let mut s = session_with("q");
        s.submit(&SelectionStore::new()).unwrap();
        let id = s.dispatched().unwrap();
        s.resolve(id, Ok(ChatReply::Answer("a".to_string())));

        let before = s.transcript().len();
        assert!(s.resolve(id, Ok(ChatReply::Answer("late".to_string()))).is_none());
        assert_eq!(s.transcript().len(), before);
    }

    #[test]
    fn test_payload_is_a_snapshot() {
        let mut store = SelectionStore::new();
        let file = FileDescriptor {
            id: "f1".to_string(),
            name: "a.pdf".to_string(),
            kind: "file".to_string(),
            extension: "pdf".to_string(),
        };
        store.add(&file);

        let mut s = session_with("q");
        let req = s.submit(&store).unwrap();
        store.clear();
        store.toggle(&FileDescriptor { id: "f2".to_string(), ..file.clone() });

        assert_eq!(req.selected_items.len(), 1);
        assert_eq!(req.selected_items[0].id, "f1");
    }

    #[test]
    fn test_dispatched_requires_sending() {
        let mut s = ChatSession::with_clock(fixed_clock);
        assert!(s.dispatched().is_none());
        assert!(s.indicator().is_none());
    }

    #[tokio::test]
    async fn test_phase_sequence() {
        let backend = FakeBackend::replying(vec![Ok(ChatReply::Answer("ok".to_string()))]);
        let mut s = session_with("q");
        s.drain_events();
        s.send(&backend, &SelectionStore::new()).await;

        let phases: Vec<Phase> = s
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::PhaseChanged(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![Phase::Sending, Phase::AwaitingResponse, Phase::Completed, Phase::Idle]
        );
    }
}
