/// Transcript view — the node list the chat pane renders.
///
/// Pure projection of `SessionEvent`s: messages are appended, the typing
/// placeholder is inserted and later removed by identity. Notices are local
/// UI lines (command output, cache errors) that never reach the session.
use crate::session::{ChatMessage, IndicatorId, SessionEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Message(ChatMessage),
    Typing(IndicatorId),
    /// Dim system line
    Notice(String),
}

#[derive(Debug, Default)]
pub struct TranscriptView {
    nodes: Vec<Node>,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Appended(msg) => self.nodes.push(Node::Message(msg)),
            SessionEvent::TypingShown(id) => self.nodes.push(Node::Typing(id)),
            SessionEvent::TypingRemoved(id) => {
                self.nodes.retain(|n| *n != Node::Typing(id));
            }
            SessionEvent::PhaseChanged(_) => {}
        }
    }

    pub fn apply_all(&mut self, events: impl IntoIterator<Item = SessionEvent>) {
        for ev in events {
            self.apply(ev);
        }
    }

    pub fn notice(&mut self, text: impl Into<String>) {
        self.nodes.push(Node::Notice(text.into()));
    }

    /// Number of typing placeholders currently shown.
    pub fn typing_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Typing(_))).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ChatReply, ClientError};
    use crate::selection::SelectionStore;
    use crate::session::{ChatSession, Sender};

    fn clock() -> String {
        "01:00 PM".to_string()
    }

    fn messages(view: &TranscriptView) -> Vec<(Sender, String)> {
        view.nodes()
            .iter()
            .filter_map(|n| match n {
                Node::Message(m) => Some((m.sender, m.text.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_exactly_one_indicator_while_waiting() {
        let mut session = ChatSession::with_clock(clock);
        let mut view = TranscriptView::new();
        session.set_input("hello");

        session.submit(&SelectionStore::new()).unwrap();
        view.apply_all(session.drain_events());
        assert_eq!(view.typing_count(), 0);
        assert_eq!(messages(&view), vec![(Sender::User, "hello".to_string())]);

        let id = session.dispatched().unwrap();
        view.apply_all(session.drain_events());
        assert_eq!(view.typing_count(), 1);
        assert_eq!(view.nodes().last(), Some(&Node::Typing(id)));

        session.resolve(id, Ok(ChatReply::Answer("hi".to_string())));
        view.apply_all(session.drain_events());
        assert_eq!(view.typing_count(), 0);
        assert_eq!(
            messages(&view),
            vec![(Sender::User, "hello".to_string()), (Sender::Bot, "hi".to_string())]
        );
    }

    #[test]
    fn test_indicator_removed_on_failure() {
        let mut session = ChatSession::with_clock(clock);
        let mut view = TranscriptView::new();
        session.set_input("q");
        session.submit(&SelectionStore::new()).unwrap();
        let id = session.dispatched().unwrap();
        view.apply_all(session.drain_events());

        session.resolve(id, Err(ClientError::Decode("bad".to_string())));
        view.apply_all(session.drain_events());

        assert_eq!(view.typing_count(), 0);
        assert!(matches!(view.nodes().last(), Some(Node::Message(m)) if m.sender == Sender::Bot));
    }

    #[test]
    fn test_removal_is_by_identity() {
        let mut view = TranscriptView::new();
        let mut session = ChatSession::with_clock(clock);
        session.set_input("a");
        session.submit(&SelectionStore::new()).unwrap();
        let first = session.dispatched().unwrap();
        session.resolve(first, Ok(ChatReply::Answer("1".to_string())));
        session.set_input("b");
        session.submit(&SelectionStore::new()).unwrap();
        let second = session.dispatched().unwrap();
        assert_ne!(first, second);

        view.apply(SessionEvent::TypingShown(second));
        view.apply(SessionEvent::TypingRemoved(first));
        assert_eq!(view.typing_count(), 1);
        view.apply(SessionEvent::TypingRemoved(second));
        assert_eq!(view.typing_count(), 0);
    }

    #[test]
    fn test_notices_interleave() {
        let mut view = TranscriptView::new();
        view.notice("cache status unavailable");
        view.apply(SessionEvent::PhaseChanged(crate::session::Phase::Composing));
        assert_eq!(view.nodes(), &[Node::Notice("cache status unavailable".to_string())]);
    }
}
