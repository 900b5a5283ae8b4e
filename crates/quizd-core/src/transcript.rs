// ABOUTME: Defines the role-tagged Turn and the append-only Transcript replayed to the agent.
// ABOUTME: Turns alternate user/assistant by construction: the transcript only grows by exchange pairs.

use serde::{Deserialize, Serialize};

/// Who produced a turn. Serialized lowercase because the transcript doubles
/// as the wire history the agent receives on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single role-tagged message in the conversation with the quiz-master agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The ordered user/assistant history for one quiz session.
///
/// The agent is stateless between calls; this transcript is how it
/// reconstructs score, streak, and question count on every exchange. It is
/// append-only within a session and discarded wholesale on reset. Appends
/// happen only through `record_exchange`, so a lone user or assistant turn
/// is not expressible and strict alternation holds structurally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one completed exchange: the user message that was sent and the
    /// serialized result that came back.
    pub fn record_exchange(&mut self, message: &str, reply: &str) {
        self.turns.push(Turn::user(message));
        self.turns.push(Turn::assistant(reply));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_grows_by_exchange_pairs() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.record_exchange("Start quiz: Category=Science, Difficulty=Medium", "{}");
        transcript.record_exchange("My answer is A", "{\"is_correct\":true}");

        assert_eq!(transcript.len(), 4);
    }

    #[test]
    fn turns_alternate_starting_with_user() {
        let mut transcript = Transcript::new();
        transcript.record_exchange("first", "one");
        transcript.record_exchange("second", "two");
        transcript.record_exchange("third", "three");

        for (i, turn) in transcript.turns().iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected, "turn {} has the wrong role", i);
        }
        assert_eq!(transcript.turns().last().map(|t| t.role), Some(Role::Assistant));
    }

    #[test]
    fn turn_serializes_with_lowercase_role() {
        let turn = Turn::user("Next question");
        let json = serde_json::to_string(&turn).expect("serialize turn");
        assert_eq!(json, r#"{"role":"user","content":"Next question"}"#);

        let deser: Turn = serde_json::from_str(&json).expect("deserialize turn");
        assert_eq!(deser, turn);
    }
}
