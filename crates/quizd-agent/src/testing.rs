// ABOUTME: Test utilities for quizd-agent, including a scripted stub gateway.
// ABOUTME: Used in tests to simulate quiz-master responses without a live agent endpoint.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use quizd_core::{QuizOption, QuizResult, Turn};

use crate::gateway::{AgentGateway, GatewayError};

/// One invocation as seen by the stub.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub agent_id: String,
    pub message: String,
    pub history_len: usize,
}

/// A gateway that replays a scripted sequence of outcomes and records every
/// call it receives.
///
/// Useful in tests to drive a session controller through a whole quiz
/// without a live agent endpoint. Panics if invoked past the end of its
/// script, which in a test means the controller made more gateway calls
/// than the scenario allows.
pub struct StubGateway {
    script: Mutex<VecDeque<Result<QuizResult, GatewayError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubGateway {
    pub fn scripted(
        outcomes: impl IntoIterator<Item = Result<QuizResult, GatewayError>>,
    ) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call recorded so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl AgentGateway for StubGateway {
    async fn invoke(
        &self,
        agent_id: &str,
        message: &str,
        history: &[Turn],
    ) -> Result<QuizResult, GatewayError> {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            agent_id: agent_id.to_string(),
            message: message.to_string(),
            history_len: history.len(),
        });

        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .expect("StubGateway script exhausted")
    }
}

/// A question-phase result with options A through D.
pub fn question(number: u32) -> QuizResult {
    QuizResult {
        question_text: Some(format!("Stub question {}?", number)),
        options: Some(
            ["A", "B", "C", "D"]
                .into_iter()
                .enumerate()
                .map(|(i, label)| QuizOption {
                    label: label.to_string(),
                    text: format!("option {}", i + 1),
                })
                .collect(),
        ),
        question_number: Some(number),
        current_score: Some(number.saturating_sub(1) as i64),
        current_streak: Some(0),
        best_streak: Some(0),
        ..QuizResult::default()
    }
}

/// A grading-phase result.
pub fn grading(correct: bool) -> QuizResult {
    QuizResult {
        is_correct: Some(correct),
        correct_answer: Some("B".to_string()),
        explanation: Some("### Why\nThe answer is **B** because the stub says so.".to_string()),
        current_score: Some(if correct { 1 } else { 0 }),
        current_streak: Some(if correct { 1 } else { 0 }),
        best_streak: Some(1),
        ..QuizResult::default()
    }
}

/// A terminal result with `quiz_complete` set.
pub fn final_result(score: i64, accuracy: f64, best_streak: u32) -> QuizResult {
    QuizResult {
        quiz_complete: Some(true),
        final_score: Some(score),
        accuracy_percentage: Some(accuracy),
        best_streak: Some(best_streak),
        ..QuizResult::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_replays_its_script_in_order() {
        let stub = StubGateway::scripted([
            Ok(question(1)),
            Err(GatewayError::Transport("down".to_string())),
        ]);

        let first = stub.invoke("agent", "Start quiz", &[]).await;
        assert!(first.is_ok_and(|r| r.question_number == Some(1)));

        let second = stub.invoke("agent", "My answer is A", &[]).await;
        assert!(matches!(second, Err(GatewayError::Transport(_))));
    }

    #[tokio::test]
    async fn stub_records_calls() {
        let stub = StubGateway::scripted([Ok(question(1))]);
        let history = vec![Turn::user("hi"), Turn::assistant("{}")];

        stub.invoke("quiz-master", "Next question", &history)
            .await
            .unwrap();

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].agent_id, "quiz-master");
        assert_eq!(calls[0].message, "Next question");
        assert_eq!(calls[0].history_len, 2);
    }

    #[test]
    fn fixtures_have_the_fields_their_phase_needs() {
        let q = question(3);
        assert!(q.has_option("D"));
        assert_eq!(q.progress(), 3);

        let g = grading(true);
        assert!(g.correct());
        assert!(!g.complete());

        let f = final_result(8, 80.0, 5);
        assert!(f.complete());
        assert_eq!(f.total(), 8);
    }
}
