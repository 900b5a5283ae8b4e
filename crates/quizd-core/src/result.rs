// ABOUTME: The sparse structured result the quiz-master agent returns for any turn.
// ABOUTME: Every field is optional; display accessors substitute defaults instead of failing.

use serde::{Deserialize, Serialize};

/// One answer option as presented to the player. Labels are expected to be
/// unique within a question but duplicates are passed through as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub label: String,
    pub text: String,
}

/// The structured object returned by the agent. Which fields are populated
/// depends on where the quiz is: question fields while a question is live,
/// grading fields after an answer, terminal fields once the quiz is done.
/// The running score/streak bookkeeping is owned entirely by the agent; the
/// controller only displays it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuizOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_streak: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_streak: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_percentage: Option<f64>,
}

impl QuizResult {
    /// Question number for progress display, clamped to the expected 1..10
    /// range. The stored value is never mutated; 0 means "not reported".
    pub fn progress(&self) -> u32 {
        self.question_number.map(|n| n.clamp(1, 10)).unwrap_or(0)
    }

    pub fn score(&self) -> i64 {
        self.current_score.unwrap_or(0)
    }

    pub fn streak(&self) -> u32 {
        self.current_streak.unwrap_or(0)
    }

    pub fn peak_streak(&self) -> u32 {
        self.best_streak.unwrap_or(0)
    }

    pub fn total(&self) -> i64 {
        self.final_score.unwrap_or(0)
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy_percentage.unwrap_or(0.0)
    }

    pub fn correct(&self) -> bool {
        self.is_correct.unwrap_or(false)
    }

    pub fn complete(&self) -> bool {
        self.quiz_complete.unwrap_or(false)
    }

    pub fn answer_key(&self) -> &str {
        self.correct_answer.as_deref().unwrap_or("N/A")
    }

    pub fn explanation_text(&self) -> &str {
        self.explanation.as_deref().unwrap_or("")
    }

    /// Whether `label` names one of the current options.
    pub fn has_option(&self, label: &str) -> bool {
        self.options
            .as_deref()
            .is_some_and(|opts| opts.iter().any(|o| o.label == label))
    }

    /// Serialized form stored as the assistant turn in the transcript.
    /// Absent fields are skipped so the stored turn matches the sparse
    /// object the agent produced.
    pub fn to_transcript_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}
