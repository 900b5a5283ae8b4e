// ABOUTME: The quiz session state machine: phases, preconditions, and pure transition functions.
// ABOUTME: Exchange operations split into begin_* (build the outbound call) and finish_*/fail_exchange (fold the outcome).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markdown::{self, Block};
use crate::result::QuizResult;
use crate::transcript::{Transcript, Turn};

/// Where the session is in the quiz lifecycle.
///
/// `Setup -> Active -> Feedback -> Active (loop) -> Results -> Setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    Active,
    Feedback,
    Results,
}

/// The fixed category set offered to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Science,
    History,
    Sports,
    Entertainment,
    Geography,
    #[serde(rename = "General Knowledge")]
    GeneralKnowledge,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Science => "Science",
            Category::History => "History",
            Category::Sports => "Sports",
            Category::Entertainment => "Entertainment",
            Category::Geography => "Geography",
            Category::GeneralKnowledge => "General Knowledge",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Precondition failures. These reject the operation and leave the session
/// untouched; they never become `last_error`, which is reserved for gateway
/// failures the player can retry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{op} is not valid in the {phase:?} phase")]
    InvalidPhase { op: &'static str, phase: Phase },

    #[error("no answer selected")]
    NoSelection,

    #[error("unknown option label: {0}")]
    UnknownLabel(String),

    #[error("an exchange with the agent is already in flight")]
    ExchangeInFlight,
}

/// A description of the gateway call an operation wants to make. Produced by
/// the pure `begin_*` functions and executed by the controller; the session
/// is only mutated once the outcome is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    pub message: String,
    pub history: Vec<Turn>,
}

/// The single mutable value backing one quiz session. Owned by its
/// controller; everything else sees only the `SessionView` projection.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub category: Category,
    pub difficulty: Difficulty,
    transcript: Transcript,
    pub pending_selection: Option<String>,
    pub last_result: Option<QuizResult>,
    pub last_error: Option<String>,
    pub in_flight: bool,
    pub started_at: DateTime<Utc>,
}

/// Read-only display state handed to the UI boundary.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub category: Category,
    pub difficulty: Difficulty,
    pub pending_selection: Option<String>,
    pub last_result: Option<QuizResult>,
    pub explanation_blocks: Vec<Block>,
    pub last_error: Option<String>,
    pub in_flight: bool,
    pub transcript_len: usize,
    pub started_at: DateTime<Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// A fresh session: `Setup` phase, the initial category/difficulty
    /// selections, empty transcript.
    pub fn new() -> Self {
        Self {
            phase: Phase::Setup,
            category: Category::Science,
            difficulty: Difficulty::Medium,
            transcript: Transcript::new(),
            pending_selection: None,
            last_result: None,
            last_error: None,
            in_flight: false,
            started_at: Utc::now(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Project the display state for the UI boundary, running the
    /// explanation (if any) through the markdown renderer.
    pub fn view(&self) -> SessionView {
        let explanation_blocks = self
            .last_result
            .as_ref()
            .map(|r| markdown::render(r.explanation_text()))
            .unwrap_or_default();

        SessionView {
            phase: self.phase,
            category: self.category,
            difficulty: self.difficulty,
            pending_selection: self.pending_selection.clone(),
            last_result: self.last_result.clone(),
            explanation_blocks,
            last_error: self.last_error.clone(),
            in_flight: self.in_flight,
            transcript_len: self.transcript.len(),
            started_at: self.started_at,
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.in_flight {
            return Err(SessionError::ExchangeInFlight);
        }
        Ok(())
    }

    /// Validate a start and build its outbound call. The very first exchange
    /// carries an empty history.
    pub fn begin_start(
        &self,
        category: Category,
        difficulty: Difficulty,
    ) -> Result<OutboundCall, SessionError> {
        self.ensure_idle()?;
        if self.phase != Phase::Setup {
            return Err(SessionError::InvalidPhase {
                op: "start",
                phase: self.phase,
            });
        }

        Ok(OutboundCall {
            message: format!(
                "Start quiz: Category={}, Difficulty={}",
                category, difficulty
            ),
            history: Vec::new(),
        })
    }

    /// Fold a successful start: store the question, record the exchange,
    /// persist the chosen category/difficulty, enter `Active`.
    pub fn finish_start(
        &mut self,
        category: Category,
        difficulty: Difficulty,
        call: &OutboundCall,
        result: QuizResult,
    ) {
        self.transcript
            .record_exchange(&call.message, &result.to_transcript_json());
        self.category = category;
        self.difficulty = difficulty;
        self.last_result = Some(result);
        self.last_error = None;
        self.phase = Phase::Active;
        tracing::debug!(category = %category, difficulty = %difficulty, "quiz started");
    }

    /// Record the player's choice. Local state only; no outbound call.
    pub fn select(&mut self, label: &str) -> Result<(), SessionError> {
        self.ensure_idle()?;
        if self.phase != Phase::Active {
            return Err(SessionError::InvalidPhase {
                op: "select",
                phase: self.phase,
            });
        }
        let known = self
            .last_result
            .as_ref()
            .is_some_and(|r| r.has_option(label));
        if !known {
            return Err(SessionError::UnknownLabel(label.to_string()));
        }

        self.pending_selection = Some(label.to_string());
        Ok(())
    }

    /// Validate a submit and build its outbound call, carrying the full
    /// accumulated transcript.
    pub fn begin_submit(&self) -> Result<OutboundCall, SessionError> {
        self.ensure_idle()?;
        if self.phase != Phase::Active {
            return Err(SessionError::InvalidPhase {
                op: "submit",
                phase: self.phase,
            });
        }
        let label = self
            .pending_selection
            .as_deref()
            .ok_or(SessionError::NoSelection)?;

        Ok(OutboundCall {
            message: format!("My answer is {}", label),
            history: self.transcript.turns().to_vec(),
        })
    }

    /// Fold a successful grading: record the exchange, enter `Feedback`.
    /// The selection stays put so the feedback screen can highlight it.
    pub fn finish_submit(&mut self, call: &OutboundCall, result: QuizResult) {
        self.transcript
            .record_exchange(&call.message, &result.to_transcript_json());
        self.last_result = Some(result);
        self.last_error = None;
        self.phase = Phase::Feedback;
    }

    /// Validate a continue and build its outbound call.
    pub fn begin_continue(&self) -> Result<OutboundCall, SessionError> {
        self.ensure_idle()?;
        if self.phase != Phase::Feedback {
            return Err(SessionError::InvalidPhase {
                op: "continue",
                phase: self.phase,
            });
        }

        Ok(OutboundCall {
            message: "Next question".to_string(),
            history: self.transcript.turns().to_vec(),
        })
    }

    /// Fold a successful continue. A `quiz_complete` result ends the session:
    /// the terminal exchange is not recorded because nothing will ever replay
    /// it. Otherwise the next question goes live and the old selection is
    /// cleared.
    pub fn finish_continue(&mut self, call: &OutboundCall, result: QuizResult) {
        if result.complete() {
            self.last_result = Some(result);
            self.last_error = None;
            self.phase = Phase::Results;
            tracing::debug!(turns = self.transcript.len(), "quiz complete");
            return;
        }

        self.transcript
            .record_exchange(&call.message, &result.to_transcript_json());
        self.last_result = Some(result);
        self.last_error = None;
        self.pending_selection = None;
        self.phase = Phase::Active;
    }

    /// Record a failed exchange. The phase, transcript, and selection are
    /// untouched, so re-invoking the same operation retries it as-is.
    pub fn fail_exchange(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(phase = ?self.phase, error = %message, "agent exchange failed");
        self.last_error = Some(message);
    }

    /// Discard everything and return to a fresh `Setup`.
    pub fn reset(&mut self) {
        *self = SessionState::new();
    }
}
