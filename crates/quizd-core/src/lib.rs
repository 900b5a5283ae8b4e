// ABOUTME: Core library for quizd, containing the quiz domain model and session state machine.
// ABOUTME: This crate is pure and synchronous; all I/O lives in quizd-agent and quizd-server.

pub mod markdown;
pub mod result;
pub mod session;
pub mod transcript;

pub use result::{QuizOption, QuizResult};
pub use session::{
    Category, Difficulty, OutboundCall, Phase, SessionError, SessionState, SessionView,
};
pub use transcript::{Role, Transcript, Turn};
