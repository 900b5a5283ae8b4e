// ABOUTME: API handler modules for the quizd HTTP server.
// ABOUTME: Session lifecycle and operation dispatch live under api::sessions.

pub mod sessions;
