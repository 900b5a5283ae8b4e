// ABOUTME: Async session controller actor: processes quiz operations sequentially and drives gateway exchanges.
// ABOUTME: Guarantees at most one in-flight exchange per session, with unconditional in-flight release.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{RwLock, mpsc, oneshot};
use ulid::Ulid;

use quizd_core::{
    Category, Difficulty, OutboundCall, QuizResult, SessionError, SessionState, SessionView,
};

use crate::gateway::{AgentGateway, GatewayError};

/// The five operations the UI boundary can raise. Serde-tagged so the HTTP
/// layer accepts them directly.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum SessionOp {
    Start {
        category: Category,
        difficulty: Difficulty,
    },
    Select {
        label: String,
    },
    Submit,
    Continue,
    Reset,
}

impl SessionOp {
    /// Whether this operation performs a gateway exchange.
    fn is_exchange(&self) -> bool {
        matches!(
            self,
            SessionOp::Start { .. } | SessionOp::Submit | SessionOp::Continue
        )
    }
}

/// Errors surfaced to the caller of `dispatch`. Gateway failures are NOT
/// among them: those degrade to `last_error` inside the session and the
/// operation still yields a view.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("controller channel closed")]
    ChannelClosed,
}

type OpMessage = (SessionOp, oneshot::Sender<Result<SessionView, ControllerError>>);

/// Public handle for one quiz session. Operations are processed strictly one
/// at a time by the actor; the state is readable at any moment, including
/// while an exchange is in flight.
#[derive(Clone)]
pub struct SessionControllerHandle {
    op_tx: mpsc::Sender<OpMessage>,
    state: Arc<RwLock<SessionState>>,
    pub session_id: Ulid,
}

impl SessionControllerHandle {
    /// Send an operation and await the resulting view.
    ///
    /// Exchange operations are rejected outright while a prior exchange is
    /// pending rather than queued, so a double-click cannot produce a second
    /// gateway call or a duplicate transcript pair.
    pub async fn dispatch(&self, op: SessionOp) -> Result<SessionView, ControllerError> {
        if op.is_exchange() && self.state.read().await.in_flight {
            return Err(ControllerError::Session(SessionError::ExchangeInFlight));
        }

        let (tx, rx) = oneshot::channel();
        self.op_tx
            .send((op, tx))
            .await
            .map_err(|_| ControllerError::ChannelClosed)?;
        rx.await.map_err(|_| ControllerError::ChannelClosed)?
    }

    /// Current display state.
    pub async fn view(&self) -> SessionView {
        self.state.read().await.view()
    }

    /// Read-only access to the full session state.
    pub async fn read_state(&self) -> tokio::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().await
    }
}

/// Spawn a new session controller task and return its handle.
pub fn spawn(gateway: Arc<dyn AgentGateway>, agent_id: String) -> SessionControllerHandle {
    let (op_tx, op_rx) = mpsc::channel::<OpMessage>(64);
    let state = Arc::new(RwLock::new(SessionState::new()));
    let session_id = Ulid::new();

    let handle = SessionControllerHandle {
        op_tx,
        state: Arc::clone(&state),
        session_id,
    };

    let controller = SessionController {
        state,
        op_rx,
        gateway,
        agent_id,
        session_id,
    };

    tokio::spawn(controller.run());
    tracing::debug!(%session_id, "session controller spawned");

    handle
}

struct SessionController {
    state: Arc<RwLock<SessionState>>,
    op_rx: mpsc::Receiver<OpMessage>,
    gateway: Arc<dyn AgentGateway>,
    agent_id: String,
    session_id: Ulid,
}

impl SessionController {
    async fn run(mut self) {
        while let Some((op, reply_tx)) = self.op_rx.recv().await {
            let result = self.process(op).await;
            // Ignore send error — the caller may have dropped their receiver
            let _ = reply_tx.send(result);
        }
        tracing::debug!(session_id = %self.session_id, "session controller stopped");
    }

    async fn process(&mut self, op: SessionOp) -> Result<SessionView, ControllerError> {
        match op {
            SessionOp::Select { label } => {
                let mut state = self.state.write().await;
                state.select(&label)?;
                Ok(state.view())
            }

            SessionOp::Reset => {
                let mut state = self.state.write().await;
                state.reset();
                Ok(state.view())
            }

            SessionOp::Start {
                category,
                difficulty,
            } => {
                let call = self.state.read().await.begin_start(category, difficulty)?;
                match self.exchange(&call).await {
                    Ok(result) => {
                        let mut state = self.state.write().await;
                        state.finish_start(category, difficulty, &call, result);
                        Ok(state.view())
                    }
                    Err(err) => self.downgrade(start_failure(&err)).await,
                }
            }

            SessionOp::Submit => {
                let call = self.state.read().await.begin_submit()?;
                match self.exchange(&call).await {
                    Ok(result) => {
                        let mut state = self.state.write().await;
                        state.finish_submit(&call, result);
                        Ok(state.view())
                    }
                    Err(err) => self.downgrade(submit_failure(&err)).await,
                }
            }

            SessionOp::Continue => {
                let call = self.state.read().await.begin_continue()?;
                match self.exchange(&call).await {
                    Ok(result) => {
                        let mut state = self.state.write().await;
                        state.finish_continue(&call, result);
                        Ok(state.view())
                    }
                    Err(err) => self.downgrade(continue_failure(&err)).await,
                }
            }
        }
    }

    /// Run one gateway exchange with the in-flight flag raised. The guard
    /// clears the flag even if the exchange future is dropped mid-await.
    async fn exchange(&self, call: &OutboundCall) -> Result<QuizResult, GatewayError> {
        self.state.write().await.in_flight = true;
        let guard = InFlightGuard::new(Arc::clone(&self.state));

        let outcome = self
            .gateway
            .invoke(&self.agent_id, &call.message, &call.history)
            .await;

        guard.release().await;
        outcome
    }

    /// Fold a gateway failure into `last_error` and report the view; the
    /// failure never propagates past the controller.
    async fn downgrade(&self, message: &'static str) -> Result<SessionView, ControllerError> {
        let mut state = self.state.write().await;
        state.fail_exchange(message);
        Ok(state.view())
    }
}

/// Clears the in-flight flag exactly once: normally through `release`, or
/// from `Drop` if the exchange future is cancelled.
struct InFlightGuard {
    state: Arc<RwLock<SessionState>>,
    armed: bool,
}

impl InFlightGuard {
    fn new(state: Arc<RwLock<SessionState>>) -> Self {
        Self { state, armed: true }
    }

    async fn release(mut self) {
        self.armed = false;
        self.state.write().await.in_flight = false;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut state) = self.state.try_write() {
            state.in_flight = false;
        }
    }
}

fn start_failure(err: &GatewayError) -> &'static str {
    match err {
        GatewayError::Transport(_) => "An error occurred while starting the quiz.",
        _ => "Failed to start quiz. Please try again.",
    }
}

fn submit_failure(err: &GatewayError) -> &'static str {
    match err {
        GatewayError::Transport(_) => "An error occurred while submitting your answer.",
        _ => "Failed to submit answer. Please try again.",
    }
}

fn continue_failure(err: &GatewayError) -> &'static str {
    match err {
        GatewayError::Transport(_) => "An error occurred while loading the next question.",
        _ => "Failed to load next question. Please try again.",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use quizd_core::{Phase, Turn};

    use super::*;
    use crate::testing::{StubGateway, final_result, grading, question};

    fn start_op() -> SessionOp {
        SessionOp::Start {
            category: Category::Science,
            difficulty: Difficulty::Medium,
        }
    }

    fn select(label: &str) -> SessionOp {
        SessionOp::Select {
            label: label.to_string(),
        }
    }

    #[tokio::test]
    async fn full_quiz_lifecycle() {
        let stub = Arc::new(StubGateway::scripted([
            Ok(question(1)),
            Ok(grading(true)),
            Ok(question(2)),
            Ok(grading(false)),
            Ok(final_result(7, 50.0, 1)),
        ]));
        let handle = spawn(Arc::clone(&stub) as Arc<dyn AgentGateway>, "quiz-master".into());

        let view = handle.dispatch(start_op()).await.unwrap();
        assert_eq!(view.phase, Phase::Active);
        assert_eq!(view.transcript_len, 2);

        handle.dispatch(select("A")).await.unwrap();
        let view = handle.dispatch(SessionOp::Submit).await.unwrap();
        assert_eq!(view.phase, Phase::Feedback);
        assert_eq!(view.transcript_len, 4);

        let view = handle.dispatch(SessionOp::Continue).await.unwrap();
        assert_eq!(view.phase, Phase::Active);
        assert_eq!(view.transcript_len, 6);
        assert!(view.pending_selection.is_none());

        handle.dispatch(select("B")).await.unwrap();
        let view = handle.dispatch(SessionOp::Submit).await.unwrap();
        assert_eq!(view.phase, Phase::Feedback);
        assert_eq!(view.transcript_len, 8);

        let view = handle.dispatch(SessionOp::Continue).await.unwrap();
        assert_eq!(view.phase, Phase::Results);
        assert_eq!(view.transcript_len, 8, "terminal exchange is not recorded");
        let result = view.last_result.expect("terminal result");
        assert_eq!(result.total(), 7);

        // The agent saw the exact message templates with a growing history.
        let calls = stub.calls();
        let messages: Vec<&str> = calls.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Start quiz: Category=Science, Difficulty=Medium",
                "My answer is A",
                "Next question",
                "My answer is B",
                "Next question",
            ]
        );
        let history_lens: Vec<usize> = calls.iter().map(|c| c.history_len).collect();
        assert_eq!(history_lens, vec![0, 2, 4, 6, 8]);
    }

    #[tokio::test]
    async fn gateway_failure_leaves_state_retryable() {
        let stub = Arc::new(StubGateway::scripted([
            Ok(question(1)),
            Err(GatewayError::Transport("connection reset".into())),
            Ok(grading(true)),
        ]));
        let handle = spawn(Arc::clone(&stub) as Arc<dyn AgentGateway>, "quiz-master".into());

        handle.dispatch(start_op()).await.unwrap();
        handle.dispatch(select("A")).await.unwrap();

        let before = handle.read_state().await.clone();
        let view = handle.dispatch(SessionOp::Submit).await.unwrap();

        assert_eq!(view.phase, Phase::Active, "failed submit stays in Active");
        assert_eq!(
            view.last_error.as_deref(),
            Some("An error occurred while submitting your answer.")
        );
        assert_eq!(view.pending_selection.as_deref(), Some("A"));

        // Everything except last_error matches the pre-failure state.
        let after = handle.read_state().await.clone();
        assert_eq!(after.phase, before.phase);
        assert_eq!(after.transcript(), before.transcript());
        assert_eq!(after.pending_selection, before.pending_selection);
        assert_eq!(after.last_result, before.last_result);
        assert!(!after.in_flight);

        // Re-invoking the same operation retries without re-selecting.
        let view = handle.dispatch(SessionOp::Submit).await.unwrap();
        assert_eq!(view.phase, Phase::Feedback);
        assert_eq!(view.transcript_len, 4);
    }

    #[tokio::test]
    async fn unsuccessful_payload_gets_retry_wording() {
        let stub = Arc::new(StubGateway::scripted([Err(GatewayError::EmptyPayload)]));
        let handle = spawn(stub as Arc<dyn AgentGateway>, "quiz-master".into());

        let view = handle.dispatch(start_op()).await.unwrap();
        assert_eq!(view.phase, Phase::Setup);
        assert_eq!(
            view.last_error.as_deref(),
            Some("Failed to start quiz. Please try again.")
        );
        assert_eq!(view.transcript_len, 0, "failed start appends nothing");
    }

    #[tokio::test]
    async fn precondition_violations_reject_without_touching_state() {
        let stub = Arc::new(StubGateway::scripted([Ok(question(1))]));
        let handle = spawn(stub as Arc<dyn AgentGateway>, "quiz-master".into());

        let err = handle.dispatch(SessionOp::Submit).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Session(SessionError::InvalidPhase { op: "submit", .. })
        ));

        let view = handle.view().await;
        assert_eq!(view.phase, Phase::Setup);
        assert!(view.last_error.is_none(), "rejection is not a quiz failure");
    }

    #[tokio::test]
    async fn reset_returns_to_setup_from_anywhere() {
        let stub = Arc::new(StubGateway::scripted([Ok(question(1))]));
        let handle = spawn(stub as Arc<dyn AgentGateway>, "quiz-master".into());

        handle.dispatch(start_op()).await.unwrap();
        handle.dispatch(select("A")).await.unwrap();

        let view = handle.dispatch(SessionOp::Reset).await.unwrap();
        assert_eq!(view.phase, Phase::Setup);
        assert_eq!(view.transcript_len, 0);
        assert!(view.pending_selection.is_none());
        assert!(view.last_result.is_none());
    }

    /// Gateway whose second call blocks until released, for exercising the
    /// in-flight rejection window.
    struct GatedGateway {
        calls: AtomicUsize,
        gate: Notify,
    }

    #[async_trait]
    impl AgentGateway for GatedGateway {
        async fn invoke(
            &self,
            _agent_id: &str,
            _message: &str,
            _history: &[Turn],
        ) -> Result<quizd_core::QuizResult, GatewayError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                return Ok(question(1));
            }
            self.gate.notified().await;
            Ok(grading(true))
        }
    }

    #[tokio::test]
    async fn double_submit_makes_exactly_one_gateway_call() {
        let gateway = Arc::new(GatedGateway {
            calls: AtomicUsize::new(0),
            gate: Notify::new(),
        });
        let handle = spawn(
            Arc::clone(&gateway) as Arc<dyn AgentGateway>,
            "quiz-master".into(),
        );

        handle.dispatch(start_op()).await.unwrap();
        handle.dispatch(select("A")).await.unwrap();

        let racing = handle.clone();
        let first = tokio::spawn(async move { racing.dispatch(SessionOp::Submit).await });

        // Wait until the first submit is visibly in flight.
        let mut in_flight = false;
        for _ in 0..500 {
            if handle.view().await.in_flight {
                in_flight = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(in_flight, "first submit never became in-flight");

        let err = handle.dispatch(SessionOp::Submit).await.unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Session(SessionError::ExchangeInFlight)
        ));

        gateway.gate.notify_one();
        let view = first.await.unwrap().unwrap();
        assert_eq!(view.phase, Phase::Feedback);
        assert_eq!(view.transcript_len, 4, "exactly one appended pair");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2, "start + one submit");
    }
}
