// ABOUTME: Agent boundary for quizd: the gateway trait, its HTTP implementation, and the session controller actor.
// ABOUTME: Everything async lives here; quizd-core stays pure.

pub mod controller;
pub mod gateway;
pub mod http;
pub mod testing;

pub use controller::{ControllerError, SessionControllerHandle, SessionOp, spawn};
pub use gateway::{AgentGateway, GatewayError};
pub use http::HttpGateway;
