//! Session orchestration for the playground client.
//!
//! Provides:
//! - `SessionRunner` - Drive a session over a backend connection
//! - `SessionHandle` - Feed user actions into a running session
//! - `ExponentialBackoff` - Reconnection delays

pub mod backoff;
pub mod runner;

pub use backoff::ExponentialBackoff;
pub use runner::{RunnerError, SendError, SessionHandle, SessionRunner, UserAction};
