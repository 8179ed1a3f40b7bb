//! Core of the code playground client.
//!
//! This crate provides the I/O-free building blocks:
//! - `SessionClient` - Per-session state machine producing `Effect`s
//! - `InboundMessage` - Backend push messages
//! - `Address` / `Location` - Sandbox selection and derived addresses
//! - `Transcript` - Append-only colorized log
//! - `Connection`, `Connector` and `Frontend` traits

pub mod address;
pub mod client;
pub mod colorize;
pub mod config;
pub mod message;
pub mod traits;
pub mod transcript;

pub use address::{Address, Location, SandboxId};
pub use client::SessionClient;
pub use config::PlaygroundConfig;
pub use message::{Effect, InboundMessage, Key};
pub use traits::{Connection, ConnectionError, ConnectionState, Connector, Frontend};
pub use transcript::Transcript;
