//! IRC Relay Core
//!
//! This crate provides a single-threaded IRC relay: session and channel
//! state, line framing, reply formatting, command dispatch and the
//! readiness-driven event loop that ties them to TCP.

pub mod buffer;
pub mod channel;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod event_loop;
pub mod message;
pub mod module;
pub mod numeric;
pub mod server;
pub mod utils;

#[cfg(test)]
mod tests;

pub use buffer::{ConnectionTiming, RecvQueue};
pub use channel::{Channel, ChannelMode, Topic};
pub use client::{Client, ClientId, ClientRegistry, ClientState};
pub use config::Config;
pub use connection::{MemoryTransport, Transport};
pub use error::{Error, Result};
pub use event_loop::EventLoop;
pub use message::{frame, Message, Prefix, MAX_LINE_LENGTH};
pub use module::{Module, ModuleContext, ModuleManager};
pub use numeric::NumericReply;
pub use server::Server;

/// Re-exports for convenience
pub use tokio_util::sync::CancellationToken;
pub use tracing::{debug, error, info, warn};
