//! Client driver
//!
//! Tokio TCP driver for the relay session engine. The Sans-IO state machine
//! in [`relay_core`] produces actions; this crate owns the socket, executes
//! those actions, and republishes decoded events to subscribers.
//!
//! # Architecture
//!
//! One [`Client`] performs exactly one connection lifecycle. [`Client::run`]
//! is the single dispatch loop: it selects over inbound transport chunks,
//! command-handle messages, and the keepalive tick, and feeds them to the
//! session in strict arrival order. All session-owned state is touched only
//! inside that loop, so the engine's single-writer discipline holds without
//! locks.
//!
//! Faults never unwind into caller code: a failed dial or mid-session write
//! error becomes an [`Event::Error`], and reconnection is entirely the
//! caller's decision.
//!
//! # Components
//!
//! - [`Client`]: owns session, transport, and event bus for one lifecycle
//! - [`Handle`]: cloneable command sender (join, part, privmsg, quit, ...)
//! - [`EventBus`]: ordered, synchronous publish/subscribe registry

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod bus;
mod client;
mod transport;

pub use bus::EventBus;
pub use client::{Client, ClientConfig, Handle};
pub use relay_core::{
    ChannelJoin, ChannelPart, ChatMessage, Event, EventKind, NameList, Probe, Registration,
    SessionConfig, SessionState, StateChange, TransportFault,
};
pub use relay_proto::Message;
