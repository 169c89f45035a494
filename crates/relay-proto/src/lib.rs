//! Wire grammar for the relay protocol engine.
//!
//! IRC is a CRLF-delimited line protocol. Each line follows the grammar:
//!
//! ```text
//! [":" prefix SPACE] command (SPACE param)* [SPACE ":" trailing]
//! ```
//!
//! where `trailing` is the only field permitted to contain embedded spaces.
//!
//! This crate is pure data handling with no I/O:
//!
//! - [`LineBuffer`]: reassembles arbitrarily-fragmented transport chunks into
//!   complete lines
//! - [`Message`]: decoded line (prefix, command, params, trailing) with a
//!   total parser and wire rendering
//! - [`command`]: command verbs and numeric reply codes used by the engine
//!
//! Session semantics (handshake, classification, keepalive) live in
//! `relay-core`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod buffer;
pub mod command;
mod errors;
mod message;

pub use buffer::LineBuffer;
pub use errors::ProtocolError;
pub use message::Message;
