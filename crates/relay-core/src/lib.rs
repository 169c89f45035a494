//! Session engine
//!
//! Sans-IO state machine for one IRC client connection. Manages the
//! connect/registration lifecycle, auto-answers liveness probes, classifies
//! inbound lines into semantic events, and tracks activity for keepalives.
//!
//! # Architecture
//!
//! The session follows the action pattern: the driver feeds it transport
//! callbacks and commands (each carrying the current time where activity
//! tracking matters), and it returns [`SessionAction`]s for the driver to
//! execute. This keeps the state machine pure (no I/O, no clocks) and makes
//! testing straightforward.
//!
//! # Components
//!
//! - [`Session`]: the connection/registration state machine
//! - [`SessionAction`]: actions produced for the driver
//! - [`Event`]: typed semantic events republished to observers
//! - [`Registration`]: endpoint and identity for one connection attempt

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod event;
mod session;

pub use relay_proto::Message;

pub use event::{
    ChannelJoin, ChannelPart, ChatMessage, Event, EventKind, NameList, Probe, SessionAction,
    StateChange, TransportFault,
};
pub use session::{
    DEFAULT_KEEPALIVE_INTERVAL, DEFAULT_KEEPALIVE_THRESHOLD, QUIT_GRACE, Registration, Session,
    SessionConfig, SessionState,
};
