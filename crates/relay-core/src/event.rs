//! Session events and actions.

use std::time::{Duration, SystemTime};

use relay_proto::Message;

use crate::session::SessionState;

/// Actions the session produces for the driver to execute.
///
/// The driver (tokio client or test harness) executes these in order:
/// - `Send`: append CRLF and write the line to the transport
/// - `Emit`: dispatch the event to subscribers
/// - `Close`: close the transport, after the grace delay if nonzero
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Send this line to the server (without the CRLF terminator).
    Send(String),

    /// Dispatch this event to subscribers.
    Emit(Event),

    /// Close the transport.
    Close {
        /// Delay before closing, so a farewell line can flush. Zero for an
        /// immediate close.
        grace: Duration,
    },
}

/// Semantic events republished to observers.
///
/// One payload type per variant; [`EventKind`] is the subscription key.
/// Every decoded non-probe line additionally reaches observers as
/// [`Event::Raw`], so unfiltered visibility never depends on
/// classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Connection state changed.
    State(StateChange),

    /// Engine trace line (lifecycle notes, keepalive probes).
    Debug(String),

    /// Registration accepted; the session is live. Carries the triggering
    /// welcome message. Emitted every time the welcome numeric arrives, not
    /// deduplicated.
    Registered(Message),

    /// Inbound liveness probe, already auto-answered.
    Ping(Probe),

    /// Message to a channel or user.
    Message(ChatMessage),

    /// A peer joined a channel.
    Join(ChannelJoin),

    /// A peer left a channel.
    Part(ChannelPart),

    /// One batch of channel occupants.
    Names(NameList),

    /// Full decoded message, emitted for every non-probe line regardless of
    /// classification.
    Raw(Message),

    /// Transport fault. Reported, never thrown; does not itself change
    /// session state (an actual close does).
    Error(TransportFault),
}

impl Event {
    /// Subscription key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::State(_) => EventKind::State,
            Event::Debug(_) => EventKind::Debug,
            Event::Registered(_) => EventKind::Registered,
            Event::Ping(_) => EventKind::Ping,
            Event::Message(_) => EventKind::Message,
            Event::Join(_) => EventKind::Join,
            Event::Part(_) => EventKind::Part,
            Event::Names(_) => EventKind::Names,
            Event::Raw(_) => EventKind::Raw,
            Event::Error(_) => EventKind::Error,
        }
    }
}

/// Subscription key: the discriminant of [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`Event::State`]
    State,
    /// [`Event::Debug`]
    Debug,
    /// [`Event::Registered`]
    Registered,
    /// [`Event::Ping`]
    Ping,
    /// [`Event::Message`]
    Message,
    /// [`Event::Join`]
    Join,
    /// [`Event::Part`]
    Part,
    /// [`Event::Names`]
    Names,
    /// [`Event::Raw`]
    Raw,
    /// [`Event::Error`]
    Error,
}

/// Payload of [`Event::State`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// State entered.
    pub state: SessionState,
    /// Closure reason, present on the transition to
    /// [`SessionState::Disconnected`] when the transport reported one.
    pub reason: Option<String>,
}

/// Payload of [`Event::Ping`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// Probe argument echoed back in the reply. `None` for a bare probe.
    pub token: Option<String>,
}

/// Payload of [`Event::Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Sender nick, or the sentinel `"server"` when the line carried no
    /// prefix.
    pub from: String,
    /// Delivery target: a channel or our own nick.
    pub target: String,
    /// Message text.
    pub text: String,
    /// Whether the target is a channel (starts with the channel sigil).
    pub is_channel: bool,
}

/// Payload of [`Event::Join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelJoin {
    /// Joining nick.
    pub nick: String,
    /// Channel joined.
    pub channel: String,
}

/// Payload of [`Event::Part`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPart {
    /// Departing nick.
    pub nick: String,
    /// Channel left.
    pub channel: String,
    /// Part reason, if one was given.
    pub reason: Option<String>,
}

/// Payload of [`Event::Names`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameList {
    /// Channel the batch belongs to.
    pub channel: String,
    /// Occupant nicks, in wire order.
    pub users: Vec<String>,
}

/// Payload of [`Event::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFault {
    /// Fault description from the transport.
    pub kind: String,
    /// Wall-clock time the fault was observed.
    pub at: SystemTime,
    /// Whether the transport was open when the fault occurred.
    pub connected: bool,
    /// Endpoint of this connection attempt.
    pub endpoint: String,
}
