//! Session layer state machine.
//!
//! Manages the connect/registration lifecycle, per-line classification, and
//! keepalives for a single connection attempt. Uses the action pattern:
//! methods take time as input and return actions for the driver to execute.
//! This keeps the state machine pure (no I/O) and makes testing
//! straightforward.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect() ┌────────────┐ transport   ┌─────────────┐
//! │ Disconnected │──────────>│ Connecting │────────────>│ Registering │
//! └──────────────┘           └────────────┘   opened    └─────────────┘
//!        ▲                                                     │
//!        │              transport closed / disconnect()        │ welcome
//!        │                 (from any state)                    │ numeric
//!        │                                               ┌───────────┐
//!        └───────────────────────────────────────────────│ Connected │
//!                                                        └───────────┘
//! ```
//!
//! One instance drives one connection attempt; all owned state (pending
//! fragment, activity timestamp) is reset when the transport closes, so
//! nothing leaks into a later attempt.

use std::{ops::Sub, time::Duration};

use relay_proto::{LineBuffer, Message, command};

use crate::event::{
    ChannelJoin, ChannelPart, ChatMessage, Event, NameList, Probe, SessionAction, StateChange,
};

/// Cadence at which the driver should call [`Session::tick`].
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Idle window after which a tick sends a self-initiated probe. Must be
/// strictly greater than the tick cadence.
pub const DEFAULT_KEEPALIVE_THRESHOLD: Duration = Duration::from_secs(120);

/// Delay between sending the farewell line and closing the transport, so
/// the farewell has a chance to flush.
pub const QUIT_GRACE: Duration = Duration::from_millis(500);

/// Sender sentinel for messages whose line carried no prefix.
const SERVER_SENDER: &str = "server";

/// Channel sigil: targets starting with this are channels.
const CHANNEL_SIGIL: char = '#';

/// Connection state. Exactly one active value per session instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport; the resting state before and after an attempt.
    Disconnected,
    /// Transport being opened; no protocol lines sent yet.
    Connecting,
    /// Transport open, handshake sent, awaiting the welcome numeric.
    Registering,
    /// Welcome numeric received; the session is live.
    Connected,
}

/// Endpoint and identity for one connection attempt.
#[derive(Debug, Clone)]
pub struct Registration {
    /// Server endpoint, `host:port`.
    pub endpoint: String,
    /// Nickname to register.
    pub nick: String,
    /// Login identity for the user-registration line.
    pub user: String,
    /// Human-readable display name.
    pub realname: String,
    /// Optional connection credential; when present, an authentication line
    /// precedes the rest of the handshake.
    pub password: Option<String>,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cadence for [`Session::tick`] calls.
    pub keepalive_interval: Duration,
    /// Idle window before a self-initiated probe is sent.
    pub keepalive_threshold: Duration,
    /// Optional ceiling on the pending line fragment. `None` leaves the
    /// buffer unbounded.
    pub max_pending: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            keepalive_threshold: DEFAULT_KEEPALIVE_THRESHOLD,
            max_pending: None,
        }
    }
}

/// Connection/registration state machine for one session.
///
/// This is a pure state machine: no I/O, no clocks. Time is passed as a
/// parameter to the methods that track activity.
///
/// Generic over `I` to support both real time (`std::time::Instant`) and
/// virtual time in deterministic tests.
#[derive(Debug, Clone)]
pub struct Session<I = std::time::Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Current state.
    state: SessionState,
    /// Configuration.
    config: SessionConfig,
    /// Identity for this attempt.
    registration: Registration,
    /// Reassembler for inbound chunks.
    buffer: LineBuffer,
    /// Monotonic time of the most recent byte sent or received. `None`
    /// until the transport opens.
    last_activity: Option<I>,
}

impl<I> Session<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a new session in [`SessionState::Disconnected`].
    pub fn new(registration: Registration, config: SessionConfig) -> Self {
        let buffer = match config.max_pending {
            Some(limit) => LineBuffer::with_limit(limit),
            None => LineBuffer::new(),
        };

        Self {
            state: SessionState::Disconnected,
            config,
            registration,
            buffer,
            last_activity: None,
        }
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Endpoint of this connection attempt.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.registration.endpoint
    }

    /// Begin a connection attempt.
    ///
    /// `Disconnected → Connecting`. The driver opens the transport after
    /// this; no protocol lines are sent yet. No-op in any other state.
    pub fn connect(&mut self) -> Vec<SessionAction> {
        if self.state != SessionState::Disconnected {
            return Vec::new();
        }

        let mut actions = Vec::new();
        self.set_state(SessionState::Connecting, None, &mut actions);
        actions
    }

    /// The transport finished opening.
    ///
    /// `Connecting → Registering`. Sends the fixed handshake in order:
    /// optional authentication line, nickname line, user-registration line.
    /// The order is required by the protocol and must not change.
    pub fn transport_opened(&mut self, now: I) -> Vec<SessionAction> {
        if self.state != SessionState::Connecting {
            return Vec::new();
        }

        let mut actions = Vec::new();
        self.set_state(SessionState::Registering, None, &mut actions);
        actions.push(SessionAction::Emit(Event::Debug(format!(
            "registering as {} with {}",
            self.registration.nick, self.registration.endpoint
        ))));

        if let Some(password) = self.registration.password.clone() {
            self.push_send(Message::new(command::PASS).param(password).to_line(), now, &mut actions);
        }
        self.push_send(
            Message::new(command::NICK).param(self.registration.nick.clone()).to_line(),
            now,
            &mut actions,
        );
        self.push_send(
            Message::new(command::USER)
                .param(self.registration.user.clone())
                .param("0")
                .param("*")
                .trailing(self.registration.realname.clone())
                .to_line(),
            now,
            &mut actions,
        );

        actions
    }

    /// Process an inbound transport chunk.
    ///
    /// Reassembles complete lines and processes each in arrival order:
    /// probes are answered immediately, everything else is classified and
    /// always also emitted as [`Event::Raw`].
    pub fn data_received(&mut self, chunk: &str, now: I) -> Vec<SessionAction> {
        if self.state == SessionState::Disconnected {
            return Vec::new();
        }

        self.last_activity = Some(now);

        let mut actions = Vec::new();
        match self.buffer.push(chunk) {
            Ok(lines) => {
                for line in lines {
                    self.handle_line(&line, now, &mut actions);
                }
            },
            Err(e) => {
                // Opt-in fragment ceiling hit: protocol fault, drop the
                // connection instead of growing without bound.
                actions.push(SessionAction::Emit(Event::Debug(format!("protocol fault: {e}"))));
                actions.push(SessionAction::Close { grace: Duration::ZERO });
            },
        }
        actions
    }

    /// Periodic keepalive check.
    ///
    /// Once the handshake has begun, an idle window longer than the
    /// configured threshold produces a self-initiated probe. This defeats
    /// idle-connection timeouts in intermediary infrastructure; it is not a
    /// peer-failure detector.
    pub fn tick(&mut self, now: I) -> Vec<SessionAction> {
        if !matches!(self.state, SessionState::Registering | SessionState::Connected) {
            return Vec::new();
        }
        let Some(last) = self.last_activity else {
            return Vec::new();
        };
        if now - last <= self.config.keepalive_threshold {
            return Vec::new();
        }

        let token = self.probe_token();
        let mut actions = vec![SessionAction::Emit(Event::Debug(format!(
            "keepalive: probing idle connection ({token})"
        )))];
        self.push_send(Message::new(command::PING).trailing(token).to_line(), now, &mut actions);
        actions
    }

    /// The transport closed (peer close, local close, or fatal error).
    ///
    /// Any state transitions to `Disconnected`; the pending fragment is
    /// discarded so no partial line survives into a later attempt. No-op if
    /// already disconnected.
    pub fn transport_closed(&mut self, reason: Option<String>) -> Vec<SessionAction> {
        if self.state == SessionState::Disconnected {
            return Vec::new();
        }

        self.reset();
        let mut actions = Vec::new();
        self.set_state(SessionState::Disconnected, reason, &mut actions);
        actions
    }

    /// Proactively close the connection.
    ///
    /// Resets internal state and tells the driver to close the transport.
    /// Idempotent: a no-op when already disconnected.
    pub fn disconnect(&mut self) -> Vec<SessionAction> {
        if self.state == SessionState::Disconnected {
            return Vec::new();
        }

        self.reset();
        let mut actions = Vec::new();
        self.set_state(SessionState::Disconnected, None, &mut actions);
        actions.push(SessionAction::Close { grace: Duration::ZERO });
        actions
    }

    /// Send a raw line (terminator appended by the driver).
    ///
    /// Guarded no-op unless the transport is open: the transport state
    /// already reflects the condition, so misuse is not reported.
    pub fn send(&mut self, line: &str, now: I) -> Vec<SessionAction> {
        if !self.transport_open() {
            return Vec::new();
        }

        let mut actions = Vec::new();
        self.push_send(line.to_owned(), now, &mut actions);
        actions
    }

    /// Join a channel.
    pub fn join(&mut self, channel: &str, now: I) -> Vec<SessionAction> {
        self.send(&Message::new(command::JOIN).param(channel).to_line(), now)
    }

    /// Leave a channel, with an optional reason.
    pub fn part(&mut self, channel: &str, reason: Option<&str>, now: I) -> Vec<SessionAction> {
        let mut msg = Message::new(command::PART).param(channel);
        if let Some(reason) = reason {
            msg = msg.trailing(reason);
        }
        self.send(&msg.to_line(), now)
    }

    /// Send a message to a channel or user.
    pub fn privmsg(&mut self, target: &str, text: &str, now: I) -> Vec<SessionAction> {
        self.send(&Message::new(command::PRIVMSG).param(target).trailing(text).to_line(), now)
    }

    /// Query the occupant list of a channel.
    pub fn names(&mut self, channel: &str, now: I) -> Vec<SessionAction> {
        self.send(&Message::new(command::NAMES).param(channel).to_line(), now)
    }

    /// Send a farewell and close the transport after a short grace delay,
    /// so the farewell can flush before the socket drops.
    pub fn quit(&mut self, reason: Option<&str>, now: I) -> Vec<SessionAction> {
        if !self.transport_open() {
            return Vec::new();
        }

        let mut msg = Message::new(command::QUIT);
        if let Some(reason) = reason {
            msg = msg.trailing(reason);
        }

        let mut actions = Vec::new();
        self.push_send(msg.to_line(), now, &mut actions);
        actions.push(SessionAction::Close { grace: QUIT_GRACE });
        actions
    }

    /// Whether lines can currently be written to the transport.
    fn transport_open(&self) -> bool {
        matches!(self.state, SessionState::Registering | SessionState::Connected)
    }

    /// Argument for self-initiated probes: the endpoint host.
    fn probe_token(&self) -> String {
        self.registration
            .endpoint
            .split(':')
            .next()
            .unwrap_or(&self.registration.endpoint)
            .to_owned()
    }

    /// Clear per-connection state (fragment, activity timestamp).
    fn reset(&mut self) {
        self.buffer.clear();
        self.last_activity = None;
    }

    fn set_state(
        &mut self,
        state: SessionState,
        reason: Option<String>,
        actions: &mut Vec<SessionAction>,
    ) {
        self.state = state;
        actions.push(SessionAction::Emit(Event::State(StateChange { state, reason })));
    }

    /// Queue an outbound line and mark activity.
    fn push_send(&mut self, line: String, now: I, actions: &mut Vec<SessionAction>) {
        self.last_activity = Some(now);
        actions.push(SessionAction::Send(line));
    }

    /// Process one complete decoded line.
    fn handle_line(&mut self, line: &str, now: I, actions: &mut Vec<SessionAction>) {
        let msg = Message::parse(line);

        // Liveness probes are answered immediately and skip classification
        // entirely, including the raw event.
        if msg.command == command::PING {
            let token = msg.trailing.clone().or_else(|| msg.params.first().cloned());
            let mut reply = Message::new(command::PONG);
            if let Some(token) = &token {
                // A token with spaces only survives the echo as trailing
                // text; params are single words.
                reply = if token.contains(' ') {
                    reply.trailing(token.clone())
                } else {
                    reply.param(token.clone())
                };
            }
            self.push_send(reply.to_line(), now, actions);
            actions.push(SessionAction::Emit(Event::Ping(Probe { token })));
            return;
        }

        self.classify(&msg, actions);

        // Unfiltered visibility: every non-probe line reaches raw observers
        // whether or not a semantic event was emitted.
        actions.push(SessionAction::Emit(Event::Raw(msg)));
    }

    /// Map a decoded message to its semantic event, if any.
    fn classify(&mut self, msg: &Message, actions: &mut Vec<SessionAction>) {
        match msg.command.as_str() {
            command::RPL_WELCOME => {
                if self.state != SessionState::Connected {
                    self.set_state(SessionState::Connected, None, actions);
                }
                // Emitted every time the numeric arrives, not deduplicated.
                actions.push(SessionAction::Emit(Event::Registered(msg.clone())));
            },

            command::PRIVMSG => {
                let target = msg.params.first().cloned().unwrap_or_default();
                let is_channel = target.starts_with(CHANNEL_SIGIL);
                actions.push(SessionAction::Emit(Event::Message(ChatMessage {
                    from: msg.source_nick().unwrap_or(SERVER_SENDER).to_owned(),
                    target,
                    text: msg.trailing.clone().unwrap_or_default(),
                    is_channel,
                })));
            },

            command::JOIN => {
                let channel = msg
                    .trailing
                    .clone()
                    .or_else(|| msg.params.first().cloned())
                    .unwrap_or_default();
                actions.push(SessionAction::Emit(Event::Join(ChannelJoin {
                    nick: msg.source_nick().unwrap_or_default().to_owned(),
                    channel,
                })));
            },

            command::PART => {
                actions.push(SessionAction::Emit(Event::Part(ChannelPart {
                    nick: msg.source_nick().unwrap_or_default().to_owned(),
                    channel: msg.params.first().cloned().unwrap_or_default(),
                    reason: msg.trailing.clone(),
                })));
            },

            command::RPL_NAMREPLY => {
                // 353 params: <our nick> <channel symbol> <channel>
                let users = msg
                    .trailing
                    .as_deref()
                    .unwrap_or_default()
                    .split(' ')
                    .filter(|nick| !nick.is_empty())
                    .map(str::to_owned)
                    .collect();
                actions.push(SessionAction::Emit(Event::Names(NameList {
                    channel: msg.params.get(2).cloned().unwrap_or_default(),
                    users,
                })));
            },

            // Anything else flows through as raw only.
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn registration(password: Option<&str>) -> Registration {
        Registration {
            endpoint: "irc.example.org:6667".to_owned(),
            nick: "alice".to_owned(),
            user: "alice".to_owned(),
            realname: "Alice Example".to_owned(),
            password: password.map(str::to_owned),
        }
    }

    fn session(password: Option<&str>) -> Session {
        Session::new(registration(password), SessionConfig::default())
    }

    fn opened_session() -> (Session, Instant) {
        let mut s = session(None);
        let t0 = Instant::now();
        s.connect();
        s.transport_opened(t0);
        (s, t0)
    }

    fn sends(actions: &[SessionAction]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|a| match a {
                SessionAction::Send(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    fn events(actions: &[SessionAction]) -> Vec<Event> {
        actions
            .iter()
            .filter_map(|a| match a {
                SessionAction::Emit(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn handshake_order_without_password() {
        let mut s = session(None);
        let t0 = Instant::now();

        s.connect();
        assert_eq!(s.state(), SessionState::Connecting);

        let actions = s.transport_opened(t0);
        assert_eq!(s.state(), SessionState::Registering);
        assert_eq!(sends(&actions), vec!["NICK alice", "USER alice 0 * :Alice Example"]);
    }

    #[test]
    fn handshake_order_with_password() {
        let mut s = session(Some("hunter2"));
        let t0 = Instant::now();

        s.connect();
        let actions = s.transport_opened(t0);

        assert_eq!(
            sends(&actions),
            vec!["PASS hunter2", "NICK alice", "USER alice 0 * :Alice Example"]
        );
    }

    #[test]
    fn transport_opened_requires_connecting() {
        let mut s = session(None);
        let actions = s.transport_opened(Instant::now());

        assert!(actions.is_empty());
        assert_eq!(s.state(), SessionState::Disconnected);
    }

    #[test]
    fn welcome_numeric_transitions_and_fires_registered() {
        let (mut s, t0) = opened_session();

        let actions = s.data_received(":irc.example.org 001 alice :Welcome to the network\r\n", t0);

        assert_eq!(s.state(), SessionState::Connected);
        let events = events(&actions);
        assert!(matches!(
            events[0],
            Event::State(StateChange { state: SessionState::Connected, .. })
        ));
        let Event::Registered(msg) = &events[1] else {
            panic!("expected registered event, got {events:?}");
        };
        assert_eq!(msg.command, "001");
        assert!(matches!(events[2], Event::Raw(_)));
    }

    #[test]
    fn repeated_welcome_refires_registered_without_state_change() {
        let (mut s, t0) = opened_session();
        s.data_received(":irc.example.org 001 alice :Welcome\r\n", t0);

        let actions = s.data_received(":irc.example.org 001 alice :Welcome\r\n", t0);

        let events = events(&actions);
        assert!(matches!(events[0], Event::Registered(_)));
        assert!(!events.iter().any(|e| matches!(e, Event::State(_))));
    }

    #[test]
    fn ping_auto_reply_echoes_trailing() {
        let (mut s, t0) = opened_session();

        let actions = s.data_received("PING :xyz\r\n", t0);

        assert_eq!(sends(&actions), vec!["PONG xyz"]);
        let events = events(&actions);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0], Event::Ping(Probe { token: Some("xyz".to_owned()) }));
        // No raw event and no state change for probe lines.
        assert_eq!(s.state(), SessionState::Registering);
    }

    #[test]
    fn ping_token_with_spaces_is_echoed_as_trailing() {
        let (mut s, t0) = opened_session();

        let actions = s.data_received("PING :a b\r\n", t0);

        assert_eq!(sends(&actions), vec!["PONG :a b"]);
        assert_eq!(events(&actions)[0], Event::Ping(Probe { token: Some("a b".to_owned()) }));
    }

    #[test]
    fn ping_auto_reply_falls_back_to_first_param() {
        let (mut s, t0) = opened_session();

        let actions = s.data_received("PING token1\r\n", t0);

        assert_eq!(sends(&actions), vec!["PONG token1"]);
    }

    #[test]
    fn privmsg_classification() {
        let (mut s, t0) = opened_session();

        let actions = s.data_received(":bob!bob@host PRIVMSG #general :Hello World\r\n", t0);

        let events = events(&actions);
        assert_eq!(
            events[0],
            Event::Message(ChatMessage {
                from: "bob".to_owned(),
                target: "#general".to_owned(),
                text: "Hello World".to_owned(),
                is_channel: true,
            })
        );
        assert!(matches!(events[1], Event::Raw(_)));
    }

    #[test]
    fn privmsg_without_prefix_uses_server_sentinel() {
        let (mut s, t0) = opened_session();

        let actions = s.data_received("PRIVMSG alice :direct\r\n", t0);

        let Event::Message(msg) = &events(&actions)[0] else {
            panic!("expected message event");
        };
        assert_eq!(msg.from, "server");
        assert!(!msg.is_channel);
    }

    #[test]
    fn join_prefers_trailing_channel() {
        let (mut s, t0) = opened_session();

        let trailing_form = s.data_received(":bob!bob@host JOIN :#general\r\n", t0);
        let param_form = s.data_received(":bob!bob@host JOIN #other\r\n", t0);

        assert_eq!(
            events(&trailing_form)[0],
            Event::Join(ChannelJoin { nick: "bob".to_owned(), channel: "#general".to_owned() })
        );
        assert_eq!(
            events(&param_form)[0],
            Event::Join(ChannelJoin { nick: "bob".to_owned(), channel: "#other".to_owned() })
        );
    }

    #[test]
    fn part_carries_optional_reason() {
        let (mut s, t0) = opened_session();

        let actions = s.data_received(":bob!bob@host PART #general :bye now\r\n", t0);

        assert_eq!(
            events(&actions)[0],
            Event::Part(ChannelPart {
                nick: "bob".to_owned(),
                channel: "#general".to_owned(),
                reason: Some("bye now".to_owned()),
            })
        );
    }

    #[test]
    fn names_reply_splits_users() {
        let (mut s, t0) = opened_session();

        let actions =
            s.data_received(":irc.example.org 353 alice = #general :alice bob  carol\r\n", t0);

        assert_eq!(
            events(&actions)[0],
            Event::Names(NameList {
                channel: "#general".to_owned(),
                users: vec!["alice".to_owned(), "bob".to_owned(), "carol".to_owned()],
            })
        );
    }

    #[test]
    fn unknown_command_is_raw_only() {
        let (mut s, t0) = opened_session();

        let actions = s.data_received(":irc.example.org 372 alice :motd line\r\n", t0);

        let events = events(&actions);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Raw(_)));
    }

    #[test]
    fn lines_processed_in_arrival_order() {
        let (mut s, t0) = opened_session();

        let actions = s.data_received(":a!a@h PRIVMSG #c :one\r\n:b!b@h PRIVMSG #c :two\r\n", t0);

        let texts: Vec<String> = events(&actions)
            .into_iter()
            .filter_map(|e| match e {
                Event::Message(m) => Some(m.text),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn send_before_transport_open_is_silent_noop() {
        let mut s = session(None);
        let t0 = Instant::now();

        assert!(s.send("PRIVMSG #a :hi", t0).is_empty());

        s.connect();
        // Connecting but not yet opened: still a no-op.
        assert!(s.privmsg("#a", "hi", t0).is_empty());
    }

    #[test]
    fn convenience_commands_render_expected_lines() {
        let (mut s, t0) = opened_session();

        assert_eq!(sends(&s.join("#general", t0)), vec!["JOIN #general"]);
        assert_eq!(sends(&s.part("#general", None, t0)), vec!["PART #general"]);
        assert_eq!(
            sends(&s.part("#general", Some("so long"), t0)),
            vec!["PART #general :so long"]
        );
        assert_eq!(sends(&s.privmsg("#general", "hi there", t0)), vec![
            "PRIVMSG #general :hi there"
        ]);
        assert_eq!(sends(&s.names("#general", t0)), vec!["NAMES #general"]);
    }

    #[test]
    fn quit_sends_farewell_then_graceful_close() {
        let (mut s, t0) = opened_session();

        let actions = s.quit(Some("gone"), t0);

        assert_eq!(sends(&actions), vec!["QUIT :gone"]);
        assert!(matches!(actions.last(), Some(SessionAction::Close { grace: g }) if *g == QUIT_GRACE));
    }

    #[test]
    fn keepalive_probes_only_after_threshold() {
        let (mut s, t0) = opened_session();
        let config = SessionConfig::default();

        // Within the threshold: quiet.
        let quiet = s.tick(t0 + config.keepalive_interval);
        assert!(quiet.is_empty());

        // Past the threshold: one probe, activity refreshed.
        let t1 = t0 + config.keepalive_threshold + Duration::from_secs(1);
        let probing = s.tick(t1);
        assert_eq!(sends(&probing), vec!["PING :irc.example.org"]);

        // Immediately after, quiet again.
        assert!(s.tick(t1 + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn inbound_traffic_defers_keepalive() {
        let (mut s, t0) = opened_session();
        let config = SessionConfig::default();

        let t1 = t0 + config.keepalive_threshold;
        s.data_received("NOTICE alice :hi\r\n", t1);

        // Threshold measured from the refreshed activity timestamp.
        assert!(s.tick(t1 + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn keepalive_idle_when_disconnected() {
        let mut s = session(None);
        assert!(s.tick(Instant::now()).is_empty());
    }

    #[test]
    fn transport_closed_emits_state_with_reason() {
        let (mut s, _t0) = opened_session();

        let actions = s.transport_closed(Some("connection reset".to_owned()));

        assert_eq!(s.state(), SessionState::Disconnected);
        assert_eq!(
            events(&actions)[0],
            Event::State(StateChange {
                state: SessionState::Disconnected,
                reason: Some("connection reset".to_owned()),
            })
        );

        // Idempotent.
        assert!(s.transport_closed(None).is_empty());
    }

    #[test]
    fn disconnect_discards_partial_fragment() {
        let (mut s, t0) = opened_session();

        // A partial line with no terminator stays buffered.
        assert!(sends(&s.data_received("PRIV", t0)).is_empty());

        let actions = s.disconnect();
        assert_eq!(s.state(), SessionState::Disconnected);
        assert!(matches!(actions.last(), Some(SessionAction::Close { .. })));

        // A fresh attempt must not resurface the discarded bytes.
        s.connect();
        s.transport_opened(t0);
        let fresh = s.data_received("MSG #a :hi\r\n", t0);
        let Event::Raw(msg) = &events(&fresh)[0] else {
            panic!("expected raw event");
        };
        assert_eq!(msg.command, "MSG");
    }

    #[test]
    fn fragment_ceiling_forces_close() {
        let mut s: Session = Session::new(registration(None), SessionConfig {
            max_pending: Some(16),
            ..SessionConfig::default()
        });
        let t0 = Instant::now();
        s.connect();
        s.transport_opened(t0);

        let actions = s.data_received("this fragment never terminates and keeps growing", t0);

        assert!(matches!(actions.last(), Some(SessionAction::Close { grace }) if *grace == Duration::ZERO));
    }

    #[test]
    fn data_ignored_when_disconnected() {
        let mut s = session(None);
        assert!(s.data_received("PING :x\r\n", Instant::now()).is_empty());
    }
}
