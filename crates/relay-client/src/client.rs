//! Client driver: one connection lifecycle over TCP.

use std::time::{Duration, Instant, SystemTime};

use relay_core::{
    Event, EventKind, Registration, Session, SessionAction, SessionConfig, TransportFault,
};
use tokio::{sync::mpsc, time::MissedTickBehavior};

use crate::{
    bus::EventBus,
    transport::{Inbound, Transport},
};

/// Configuration for one connection attempt.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server endpoint, `host:port`.
    pub endpoint: String,
    /// Nickname to register.
    pub nick: String,
    /// Login identity for the user-registration line.
    pub user: String,
    /// Human-readable display name.
    pub realname: String,
    /// Optional connection credential.
    pub password: Option<String>,
    /// Keepalive and buffering knobs.
    pub session: SessionConfig,
}

impl ClientConfig {
    /// Configuration with the login identity and display name defaulted to
    /// the nickname, no credential, and default session knobs.
    pub fn new(endpoint: impl Into<String>, nick: impl Into<String>) -> Self {
        let nick = nick.into();
        Self {
            endpoint: endpoint.into(),
            user: nick.clone(),
            realname: nick.clone(),
            nick,
            password: None,
            session: SessionConfig::default(),
        }
    }
}

/// Commands accepted by the dispatch loop.
#[derive(Debug)]
enum Command {
    Raw(String),
    Join(String),
    Part { channel: String, reason: Option<String> },
    Privmsg { target: String, text: String },
    Names(String),
    Quit { reason: Option<String> },
    Disconnect,
}

/// Cloneable command sender for a running client.
///
/// Commands issued after the connection lifecycle has ended are silently
/// dropped, matching the engine's guarded no-op policy for misuse.
#[derive(Debug, Clone)]
pub struct Handle {
    tx: mpsc::UnboundedSender<Command>,
}

impl Handle {
    /// Transmit a raw line (terminator appended by the engine).
    pub fn send(&self, line: impl Into<String>) {
        let _ = self.tx.send(Command::Raw(line.into()));
    }

    /// Join a channel.
    pub fn join(&self, channel: impl Into<String>) {
        let _ = self.tx.send(Command::Join(channel.into()));
    }

    /// Leave a channel, with an optional reason.
    pub fn part(&self, channel: impl Into<String>, reason: Option<&str>) {
        let _ = self
            .tx
            .send(Command::Part { channel: channel.into(), reason: reason.map(str::to_owned) });
    }

    /// Send a message to a channel or user.
    pub fn privmsg(&self, target: impl Into<String>, text: impl Into<String>) {
        let _ = self.tx.send(Command::Privmsg { target: target.into(), text: text.into() });
    }

    /// Query the occupant list of a channel.
    pub fn names(&self, channel: impl Into<String>) {
        let _ = self.tx.send(Command::Names(channel.into()));
    }

    /// Send a farewell and close after a short grace delay.
    pub fn quit(&self, reason: Option<&str>) {
        let _ = self.tx.send(Command::Quit { reason: reason.map(str::to_owned) });
    }

    /// Close the transport immediately and end the lifecycle.
    pub fn disconnect(&self) {
        let _ = self.tx.send(Command::Disconnect);
    }
}

/// Client for one IRC session over TCP.
///
/// Owns the session state machine, the event bus, and (while running) the
/// transport. Subscribers are registered up front with [`Client::on`]; the
/// registry is never mutated internally after that.
pub struct Client {
    session: Session<Instant>,
    bus: EventBus,
    keepalive_interval: Duration,
    cmd_tx: mpsc::UnboundedSender<Command>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

impl Client {
    /// Create a client for one connection attempt.
    pub fn new(config: ClientConfig) -> Self {
        let keepalive_interval = config.session.keepalive_interval;
        let registration = Registration {
            endpoint: config.endpoint,
            nick: config.nick,
            user: config.user,
            realname: config.realname,
            password: config.password,
        };
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        Self {
            session: Session::new(registration, config.session),
            bus: EventBus::new(),
            keepalive_interval,
            cmd_tx,
            cmd_rx,
        }
    }

    /// Subscribe to one event kind. Delivery follows subscription order.
    pub fn on(&mut self, kind: EventKind, handler: impl FnMut(&Event) + Send + 'static) {
        self.bus.on(kind, handler);
    }

    /// Command sender usable from handlers and other tasks.
    pub fn handle(&self) -> Handle {
        Handle { tx: self.cmd_tx.clone() }
    }

    /// Run one connection lifecycle to completion.
    ///
    /// Dials the endpoint, performs the handshake, and dispatches until the
    /// transport closes or a quit/disconnect command lands. A failed dial is
    /// reported as an [`Event::Error`] followed by a disconnected state
    /// event; it is not a returned error.
    pub async fn run(self) {
        let Self { mut session, mut bus, keepalive_interval, cmd_tx, mut cmd_rx } = self;
        // Holding a sender keeps the command channel open for late handles.
        let _cmd_tx = cmd_tx;

        let endpoint = session.endpoint().to_owned();
        emit_all(&mut bus, session.connect());

        tracing::info!(%endpoint, "connecting");
        let mut transport = match Transport::open(&endpoint).await {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!(%endpoint, error = %e, "connect failed");
                bus.emit(&Event::Error(TransportFault {
                    kind: e.to_string(),
                    at: SystemTime::now(),
                    connected: false,
                    endpoint: endpoint.clone(),
                }));
                emit_all(&mut bus, session.transport_closed(Some(e.to_string())));
                return;
            },
        };

        let opening = session.transport_opened(Instant::now());
        if let Some(grace) = execute(&mut bus, &mut transport, &endpoint, opening).await {
            close(&mut bus, &mut session, &mut transport, grace).await;
            transport.stop();
            return;
        }

        let mut tick = tokio::time::interval(keepalive_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let step = tokio::select! {
                inbound = transport.inbound.recv() => match inbound {
                    Some(Inbound::Data(chunk)) => Step::Chunk(chunk),
                    Some(Inbound::Closed(reason)) => Step::Closed(reason),
                    None => Step::Closed(None),
                },
                command = cmd_rx.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => continue,
                },
                _ = tick.tick() => Step::Tick,
            };

            let actions = match step {
                Step::Chunk(chunk) => session.data_received(&chunk, Instant::now()),
                Step::Command(command) => apply_command(&mut session, command),
                Step::Tick => session.tick(Instant::now()),
                Step::Closed(reason) => {
                    tracing::info!(%endpoint, ?reason, "transport closed");
                    emit_all(&mut bus, session.transport_closed(reason));
                    break;
                },
            };

            if let Some(grace) = execute(&mut bus, &mut transport, &endpoint, actions).await {
                close(&mut bus, &mut session, &mut transport, grace).await;
                break;
            }
        }

        transport.stop();
    }
}

/// One unit of work for the dispatch loop.
enum Step {
    Chunk(String),
    Command(Command),
    Tick,
    Closed(Option<String>),
}

/// Map a command to session actions.
fn apply_command(session: &mut Session<Instant>, command: Command) -> Vec<SessionAction> {
    let now = Instant::now();
    match command {
        Command::Raw(line) => session.send(&line, now),
        Command::Join(channel) => session.join(&channel, now),
        Command::Part { channel, reason } => session.part(&channel, reason.as_deref(), now),
        Command::Privmsg { target, text } => session.privmsg(&target, &text, now),
        Command::Names(channel) => session.names(&channel, now),
        Command::Quit { reason } => session.quit(reason.as_deref(), now),
        Command::Disconnect => session.disconnect(),
    }
}

/// Execute actions against the open transport.
///
/// Returns the grace delay if a close was requested. Write faults become
/// error events and do not interrupt the remaining actions; the transport
/// will report the closure through its own channel if the connection is
/// actually gone.
async fn execute(
    bus: &mut EventBus,
    transport: &mut Transport,
    endpoint: &str,
    actions: Vec<SessionAction>,
) -> Option<Duration> {
    let mut close_after = None;

    for action in actions {
        match action {
            SessionAction::Send(line) => {
                tracing::debug!(%line, "send");
                if let Err(e) = transport.write_line(&line).await {
                    tracing::warn!(%endpoint, error = %e, "write failed");
                    bus.emit(&Event::Error(TransportFault {
                        kind: e.to_string(),
                        at: SystemTime::now(),
                        connected: true,
                        endpoint: endpoint.to_owned(),
                    }));
                }
            },
            SessionAction::Emit(event) => bus.emit(&event),
            SessionAction::Close { grace } => close_after = Some(grace),
        }
    }

    close_after
}

/// Dispatch actions that cannot touch a transport (none open yet, or the
/// close path): sends are impossible by construction, closes are already
/// underway.
fn emit_all(bus: &mut EventBus, actions: Vec<SessionAction>) {
    for action in actions {
        if let SessionAction::Emit(event) = action {
            bus.emit(&event);
        }
    }
}

/// Close the transport after the grace delay and settle the session.
async fn close(
    bus: &mut EventBus,
    session: &mut Session<Instant>,
    transport: &mut Transport,
    grace: Duration,
) {
    if !grace.is_zero() {
        tokio::time::sleep(grace).await;
    }
    transport.shutdown().await;
    // No-op if the session already reset itself (disconnect path); emits
    // the disconnected state event otherwise (quit path).
    emit_all(bus, session.transport_closed(None));
}
