//! Command verbs and numeric reply codes.
//!
//! Command tokens are matched verbatim: named verbs are uppercase words,
//! numeric replies are three-digit strings. The decoder performs no
//! normalization, so these constants must match the wire form exactly.

/// Liveness probe from the server (or self-initiated keepalive).
pub const PING: &str = "PING";

/// Reply to a liveness probe.
pub const PONG: &str = "PONG";

/// Message to a channel or user.
pub const PRIVMSG: &str = "PRIVMSG";

/// Channel join.
pub const JOIN: &str = "JOIN";

/// Channel part.
pub const PART: &str = "PART";

/// Session farewell.
pub const QUIT: &str = "QUIT";

/// Nickname registration (handshake step two).
pub const NICK: &str = "NICK";

/// User registration (handshake step three).
pub const USER: &str = "USER";

/// Connection password (optional handshake step one).
pub const PASS: &str = "PASS";

/// Channel name-list query.
pub const NAMES: &str = "NAMES";

/// Welcome numeric: registration accepted, session is live.
pub const RPL_WELCOME: &str = "001";

/// Names-reply numeric: one batch of channel occupants.
pub const RPL_NAMREPLY: &str = "353";
